//! role-server
//!
//! Exposes one configurable LLM role as the `generate_text`, `chat` and
//! `update_role` MCP tools, on stdio or streamable HTTP. The advisory tool
//! family is added with `MCP_ADVISORY_TOOLS=true`.

mod config;
mod handlers;
mod service;
mod state;

use role_core::RoleEngineBuilder;
use role_runtime::config::{LlmConfig, RoleSettings};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{ServerConfig, Transport};
use crate::service::RoleService;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Stdout belongs to the stdio transport
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let llm = LlmConfig::from_env()?;
    let role = RoleSettings::from_env()?.to_role_config()?;
    let server = ServerConfig::from_env()?;

    let provider = role_runtime::create_provider(&llm)?;
    let engine = RoleEngineBuilder::new()
        .provider(provider)
        .role(role)
        .generation(llm.generation)
        .request_timeout(llm.request_timeout())
        .build()?;

    tracing::info!(
        name = %server.name,
        version = %server.version,
        provider = %llm.provider,
        model = %llm.model,
        context_window = engine.role().context_window(),
        advisory_tools = server.advisory_tools,
        "Role engine ready"
    );

    let transport = server.transport;
    let bind_addr = server.bind_addr;
    let state = AppState::new(engine, server);

    match transport {
        Transport::Stdio => {
            tracing::info!("Serving MCP on stdio");
            RoleService::new(state).serve_stdio().await?;
        }
        Transport::Http => {
            let listener = tokio::net::TcpListener::bind(bind_addr).await?;
            tracing::info!("Serving MCP on http://{}/mcp", bind_addr);
            axum::serve(listener, handlers::router(state)).await?;
        }
    }

    Ok(())
}
