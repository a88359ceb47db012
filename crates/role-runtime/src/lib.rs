//! # role-runtime
//!
//! Concrete LLM backends and startup configuration for the role server.
//!
//! ## Providers
//!
//! - **OpenAI** (default): `/chat/completions` with bearer auth
//! - **Anthropic**: `/v1/messages` with `x-api-key`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use role_runtime::{config::LlmConfig, create_provider};
//!
//! let provider = create_provider(&LlmConfig::from_env()?)?;
//! let engine = RoleEngineBuilder::new()
//!     .provider(provider)
//!     .build()?;
//! ```

use std::sync::Arc;

use role_core::{LlmProvider, Result, RoleError};

use crate::config::{LlmConfig, ProviderKind};

pub mod config;
mod http;

#[cfg(feature = "anthropic")]
pub mod anthropic;
#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "anthropic")]
pub use anthropic::AnthropicProvider;
#[cfg(feature = "openai")]
pub use openai::OpenAiProvider;

/// Build the provider selected by `config.provider`
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>> {
    tracing::info!(
        provider = %config.provider,
        model = %config.model,
        base_url = config.base_url.as_deref().unwrap_or("default"),
        "Creating LLM provider"
    );

    match config.provider {
        #[cfg(feature = "openai")]
        ProviderKind::OpenAi => Ok(Arc::new(OpenAiProvider::from_config(config)?)),
        #[cfg(feature = "anthropic")]
        ProviderKind::Anthropic => Ok(Arc::new(AnthropicProvider::from_config(config)?)),
        #[allow(unreachable_patterns)]
        other => Err(RoleError::Config(format!(
            "provider {other} is not compiled into this build"
        ))),
    }
}
