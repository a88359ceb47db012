//! MCP Service
//!
//! `ServerHandler` over the role engine's tool surface. rmcp owns the
//! JSON-RPC envelopes and session handshake; this layer only maps tool
//! schemas and outputs. Every session shares one engine, so tool calls are
//! serialized through its lock.

use std::borrow::Cow;
use std::sync::Arc;

use rmcp::transport::StreamableHttpServerConfig;
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, tower::StreamableHttpService,
};
use rmcp::{
    ErrorData as McpError, ServerHandler, ServiceExt,
    model::*,
    service::{RequestContext, RoleServer},
};
use role_core::{ToolCall, ToolOutput, ToolSchema};

use crate::state::AppState;

/// The role engine as an MCP server
#[derive(Clone)]
pub struct RoleService {
    state: AppState,
}

impl RoleService {
    pub const fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Tool descriptors for every exposed tool
    pub fn tools(&self) -> Vec<Tool> {
        self.state.tools.schemas().iter().map(to_mcp_tool).collect()
    }

    /// Run one tool call. Tool failures come back as `isError` results, not
    /// protocol errors.
    pub async fn call(&self, name: &str, arguments: Option<JsonObject>) -> Result<CallToolResult, McpError> {
        let call = ToolCall {
            name: name.to_string(),
            arguments: arguments.unwrap_or_default().into_iter().collect(),
        };

        let output = {
            let mut engine = self.state.engine.lock().await;
            self.state.tools.dispatch(&mut engine, &call).await
        };

        to_call_result(&output)
    }

    /// Serve on stdin/stdout until the client disconnects
    pub async fn serve_stdio(self) -> anyhow::Result<()> {
        let service = self.serve((tokio::io::stdin(), tokio::io::stdout())).await?;
        let reason = service.waiting().await?;
        tracing::info!(?reason, "stdio session closed");
        Ok(())
    }

    /// Streamable HTTP endpoint, one session per client
    pub fn http_service(self) -> StreamableHttpService<Self, LocalSessionManager> {
        StreamableHttpService::new(
            move || Ok(self.clone()),
            LocalSessionManager::default().into(),
            StreamableHttpServerConfig::default(),
        )
    }
}

fn to_mcp_tool(schema: &ToolSchema) -> Tool {
    Tool {
        name: Cow::Owned(schema.name.clone()),
        title: None,
        description: Some(Cow::Owned(schema.description.clone())),
        input_schema: Arc::new(schema.input_schema()),
        output_schema: None,
        annotations: Some(ToolAnnotations {
            title: None,
            read_only_hint: Some(!schema.has_side_effects),
            destructive_hint: Some(false),
            idempotent_hint: None,
            open_world_hint: Some(true),
        }),
        icons: None,
    }
}

/// The output object travels as JSON text in a single content block
fn to_call_result(output: &ToolOutput) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string(output).map_err(|e| McpError::internal_error(e.to_string(), None))?;
    let content = vec![Content::text(text)];

    Ok(if output.is_error() {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    })
}

impl ServerHandler for RoleService {
    fn get_info(&self) -> ServerInfo {
        let server = &self.state.server;
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: server.name.clone(),
                version: server.version.clone(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(server.description.clone()),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(self.tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = %request.name, "Tool call received");
        self.call(&request.name, request.arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use role_core::test_support::StubProvider;
    use role_core::{ProviderError, RoleConfig, RoleEngine};
    use serde_json::{Value, json};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    use crate::config::ServerConfig;

    fn service_with(stub: &Arc<StubProvider>, server: ServerConfig) -> RoleService {
        let role = RoleConfig::new("You are helpful.", None, 10).unwrap();
        RoleService::new(AppState::new(RoleEngine::with_defaults(stub.clone(), role), server))
    }

    fn args(value: Value) -> Option<JsonObject> {
        value.as_object().cloned()
    }

    fn output_of(result: &CallToolResult) -> Value {
        let text = &result.content[0].as_text().unwrap().text;
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_server_info() {
        let service = service_with(&Arc::new(StubProvider::echo()), ServerConfig::default());
        let info = service.get_info();

        assert_eq!(info.server_info.name, "llm-mcp-server");
        assert_eq!(info.server_info.version, "1.0.0");
        assert_eq!(info.instructions.as_deref(), Some("MCP server with LLM capabilities"));
        assert!(info.capabilities.tools.is_some());
    }

    #[test]
    fn test_tool_descriptors() {
        let service = service_with(&Arc::new(StubProvider::echo()), ServerConfig::default());
        let tools = service.tools();

        let names: Vec<&str> = tools.iter().map(|t| t.name.as_ref()).collect();
        assert_eq!(names, vec!["generate_text", "chat", "update_role"]);
        assert_eq!(tools[0].input_schema["required"], json!(["prompt"]));

        let read_only: Vec<Option<bool>> = tools
            .iter()
            .map(|t| t.annotations.as_ref().and_then(|a| a.read_only_hint))
            .collect();
        assert_eq!(read_only, vec![Some(true), Some(false), Some(false)]);
    }

    #[test]
    fn test_advisory_tools_listed_when_enabled() {
        let server = ServerConfig {
            advisory_tools: true,
            ..ServerConfig::default()
        };
        let service = service_with(&Arc::new(StubProvider::echo()), server);

        let tools = service.tools();
        assert_eq!(tools.len(), 8);
        let education = tools.iter().find(|t| t.name == "investment_education").unwrap();
        assert_eq!(education.input_schema["properties"]["complexity"]["default"], "intermediate");
    }

    #[tokio::test]
    async fn test_chat_call_updates_history() {
        let stub = Arc::new(StubProvider::echo());
        let service = service_with(&stub, ServerConfig::default());

        let result = service.call("chat", args(json!({"message": "hello"}))).await.unwrap();

        assert_eq!(output_of(&result), json!({"text": "echo: hello"}));
        assert_eq!(result.is_error, Some(false));
        assert_eq!(service.state.engine.lock().await.history().len(), 2);
    }

    #[tokio::test]
    async fn test_provider_failure_is_tool_error() {
        let stub = Arc::new(StubProvider::echo());
        stub.fail_next(ProviderError::auth("HTTP 401: bad key"));
        let service = service_with(&stub, ServerConfig::default());

        let result = service.call("generate_text", args(json!({"prompt": "hi"}))).await.unwrap();

        assert!(output_of(&result)["error"].as_str().unwrap().starts_with("ProviderError{AUTH}"));
        assert_eq!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_tool_error() {
        let stub = Arc::new(StubProvider::echo());
        let service = service_with(&stub, ServerConfig::default());

        let result = service.call("translate", None).await.unwrap();

        assert_eq!(output_of(&result), json!({"error": "Tool not found: translate"}));
        assert_eq!(stub.call_count(), 0);
    }

    async fn send(writer: &mut (impl AsyncWriteExt + Unpin), message: Value) {
        let mut line = message.to_string();
        line.push('\n');
        writer.write_all(line.as_bytes()).await.unwrap();
        writer.flush().await.unwrap();
    }

    async fn recv(lines: &mut tokio::io::Lines<BufReader<tokio::io::DuplexStream>>) -> Value {
        let line = lines.next_line().await.unwrap().unwrap();
        serde_json::from_str(&line).unwrap()
    }

    #[tokio::test]
    async fn test_session_over_stream_transport() {
        let stub = Arc::new(StubProvider::echo());
        let service = service_with(&stub, ServerConfig::default());

        let (mut client_write, server_read) = tokio::io::duplex(65_536);
        let (server_write, client_read) = tokio::io::duplex(65_536);
        let server = tokio::spawn(async move {
            let running = service.serve((server_read, server_write)).await.unwrap();
            running.waiting().await.unwrap();
        });
        let mut lines = BufReader::new(client_read).lines();

        send(
            &mut client_write,
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "test-client", "version": "0.0.1"}
            }}),
        )
        .await;
        let init = recv(&mut lines).await;
        assert_eq!(init["id"], 1);
        assert_eq!(init["result"]["serverInfo"]["name"], "llm-mcp-server");

        send(&mut client_write, json!({"jsonrpc": "2.0", "method": "notifications/initialized"})).await;

        send(&mut client_write, json!({"jsonrpc": "2.0", "id": "list", "method": "tools/list"})).await;
        let list = recv(&mut lines).await;
        assert_eq!(list["id"], "list");
        assert_eq!(list["result"]["tools"].as_array().unwrap().len(), 3);

        send(
            &mut client_write,
            json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call", "params": {
                "name": "update_role",
                "arguments": {"system_prompt": "You are a pirate."}
            }}),
        )
        .await;
        let updated = recv(&mut lines).await;
        assert_eq!(updated["id"], 3);
        assert_eq!(
            updated["result"]["content"][0]["text"],
            r#"{"status":"Role updated successfully"}"#
        );

        send(
            &mut client_write,
            json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call", "params": {
                "name": "chat", "arguments": {"message": "ahoy"}
            }}),
        )
        .await;
        let reply = recv(&mut lines).await;
        assert_eq!(reply["id"], 4);
        assert_eq!(reply["result"]["isError"], false);
        assert_eq!(stub.last_request().unwrap().system_prompt, "You are a pirate.");

        drop(client_write);
        server.await.unwrap();
    }
}
