//! Tool Surface
//!
//! The three tools exposed to the calling protocol layer and their
//! dispatch onto the [`RoleEngine`]:
//!
//! - `generate_text(prompt, temperature?, max_tokens?) -> {text} | {error}`
//! - `chat(message, reset_conversation?) -> {text} | {error}`
//! - `update_role(system_prompt, user_prompt_template?) -> {status} | {error}`
//!
//! A [`Toolset`] can additionally expose the [`crate::advisory`] family.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::advisory::{self, AdvisoryTool};
use crate::engine::{GenerationRequest, RoleEngine};
use crate::error::{Result, RoleError, ValidationError};

/// Tool call request from the protocol layer
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool identifier
    pub name: String,

    /// Arguments as key-value pairs
    #[serde(default)]
    pub arguments: HashMap<String, serde_json::Value>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: HashMap::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    /// Deserialize the arguments into a typed struct
    pub(crate) fn parse_args<T: DeserializeOwned>(&self) -> Result<T> {
        let object: serde_json::Map<String, serde_json::Value> = self
            .arguments
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        serde_json::from_value(serde_json::Value::Object(object))
            .map_err(|e| RoleError::InvalidArguments(format!("{}: {e}", self.name)))
    }
}

/// Structured tool result crossing the protocol boundary
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolOutput {
    Text { text: String },
    Status { status: String },
    Error { error: String },
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn status(status: impl Into<String>) -> Self {
        Self::Status {
            status: status.into(),
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self::Error {
            error: error.into(),
        }
    }

    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

impl From<Result<Self>> for ToolOutput {
    fn from(result: Result<Self>) -> Self {
        result.unwrap_or_else(|e| Self::error(e.to_string()))
    }
}

/// Parameter definition for tool schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, number, integer, boolean)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,

    /// Default value if not provided
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,

    /// Enum of allowed values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<serde_json::Value>>,
}

impl ParameterSchema {
    pub(crate) fn new(name: &str, param_type: &str, description: &str, required: bool) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
            required,
            default: None,
            enum_values: None,
        }
    }

    #[must_use]
    pub(crate) fn with_default(mut self, default: serde_json::Value) -> Self {
        self.default = Some(default);
        self
    }

    #[must_use]
    pub(crate) fn with_enum(mut self, values: &[&str]) -> Self {
        self.enum_values = Some(values.iter().map(|v| serde_json::json!(v)).collect());
        self
    }
}

/// Tool definition schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// Parameter definitions
    pub parameters: Vec<ParameterSchema>,

    /// Whether tool mutates engine state
    #[serde(default)]
    pub has_side_effects: bool,
}

impl ToolSchema {
    /// JSON Schema object describing the arguments
    pub fn input_schema(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut properties = serde_json::Map::new();
        for param in &self.parameters {
            let mut property = serde_json::json!({
                "type": param.param_type,
                "description": param.description,
            });
            if let Some(default) = &param.default {
                property["default"] = default.clone();
            }
            if let Some(values) = &param.enum_values {
                property["enum"] = serde_json::Value::Array(values.clone());
            }
            properties.insert(param.name.clone(), property);
        }

        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        let mut schema = serde_json::Map::new();
        schema.insert("type".into(), "object".into());
        schema.insert("properties".into(), properties.into());
        schema.insert("required".into(), serde_json::json!(required));
        schema
    }

    /// Check required parameters are present and non-null, and that
    /// enum-constrained values are in their set
    pub fn validate(&self, call: &ToolCall) -> Result<()> {
        for param in &self.parameters {
            let value = call.arguments.get(&param.name).filter(|v| !v.is_null());
            let Some(value) = value else {
                if param.required {
                    return Err(RoleError::InvalidArguments(format!(
                        "Missing required parameter: {}",
                        param.name
                    )));
                }
                continue;
            };

            let allowed = param.enum_values.as_ref();
            if allowed.is_some_and(|allowed| !allowed.contains(value)) {
                let allowed = serde_json::Value::Array(allowed.cloned().unwrap_or_default());
                return Err(RoleError::InvalidArguments(format!(
                    "{} must be one of {allowed}",
                    param.name
                )));
            }
        }

        Ok(())
    }
}

/// The tools this server exposes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoleTool {
    GenerateText,
    Chat,
    UpdateRole,
}

impl RoleTool {
    pub const ALL: [Self; 3] = [Self::GenerateText, Self::Chat, Self::UpdateRole];

    pub const fn name(self) -> &'static str {
        match self {
            Self::GenerateText => "generate_text",
            Self::Chat => "chat",
            Self::UpdateRole => "update_role",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    pub fn schema(self) -> ToolSchema {
        let (description, parameters, has_side_effects) = match self {
            Self::GenerateText => (
                "Generate text from a prompt under the current role. Does not use or change the conversation history.",
                vec![
                    ParameterSchema::new("prompt", "string", "Input text for the model", true),
                    ParameterSchema::new("temperature", "number", "Sampling temperature in [0, 1]", false),
                    ParameterSchema::new("max_tokens", "integer", "Maximum tokens to generate", false),
                ],
                false,
            ),
            Self::Chat => (
                "Send a message in the ongoing conversation and get the assistant's reply.",
                vec![
                    ParameterSchema::new("message", "string", "User message", true),
                    ParameterSchema::new(
                        "reset_conversation",
                        "boolean",
                        "Start a fresh conversation before this message",
                        false,
                    )
                    .with_default(serde_json::json!(false)),
                ],
                true,
            ),
            Self::UpdateRole => (
                "Replace the system prompt and user prompt template. Conversation history is kept.",
                vec![
                    ParameterSchema::new("system_prompt", "string", "New system prompt", true),
                    ParameterSchema::new(
                        "user_prompt_template",
                        "string",
                        "Template with exactly one {user_input} slot",
                        false,
                    )
                    .with_default(serde_json::json!(crate::role::USER_INPUT_SLOT)),
                ],
                true,
            ),
        };

        ToolSchema {
            name: self.name().into(),
            description: description.into(),
            parameters,
            has_side_effects,
        }
    }
}

/// Schemas for the three role tools
pub fn tool_schemas() -> Vec<ToolSchema> {
    RoleTool::ALL.into_iter().map(RoleTool::schema).collect()
}

/// The tool families a server exposes. The role tools are always present.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Toolset {
    pub advisory: bool,
}

impl Toolset {
    pub const fn with_advisory(advisory: bool) -> Self {
        Self { advisory }
    }

    /// Schemas for every exposed tool
    pub fn schemas(self) -> Vec<ToolSchema> {
        let mut schemas = tool_schemas();
        if self.advisory {
            schemas.extend(advisory::advisory_schemas());
        }
        schemas
    }

    /// Run a tool call against the engine. Every failure becomes `{error}`.
    pub async fn dispatch(self, engine: &mut RoleEngine, call: &ToolCall) -> ToolOutput {
        let result = match AdvisoryTool::from_name(&call.name) {
            Some(tool) if self.advisory => advisory::execute(engine, tool, call).await,
            _ => execute(engine, call).await,
        };
        if let Err(e) = &result {
            tracing::warn!(tool = %call.name, code = e.code(), "Tool call failed");
        }
        result.into()
    }
}

#[derive(Deserialize)]
struct GenerateTextArgs {
    prompt: String,
    #[serde(default)]
    temperature: Option<f64>,
    #[serde(default)]
    max_tokens: Option<i64>,
}

#[derive(Deserialize)]
struct ChatArgs {
    message: String,
    #[serde(default)]
    reset_conversation: Option<bool>,
}

#[derive(Deserialize)]
struct UpdateRoleArgs {
    system_prompt: String,
    #[serde(default)]
    user_prompt_template: Option<String>,
}

/// Run a role tool call against the engine. Every failure becomes `{error}`.
pub async fn dispatch(engine: &mut RoleEngine, call: &ToolCall) -> ToolOutput {
    Toolset::default().dispatch(engine, call).await
}

async fn execute(engine: &mut RoleEngine, call: &ToolCall) -> Result<ToolOutput> {
    let tool = RoleTool::from_name(&call.name)
        .ok_or_else(|| RoleError::ToolNotFound(call.name.clone()))?;
    tool.schema().validate(call)?;

    tracing::debug!(tool = tool.name(), "Executing tool");

    match tool {
        RoleTool::GenerateText => {
            let args: GenerateTextArgs = call.parse_args()?;
            let max_tokens = args
                .max_tokens
                .map(|n| {
                    u32::try_from(n)
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or(ValidationError::InvalidMaxTokens)
                })
                .transpose()?;

            #[allow(clippy::cast_possible_truncation)]
            let temperature = args
                .temperature
                .map(|t| {
                    if (0.0..=1.0).contains(&t) {
                        Ok(t as f32)
                    } else {
                        Err(ValidationError::TemperatureOutOfRange(t as f32))
                    }
                })
                .transpose()?;

            let request = GenerationRequest {
                prompt: args.prompt,
                temperature,
                max_tokens,
            };

            Ok(ToolOutput::text(engine.generate(request).await?))
        }
        RoleTool::Chat => {
            let args: ChatArgs = call.parse_args()?;
            let reply = engine
                .chat(&args.message, args.reset_conversation.unwrap_or(false))
                .await?;
            Ok(ToolOutput::text(reply))
        }
        RoleTool::UpdateRole => {
            let args: UpdateRoleArgs = call.parse_args()?;
            engine.update_role(&args.system_prompt, args.user_prompt_template.as_deref())?;
            Ok(ToolOutput::status("Role updated successfully"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::role::RoleConfig;
    use crate::test_support::StubProvider;
    use std::sync::Arc;

    fn engine(stub: &Arc<StubProvider>) -> RoleEngine {
        RoleEngine::with_defaults(stub.clone(), RoleConfig::new("You are helpful.", None, 10).unwrap())
    }

    #[test]
    fn test_schemas() {
        let schemas = tool_schemas();
        let names: Vec<&str> = schemas.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["generate_text", "chat", "update_role"]);

        let input = RoleTool::GenerateText.schema().input_schema();
        assert_eq!(input["type"], "object");
        assert_eq!(input["required"], serde_json::json!(["prompt"]));
        assert_eq!(input["properties"]["max_tokens"]["type"], "integer");
    }

    #[test]
    fn test_output_shapes() {
        assert_eq!(
            serde_json::to_value(ToolOutput::text("hi")).unwrap(),
            serde_json::json!({"text": "hi"})
        );
        assert_eq!(
            serde_json::to_value(ToolOutput::error("boom")).unwrap(),
            serde_json::json!({"error": "boom"})
        );
    }

    #[tokio::test]
    async fn test_generate_text() {
        let stub = Arc::new(StubProvider::echo());
        let mut engine = engine(&stub);

        let call = ToolCall::new("generate_text")
            .arg("prompt", "hello")
            .arg("temperature", 0.3)
            .arg("max_tokens", 50);
        let output = dispatch(&mut engine, &call).await;

        assert_eq!(output, ToolOutput::text("echo: hello"));
        assert_eq!(stub.last_request().unwrap().options.max_tokens, 50);
    }

    #[tokio::test]
    async fn test_generate_text_rejects_hot_temperature() {
        let stub = Arc::new(StubProvider::echo());
        let mut engine = engine(&stub);

        let call = ToolCall::new("generate_text")
            .arg("prompt", "hello")
            .arg("temperature", 1.5);
        let output = dispatch(&mut engine, &call).await;

        match output {
            ToolOutput::Error { error } => {
                assert!(error.starts_with("ValidationError{TEMPERATURE_OUT_OF_RANGE}"));
            }
            other => panic!("expected error, got {other:?}"),
        }
        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test]
    async fn test_temperature_checked_before_narrowing() {
        let stub = Arc::new(StubProvider::echo());
        let mut engine = engine(&stub);

        let call = ToolCall::new("generate_text")
            .arg("prompt", "hello")
            .arg("temperature", 1.000_000_01);
        let output = dispatch(&mut engine, &call).await;

        assert!(output.is_error());
        assert_eq!(stub.call_count(), 0);

        let edge = ToolCall::new("generate_text")
            .arg("prompt", "hello")
            .arg("temperature", 1.0);
        assert_eq!(dispatch(&mut engine, &edge).await, ToolOutput::text("echo: hello"));
    }

    #[tokio::test]
    async fn test_negative_max_tokens_rejected() {
        let stub = Arc::new(StubProvider::echo());
        let mut engine = engine(&stub);

        let call = ToolCall::new("generate_text")
            .arg("prompt", "hello")
            .arg("max_tokens", -5);
        let output = dispatch(&mut engine, &call).await;

        assert_eq!(
            output,
            ToolOutput::error("ValidationError{INVALID_MAX_TOKENS}: max_tokens must be a positive integer")
        );
    }

    #[tokio::test]
    async fn test_chat_and_reset() {
        let stub = Arc::new(StubProvider::echo());
        let mut engine = engine(&stub);

        dispatch(&mut engine, &ToolCall::new("chat").arg("message", "one")).await;
        assert_eq!(engine.history().len(), 2);

        let call = ToolCall::new("chat")
            .arg("message", "two")
            .arg("reset_conversation", true);
        let output = dispatch(&mut engine, &call).await;

        assert_eq!(output, ToolOutput::text("echo: two"));
        assert_eq!(engine.history().len(), 2);
    }

    #[tokio::test]
    async fn test_update_role() {
        let stub = Arc::new(StubProvider::echo());
        let mut engine = engine(&stub);

        let call = ToolCall::new("update_role")
            .arg("system_prompt", "You are X")
            .arg("user_prompt_template", "Say: {user_input}");
        let output = dispatch(&mut engine, &call).await;

        assert_eq!(output, ToolOutput::status("Role updated successfully"));
        assert_eq!(engine.role().system_prompt(), "You are X");
        assert_eq!(engine.role().render("hi"), "Say: hi");
    }

    #[tokio::test]
    async fn test_update_role_missing_slot() {
        let stub = Arc::new(StubProvider::echo());
        let mut engine = engine(&stub);

        let call = ToolCall::new("update_role")
            .arg("system_prompt", "You are X")
            .arg("user_prompt_template", "no slot");
        let output = dispatch(&mut engine, &call).await;

        assert!(output.is_error());
        assert_eq!(engine.role().system_prompt(), "You are helpful.");
    }

    #[tokio::test]
    async fn test_provider_error_is_structured() {
        let stub = Arc::new(StubProvider::echo());
        let mut engine = engine(&stub);
        stub.fail_next(ProviderError::auth("invalid x-api-key"));

        let output = dispatch(&mut engine, &ToolCall::new("chat").arg("message", "hi")).await;

        assert_eq!(
            output,
            ToolOutput::error("ProviderError{AUTH}: invalid x-api-key")
        );
        assert!(engine.history().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_tool_and_missing_args() {
        let stub = Arc::new(StubProvider::echo());
        let mut engine = engine(&stub);

        let output = dispatch(&mut engine, &ToolCall::new("summarize")).await;
        assert_eq!(output, ToolOutput::error("Tool not found: summarize"));

        let output = dispatch(&mut engine, &ToolCall::new("chat")).await;
        assert_eq!(
            output,
            ToolOutput::error("Invalid arguments: Missing required parameter: message")
        );

        let output = dispatch(&mut engine, &ToolCall::new("chat").arg("message", 42)).await;
        assert!(output.is_error());
        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test]
    async fn test_toolset_gates_advisory_family() {
        let stub = Arc::new(StubProvider::echo());
        let mut engine = engine(&stub);
        let call = ToolCall::new("investment_education").arg("topic", "basics");

        assert_eq!(Toolset::default().schemas().len(), 3);
        let output = Toolset::default().dispatch(&mut engine, &call).await;
        assert_eq!(output, ToolOutput::error("Tool not found: investment_education"));
        assert_eq!(stub.call_count(), 0);

        let toolset = Toolset::with_advisory(true);
        assert_eq!(toolset.schemas().len(), 8);
        let output = toolset.dispatch(&mut engine, &call).await;
        assert!(!output.is_error());
        assert!(stub.last_request().unwrap().user_content.contains("Topic: basics"));
        assert!(engine.history().is_empty());
    }

    #[tokio::test]
    async fn test_toolset_rejects_out_of_set_value() {
        let stub = Arc::new(StubProvider::echo());
        let mut engine = engine(&stub);

        let call = ToolCall::new("investment_education")
            .arg("topic", "basics")
            .arg("complexity", "expert");
        let output = Toolset::with_advisory(true).dispatch(&mut engine, &call).await;

        assert_eq!(
            output,
            ToolOutput::error(r#"Invalid arguments: complexity must be one of ["beginner","intermediate","advanced"]"#)
        );
        assert_eq!(stub.call_count(), 0);
    }
}
