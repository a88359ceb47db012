//! Anthropic-style LLM Provider
//!
//! Implementation of `LlmProvider` for the `/v1/messages` endpoint. The
//! system prompt travels in its own field; history and the user turn go in
//! `messages`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use role_core::{
    error::{ProviderError, Result},
    message::Role,
    provider::{
        Completion, CompletionRequest, FinishReason, LlmProvider, ProviderInfo, TokenUsage,
    },
};
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::http;

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Value of the `anthropic-version` header
pub const API_VERSION: &str = "2023-06-01";

/// Anthropic-style messages provider
pub struct AnthropicProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl AnthropicProvider {
    pub fn new(
        api_key: Option<String>,
        base_url: Option<&str>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = base_url
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        if api_key.is_none() {
            tracing::warn!(base_url = %base_url, "No API key configured for Anthropic-style provider");
        }

        Ok(Self {
            client: http::build_client(timeout)?,
            api_key,
            base_url,
            model: model.into(),
        })
    }

    /// Create from configuration
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        Self::new(
            config.api_key.clone(),
            config.base_url.as_deref(),
            config.model.clone(),
            config.request_timeout(),
        )
    }

    fn build_body<'a>(&'a self, request: &CompletionRequest<'a>) -> MessagesRequestBody<'a> {
        MessagesRequestBody {
            model: &self.model,
            system: request.system_prompt,
            messages: request
                .turns()
                .map(|(role, content)| WireMessage { role, content })
                .collect(),
            temperature: request.options.temperature,
            max_tokens: request.options.max_tokens,
        }
    }

    fn convert_completion(
        &self,
        response: MessagesResponseBody,
    ) -> std::result::Result<Completion, ProviderError> {
        let texts: Vec<String> = response
            .content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text)
            .collect();

        if texts.is_empty() {
            return Err(ProviderError::malformed("response has no text content blocks"));
        }

        Ok(Completion {
            content: texts.concat(),
            model: response.model.unwrap_or_else(|| self.model.clone()),
            usage: response
                .usage
                .map(|u| TokenUsage::new(u.input_tokens, u.output_tokens)),
            finish_reason: response.stop_reason.as_deref().map(FinishReason::from_vendor),
        })
    }
}

#[derive(Serialize)]
struct MessagesRequestBody<'a> {
    model: &'a str,
    system: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponseBody {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<UsageBody>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct UsageBody {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "anthropic".into(),
            model: self.model.clone(),
        }
    }

    async fn complete(
        &self,
        request: &CompletionRequest<'_>,
    ) -> std::result::Result<Completion, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = self.build_body(request);

        tracing::debug!(model = %self.model, url = %url, msg_count = body.messages.len(), "Sending messages request");

        let mut builder = self
            .client
            .post(&url)
            .header("anthropic-version", API_VERSION)
            .json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.header("x-api-key", key);
        }

        let response: MessagesResponseBody = http::send_json(builder).await?;
        self.convert_completion(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use role_core::{GenerationOptions, Message, ProviderErrorKind};

    fn provider() -> AnthropicProvider {
        AnthropicProvider::new(None, None, "claude-test", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_system_prompt_kept_out_of_messages() {
        let history = vec![Message::user("a"), Message::assistant("b")];
        let request = CompletionRequest::new("sys", &history, "c", GenerationOptions::default());
        let provider = provider();

        let body = serde_json::to_value(provider.build_body(&request)).unwrap();

        assert_eq!(body["system"], "sys");
        assert_eq!(body["messages"].as_array().unwrap().len(), 3);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][2]["content"], "c");
    }

    #[test]
    fn test_text_blocks_concatenated() {
        let response: MessagesResponseBody = serde_json::from_value(serde_json::json!({
            "content": [
                {"type": "text", "text": "Hello, "},
                {"type": "tool_use", "id": "t1"},
                {"type": "text", "text": "world"}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 5, "output_tokens": 2}
        }))
        .unwrap();

        let completion = provider().convert_completion(response).unwrap();
        assert_eq!(completion.content, "Hello, world");
        assert_eq!(completion.model, "claude-test");
        assert_eq!(completion.finish_reason, Some(FinishReason::Stop));
        assert_eq!(completion.usage.unwrap().total_tokens, 7);
    }

    #[test]
    fn test_no_text_blocks_is_malformed() {
        let response: MessagesResponseBody =
            serde_json::from_value(serde_json::json!({"content": []})).unwrap();

        let err = provider().convert_completion(response).unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::MalformedResponse);
    }
}
