//! OpenAI-style LLM Provider
//!
//! Implementation of `LlmProvider` for any backend exposing the
//! `/chat/completions` endpoint.

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
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI-style chat completions provider
pub struct OpenAiProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl OpenAiProvider {
    /// Create a provider for `model` at `base_url` (or the OpenAI default)
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
            tracing::warn!(base_url = %base_url, "No API key configured for OpenAI-style provider");
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

    /// Translate a completion request to the wire body
    fn build_body<'a>(&'a self, request: &CompletionRequest<'a>) -> ChatRequestBody<'a> {
        let messages = std::iter::once(WireMessage {
            role: Role::System,
            content: request.system_prompt,
        })
        .chain(request.turns().map(|(role, content)| WireMessage { role, content }))
        .collect();

        ChatRequestBody {
            model: &self.model,
            messages,
            temperature: request.options.temperature,
            max_tokens: request.options.max_tokens,
        }
    }

    /// Convert the wire response to a completion
    fn convert_completion(
        &self,
        response: ChatResponseBody,
    ) -> std::result::Result<Completion, ProviderError> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::malformed("response has no choices"))?;

        let content = choice
            .message
            .content
            .ok_or_else(|| ProviderError::malformed("first choice has no text content"))?;

        Ok(Completion {
            content,
            model: response.model.unwrap_or_else(|| self.model.clone()),
            usage: response
                .usage
                .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens)),
            finish_reason: choice.finish_reason.as_deref().map(FinishReason::from_vendor),
        })
    }
}

#[derive(Serialize)]
struct ChatRequestBody<'a> {
    model: &'a str,
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
struct ChatResponseBody {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<UsageBody>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct UsageBody {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "openai".into(),
            model: self.model.clone(),
        }
    }

    async fn complete(
        &self,
        request: &CompletionRequest<'_>,
    ) -> std::result::Result<Completion, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_body(request);

        tracing::debug!(model = %self.model, url = %url, msg_count = body.messages.len(), "Sending chat completion request");

        let mut builder = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response: ChatResponseBody = http::send_json(builder).await?;
        self.convert_completion(response)
    }
}
