//! LLM Provider Strategy Pattern
//!
//! Defines a common interface for all LLM backends (OpenAI-style,
//! Anthropic-style, ...) so the role engine can work with any of them
//! without code changes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use role_core::provider::{CompletionRequest, GenerationOptions, LlmProvider};
//!
//! let request = CompletionRequest::new("You are X", &history, "hi", GenerationOptions::default());
//! let completion = provider.complete(&request).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, ValidationError};
use crate::message::{Message, Role};

/// Sampling options sent with every completion
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Temperature for sampling (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

const fn default_temperature() -> f32 { 0.7 }
const fn default_max_tokens() -> u32 { 1000 }

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl GenerationOptions {
    /// Check temperature is within [0, 1] and max_tokens is positive
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(ValidationError::TemperatureOutOfRange(self.temperature));
        }
        if self.max_tokens == 0 {
            return Err(ValidationError::InvalidMaxTokens);
        }
        Ok(())
    }

    /// Apply per-request overrides on top of these defaults
    pub fn with_overrides(self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        Self {
            temperature: temperature.unwrap_or(self.temperature),
            max_tokens: max_tokens.unwrap_or(self.max_tokens),
        }
    }
}

/// Everything a provider needs for one completion.
///
/// Providers must send the system prompt first, then `history` in order,
/// then `user_content`, without reordering or dropping anything.
#[derive(Clone, Copy, Debug)]
pub struct CompletionRequest<'a> {
    pub system_prompt: &'a str,
    pub history: &'a [Message],
    pub user_content: &'a str,
    pub options: GenerationOptions,
}

impl<'a> CompletionRequest<'a> {
    pub const fn new(
        system_prompt: &'a str,
        history: &'a [Message],
        user_content: &'a str,
        options: GenerationOptions,
    ) -> Self {
        Self {
            system_prompt,
            history,
            user_content,
            options,
        }
    }

    /// History followed by the new user turn, without the system prompt
    pub fn turns(&self) -> impl Iterator<Item = (Role, &'a str)> + 'a {
        let user_content = self.user_content;
        self.history
            .iter()
            .map(|m| (m.role, m.content.as_str()))
            .chain(std::iter::once((Role::User, user_content)))
    }
}

/// Response from an LLM completion
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Completion {
    /// The generated text
    pub content: String,

    /// Model that generated this response
    pub model: String,

    /// Token usage statistics (if available)
    pub usage: Option<TokenUsage>,

    /// Finish reason
    pub finish_reason: Option<FinishReason>,
}

impl Completion {
    pub fn text(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: model.into(),
            usage: None,
            finish_reason: Some(FinishReason::Stop),
        }
    }
}

/// Token usage statistics
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub const fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// Reason for completion finishing
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Other(String),
}

impl FinishReason {
    /// Normalize a vendor finish/stop reason
    pub fn from_vendor(reason: &str) -> Self {
        match reason {
            "stop" | "end_turn" | "stop_sequence" => Self::Stop,
            "length" | "max_tokens" => Self::Length,
            "content_filter" | "refusal" => Self::ContentFilter,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Provider metadata
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Provider name (e.g., "openai", "anthropic")
    pub name: String,

    /// Model identifier sent with every request
    pub model: String,
}

/// Strategy trait for LLM providers
///
/// Implement this trait to add support for new LLM backends.
/// The engine works exclusively through this interface.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get provider information
    fn info(&self) -> ProviderInfo;

    /// Generate a completion for the system prompt, history and user turn
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<Completion, ProviderError>;
}
