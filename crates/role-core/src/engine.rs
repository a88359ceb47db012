//! Role Engine
//!
//! Owns the active [`RoleConfig`] and the [`ConversationHistory`] and
//! implements the three operations the tool layer dispatches to:
//! `generate`, `chat` and `update_role`.
//!
//! The engine has no internal locking. Callers must not issue overlapping
//! calls against one instance; the server serializes them behind a mutex.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{ProviderError, Result, ValidationError};
use crate::message::{ConversationHistory, Message, Role};
use crate::provider::{Completion, CompletionRequest, GenerationOptions, LlmProvider, ProviderInfo};
use crate::role::RoleConfig;

/// Default timeout for a single provider call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Engine configuration
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Sampling defaults used when a request omits them
    pub generation: GenerationOptions,

    /// Upper bound on one provider call
    pub request_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            generation: GenerationOptions::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Single-shot generation request
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    #[must_use]
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// The role engine
pub struct RoleEngine {
    provider: Arc<dyn LlmProvider>,
    role: RoleConfig,
    history: ConversationHistory,
    config: EngineConfig,
}

impl RoleEngine {
    /// Create a new engine with an empty history sized by the role's window
    pub fn new(provider: Arc<dyn LlmProvider>, role: RoleConfig, config: EngineConfig) -> Self {
        let history = ConversationHistory::new(role.context_window());
        Self {
            provider,
            role,
            history,
            config,
        }
    }

    /// Create with default engine configuration
    pub fn with_defaults(provider: Arc<dyn LlmProvider>, role: RoleConfig) -> Self {
        Self::new(provider, role, EngineConfig::default())
    }

    /// Single-shot generation under the current role. Never touches history.
    pub async fn generate(&self, request: GenerationRequest) -> Result<String> {
        if request.prompt.trim().is_empty() {
            return Err(ValidationError::EmptyPrompt.into());
        }

        let options = self
            .config
            .generation
            .with_overrides(request.temperature, request.max_tokens);
        options.validate()?;

        let user_content = self.role.render(&request.prompt);
        let completion = self
            .call_provider(&CompletionRequest::new(
                self.role.system_prompt(),
                &[],
                &user_content,
                options,
            ))
            .await?;

        Ok(completion.content)
    }

    /// One conversational turn.
    ///
    /// With `reset_conversation` the turn is sent without prior context and
    /// the history is cleared. History is only mutated after the provider
    /// succeeds, so a failed call leaves it exactly as it was.
    pub async fn chat(&mut self, message: &str, reset_conversation: bool) -> Result<String> {
        if message.trim().is_empty() {
            return Err(ValidationError::EmptyPrompt.into());
        }

        let options = self.config.generation;
        options.validate()?;

        let context: Vec<Message> = if reset_conversation {
            Vec::new()
        } else {
            self.history.snapshot()
        };
        let user_content = self.role.render(message);

        tracing::debug!(
            history_len = context.len(),
            history_tokens = self.history.estimate_tokens(),
            reset = reset_conversation,
            "Sending chat turn"
        );

        let completion = self
            .call_provider(&CompletionRequest::new(
                self.role.system_prompt(),
                &context,
                &user_content,
                options,
            ))
            .await?;

        if reset_conversation {
            self.history.reset();
        }
        self.history.append(Role::User, user_content);
        self.history.append(Role::Assistant, completion.content.clone());

        Ok(completion.content)
    }

    /// Replace the role atomically. History is kept.
    ///
    /// On validation failure the previous role stays in effect.
    pub fn update_role(
        &mut self,
        system_prompt: &str,
        user_prompt_template: Option<&str>,
    ) -> Result<&RoleConfig> {
        let role = self.role.with_prompts(system_prompt, user_prompt_template)?;
        tracing::info!(
            history_len = self.history.len(),
            passthrough = role.user_prompt_template().is_passthrough(),
            "Role updated"
        );
        self.role = role;
        Ok(&self.role)
    }

    pub const fn role(&self) -> &RoleConfig {
        &self.role
    }

    pub const fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn provider_info(&self) -> ProviderInfo {
        self.provider.info()
    }

    /// Call the provider under the configured timeout
    async fn call_provider(&self, request: &CompletionRequest<'_>) -> Result<Completion> {
        let timeout = self.config.request_timeout;

        let completion = match tokio::time::timeout(timeout, self.provider.complete(request)).await {
            Ok(Ok(completion)) => completion,
            Ok(Err(e)) => {
                tracing::warn!(kind = %e.kind, "Provider call failed: {}", e.message);
                return Err(e.into());
            }
            Err(_) => {
                tracing::warn!(timeout_secs = timeout.as_secs(), "Provider call timed out");
                return Err(ProviderError::timeout(format!(
                    "no response within {}s",
                    timeout.as_secs_f32()
                ))
                .into());
            }
        };

        if let Some(usage) = completion.usage {
            tracing::debug!(
                model = %completion.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Completion received"
            );
        }

        Ok(completion)
    }
}

/// Builder for the role engine
pub struct RoleEngineBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    role: RoleConfig,
    config: EngineConfig,
}

impl Default for RoleEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RoleEngineBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            role: RoleConfig::default(),
            config: EngineConfig::default(),
        }
    }

    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn role(mut self, role: RoleConfig) -> Self {
        self.role = role;
        self
    }

    #[must_use]
    pub fn generation(mut self, generation: GenerationOptions) -> Self {
        self.config.generation = generation;
        self
    }

    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<RoleEngine> {
        let provider = self
            .provider
            .ok_or_else(|| crate::error::RoleError::Config("Provider is required".into()))?;
        self.config.generation.validate()?;

        Ok(RoleEngine::new(provider, self.role, self.config))
    }
}
