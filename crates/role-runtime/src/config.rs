//! Startup Configuration
//!
//! LLM backend and default role settings read once from the environment
//! (`LLM_*` and `ROLE_*` variables). Values are validated here so the core
//! only ever sees well-formed inputs.

use std::str::FromStr;
use std::time::Duration;

use role_core::role::{DEFAULT_CONTEXT_WINDOW, DEFAULT_SYSTEM_PROMPT, USER_INPUT_SLOT};
use role_core::{GenerationOptions, RoleConfig, RoleError};
use thiserror::Error;

/// Configuration loading errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} has invalid value {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("Unsupported LLM provider: {0}")]
    UnsupportedProvider(String),

    #[error("{0}")]
    Invalid(String),
}

impl From<ConfigError> for RoleError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Supported backend families
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
}

impl ProviderKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }

    /// Model used when `LLM_MODEL` is unset
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4",
            Self::Anthropic => "claude-3-7-sonnet-20250219",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for LLM providers
#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: ProviderKind,

    /// Sent as bearer token / `x-api-key`; omitted when unset
    pub api_key: Option<String>,

    pub model: String,

    /// Overrides the vendor's default endpoint
    pub base_url: Option<String>,

    /// Defaults for requests that omit them
    pub generation: GenerationOptions,

    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            api_key: None,
            model: ProviderKind::OpenAi.default_model().into(),
            base_url: None,
            generation: GenerationOptions::default(),
            timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    /// Read from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read using an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let provider = match non_empty(lookup("LLM_PROVIDER")) {
            Some(raw) => raw.parse::<ProviderKind>()?,
            None => defaults.provider,
        };

        let generation = GenerationOptions {
            temperature: parse_var(&lookup, "LLM_TEMPERATURE", defaults.generation.temperature)?,
            max_tokens: parse_var(&lookup, "LLM_MAX_TOKENS", defaults.generation.max_tokens)?,
        };
        generation
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("LLM defaults: {e}")))?;

        let timeout_secs = parse_var(&lookup, "LLM_TIMEOUT_SECS", defaults.timeout_secs)?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "LLM_TIMEOUT_SECS".into(),
                value: "0".into(),
            });
        }

        Ok(Self {
            provider,
            api_key: non_empty(lookup("LLM_API_KEY")),
            model: non_empty(lookup("LLM_MODEL"))
                .unwrap_or_else(|| provider.default_model().into()),
            base_url: non_empty(lookup("LLM_BASE_URL")),
            generation,
            timeout_secs,
        })
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Configuration for the default role
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleSettings {
    pub system_prompt: String,
    pub user_prompt_template: String,
    pub context_window: usize,
}

impl Default for RoleSettings {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            user_prompt_template: USER_INPUT_SLOT.into(),
            context_window: DEFAULT_CONTEXT_WINDOW,
        }
    }
}

impl RoleSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            system_prompt: non_empty(lookup("ROLE_SYSTEM_PROMPT")).unwrap_or(defaults.system_prompt),
            user_prompt_template: non_empty(lookup("ROLE_USER_PROMPT_TEMPLATE"))
                .unwrap_or(defaults.user_prompt_template),
            context_window: parse_var(&lookup, "ROLE_CONTEXT_WINDOW", defaults.context_window)?,
        })
    }

    /// Validate into the role the engine starts with
    pub fn to_role_config(&self) -> Result<RoleConfig, ConfigError> {
        RoleConfig::new(
            self.system_prompt.clone(),
            Some(self.user_prompt_template.as_str()),
            self.context_window,
        )
        .map_err(|e| ConfigError::Invalid(format!("default role: {e}")))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parse `key` if set, otherwise return `default`
pub(crate) fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match non_empty(lookup(key)) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}
