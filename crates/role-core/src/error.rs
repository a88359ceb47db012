//! Error Types

use thiserror::Error;

/// Result type alias for role operations
pub type Result<T> = std::result::Result<T, RoleError>;

/// Input rejected before any provider call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("prompt must not be empty")]
    EmptyPrompt,

    #[error("system prompt must not be empty")]
    EmptySystemPrompt,

    /// Template has zero or more than one `{user_input}` slot
    #[error("user prompt template must contain exactly one {{user_input}} slot")]
    MissingTemplateSlot,

    #[error("temperature {0} is outside [0, 1]")]
    TemperatureOutOfRange(f32),

    #[error("max_tokens must be a positive integer")]
    InvalidMaxTokens,

    #[error("context window must be greater than zero")]
    InvalidContextWindow,
}

impl ValidationError {
    /// Stable code used in structured error strings
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EmptyPrompt => "EMPTY_PROMPT",
            Self::EmptySystemPrompt => "EMPTY_SYSTEM_PROMPT",
            Self::MissingTemplateSlot => "MISSING_TEMPLATE_SLOT",
            Self::TemperatureOutOfRange(_) => "TEMPERATURE_OUT_OF_RANGE",
            Self::InvalidMaxTokens => "INVALID_MAX_TOKENS",
            Self::InvalidContextWindow => "INVALID_CONTEXT_WINDOW",
        }
    }
}

/// Classification of a failed provider call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Credential rejected (401/403)
    Auth,
    /// Throttled or overloaded
    RateLimit,
    /// Request did not complete within the configured timeout
    Timeout,
    /// Backend answered but the body was not the expected shape
    MalformedResponse,
    Unknown,
}

impl ProviderErrorKind {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Auth => "AUTH",
            Self::RateLimit => "RATE_LIMIT",
            Self::Timeout => "TIMEOUT",
            Self::MalformedResponse => "MALFORMED_RESPONSE",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Map an HTTP status from a backend to an error kind
    pub const fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Auth,
            // 529 is Anthropic's "overloaded"
            429 | 529 => Self::RateLimit,
            408 | 504 => Self::Timeout,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Error raised at the provider boundary. Transport errors never cross it raw.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Auth, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::RateLimit, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Timeout, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::MalformedResponse, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unknown, message)
    }

    /// Build from a non-success HTTP status and the vendor's error message
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self::new(
            ProviderErrorKind::from_status(status),
            format!("HTTP {status}: {}", message.into()),
        )
    }
}

/// Role engine error types
#[derive(Error, Debug)]
pub enum RoleError {
    #[error("ValidationError{{{code}}}: {0}", code = .0.code())]
    Validation(#[from] ValidationError),

    #[error("ProviderError{{{}}}: {}", .0.kind.code(), .0.message)]
    Provider(#[from] ProviderError),

    /// Tool not found in the tool surface
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool arguments missing or of the wrong type
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RoleError {
    /// Check if error is retryable by the caller
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Provider(ProviderError {
                kind: ProviderErrorKind::RateLimit | ProviderErrorKind::Timeout,
                ..
            })
        )
    }

    /// Short machine-readable code
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.code(),
            Self::Provider(e) => e.kind.code(),
            Self::ToolNotFound(_) => "TOOL_NOT_FOUND",
            Self::InvalidArguments(_) => "INVALID_ARGUMENTS",
            Self::Config(_) => "CONFIG",
        }
    }

    /// The provider error kind, if this came from a provider
    pub const fn provider_kind(&self) -> Option<ProviderErrorKind> {
        match self {
            Self::Provider(e) => Some(e.kind),
            _ => None,
        }
    }
}
