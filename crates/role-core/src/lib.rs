//! # role-core
//!
//! Provider-agnostic LLM role engine: role templating, bounded conversation
//! history and the tool surface dispatched to by the protocol layer.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       RoleEngine                            │
//! │  ┌─────────────┐  ┌──────────────────┐  ┌────────────────┐  │
//! │  │ RoleConfig  │  │ Conversation     │  │  LlmProvider   │  │
//! │  │ (template)  │──│ History (window) │──│  (Strategy)    │  │
//! │  └─────────────┘  └──────────────────┘  └────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//!          ▲
//!          │ generate_text / chat / update_role
//!     tool::dispatch (+ advisory family via Toolset)
//! ```
//!
//! The `LlmProvider` trait enables swapping between OpenAI-style,
//! Anthropic-style or any other backend without changing engine logic.

pub mod advisory;
pub mod engine;
pub mod error;
pub mod message;
pub mod provider;
pub mod role;
pub mod tool;

#[cfg(any(test, feature = "test-util"))]
pub mod test_support;

pub use engine::{EngineConfig, GenerationRequest, RoleEngine, RoleEngineBuilder};
pub use error::{ProviderError, ProviderErrorKind, Result, RoleError, ValidationError};
pub use message::{ConversationHistory, Message, Role};
pub use provider::{Completion, CompletionRequest, GenerationOptions, LlmProvider, ProviderInfo};
pub use role::{PromptTemplate, RoleConfig};
pub use tool::{ToolCall, ToolOutput, ToolSchema, Toolset};
