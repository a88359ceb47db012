//! Role Configuration
//!
//! A role is a system prompt plus a user prompt template with a single
//! `{user_input}` slot. Both are validated on construction and the value is
//! only ever replaced wholesale.

use serde::{Serialize, Serializer};

use crate::error::ValidationError;

/// Substitution point for the raw user text
pub const USER_INPUT_SLOT: &str = "{user_input}";

/// Default system prompt when none is configured
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

/// Default context window (turns)
pub const DEFAULT_CONTEXT_WINDOW: usize = 4000;

/// A user prompt template split at its single slot.
///
/// Rendering is `prefix + input + suffix`, so user text that itself contains
/// `{user_input}` is never expanded again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptTemplate {
    prefix: String,
    suffix: String,
}

impl PromptTemplate {
    /// Parse a template, requiring exactly one slot
    pub fn parse(template: &str) -> Result<Self, ValidationError> {
        if template.matches(USER_INPUT_SLOT).count() != 1 {
            return Err(ValidationError::MissingTemplateSlot);
        }

        let (prefix, suffix) = template
            .split_once(USER_INPUT_SLOT)
            .ok_or(ValidationError::MissingTemplateSlot)?;

        Ok(Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        })
    }

    /// Template that sends the user text unchanged
    pub const fn passthrough() -> Self {
        Self {
            prefix: String::new(),
            suffix: String::new(),
        }
    }

    /// Substitute `input` at the slot
    pub fn render(&self, input: &str) -> String {
        let mut out = String::with_capacity(self.prefix.len() + input.len() + self.suffix.len());
        out.push_str(&self.prefix);
        out.push_str(input);
        out.push_str(&self.suffix);
        out
    }

    pub fn is_passthrough(&self) -> bool {
        self.prefix.is_empty() && self.suffix.is_empty()
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::passthrough()
    }
}

impl std::fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{USER_INPUT_SLOT}{}", self.prefix, self.suffix)
    }
}

impl Serialize for PromptTemplate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Immutable role definition owned by the engine
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RoleConfig {
    system_prompt: String,
    user_prompt_template: PromptTemplate,
    context_window: usize,
}

impl RoleConfig {
    /// Validate and build a role
    pub fn new(
        system_prompt: impl Into<String>,
        user_prompt_template: Option<&str>,
        context_window: usize,
    ) -> Result<Self, ValidationError> {
        let system_prompt = system_prompt.into();
        if system_prompt.trim().is_empty() {
            return Err(ValidationError::EmptySystemPrompt);
        }
        if context_window == 0 {
            return Err(ValidationError::InvalidContextWindow);
        }

        let user_prompt_template = match user_prompt_template {
            Some(template) => PromptTemplate::parse(template)?,
            None => PromptTemplate::passthrough(),
        };

        Ok(Self {
            system_prompt,
            user_prompt_template,
            context_window,
        })
    }

    /// A new role with the same context window
    pub fn with_prompts(
        &self,
        system_prompt: impl Into<String>,
        user_prompt_template: Option<&str>,
    ) -> Result<Self, ValidationError> {
        Self::new(system_prompt, user_prompt_template, self.context_window)
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub const fn user_prompt_template(&self) -> &PromptTemplate {
        &self.user_prompt_template
    }

    pub const fn context_window(&self) -> usize {
        self.context_window
    }

    /// Render the user prompt template around `input`
    pub fn render(&self, input: &str) -> String {
        self.user_prompt_template.render(input)
    }
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            user_prompt_template: PromptTemplate::passthrough(),
            context_window: DEFAULT_CONTEXT_WINDOW,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_and_render() {
        let template = PromptTemplate::parse("Question: {user_input}\nAnswer briefly.").unwrap();
        assert_eq!(template.render("why?"), "Question: why?\nAnswer briefly.");
        assert_eq!(template.to_string(), "Question: {user_input}\nAnswer briefly.");
    }

    #[test]
    fn test_missing_slot_rejected() {
        assert_eq!(
            PromptTemplate::parse("no slot here"),
            Err(ValidationError::MissingTemplateSlot)
        );
    }

    #[test]
    fn test_duplicate_slot_rejected() {
        assert_eq!(
            PromptTemplate::parse("{user_input} and {user_input}"),
            Err(ValidationError::MissingTemplateSlot)
        );
    }

    #[test]
    fn test_slot_in_input_not_expanded() {
        let template = PromptTemplate::parse("<{user_input}>").unwrap();
        assert_eq!(template.render("{user_input}"), "<{user_input}>");
    }

    #[test]
    fn test_default_template_is_passthrough() {
        let role = RoleConfig::new("You are X", None, 10).unwrap();
        assert!(role.user_prompt_template().is_passthrough());
        assert_eq!(role.render("hello"), "hello");
    }

    #[test]
    fn test_role_validation() {
        assert_eq!(
            RoleConfig::new("   ", None, 10),
            Err(ValidationError::EmptySystemPrompt)
        );
        assert_eq!(
            RoleConfig::new("You are X", None, 0),
            Err(ValidationError::InvalidContextWindow)
        );
        assert_eq!(
            RoleConfig::new("You are X", Some("plain"), 10),
            Err(ValidationError::MissingTemplateSlot)
        );
    }

    #[test]
    fn test_with_prompts_keeps_window() {
        let role = RoleConfig::new("A", None, 7).unwrap();
        let next = role.with_prompts("B", Some("> {user_input}")).unwrap();
        assert_eq!(next.context_window(), 7);
        assert_eq!(next.system_prompt(), "B");
    }

    #[test]
    fn test_role_serializes_template_string() {
        let role = RoleConfig::new("A", Some("Q: {user_input}"), 3).unwrap();
        let json = serde_json::to_value(&role).unwrap();
        assert_eq!(json["user_prompt_template"], "Q: {user_input}");
        assert_eq!(json["context_window"], 3);
    }

    proptest! {
        #[test]
        fn prop_render_differs_only_at_slot(
            prefix in "[^{}]{0,12}",
            suffix in "[^{}]{0,12}",
            a in ".{0,16}",
            b in ".{0,16}",
        ) {
            let template = PromptTemplate::parse(&format!("{prefix}{USER_INPUT_SLOT}{suffix}")).unwrap();
            let ra = template.render(&a);
            let rb = template.render(&b);

            prop_assert!(ra.starts_with(&prefix) && ra.ends_with(&suffix));
            prop_assert_eq!(&ra[prefix.len()..ra.len() - suffix.len()], a.as_str());
            prop_assert_eq!(&rb[prefix.len()..rb.len() - suffix.len()], b.as_str());
            prop_assert_eq!(a == b, ra == rb);
        }
    }
}
