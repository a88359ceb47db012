//! Conversation Messages
//!
//! Standard message format and the bounded conversation history kept by the
//! role engine.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a message sender
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompt/instructions
    System,
    /// User input
    User,
    /// Assistant (LLM) response
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single message in a conversation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Text content
    pub content: String,

    /// Timestamp
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a new message
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Estimate token count (rough approximation)
    pub fn estimate_tokens(&self) -> u32 {
        // ~4 characters per token is a rough estimate
        u32::try_from(self.content.len() / 4).unwrap_or(u32::MAX).saturating_add(4)
    }
}

/// Ordered, window-bounded conversation history (oldest first).
///
/// The window counts turns: a user message plus the replies that follow it.
/// Eviction always drops a whole turn from the front, so the retained
/// history never opens with an orphaned assistant message. The turn being
/// appended is never evicted.
#[derive(Clone, Debug)]
pub struct ConversationHistory {
    messages: VecDeque<Message>,
    window: usize,
}

impl ConversationHistory {
    /// Create an empty history. A zero window is raised to one so the
    /// in-flight turn can always be retained.
    pub fn new(window: usize) -> Self {
        Self {
            messages: VecDeque::new(),
            window: window.max(1),
        }
    }

    /// Add a message, then evict whole turns from the front until within
    /// the window
    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push_back(Message::new(role, content));

        let mut evicted = 0usize;
        while self.turn_count() > self.window {
            evicted += self.evict_oldest_turn();
        }

        if evicted > 0 {
            tracing::debug!(evicted, window = self.window, "Evicted oldest history turns");
        }
    }

    /// Drop the front message and any replies belonging to the same turn
    fn evict_oldest_turn(&mut self) -> usize {
        let mut evicted = 0;
        if self.messages.pop_front().is_some() {
            evicted += 1;
        }
        while self.messages.front().is_some_and(|m| m.role != Role::User) {
            self.messages.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// Number of turns currently held. Replies with no preceding user
    /// message count as one turn.
    pub fn turn_count(&self) -> usize {
        let users = self.messages.iter().filter(|m| m.role == Role::User).count();
        let leading_reply = self.messages.front().is_some_and(|m| m.role != Role::User);
        users + usize::from(leading_reply)
    }

    /// Clear all messages
    pub fn reset(&mut self) {
        self.messages.clear();
    }

    /// Owned copy of the messages, oldest first
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// Maximum number of retained turns
    pub const fn window(&self) -> usize {
        self.window
    }

    /// Estimate total tokens in the history
    pub fn estimate_tokens(&self) -> u32 {
        self.messages
            .iter()
            .map(Message::estimate_tokens)
            .fold(0, u32::saturating_add)
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn contents(history: &ConversationHistory) -> Vec<String> {
        history.iter().map(|m| m.content.clone()).collect()
    }

    #[test]
    fn test_message_creation() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }

    fn chat(history: &mut ConversationHistory, turns: &[&str]) {
        for turn in turns {
            history.append(Role::User, *turn);
            history.append(Role::Assistant, format!("re:{turn}"));
        }
    }

    #[test]
    fn test_append_within_window() {
        let mut history = ConversationHistory::new(4);
        history.append(Role::User, "Hi");
        history.append(Role::Assistant, "Hello!");

        assert_eq!(history.len(), 2);
        assert_eq!(history.turn_count(), 1);
    }

    #[test]
    fn test_eviction_drops_whole_turns() {
        let mut history = ConversationHistory::new(3);
        chat(&mut history, &["a", "b", "c", "d"]);

        assert_eq!(contents(&history), vec!["b", "re:b", "c", "re:c", "d", "re:d"]);
        assert_eq!(history.turn_count(), 3);
    }

    #[test]
    fn test_odd_window_never_opens_with_reply() {
        let mut history = ConversationHistory::new(3);
        chat(&mut history, &["a", "b", "c"]);
        history.append(Role::User, "d");

        assert_eq!(history.iter().next().unwrap().role, Role::User);
        assert_eq!(contents(&history), vec!["b", "re:b", "c", "re:c", "d"]);
    }

    #[test]
    fn test_window_of_one_keeps_latest_turn() {
        let mut history = ConversationHistory::new(1);
        chat(&mut history, &["first", "second"]);

        assert_eq!(contents(&history), vec!["second", "re:second"]);
    }

    #[test]
    fn test_multi_reply_turn_evicted_together() {
        let mut history = ConversationHistory::new(1);
        history.append(Role::User, "q1");
        history.append(Role::Assistant, "part 1");
        history.append(Role::Assistant, "part 2");
        history.append(Role::User, "q2");

        assert_eq!(contents(&history), vec!["q2"]);
    }

    #[test]
    fn test_zero_window_clamped() {
        let mut history = ConversationHistory::new(0);
        history.append(Role::User, "kept");
        assert_eq!(history.window(), 1);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut history = ConversationHistory::new(5);
        history.append(Role::User, "Hi");
        history.reset();
        assert!(history.is_empty());
        history.reset();
        assert!(history.is_empty());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut history = ConversationHistory::new(5);
        history.append(Role::User, "Hi");

        let mut snapshot = history.snapshot();
        snapshot.push(Message::assistant("injected"));
        snapshot[0].content = "changed".into();

        assert_eq!(contents(&history), vec!["Hi"]);
    }

    proptest! {
        #[test]
        fn prop_retains_most_recent_turns_in_order(
            window in 1usize..8,
            turns in proptest::collection::vec("[a-z]{1,6}", 0..30),
        ) {
            let mut history = ConversationHistory::new(window);
            for turn in &turns {
                history.append(Role::User, turn.clone());
                history.append(Role::Assistant, format!("re:{turn}"));
                prop_assert!(history.turn_count() <= window);
                prop_assert_eq!(history.iter().next().map(|m| m.role), Some(Role::User));
            }

            let expected: Vec<String> = turns
                .iter()
                .skip(turns.len().saturating_sub(window))
                .flat_map(|t| [t.clone(), format!("re:{t}")])
                .collect();
            prop_assert_eq!(contents(&history), expected);
        }
    }
}
