//! Scriptable in-memory provider for tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::message::Message;
use crate::provider::{Completion, CompletionRequest, GenerationOptions, LlmProvider, ProviderInfo};

/// Owned copy of a request seen by [`StubProvider`]
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub system_prompt: String,
    pub history: Vec<Message>,
    pub user_content: String,
    pub options: GenerationOptions,
}

impl RecordedRequest {
    pub fn history_contents(&self) -> Vec<String> {
        self.history.iter().map(|m| m.content.clone()).collect()
    }
}

/// Replies `"echo: <user_content>"` unless a failure is queued
pub struct StubProvider {
    requests: Mutex<Vec<RecordedRequest>>,
    failures: Mutex<VecDeque<ProviderError>>,
    delay: Option<Duration>,
}

impl StubProvider {
    pub fn echo() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            failures: Mutex::new(VecDeque::new()),
            delay: None,
        }
    }

    /// Sleep before answering (use with a paused tokio clock)
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make the next call fail with `error`
    pub fn fail_next(&self, error: ProviderError) {
        self.failures.lock().unwrap().push_back(error);
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LlmProvider for StubProvider {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "stub".into(),
            model: "stub-model".into(),
        }
    }

    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<Completion, ProviderError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            system_prompt: request.system_prompt.to_string(),
            history: request.history.to_vec(),
            user_content: request.user_content.to_string(),
            options: request.options,
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.failures.lock().unwrap().pop_front();
        match failure {
            Some(error) => Err(error),
            None => Ok(Completion::text(
                format!("echo: {}", request.user_content),
                "stub-model",
            )),
        }
    }
}
