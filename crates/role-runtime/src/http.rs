//! Shared HTTP plumbing for the vendor clients.
//!
//! Every reqwest failure and non-success status is turned into a
//! classified [`ProviderError`] here; nothing raw escapes a provider.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use role_core::{ProviderError, Result, RoleError};
use serde::de::DeserializeOwned;

/// Longest slice of an unparseable error body kept in messages
const MAX_BODY_PREVIEW: usize = 200;

pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| RoleError::Config(format!("failed to build HTTP client: {e}")))
}

/// Send a request and decode a JSON success body
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
) -> std::result::Result<T, ProviderError> {
    let response = request.send().await.map_err(classify_transport)?;

    let status = response.status();
    let body = response.text().await.map_err(classify_transport)?;

    if !status.is_success() {
        return Err(ProviderError::from_status(
            status.as_u16(),
            error_message(&body),
        ));
    }

    serde_json::from_str(&body)
        .map_err(|e| ProviderError::malformed(format!("unexpected response body: {e}")))
}

/// Classify a transport-level reqwest failure
pub(crate) fn classify_transport(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::timeout(err.to_string())
    } else if err.is_decode() {
        ProviderError::malformed(err.to_string())
    } else if let Some(status) = err.status() {
        ProviderError::from_status(status.as_u16(), err.to_string())
    } else {
        ProviderError::unknown(err.to_string())
    }
}

/// Pull the vendor's message out of an error body.
///
/// Both vendors use `{"error": {"message": ...}}`; anything else falls back
/// to a preview of the raw body.
pub(crate) fn error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let message = parsed.as_ref().and_then(|value| {
        value["error"]["message"]
            .as_str()
            .or_else(|| value["error"].as_str())
            .or_else(|| value["message"].as_str())
    });

    match message {
        Some(message) => message.to_string(),
        None if body.trim().is_empty() => "empty response body".to_string(),
        None => body.chars().take(MAX_BODY_PREVIEW).collect(),
    }
}
