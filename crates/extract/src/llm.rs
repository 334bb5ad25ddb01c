use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("generation request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("generation service returned {status}: {body}")]
    Service {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("malformed generation response: {0}")]
    MalformedResponse(String),
    #[error("{0}")]
    Other(String),
}

/// Abstraction over a generative-text service.
/// The call is fallible and latency-bound only by the remote side;
/// callers own all retry policy.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

// ── Gemini backend ────────────────────────────────────────────────────────────

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Client for the Gemini `generateContent` REST endpoint.
pub struct GeminiGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiGenerator {
    pub fn new(model: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Point the client at a different host; tests use a local stub.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        });

        let response = self
            .client
            .post(self.url())
            .json(&body)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerateError::Service { status, body });
        }

        let reply: Value = response.json().await?;
        reply
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                GenerateError::MalformedResponse("no candidate text in reply".to_string())
            })
    }
}

// ── Mock backend (scripted, used for tests) ───────────────────────────────────

/// Replays a scripted sequence of replies and counts invocations, so retry
/// behavior can be asserted without a network.
pub struct MockGenerator {
    replies: Mutex<VecDeque<Result<String, GenerateError>>>,
    calls: Arc<AtomicUsize>,
}

impl MockGenerator {
    pub fn new(replies: impl IntoIterator<Item = Result<String, GenerateError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A generator that fails every call.
    pub fn always_failing() -> Self {
        Self::new([])
    }

    /// Handle onto the invocation counter; survives moving the generator
    /// into a pipeline.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .expect("mock generator lock poisoned")
            .pop_front()
            .unwrap_or_else(|| {
                Err(GenerateError::Other(
                    "mock generator has no scripted reply".to_string(),
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_replays_in_order_then_fails() {
        let gen = MockGenerator::new([Ok("first".to_string()), Ok("second".to_string())]);
        assert_eq!(gen.generate("p").await.unwrap(), "first");
        assert_eq!(gen.generate("p").await.unwrap(), "second");
        assert!(gen.generate("p").await.is_err());
    }

    #[tokio::test]
    async fn mock_counts_calls() {
        let gen = MockGenerator::always_failing();
        let counter = gen.call_counter();
        let _ = gen.generate("p").await;
        let _ = gen.generate("p").await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn gemini_url_shape() {
        let gen = GeminiGenerator::new("gemini-1.5-flash-001", "k3y")
            .with_base_url("http://localhost:9999/");
        assert_eq!(
            gen.url(),
            "http://localhost:9999/v1beta/models/gemini-1.5-flash-001:generateContent?key=k3y"
        );
    }
}
