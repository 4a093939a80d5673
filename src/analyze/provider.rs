// src/analyze/provider.rs
//! Narrative provider abstraction + the OpenRouter-backed implementation.
//!
//! Providers fail softly: every fault — missing credential, transport error,
//! timeout, empty completion — is folded into a `NarrativeResult` value.
//! Nothing here propagates an error to the caller, and no retries are made;
//! one failure is terminal for that call.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ProviderError;

/// Public OpenRouter endpoint (OpenAI-compatible chat completions).
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Request budget. Expiry is a soft failure like any other transport fault.
pub const REQUEST_TIMEOUT_SECS: u64 = 60;
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Attribution headers sent with each call.
const ATTRIBUTION_REFERER: &str = "https://threat-triage.local";
const ATTRIBUTION_TITLE: &str = "threat-triage security analyzer";

/// One bounded completion call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Outcome of a single provider call. `provider_id` names the model that
/// produced (or failed to produce) the text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NarrativeResult {
    pub success: bool,
    pub text: String,
    pub provider_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProviderError>,
}

impl NarrativeResult {
    pub fn completed(model: &str, text: String, tokens_used: Option<u32>) -> Self {
        Self {
            success: true,
            text,
            provider_id: model.to_string(),
            tokens_used,
            error: None,
        }
    }

    /// Failure as a value, with a human-readable description in `text` so
    /// the UI always has something to show.
    pub fn failed(model: &str, error: ProviderError) -> Self {
        let text = match &error {
            ProviderError::Unavailable => {
                "Narrative analysis unavailable - API key not configured. \
                 Using classifier results only."
                    .to_string()
            }
            other => format!("Narrative analysis failed: {other}"),
        };
        Self {
            success: false,
            text,
            provider_id: model.to_string(),
            tokens_used: None,
            error: Some(error),
        }
    }
}

/// Object-safe provider seam. Implementations must uphold the soft-fail
/// contract: `complete` always returns a value.
#[async_trait]
pub trait NarrativeProvider: Send + Sync {
    async fn complete(&self, req: &CompletionRequest) -> NarrativeResult;

    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;

    /// Whether a credential is present and calls will be attempted.
    fn is_configured(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// OpenRouter (OpenAI-compatible chat completions)
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: u32,
}

pub struct OpenRouterProvider {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenRouterProvider {
    pub fn new(api_key: String, base_url: Option<&str>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("threat-triage/0.1")
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key,
            base_url: base_url.unwrap_or(OPENROUTER_BASE_URL).to_string(),
        }
    }
}

#[async_trait]
impl NarrativeProvider for OpenRouterProvider {
    async fn complete(&self, req: &CompletionRequest) -> NarrativeResult {
        if self.api_key.is_empty() {
            return NarrativeResult::failed(&req.model, ProviderError::Unavailable);
        }

        let body = ChatRequest {
            model: &req.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &req.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &req.user_prompt,
                },
            ],
            max_tokens: req.max_tokens,
            temperature: req.temperature,
        };

        let started = Instant::now();
        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", ATTRIBUTION_REFERER)
            .header("X-Title", ATTRIBUTION_TITLE)
            .json(&body)
            .send()
            .await;

        let resp = match resp {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                warn!(model = %req.model, "narrative call timed out");
                return NarrativeResult::failed(
                    &req.model,
                    ProviderError::Timeout(REQUEST_TIMEOUT_SECS),
                );
            }
            Err(e) => {
                warn!(model = %req.model, error = %e, "narrative call failed");
                return NarrativeResult::failed(&req.model, ProviderError::Call(e.to_string()));
            }
        };

        if !resp.status().is_success() {
            let status = resp.status();
            warn!(model = %req.model, %status, "narrative provider returned error status");
            return NarrativeResult::failed(
                &req.model,
                ProviderError::Call(format!("status {status}")),
            );
        }

        let parsed: ChatResponse = match resp.json().await {
            Ok(p) => p,
            Err(e) => {
                return NarrativeResult::failed(
                    &req.model,
                    ProviderError::Call(format!("malformed response: {e}")),
                )
            }
        };

        let text = parsed
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return NarrativeResult::failed(
                &req.model,
                ProviderError::Call("empty completion".to_string()),
            );
        }

        info!(
            model = %req.model,
            latency_ms = started.elapsed().as_millis() as u64,
            "narrative call ok"
        );
        NarrativeResult::completed(&req.model, text, parsed.usage.map(|u| u.total_tokens))
    }

    fn name(&self) -> &'static str {
        "openrouter"
    }
}

// ---------------------------------------------------------------------------
// Disabled + mock providers
// ---------------------------------------------------------------------------

/// Used when no credential is configured. Short-circuits to the fixed
/// "unavailable" result without any network activity.
pub struct DisabledProvider;

#[async_trait]
impl NarrativeProvider for DisabledProvider {
    async fn complete(&self, req: &CompletionRequest) -> NarrativeResult {
        NarrativeResult::failed(&req.model, ProviderError::Unavailable)
    }

    fn name(&self) -> &'static str {
        "disabled"
    }

    fn is_configured(&self) -> bool {
        false
    }
}

/// Deterministic provider for tests. Counts calls so tests can assert that
/// a path did (or did not) reach the provider.
pub struct MockProvider {
    reply: Result<String, ProviderError>,
    configured: bool,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            reply: Ok(text.into()),
            configured: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            reply: Err(error),
            configured: true,
            calls: AtomicUsize::new(0),
        }
    }

    /// Report no credential, like a real provider without a key. Lets tests
    /// assert the no-credential path never reaches `complete`.
    pub fn unconfigured(mut self) -> Self {
        self.configured = false;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NarrativeProvider for MockProvider {
    async fn complete(&self, req: &CompletionRequest) -> NarrativeResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Ok(text) => NarrativeResult::completed(&req.model, text.clone(), Some(42)),
            Err(e) => NarrativeResult::failed(&req.model, e.clone()),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req() -> CompletionRequest {
        CompletionRequest {
            model: "test/model".to_string(),
            system_prompt: "sys".to_string(),
            user_prompt: "user".to_string(),
            max_tokens: 100,
            temperature: 0.4,
        }
    }

    #[tokio::test]
    async fn disabled_provider_returns_unavailable_value() {
        let p = DisabledProvider;
        let r = p.complete(&req()).await;
        assert!(!r.success);
        assert_eq!(r.error, Some(ProviderError::Unavailable));
        assert!(r.text.contains("not configured"));
        assert_eq!(r.provider_id, "test/model");
    }

    #[tokio::test]
    async fn mock_provider_counts_calls() {
        let p = MockProvider::replying("narrative text");
        assert_eq!(p.calls(), 0);
        let r = p.complete(&req()).await;
        assert_eq!(p.calls(), 1);
        assert!(r.success);
        assert_eq!(r.text, "narrative text");
        assert_eq!(r.tokens_used, Some(42));
    }

    #[tokio::test]
    async fn empty_credential_short_circuits_openrouter() {
        let p = OpenRouterProvider::new(String::new(), None);
        let r = p.complete(&req()).await;
        assert_eq!(r.error, Some(ProviderError::Unavailable));
    }

    #[test]
    fn failure_text_describes_the_error() {
        let r = NarrativeResult::failed("m", ProviderError::Call("status 500".to_string()));
        assert!(r.text.contains("status 500"));
        assert!(!r.success);
    }
}
