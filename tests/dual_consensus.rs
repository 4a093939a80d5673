// tests/dual_consensus.rs
//
// Dual-provider orchestration: attribution stays positional, the secondary
// call runs on its smaller budget, and the consensus line reflects which
// analyses exist.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use threat_triage::analyze::{
    AnalysisContext, AnalysisEngine, CompletionRequest, NarrativeProvider, NarrativeResult,
};
use threat_triage::config::ai::AiConfig;
use threat_triage::content::ContentType;
use threat_triage::error::ProviderError;
use threat_triage::verdict::ThreatLevel;

/// Per-model scripted replies, with request capture for budget assertions.
struct ScriptedProvider {
    replies: HashMap<String, Result<String, ProviderError>>,
    calls: AtomicUsize,
    seen_budgets: std::sync::Mutex<Vec<(String, u32)>>,
}

impl ScriptedProvider {
    fn new(replies: Vec<(&str, Result<&str, ProviderError>)>) -> Self {
        Self {
            replies: replies
                .into_iter()
                .map(|(m, r)| (m.to_string(), r.map(|s| s.to_string())))
                .collect(),
            calls: AtomicUsize::new(0),
            seen_budgets: std::sync::Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NarrativeProvider for ScriptedProvider {
    async fn complete(&self, req: &CompletionRequest) -> NarrativeResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_budgets
            .lock()
            .unwrap()
            .push((req.model.clone(), req.max_tokens));
        match self.replies.get(&req.model) {
            Some(Ok(text)) => NarrativeResult::completed(&req.model, text.clone(), None),
            Some(Err(e)) => NarrativeResult::failed(&req.model, e.clone()),
            None => NarrativeResult::failed(
                &req.model,
                ProviderError::Call("unscripted model".to_string()),
            ),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

fn cfg() -> AiConfig {
    AiConfig {
        api_key: "test-key".to_string(),
        primary_model: "alpha".to_string(),
        secondary_model: "beta".to_string(),
        ..AiConfig::default()
    }
}

fn ctx() -> AnalysisContext {
    AnalysisContext::new(
        "http://secure-login.example.tld",
        ContentType::Url,
        ThreatLevel::Malicious,
        88.0,
    )
}

#[tokio::test]
async fn both_succeeding_yields_templated_consensus() {
    let stub = Arc::new(ScriptedProvider::new(vec![
        ("alpha", Ok("primary narrative")),
        ("beta", Ok("secondary narrative")),
    ]));
    let engine = AnalysisEngine::with_provider(cfg(), stub.clone());

    let out = engine.analyze_dual(&ctx()).await;

    assert_eq!(stub.calls(), 2);
    assert!(out.primary.success && out.secondary.success);
    assert_eq!(out.primary.provider_id, "alpha");
    assert_eq!(out.secondary.provider_id, "beta");
    assert!(out.consensus.contains("alpha"));
    assert!(out.consensus.contains("beta"));
}

#[tokio::test]
async fn primary_only_success_quotes_primary() {
    let stub = Arc::new(ScriptedProvider::new(vec![
        ("alpha", Ok("the primary model's detailed take on this URL")),
        ("beta", Err(ProviderError::Call("status 429".to_string()))),
    ]));
    let engine = AnalysisEngine::with_provider(cfg(), stub);

    let out = engine.analyze_dual(&ctx()).await;

    assert!(out.primary.success);
    assert!(!out.secondary.success);
    assert!(out.consensus.starts_with("Based on primary analysis (alpha):"));
    assert!(out.consensus.contains("detailed take"));
}

#[tokio::test]
async fn both_failing_names_the_double_failure() {
    let stub = Arc::new(ScriptedProvider::new(vec![
        ("alpha", Err(ProviderError::Timeout(60))),
        ("beta", Err(ProviderError::Call("boom".to_string()))),
    ]));
    let engine = AnalysisEngine::with_provider(cfg(), stub);

    let out = engine.analyze_dual(&ctx()).await;

    assert!(!out.primary.success && !out.secondary.success);
    assert_eq!(out.consensus, "Both narrative analyses failed");
}

#[tokio::test]
async fn secondary_runs_on_the_smaller_budget() {
    let stub = Arc::new(ScriptedProvider::new(vec![
        ("alpha", Ok("a")),
        ("beta", Ok("b")),
    ]));
    let engine = AnalysisEngine::with_provider(cfg(), stub.clone());

    engine.analyze_dual(&ctx()).await;

    let budgets = stub.seen_budgets.lock().unwrap().clone();
    let by_model: HashMap<_, _> = budgets.into_iter().collect();
    assert_eq!(by_model["alpha"], 2000);
    assert_eq!(by_model["beta"], 1000);
}

#[tokio::test]
async fn unconfigured_dual_short_circuits_both_results() {
    let stub = Arc::new(
        threat_triage::analyze::MockProvider::replying("unused").unconfigured(),
    );
    let engine = AnalysisEngine::with_provider(cfg(), stub.clone());

    let out = engine.analyze_dual(&ctx()).await;

    assert_eq!(stub.calls(), 0);
    assert_eq!(out.primary.error, Some(ProviderError::Unavailable));
    assert_eq!(out.secondary.error, Some(ProviderError::Unavailable));
    assert!(out.consensus.contains("unavailable") || out.consensus.contains("not configured"));
}
