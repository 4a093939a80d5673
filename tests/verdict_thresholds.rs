// tests/verdict_thresholds.rs
//
// Boundary properties of the verdict policy, plus the same boundary observed
// through the public /detect route.

use std::sync::Arc;

use axum::body::{self, Body};
use axum::http::Request;
use serde_json::{json, Value as Json};
use tower::ServiceExt; // for `oneshot`

use threat_triage::analyze::{AnalysisEngine, MockProvider};
use threat_triage::classify::{ContentClassifier, LabelTable, RawPrediction, ScoringModel};
use threat_triage::config::ai::AiConfig;
use threat_triage::error::ClassifyError;
use threat_triage::verdict::{resolve, ThreatLevel, CONFIDENT_PERCENT};
use threat_triage::{router, AppState, TriageEngine};

#[test]
fn malicious_label_splits_on_eighty_percent() {
    // Sweep the whole percent range; the only thing that matters is which
    // side of the boundary a value falls on.
    for tenth in 0..1000 {
        let confidence = tenth as f32 / 10.0;
        let expected = if confidence >= CONFIDENT_PERCENT {
            ThreatLevel::Malicious
        } else {
            ThreatLevel::Suspicious
        };
        assert_eq!(
            resolve(true, confidence),
            expected,
            "is_malicious=true, confidence={confidence}"
        );
    }
}

#[test]
fn benign_label_splits_on_eighty_percent() {
    for tenth in 0..1000 {
        let confidence = tenth as f32 / 10.0;
        let expected = if confidence >= CONFIDENT_PERCENT {
            ThreatLevel::Safe
        } else {
            ThreatLevel::Suspicious
        };
        assert_eq!(
            resolve(false, confidence),
            expected,
            "is_malicious=false, confidence={confidence}"
        );
    }
}

// --- the same boundary through the HTTP surface ---

struct StubScorer {
    label: &'static str,
    score: f32,
}

impl ScoringModel for StubScorer {
    fn score(&self, _text: &str) -> Result<RawPrediction, ClassifyError> {
        Ok(RawPrediction {
            label: self.label.to_string(),
            score: self.score,
        })
    }
}

async fn detect_level(label: &'static str, score: f32) -> String {
    let classifier = Arc::new(ContentClassifier::new(LabelTable::default()));
    classifier.install(Box::new(StubScorer { label, score }));
    let analysis = Arc::new(AnalysisEngine::with_provider(
        AiConfig::default(),
        Arc::new(MockProvider::replying("unused")),
    ));
    let app = router(AppState {
        engine: TriageEngine::new(classifier, analysis),
    });

    let payload = json!({ "content": "probe", "content_type": "sms" });
    let req = Request::builder()
        .method("POST")
        .uri("/detect")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build request");

    let resp = app.oneshot(req).await.expect("oneshot /detect");
    let bytes = body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .expect("read body")
        .to_vec();
    let v: Json = serde_json::from_slice(&bytes).expect("json");
    v["threatLevel"].as_str().expect("threatLevel").to_string()
}

#[tokio::test]
async fn detect_is_malicious_at_exactly_eighty() {
    assert_eq!(detect_level("phishing", 0.80).await, "malicious");
}

#[tokio::test]
async fn detect_is_suspicious_just_below_eighty() {
    assert_eq!(detect_level("phishing", 0.799).await, "suspicious");
}

#[tokio::test]
async fn detect_is_safe_for_confident_benign() {
    assert_eq!(detect_level("benign", 0.97).await, "safe");
}

#[tokio::test]
async fn detect_hedges_unsure_benign_to_suspicious() {
    assert_eq!(detect_level("benign", 0.55).await, "suspicious");
}
