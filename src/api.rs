// src/api.rs
//! HTTP surface: thin handlers over [`TriageEngine`].
//!
//! Status mapping mirrors the propagation policy: input faults are 400,
//! an unloaded model is 503, scoring failures are 500 — while narrative
//! faults never become HTTP errors, only degraded payloads.

use std::time::Instant;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::analyze::{NarrativeAnalysis, StructuredAnalysis};
use crate::engine::TriageEngine;
use crate::error::ClassifyError;
use crate::metrics::{DETECT_REQUESTS, NARRATIVE_FAILURES, NARRATIVE_REQUESTS};
use crate::verdict::ThreatLevel;

#[derive(Clone)]
pub struct AppState {
    pub engine: TriageEngine,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/detect", post(detect))
        .route("/analyze-llm", post(analyze_llm))
        .route("/analyze-dual", post(analyze_dual))
        .route("/analyze", post(analyze))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Wire shapes (camelCase to match the UI contract)
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct AnalysisRequest {
    content: String,
    content_type: String,
}

/// Request for the narrative-only path; carries the caller's prior verdict.
#[derive(Deserialize)]
struct NarrativeRequest {
    content: String,
    content_type: String,
    threat_level: String,
    confidence: f32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DetectionResponse {
    threat_level: ThreatLevel,
    confidence_score: f32,
    raw_label: String,
    raw_score: f32,
    content_type: String,
    timestamp: String,
    processing_time: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NarrativeResponse {
    success: bool,
    analysis: String,
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tokens_used: Option<u32>,
    parsed: StructuredAnalysis,
}

impl NarrativeResponse {
    fn from_analysis(n: NarrativeAnalysis) -> Self {
        Self {
            success: n.result.success,
            analysis: n.result.text,
            model: n.result.provider_id,
            error: n.result.error.map(|e| e.to_string()),
            tokens_used: n.result.tokens_used,
            parsed: n.parsed,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CombinedResponse {
    threat_level: ThreatLevel,
    confidence_score: f32,
    raw_label: String,
    raw_score: f32,
    llm_analysis: NarrativeResponse,
    content_type: String,
    timestamp: String,
    processing_time: u64,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    classifier_loaded: bool,
    llm_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    device: Option<&'static str>,
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

struct ApiError(ClassifyError);

impl From<ClassifyError> for ApiError {
    fn from(e: ClassifyError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ClassifyError::InvalidContent(_) => StatusCode::BAD_REQUEST,
            ClassifyError::ModelNotReady => StatusCode::SERVICE_UNAVAILABLE,
            ClassifyError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "detail": self.0.to_string() }))).into_response()
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        classifier_loaded: state.engine.classifier.is_loaded(),
        llm_configured: state.engine.analysis.is_configured(),
        device: state.engine.classifier.device_label(),
    })
}

/// Fast classifier-only detection. Returns in tens of milliseconds.
async fn detect(
    State(state): State<AppState>,
    Json(body): Json<AnalysisRequest>,
) -> Result<Json<DetectionResponse>, ApiError> {
    counter!(DETECT_REQUESTS).increment(1);
    let started = Instant::now();

    let detection = run_classification(&state.engine, body.content, body.content_type).await?;

    Ok(Json(DetectionResponse {
        threat_level: detection.level,
        confidence_score: round2(detection.result.confidence),
        raw_label: detection.result.raw_label,
        raw_score: round4(detection.result.raw_score),
        content_type: detection.content_type.as_upper().to_string(),
        timestamp: timestamp(),
        processing_time: started.elapsed().as_millis() as u64,
    }))
}

/// Narrative-only analysis, typically called after /detect for progressive
/// loading. Provider failures still return 200 with degraded data.
async fn analyze_llm(
    State(state): State<AppState>,
    Json(body): Json<NarrativeRequest>,
) -> Result<Json<NarrativeResponse>, ApiError> {
    counter!(NARRATIVE_REQUESTS).increment(1);

    let narrative = state
        .engine
        .analyze_narrative(
            &body.content,
            &body.content_type,
            ThreatLevel::from_wire(&body.threat_level),
            body.confidence,
        )
        .await?;

    if !narrative.result.success {
        counter!(NARRATIVE_FAILURES).increment(1);
    }
    Ok(Json(NarrativeResponse::from_analysis(narrative)))
}

/// Dual-provider analysis with a consensus summary.
async fn analyze_dual(
    State(state): State<AppState>,
    Json(body): Json<NarrativeRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    counter!(NARRATIVE_REQUESTS).increment(1);

    let dual = state
        .engine
        .analyze_dual(
            &body.content,
            &body.content_type,
            ThreatLevel::from_wire(&body.threat_level),
            body.confidence,
        )
        .await?;

    if !dual.primary.success && !dual.secondary.success {
        counter!(NARRATIVE_FAILURES).increment(1);
    }
    Ok(Json(json!({
        "primary": narrative_json(&dual.primary),
        "secondary": narrative_json(&dual.secondary),
        "consensus": dual.consensus,
    })))
}

fn narrative_json(r: &crate::analyze::NarrativeResult) -> serde_json::Value {
    json!({
        "success": r.success,
        "analysis": r.text,
        "model": r.provider_id,
        "error": r.error.as_ref().map(|e| e.to_string()),
    })
}

/// Full analysis: classifier verdict plus the narrative breakdown.
async fn analyze(
    State(state): State<AppState>,
    Json(body): Json<AnalysisRequest>,
) -> Result<Json<CombinedResponse>, ApiError> {
    counter!(DETECT_REQUESTS).increment(1);
    counter!(NARRATIVE_REQUESTS).increment(1);
    let started = Instant::now();

    let detection =
        run_classification(&state.engine, body.content.clone(), body.content_type).await?;

    let ctx = crate::analyze::AnalysisContext::new(
        body.content.trim(),
        detection.content_type,
        detection.level,
        detection.result.confidence,
    );
    let narrative = state.engine.analysis.analyze_narrative(&ctx).await;
    if !narrative.result.success {
        counter!(NARRATIVE_FAILURES).increment(1);
    }

    Ok(Json(CombinedResponse {
        threat_level: detection.level,
        confidence_score: round2(detection.result.confidence),
        raw_label: detection.result.raw_label,
        raw_score: round4(detection.result.raw_score),
        llm_analysis: NarrativeResponse::from_analysis(narrative),
        content_type: detection.content_type.as_upper().to_string(),
        timestamp: timestamp(),
        processing_time: started.elapsed().as_millis() as u64,
    }))
}

/// The scoring call blocks for its duration; keep it off the async workers.
async fn run_classification(
    engine: &TriageEngine,
    content: String,
    content_type: String,
) -> Result<crate::engine::Detection, ClassifyError> {
    let engine = engine.clone();
    tokio::task::spawn_blocking(move || engine.classify(&content, &content_type))
        .await
        .map_err(|e| ClassifyError::Inference(format!("classification task failed: {e}")))?
}

fn timestamp() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn round2(x: f32) -> f32 {
    (x * 100.0).round() / 100.0
}

fn round4(x: f32) -> f32 {
    (x * 10_000.0).round() / 10_000.0
}
