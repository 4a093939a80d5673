// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod classify;
pub mod config;
pub mod content;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod verdict;

// Narrative pipeline (prompting, providers, extraction, dual mode)
pub mod analyze;

pub mod ai_bootstrap;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::engine::TriageEngine;
pub use crate::verdict::ThreatLevel;

use std::sync::Arc;

use tracing::info;

use crate::ai_bootstrap::{AiRuntime, DEFAULT_AI_CONFIG_PATH};
use crate::classify::{ContentClassifier, LabelTable, ModelConfig, ENV_CLASSIFIER_LABELS_PATH};

/// Skip the one-time model load (narrative-only operation; /detect answers
/// 503 until a backend is installed).
pub const ENV_CLASSIFIER_SKIP_LOAD: &str = "CLASSIFIER_SKIP_LOAD";

/// Build the full application router the binary serves: classifier loaded
/// from env settings, narrative engine from `config/ai.json`, metrics
/// recorder installed.
pub async fn app() -> anyhow::Result<axum::Router> {
    let labels = match std::env::var(ENV_CLASSIFIER_LABELS_PATH) {
        Ok(path) => LabelTable::load_from_file(path),
        Err(_) => LabelTable::default(),
    };
    let classifier = Arc::new(ContentClassifier::new(labels));

    let skip_load = std::env::var(ENV_CLASSIFIER_SKIP_LOAD)
        .map(|v| v == "1")
        .unwrap_or(false);
    if skip_load {
        info!("classifier load skipped by request; /detect degrades to 503");
    } else {
        // One-time load; a failure here is fatal to boot, not to requests.
        let model_cfg = ModelConfig::from_env();
        let loader = classifier.clone();
        tokio::task::spawn_blocking(move || loader.load(&model_cfg)).await??;
    }

    let ai = AiRuntime::from_path(DEFAULT_AI_CONFIG_PATH);
    ai.log_status();

    let engine = TriageEngine::new(classifier.clone(), ai.engine.clone());
    let metrics = metrics::Metrics::init(classifier.is_loaded());

    Ok(api::router(AppState { engine }).merge(metrics.router()))
}
