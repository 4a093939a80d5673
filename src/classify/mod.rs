// src/classify/mod.rs
//! Fast classification stage: a pretrained scoring model behind a swappable
//! backend trait, plus the label table that turns raw labels into the
//! malicious/benign decision.

pub mod bert;
pub mod labels;

use std::sync::OnceLock;

use serde::Serialize;
use tracing::{info, warn};

use crate::content::truncate_chars;
use crate::error::ClassifyError;

pub use labels::LabelTable;

/// Character limit applied before scoring. Checked before the backend's own
/// token-level truncation to bound worst-case tokenizer latency.
pub const MAX_CONTENT_CHARS: usize = 2000;

pub const ENV_CLASSIFIER_MODEL: &str = "CLASSIFIER_MODEL";
pub const ENV_CLASSIFIER_FORCE_CPU: &str = "CLASSIFIER_FORCE_CPU";
pub const ENV_CLASSIFIER_LABELS_PATH: &str = "CLASSIFIER_LABELS_PATH";
pub const DEFAULT_MODEL_ID: &str = "ealvaradob/bert-finetuned-phishing";

/// Raw output of a scoring backend: top label and its probability.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPrediction {
    pub label: String,
    pub score: f32,
}

/// Low-level scoring backend. Separated so tests can stub the model and the
/// backend can be swapped without touching the classification contract.
pub trait ScoringModel: Send + Sync {
    fn score(&self, text: &str) -> Result<RawPrediction, ClassifyError>;

    /// Device string for diagnostics ("cpu" / "cuda").
    fn device_label(&self) -> &'static str {
        "cpu"
    }
}

/// One classification outcome. Immutable; `confidence` is always
/// `raw_score * 100`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub raw_label: String,
    pub raw_score: f32,
    pub is_malicious: bool,
    pub confidence: f32,
}

/// Model load settings, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Hub id or local model directory.
    pub model_id: String,
    pub use_cpu: bool,
}

impl ModelConfig {
    pub fn from_env() -> Self {
        let model_id = std::env::var(ENV_CLASSIFIER_MODEL)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string());
        let use_cpu = std::env::var(ENV_CLASSIFIER_FORCE_CPU)
            .map(|v| v == "1")
            .unwrap_or(false);
        Self { model_id, use_cpu }
    }
}

/// Wraps the scoring backend with truncation, the label table, and an
/// explicit readiness state. Built unloaded; `load` (or `install`) makes it
/// ready. Readiness is a write-once flag, so reads never take a lock.
pub struct ContentClassifier {
    backend: OnceLock<Box<dyn ScoringModel>>,
    labels: LabelTable,
}

impl ContentClassifier {
    pub fn new(labels: LabelTable) -> Self {
        Self {
            backend: OnceLock::new(),
            labels,
        }
    }

    /// One-time load of the BERT backend. Errors are logged here and
    /// re-raised for the caller to decide whether boot continues.
    pub fn load(&self, cfg: &ModelConfig) -> anyhow::Result<()> {
        if self.is_loaded() {
            return Ok(());
        }
        match bert::BertScorer::load(cfg) {
            Ok(scorer) => {
                self.install(Box::new(scorer));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, model = %cfg.model_id, "classifier load failed");
                Err(e)
            }
        }
    }

    /// Install an already-built backend (tests, alternative models).
    /// A second install is ignored; the first backend wins.
    pub fn install(&self, backend: Box<dyn ScoringModel>) {
        if self.backend.set(backend).is_err() {
            warn!("classifier backend already installed; ignoring replacement");
        } else {
            info!("classifier backend installed");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.backend.get().is_some()
    }

    /// Device of the loaded backend, if any.
    pub fn device_label(&self) -> Option<&'static str> {
        self.backend.get().map(|b| b.device_label())
    }

    /// Score `content` and map the raw label through the label table.
    ///
    /// Fails with `ModelNotReady` before `load`, and with `Inference` when
    /// the backend call fails. Content is truncated to
    /// [`MAX_CONTENT_CHARS`] characters first.
    pub fn classify(&self, content: &str) -> Result<ClassificationResult, ClassifyError> {
        let backend = self.backend.get().ok_or(ClassifyError::ModelNotReady)?;

        let truncated = truncate_chars(content, MAX_CONTENT_CHARS);
        let prediction = backend.score(truncated)?;

        let is_malicious = self.labels.is_malicious(&prediction.label);
        Ok(ClassificationResult {
            raw_label: prediction.label,
            raw_score: prediction.score,
            is_malicious,
            confidence: prediction.score * 100.0,
        })
    }
}
