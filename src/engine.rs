// src/engine.rs
//! # Triage Engine
//! Top-level orchestration: input validation, the fast classify→verdict
//! sequence, and the combined fast+narrative path. Pure sequencing — all
//! heavy lifting lives in `classify` and `analyze`.
//!
//! The two stages stay decoupled: the narrative path takes the prior
//! verdict as data and never requires it to be freshly computed here.

use std::sync::Arc;

use crate::analyze::{AnalysisContext, AnalysisEngine, DualAnalysisResult, NarrativeAnalysis};
use crate::classify::{ClassificationResult, ContentClassifier};
use crate::content::ContentType;
use crate::error::ClassifyError;
use crate::verdict::{self, ThreatLevel};

/// Fast-path outcome: classification plus the derived verdict.
#[derive(Debug, Clone)]
pub struct Detection {
    pub result: ClassificationResult,
    pub level: ThreatLevel,
    pub content_type: ContentType,
}

/// Combined outcome of both stages.
#[derive(Debug, Clone)]
pub struct CombinedAnalysis {
    pub detection: Detection,
    pub narrative: NarrativeAnalysis,
}

/// Shared, read-only service handle. Cheap to clone into request handlers.
#[derive(Clone)]
pub struct TriageEngine {
    pub classifier: Arc<ContentClassifier>,
    pub analysis: Arc<AnalysisEngine>,
}

impl TriageEngine {
    pub fn new(classifier: Arc<ContentClassifier>, analysis: Arc<AnalysisEngine>) -> Self {
        Self {
            classifier,
            analysis,
        }
    }

    /// Fast path: validate, classify, resolve the verdict.
    ///
    /// CPU-bound for the duration of the scoring call; async callers should
    /// run it on a blocking task.
    pub fn classify(&self, content: &str, content_type: &str) -> Result<Detection, ClassifyError> {
        let (content, content_type) = validate(content, content_type)?;
        let result = self.classifier.classify(content)?;
        let level = verdict::resolve(result.is_malicious, result.confidence);
        Ok(Detection {
            result,
            level,
            content_type,
        })
    }

    /// Narrative path alone, with the caller-supplied prior verdict. Input
    /// faults surface; provider faults are absorbed downstream.
    pub async fn analyze_narrative(
        &self,
        content: &str,
        content_type: &str,
        prior_level: ThreatLevel,
        prior_confidence: f32,
    ) -> Result<NarrativeAnalysis, ClassifyError> {
        let (content, content_type) = validate(content, content_type)?;
        let ctx = AnalysisContext::new(content, content_type, prior_level, prior_confidence);
        Ok(self.analysis.analyze_narrative(&ctx).await)
    }

    /// Both stages in sequence: the fresh verdict feeds the narrative
    /// prompt as context.
    pub async fn analyze_combined(
        &self,
        content: &str,
        content_type: &str,
    ) -> Result<CombinedAnalysis, ClassifyError> {
        let detection = self.classify(content, content_type)?;
        let ctx = AnalysisContext::new(
            content.trim(),
            detection.content_type,
            detection.level,
            detection.result.confidence,
        );
        let narrative = self.analysis.analyze_narrative(&ctx).await;
        Ok(CombinedAnalysis {
            detection,
            narrative,
        })
    }

    /// Dual-provider narrative path.
    pub async fn analyze_dual(
        &self,
        content: &str,
        content_type: &str,
        prior_level: ThreatLevel,
        prior_confidence: f32,
    ) -> Result<DualAnalysisResult, ClassifyError> {
        let (content, content_type) = validate(content, content_type)?;
        let ctx = AnalysisContext::new(content, content_type, prior_level, prior_confidence);
        Ok(self.analysis.analyze_dual(&ctx).await)
    }
}

/// Shared input validation for every exposed operation.
fn validate<'a>(
    content: &'a str,
    content_type: &str,
) -> Result<(&'a str, ContentType), ClassifyError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ClassifyError::InvalidContent(
            "content cannot be empty".to_string(),
        ));
    }
    let ct: ContentType = content_type
        .parse()
        .map_err(ClassifyError::InvalidContent)?;
    Ok((trimmed, ct))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::MockProvider;
    use crate::classify::{LabelTable, RawPrediction, ScoringModel};
    use crate::config::ai::AiConfig;

    struct FixedScorer(&'static str, f32);
    impl ScoringModel for FixedScorer {
        fn score(&self, _text: &str) -> Result<RawPrediction, ClassifyError> {
            Ok(RawPrediction {
                label: self.0.to_string(),
                score: self.1,
            })
        }
    }

    fn engine(label: &'static str, score: f32) -> TriageEngine {
        let classifier = Arc::new(ContentClassifier::new(LabelTable::default()));
        classifier.install(Box::new(FixedScorer(label, score)));
        let analysis = Arc::new(AnalysisEngine::with_provider(
            AiConfig::default(),
            Arc::new(MockProvider::replying("**Risk Level**: LOW")),
        ));
        TriageEngine::new(classifier, analysis)
    }

    #[test]
    fn empty_content_is_an_input_fault() {
        let e = engine("benign", 0.9);
        assert!(matches!(
            e.classify("", "url"),
            Err(ClassifyError::InvalidContent(_))
        ));
        assert!(matches!(
            e.classify("   \n ", "url"),
            Err(ClassifyError::InvalidContent(_))
        ));
    }

    #[test]
    fn unknown_content_type_is_an_input_fault() {
        let e = engine("benign", 0.9);
        assert!(matches!(
            e.classify("hello", "pdf"),
            Err(ClassifyError::InvalidContent(_))
        ));
    }

    #[test]
    fn confident_phishing_classifies_malicious() {
        let e = engine("phishing", 0.95);
        let d = e.classify("urgent: verify your account", "email").unwrap();
        assert_eq!(d.level, ThreatLevel::Malicious);
        assert_eq!(d.content_type, ContentType::Email);
        assert!((d.result.confidence - 95.0).abs() < 1e-3);
    }

    #[tokio::test]
    async fn combined_path_feeds_verdict_into_narrative() {
        let e = engine("phishing", 0.95);
        let out = e
            .analyze_combined("urgent: verify your account", "email")
            .await
            .unwrap();
        assert_eq!(out.detection.level, ThreatLevel::Malicious);
        assert!(out.narrative.result.success);
        assert_eq!(
            out.narrative.parsed.risk_assessment.level,
            crate::analyze::schema::RiskLevel::Low
        );
    }

    #[tokio::test]
    async fn narrative_path_validates_input_but_not_readiness() {
        // Narrative stage must work without a loaded classifier.
        let classifier = Arc::new(ContentClassifier::new(LabelTable::default()));
        let analysis = Arc::new(AnalysisEngine::with_provider(
            AiConfig::default(),
            Arc::new(MockProvider::replying("text")),
        ));
        let e = TriageEngine::new(classifier, analysis);

        let out = e
            .analyze_narrative("some link", "sms", ThreatLevel::Suspicious, 50.0)
            .await
            .unwrap();
        assert!(out.result.success);

        assert!(matches!(
            e.analyze_narrative("", "sms", ThreatLevel::Safe, 1.0).await,
            Err(ClassifyError::InvalidContent(_))
        ));
    }
}
