// src/analyze/schema.rs
//! The stable output schema extracted from narrative text.
//!
//! Every field is always present: absent extractions yield documented
//! defaults, never missing keys, so downstream consumers (UI, exports)
//! never branch on optional fields. Field names are camelCase on the wire
//! to match the frontend contract.

use serde::{Deserialize, Serialize};

/// Caps applied to extracted lists to bound downstream payload size.
pub const MAX_RISK_FACTORS: usize = 10;
pub const MAX_ANOMALIES: usize = 15;
pub const MAX_PATTERNS: usize = 8;
pub const MAX_STRATEGIES: usize = 10;
pub const MAX_INCIDENT_STEPS: usize = 8;

/// Framework references reported with every successful extraction. The
/// narrative's own framework prose is advisory, not a reliable list.
pub const POLICY_BASELINE: [&str; 3] = ["NIST CSF", "ISO/IEC 27001", "CIS Controls"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl RiskLevel {
    pub fn from_wire(s: &str) -> Option<RiskLevel> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CRITICAL" => Some(RiskLevel::Critical),
            "HIGH" => Some(RiskLevel::High),
            "MEDIUM" => Some(RiskLevel::Medium),
            "LOW" => Some(RiskLevel::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub level: RiskLevel,
    /// 0..=100; assumed moderate (50) when the narrative names none.
    pub score: u8,
    pub category: String,
    pub factors: Vec<String>,
}

impl Default for RiskAssessment {
    fn default() -> Self {
        Self {
            level: RiskLevel::Medium,
            score: 50,
            category: "Unknown".to_string(),
            factors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyDetection {
    pub has_anomalies: bool,
    pub anomalies: Vec<String>,
    /// 0..=100; anomalies are assumed absent (0) by default.
    pub anomaly_score: u8,
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MitigationRecommendations {
    pub strategies: Vec<String>,
    pub incident_response: Vec<String>,
    pub policy_alignment: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StructuredAnalysis {
    pub risk_assessment: RiskAssessment,
    pub anomaly_detection: AnomalyDetection,
    pub mitigation_recommendations: MitigationRecommendations,
}

impl StructuredAnalysis {
    /// Fixed data returned when no narrative provider is reachable. The
    /// schema stays valid; the content tells the operator what to fix.
    pub fn provider_fallback() -> Self {
        Self {
            risk_assessment: RiskAssessment {
                factors: vec!["Narrative analysis unavailable - limited assessment".to_string()],
                ..RiskAssessment::default()
            },
            anomaly_detection: AnomalyDetection::default(),
            mitigation_recommendations: MitigationRecommendations {
                strategies: vec![
                    "Configure OPENROUTER_API_KEY for detailed analysis".to_string()
                ],
                incident_response: vec![
                    "Use the classifier verdict as a preliminary indicator".to_string()
                ],
                policy_alignment: Vec::new(),
            },
        }
    }
}
