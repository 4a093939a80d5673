// src/analyze/parser.rs
//! # Structured Response Parser
//!
//! Extracts the fixed [`StructuredAnalysis`] schema from narrative text
//! using patterns anchored to the section template in `prompt.rs`. The two
//! evolve in lockstep.
//!
//! `parse` is total: any input, including the empty string or text missing
//! every anchor, yields a complete schema with the documented defaults.
//! A missing pattern is a default, never an error.

use once_cell::sync::Lazy;
use regex::Regex;

use super::schema::{
    AnomalyDetection, MitigationRecommendations, RiskAssessment, RiskLevel, StructuredAnalysis,
    MAX_ANOMALIES, MAX_INCIDENT_STEPS, MAX_PATTERNS, MAX_RISK_FACTORS, MAX_STRATEGIES,
    POLICY_BASELINE,
};

static RISK_LEVEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\*\*Risk Level\*\*:\s*(CRITICAL|HIGH|MEDIUM|LOW)").unwrap());
static RISK_SCORE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*Risk Score\*\*:\s*(\d+)").unwrap());
static ANOMALY_SCORE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*Anomaly Score\*\*:\s*(\d+)").unwrap());
static RISK_CATEGORY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*Risk Category\*\*:\s*([^\n]+)").unwrap());
static PATTERNS_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*Behavioral Patterns\*\*:\s*([^\n]+)").unwrap());

// Section spans run from their label to the next bold label / heading / end
// of text. The terminator is consumed, not peeked; only the capture is used.
static ANOMALY_SECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\*\*Detected Anomalies\*\*:(.*?)(?:\*\*|##|\z)").unwrap());
static FACTOR_SECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\*\*Risk Factors\*\*:(.*?)(?:##|\z)").unwrap());
static STRATEGY_SECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)### Security Strategies(.*?)(?:##|\z)").unwrap());
static INCIDENT_SECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)### Incident Response(.*?)(?:##|\z)").unwrap());

/// Extract the structured schema from narrative text. Total; never fails.
pub fn parse(raw_text: &str) -> StructuredAnalysis {
    let level = RISK_LEVEL
        .captures(raw_text)
        .and_then(|c| RiskLevel::from_wire(&c[1]))
        .unwrap_or_default();

    let risk_score = first_score(&RISK_SCORE, raw_text).unwrap_or(50);
    let anomaly_score = first_score(&ANOMALY_SCORE, raw_text).unwrap_or(0);

    let category = RISK_CATEGORY
        .captures(raw_text)
        .map(|c| c[1].trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());

    let factors = section_bullets(&FACTOR_SECTION, raw_text, MAX_RISK_FACTORS);
    let anomalies = section_bullets(&ANOMALY_SECTION, raw_text, MAX_ANOMALIES);
    let strategies = section_bullets(&STRATEGY_SECTION, raw_text, MAX_STRATEGIES);
    let incident_response = section_bullets(&INCIDENT_SECTION, raw_text, MAX_INCIDENT_STEPS);

    let patterns = PATTERNS_LINE
        .captures(raw_text)
        .map(|c| {
            c[1].split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .take(MAX_PATTERNS)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    StructuredAnalysis {
        risk_assessment: RiskAssessment {
            level,
            score: risk_score,
            category,
            factors,
        },
        anomaly_detection: AnomalyDetection {
            has_anomalies: !anomalies.is_empty(),
            anomalies,
            anomaly_score,
            patterns,
        },
        mitigation_recommendations: MitigationRecommendations {
            strategies,
            incident_response,
            policy_alignment: POLICY_BASELINE.iter().map(|s| s.to_string()).collect(),
        },
    }
}

/// First integer after the label, clamped into 0..=100. Unparseable numbers
/// count as absent.
fn first_score(re: &Regex, text: &str) -> Option<u8> {
    re.captures(text)
        .and_then(|c| c[1].parse::<u32>().ok())
        .map(|v| v.min(100) as u8)
}

/// Bullet lines within a bounded section span, in source order, capped.
fn section_bullets(re: &Regex, text: &str, cap: usize) -> Vec<String> {
    let Some(captures) = re.captures(text) else {
        return Vec::new();
    };
    bullet_lines(&captures[1], cap)
}

fn bullet_lines(section: &str, cap: usize) -> Vec<String> {
    section
        .lines()
        .filter_map(|line| {
            let t = line.trim_start();
            t.strip_prefix('•')
                .or_else(|| t.strip_prefix("- "))
                .or_else(|| t.strip_prefix("* "))
        })
        .map(|rest| rest.trim().to_string())
        .filter(|s| !s.is_empty())
        .take(cap)
        .collect()
}
