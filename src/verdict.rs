// src/verdict.rs
//! # Threat Verdict
//! Pure, testable mapping from classifier output to the three-level verdict.
//! No I/O, suitable for unit tests and offline evaluation.
//!
//! Policy: high-confidence labels resolve to their own level (`malicious` or
//! `safe`); anything the model is unsure about collapses to `suspicious`.
//! The hedge is deliberate: a 60%-confident "benign" is not a clean bill.

use serde::{Deserialize, Serialize};

/// Confidence (percent) at or above which a label is trusted outright.
pub const CONFIDENT_PERCENT: f32 = 80.0;

/// Graded verdict for a piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatLevel {
    Safe,
    Suspicious,
    Malicious,
}

impl ThreatLevel {
    /// Lowercase wire form ("safe" / "suspicious" / "malicious").
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatLevel::Safe => "safe",
            ThreatLevel::Suspicious => "suspicious",
            ThreatLevel::Malicious => "malicious",
        }
    }

    /// Parse a wire-form level; defaults to `Suspicious` on unknown input so
    /// downstream prompts always carry a usable prior.
    pub fn from_wire(s: &str) -> ThreatLevel {
        match s.trim().to_ascii_lowercase().as_str() {
            "safe" => ThreatLevel::Safe,
            "malicious" => ThreatLevel::Malicious,
            _ => ThreatLevel::Suspicious,
        }
    }
}

/// Resolve `(is_malicious, confidence_percent)` into a verdict.
///
/// The 80% boundary is inclusive on the high side in both branches: exactly
/// 80.0 resolves to the confident outcome.
pub fn resolve(is_malicious: bool, confidence_percent: f32) -> ThreatLevel {
    match (is_malicious, confidence_percent >= CONFIDENT_PERCENT) {
        (true, true) => ThreatLevel::Malicious,
        (true, false) => ThreatLevel::Suspicious,
        (false, true) => ThreatLevel::Safe,
        (false, false) => ThreatLevel::Suspicious,
    }
}
