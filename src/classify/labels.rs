// src/classify/labels.rs
//! # Label Table
//!
//! Configurable mapping from a scoring model's raw output label to the
//! malicious/benign decision.
//!
//! - Loads from JSON config (a plain list of positive labels).
//! - Case-insensitive lookup.
//! - Includes a built-in seed covering the common label schemes emitted by
//!   phishing/spam classifiers (`"phishing"`, `"spam"`, `"LABEL_1"`, ...).
//!
//! The mapping is label-set-specific, not probability-based: it must be
//! reviewed whenever the scoring model is swapped.

use serde::Deserialize;
use std::{fs, path::Path};

/// Labels that mark content as malicious, loaded from JSON or defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct LabelTable {
    /// Raw labels treated as malicious (stored lowercase).
    #[serde(default)]
    positive: Vec<String>,
}

impl LabelTable {
    /// Load the table from a JSON file.
    /// Falls back to `default_seed()` on any read/parse error.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(path) {
            Ok(s) => serde_json::from_str::<LabelTable>(&s)
                .map(LabelTable::normalized)
                .unwrap_or_else(|_| Self::default_seed()),
            Err(_) => Self::default_seed(),
        }
    }

    /// Built-in seed for the reference phishing model's label scheme plus
    /// the generic positive labels seen across sequence classifiers.
    pub fn default_seed() -> Self {
        Self {
            positive: ["phishing", "spam", "malicious", "1", "label_1"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Case-insensitive membership check against the positive set.
    pub fn is_malicious(&self, raw_label: &str) -> bool {
        let needle = raw_label.trim().to_ascii_lowercase();
        self.positive.iter().any(|l| *l == needle)
    }

    fn normalized(mut self) -> Self {
        for l in &mut self.positive {
            *l = l.trim().to_ascii_lowercase();
        }
        self
    }
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::default_seed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_covers_reference_labels() {
        let t = LabelTable::default_seed();
        assert!(t.is_malicious("phishing"));
        assert!(t.is_malicious("LABEL_1"));
        assert!(t.is_malicious("Spam"));
        assert!(t.is_malicious("1"));
    }

    #[test]
    fn benign_labels_stay_benign() {
        let t = LabelTable::default_seed();
        assert!(!t.is_malicious("benign"));
        assert!(!t.is_malicious("LABEL_0"));
        assert!(!t.is_malicious("0"));
        assert!(!t.is_malicious(""));
    }

    #[test]
    fn custom_table_from_json() {
        let t: LabelTable = serde_json::from_str(r#"{"positive": ["Fraud", "SCAM"]}"#).unwrap();
        let t = t.normalized();
        assert!(t.is_malicious("fraud"));
        assert!(t.is_malicious("scam"));
        assert!(!t.is_malicious("phishing"));
    }

    #[test]
    fn missing_file_falls_back_to_seed() {
        let t = LabelTable::load_from_file("does/not/exist.json");
        assert!(t.is_malicious("phishing"));
    }
}
