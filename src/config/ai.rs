// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

use crate::analyze::provider::OPENROUTER_BASE_URL;

/// Credential env var. An absent/empty key is a configuration state (the
/// narrative stage degrades to fallback data), never an error.
pub const ENV_OPENROUTER_API_KEY: &str = "OPENROUTER_API_KEY";

pub const DEFAULT_PRIMARY_MODEL: &str = "nex-agi/deepseek-v3.1-nex-n1:free";
pub const DEFAULT_SECONDARY_MODEL: &str = "google/gemma-3-12b-it:free";

fn default_enabled() -> bool {
    true
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_base_url() -> String {
    OPENROUTER_BASE_URL.to_string()
}
fn default_primary_model() -> String {
    DEFAULT_PRIMARY_MODEL.to_string()
}
fn default_secondary_model() -> String {
    DEFAULT_SECONDARY_MODEL.to_string()
}
fn default_max_output_tokens() -> u32 {
    2000
}
fn default_secondary_max_output_tokens() -> u32 {
    1000
}
// Low temperatures on purpose: the analysis needs measured, repeatable
// language, not creativity.
fn default_temperature() -> f32 {
    0.4
}
fn default_secondary_temperature() -> f32 {
    0.3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// "ENV" means: read from OPENROUTER_API_KEY.
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_primary_model")]
    pub primary_model: String,
    #[serde(default = "default_secondary_model")]
    pub secondary_model: String,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// Secondary runs on a smaller budget.
    #[serde(default = "default_secondary_max_output_tokens")]
    pub secondary_max_output_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_secondary_temperature")]
    pub secondary_temperature: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            api_key: default_api_key(),
            base_url: default_base_url(),
            primary_model: default_primary_model(),
            secondary_model: default_secondary_model(),
            max_output_tokens: default_max_output_tokens(),
            secondary_max_output_tokens: default_secondary_max_output_tokens(),
            temperature: default_temperature(),
            secondary_temperature: default_secondary_temperature(),
        }
    }
}

impl AiConfig {
    /// Load from a JSON file, resolving the `"ENV"` sentinel. Parse errors
    /// propagate; a missing credential does not.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let cfg: AiConfig = serde_json::from_str(&data)?;
        Ok(cfg.resolve_key())
    }

    /// Defaults with the key taken from the environment.
    pub fn from_env() -> Self {
        Self::default().resolve_key()
    }

    /// Convenience boot path: the file if it is readable, env defaults
    /// otherwise.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        Self::load_from_file(path).unwrap_or_else(|_| Self::from_env())
    }

    fn resolve_key(mut self) -> Self {
        if self.api_key.trim().eq_ignore_ascii_case("env") {
            self.api_key = env::var(ENV_OPENROUTER_API_KEY).unwrap_or_default();
        }
        self
    }

    pub fn is_configured(&self) -> bool {
        let key = self.api_key.trim();
        // An unresolved "ENV" sentinel is not a credential.
        self.enabled && !key.is_empty() && !key.eq_ignore_ascii_case("env")
    }
}
