// src/ai_bootstrap.rs
use std::sync::Arc;

use tracing::{info, warn};

use crate::analyze::AnalysisEngine;
use crate::config::ai::AiConfig;

/// Default on-disk location of the narrative config.
pub const DEFAULT_AI_CONFIG_PATH: &str = "config/ai.json";

pub struct AiRuntime {
    pub cfg: AiConfig,
    pub engine: Arc<AnalysisEngine>,
}

impl AiRuntime {
    /// Build the narrative engine from `config/ai.json`, falling back to env
    /// defaults when the file is absent. Safe diagnostics only: provider,
    /// models, and key length — never the key.
    pub fn from_path(path: &str) -> Self {
        let cfg = AiConfig::load(path);
        info!(
            primary = %cfg.primary_model,
            secondary = %cfg.secondary_model,
            key_len = cfg.api_key.len(),
            "AI config loaded"
        );
        let engine = Arc::new(AnalysisEngine::from_config(cfg.clone()));
        Self { cfg, engine }
    }

    /// Startup status line, mirroring the boot banner of the transport.
    pub fn log_status(&self) {
        if self.engine.is_configured() {
            info!(
                provider = self.engine.provider_name(),
                "narrative analyzer configured"
            );
        } else {
            warn!("narrative analyzer NOT configured - set OPENROUTER_API_KEY for full analysis");
        }
    }
}
