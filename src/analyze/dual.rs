// src/analyze/dual.rs
//! Dual-provider mode: the same context analyzed by two independently
//! configured models, plus a deterministic consensus line.
//!
//! No semantic agreement detection happens here: comparing free-text
//! narratives deterministically is not possible, so the consensus only
//! reports which analyses exist and where to read them.

use serde::Serialize;

use crate::content::truncate_chars;
use crate::error::ProviderError;

use super::{prompt, AnalysisContext, AnalysisEngine, CompletionRequest, NarrativeResult};

/// Longest narrative prefix quoted into a consensus line.
pub const CONSENSUS_QUOTE_CHARS: usize = 200;

#[derive(Debug, Clone, Serialize)]
pub struct DualAnalysisResult {
    pub primary: NarrativeResult,
    pub secondary: NarrativeResult,
    pub consensus: String,
}

impl AnalysisEngine {
    /// Run both providers over the same context. The calls are independent
    /// and read-only, so they run concurrently; attribution is positional
    /// (primary stays primary regardless of completion order).
    pub async fn analyze_dual(&self, ctx: &AnalysisContext) -> DualAnalysisResult {
        let cfg = self.config();

        if !self.is_configured() {
            return DualAnalysisResult {
                primary: NarrativeResult::failed(&cfg.primary_model, ProviderError::Unavailable),
                secondary: NarrativeResult::failed(
                    &cfg.secondary_model,
                    ProviderError::Unavailable,
                ),
                consensus: "Narrative analysis unavailable - API key not configured".to_string(),
            };
        }

        let full = prompt::build(ctx);
        let brief = prompt::build_secondary(ctx);

        let primary_req = CompletionRequest {
            model: cfg.primary_model.clone(),
            system_prompt: full.system.to_string(),
            user_prompt: full.user,
            max_tokens: cfg.max_output_tokens,
            temperature: cfg.temperature,
        };
        let secondary_req = CompletionRequest {
            model: cfg.secondary_model.clone(),
            system_prompt: brief.system.to_string(),
            user_prompt: brief.user,
            max_tokens: cfg.secondary_max_output_tokens,
            temperature: cfg.secondary_temperature,
        };

        let provider = self.provider();
        let (primary, secondary) = tokio::join!(
            provider.complete(&primary_req),
            provider.complete(&secondary_req)
        );

        let consensus = synthesize_consensus(&primary, &secondary);
        DualAnalysisResult {
            primary,
            secondary,
            consensus,
        }
    }
}

/// Deterministic consensus line from the two outcomes.
pub fn synthesize_consensus(primary: &NarrativeResult, secondary: &NarrativeResult) -> String {
    match (primary.success, secondary.success) {
        (false, false) => "Both narrative analyses failed".to_string(),
        (true, false) => format!(
            "Based on primary analysis ({}): {}...",
            primary.provider_id,
            truncate_chars(&primary.text, CONSENSUS_QUOTE_CHARS)
        ),
        (false, true) => format!(
            "Based on secondary analysis ({}): {}...",
            secondary.provider_id,
            truncate_chars(&secondary.text, CONSENSUS_QUOTE_CHARS)
        ),
        (true, true) => format!(
            "**Dual Analysis Consensus:**\n\n\
             Both {} and {} have analyzed this content.\n\n\
             Review both full narratives below for a comprehensive security assessment.",
            primary.provider_id, secondary.provider_id
        ),
    }
}
