// src/analyze/mod.rs
//! Narrative analysis pipeline: prompt assembly, provider call, structured
//! extraction, and the dual-provider consensus mode.

pub mod dual;
pub mod parser;
pub mod prompt;
pub mod provider;
pub mod schema;

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::config::ai::AiConfig;
use crate::error::ProviderError;

// Re-export convenient types.
pub use dual::DualAnalysisResult;
pub use prompt::AnalysisContext;
pub use provider::{
    CompletionRequest, DisabledProvider, MockProvider, NarrativeProvider, NarrativeResult,
    OpenRouterProvider,
};
pub use schema::StructuredAnalysis;

/// One narrative analysis: the raw provider outcome plus the extracted
/// schema. Always schema-complete; `result.success` tells the caller
/// whether the narrative is real or degraded.
#[derive(Debug, Clone, Serialize)]
pub struct NarrativeAnalysis {
    pub result: NarrativeResult,
    pub parsed: StructuredAnalysis,
}

/// Orchestrates the narrative stage. Constructed once at startup and shared
/// read-only across requests; all per-request state lives in
/// [`AnalysisContext`].
pub struct AnalysisEngine {
    provider: Arc<dyn NarrativeProvider>,
    cfg: AiConfig,
}

impl AnalysisEngine {
    /// Build from config: a real OpenRouter client when a credential is
    /// present, the disabled short-circuit otherwise.
    pub fn from_config(cfg: AiConfig) -> Self {
        let provider: Arc<dyn NarrativeProvider> = if cfg.is_configured() {
            Arc::new(OpenRouterProvider::new(
                cfg.api_key.clone(),
                Some(&cfg.base_url),
            ))
        } else {
            Arc::new(DisabledProvider)
        };
        Self { provider, cfg }
    }

    /// Inject a provider directly (tests, alternative backends).
    pub fn with_provider(cfg: AiConfig, provider: Arc<dyn NarrativeProvider>) -> Self {
        Self { provider, cfg }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_configured()
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn primary_model(&self) -> &str {
        &self.cfg.primary_model
    }

    pub fn secondary_model(&self) -> &str {
        &self.cfg.secondary_model
    }

    pub(crate) fn config(&self) -> &AiConfig {
        &self.cfg
    }

    pub(crate) fn provider(&self) -> &Arc<dyn NarrativeProvider> {
        &self.provider
    }

    /// Single-provider analysis. Never fails at the schema level: provider
    /// faults degrade to the documented fallback data, and the no-credential
    /// case short-circuits without touching the provider at all.
    pub async fn analyze_narrative(&self, ctx: &AnalysisContext) -> NarrativeAnalysis {
        if !self.is_configured() {
            info!("narrative provider not configured; returning fallback analysis");
            return NarrativeAnalysis {
                result: NarrativeResult::failed(&self.cfg.primary_model, ProviderError::Unavailable),
                parsed: StructuredAnalysis::provider_fallback(),
            };
        }

        let p = prompt::build(ctx);
        let req = CompletionRequest {
            model: self.cfg.primary_model.clone(),
            system_prompt: p.system.to_string(),
            user_prompt: p.user,
            max_tokens: self.cfg.max_output_tokens,
            temperature: self.cfg.temperature,
        };

        let result = self.provider.complete(&req).await;
        let parsed = if result.success {
            parser::parse(&result.text)
        } else {
            StructuredAnalysis::provider_fallback()
        };

        NarrativeAnalysis { result, parsed }
    }
}
