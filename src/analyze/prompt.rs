// src/analyze/prompt.rs
//! Prompt assembly for the narrative stage.
//!
//! The system template fixes the section layout the parser anchors on;
//! change one only together with the other. The user prompt carries the
//! truncated content plus the fast-path verdict as a contextual hint — the
//! narrative service is free to disagree with it.

use crate::content::{truncate_chars, ContentType};
use crate::verdict::ThreatLevel;

/// Character budget for content embedded in a prompt, bounding token usage
/// and cost per call.
pub const MAX_PROMPT_CONTENT_CHARS: usize = 3000;

/// Instruction template for the analyst role. All sections are mandatory so
/// extraction downstream has stable anchors.
pub const SYSTEM_PROMPT: &str = r#"You are an expert cybersecurity analyst specializing in phishing detection and social engineering analysis. Your role is to comprehensively analyze potentially malicious content (URLs, emails, SMS messages) and provide detailed security assessments.

Your analysis must include ALL of the following sections in this exact format:

## Threat Assessment
[Brief 2-3 sentence summary of the overall threat]

## Red Flags Identified
[List each red flag as bullet points with explanations]
• [Flag 1]: [Explanation]
• [Flag 2]: [Explanation]

## Anomaly Detection
**Anomaly Score**: [0-100]
**Detected Anomalies**:
• [Anomaly 1]
• [Anomaly 2]
**Behavioral Patterns**: [list any suspicious patterns]

## Risk Classification
**Risk Level**: [CRITICAL / HIGH / MEDIUM / LOW]
**Risk Score**: [0-100]
**Risk Category**: [Credential Theft / Financial Fraud / Malware Delivery / Social Engineering / Data Harvesting / Impersonation / etc.]
**Risk Factors**:
• [Factor 1]
• [Factor 2]

## Attack Technique
[Detailed explanation of the attack methodology]

## Mitigation Recommendations

### Security Strategies
• [Action 1]: [Description]
• [Action 2]: [Description]

### Incident Response
• [Step 1]
• [Step 2]

### Policy Alignment
• NIST Cybersecurity Framework: [relevant controls]
• ISO/IEC 27001: [relevant controls]

Be thorough and provide actionable intelligence. All sections are mandatory."#;

/// Per-request inputs for prompt assembly. Content is truncated to
/// [`MAX_PROMPT_CONTENT_CHARS`] at construction.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    pub content: String,
    pub content_type: ContentType,
    pub prior_level: ThreatLevel,
    pub prior_confidence: f32,
}

impl AnalysisContext {
    pub fn new(
        content: &str,
        content_type: ContentType,
        prior_level: ThreatLevel,
        prior_confidence: f32,
    ) -> Self {
        Self {
            content: truncate_chars(content, MAX_PROMPT_CONTENT_CHARS).to_string(),
            content_type,
            prior_level,
            prior_confidence,
        }
    }
}

/// A built prompt pair, ready for a provider call.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub system: &'static str,
    pub user: String,
}

/// Full-detail prompt for the primary provider.
pub fn build(ctx: &AnalysisContext) -> Prompt {
    let user = format!(
        "Analyze the following {} for potential phishing or social engineering threats.\n\n\
         **Content to analyze:**\n```\n{}\n```\n\n\
         **Classifier pre-analysis:**\n\
         - Threat Level: {}\n\
         - Confidence: {}%\n\n\
         Provide a COMPLETE analysis following ALL sections in the system prompt. Be specific and thorough.",
        ctx.content_type.as_upper(),
        ctx.content,
        ctx.prior_level.as_str().to_ascii_uppercase(),
        ctx.prior_confidence,
    );
    Prompt {
        system: SYSTEM_PROMPT,
        user,
    }
}

/// Shorter-form prompt for the secondary provider, which runs on a smaller
/// output budget.
pub fn build_secondary(ctx: &AnalysisContext) -> Prompt {
    let user = format!(
        "Analyze the following {} for potential phishing or social engineering threats.\n\n\
         **Content to analyze:**\n```\n{}\n```\n\n\
         **Classifier pre-analysis:**\n\
         - Threat Level: {}\n\
         - Confidence: {}%\n\n\
         Please provide your expert cybersecurity analysis of this content.",
        ctx.content_type.as_upper(),
        ctx.content,
        ctx.prior_level.as_str().to_ascii_uppercase(),
        ctx.prior_confidence,
    );
    Prompt {
        system: SYSTEM_PROMPT,
        user,
    }
}
