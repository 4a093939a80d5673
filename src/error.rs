// src/error.rs
//! Error taxonomy for the two analysis stages.
//!
//! Classifier faults surface to the caller (the fast path cannot produce a
//! verdict without them). Narrative faults never leave the provider layer as
//! errors; they are folded into a failed `NarrativeResult` instead.

use serde::Serialize;
use thiserror::Error;

/// Faults of the fast classification path.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The scoring model has not finished its one-time load yet.
    #[error("classifier model not loaded yet")]
    ModelNotReady,

    /// Caller input fault: empty content or an unrecognized content type.
    #[error("invalid content: {0}")]
    InvalidContent(String),

    /// The underlying scoring call failed (malformed input, resource
    /// exhaustion, backend error). The request fails; the process continues.
    #[error("inference failed: {0}")]
    Inference(String),
}

/// Faults of the narrative path. These are values, not propagated errors:
/// they ride inside `NarrativeResult` so the caller always receives data.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderError {
    /// No API credential configured. A configuration state, not a failure.
    #[error("no narrative provider configured")]
    Unavailable,

    /// Transport or provider fault during the remote call.
    #[error("provider call failed: {0}")]
    Call(String),

    /// The bounded request window expired.
    #[error("provider call timed out after {0}s")]
    Timeout(u64),
}
