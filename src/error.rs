//! Error taxonomy for the RAG pipeline
//!
//! Backend traits return `anyhow::Result`; the pipeline surface maps those
//! into this typed enum so callers can distinguish fatal stages
//! (classification, synthesis) from recoverable backend failures.

use thiserror::Error;

/// Errors surfaced by the pipeline-level operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// No well-formed intent JSON was obtained within the retry budget.
    ///
    /// Carries the last raw model output for diagnosis.
    #[error("intent classification failed after {attempts} attempt(s)")]
    Classification {
        /// 1-based attempt count at which classification gave up.
        attempts: usize,
        /// Last raw model output, if any call completed.
        raw: Option<String>,
    },

    /// The completion endpoint itself was unreachable or returned an error.
    #[error("completion endpoint error")]
    Completion(#[source] anyhow::Error),

    /// A retrieval backend was unreachable or errored.
    ///
    /// The dispatcher recovers from this locally; it is only fatal when the
    /// caller queries a backend directly.
    #[error("retrieval backend error")]
    Retrieval(#[source] anyhow::Error),

    /// The final answer-generation call failed. Never retried.
    #[error("answer synthesis failed")]
    Synthesis(#[source] anyhow::Error),
}

impl RagError {
    /// Last raw model text attached to a classification failure.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            RagError::Classification { raw, .. } => raw.as_deref(),
            _ => None,
        }
    }
}
