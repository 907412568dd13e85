//! Error types for the prediction pipeline

use thiserror::Error;

/// Errors raised while turning client records into predictions.
#[derive(Debug, Error)]
pub enum PredictionError {
    /// Canonical feature columns absent after reindexing.
    #[error("schema mismatch: missing feature column(s) [{}]", .missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },

    /// The record could not be flattened into scalar leaves.
    #[error("invalid client record: {0}")]
    InvalidRecord(String),

    /// The scorer itself failed.
    #[error("{context}: {source}")]
    Scorer {
        context: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// The scorer returned something that cannot be mapped onto the inputs.
    #[error("invalid scorer output: {0}")]
    InvalidOutput(String),
}

impl PredictionError {
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, PredictionError::SchemaMismatch { .. })
    }
}
