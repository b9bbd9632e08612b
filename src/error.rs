//! Error types for the EPA CO2 pipeline.

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors raised by pipeline stages.
///
/// Row- and configuration-scoped variants (`DataIntegrity`, `UnitMismatch`)
/// are handled by dropping and logging the offending row; the run only
/// aborts when the dropped fraction crosses the configured sanity threshold.
/// `UnknownCategory` at inference time is always fatal.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("data integrity: configuration {key} has no {cycle} cycle value")]
    DataIntegrity { key: String, cycle: &'static str },

    #[error("unit mismatch: {cycle} value {value} g/mi for {key} outside plausible range")]
    UnitMismatch {
        key: String,
        cycle: &'static str,
        value: f64,
    },

    #[error("unknown category {value:?} for feature {feature}")]
    UnknownCategory { feature: String, value: String },

    #[error("schema error in {path}: missing required columns {missing:?}")]
    MissingColumns { path: String, missing: Vec<String> },

    #[error("no raw EPA csv files found in {path}")]
    NoRawFiles { path: String },

    #[error("dropped {dropped} of {total} configurations, exceeds sanity threshold {threshold}")]
    DropThresholdExceeded {
        dropped: usize,
        total: usize,
        threshold: f64,
    },

    #[error("test split is empty, refusing to report vacuous metrics")]
    EmptyTestSplit,

    #[error("shape mismatch: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    #[error("matrix is singular, cannot solve least squares")]
    Singular,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
