//! Error types for the pairs pipeline

use thiserror::Error;

/// Errors that can abort a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Input sequences disagree in length
    #[error("Dimension mismatch in {context}: expected {expected} elements, got {actual}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Malformed input, rejected before any computation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Not enough data points to run at all
    #[error("Insufficient data: expected at least {expected} data points, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV ingest/export error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

impl PipelineError {
    /// Fail with `DimensionMismatch` unless `actual == expected`.
    pub fn check_len(
        context: &'static str,
        expected: usize,
        actual: usize,
    ) -> Result<()> {
        if expected != actual {
            return Err(PipelineError::DimensionMismatch {
                context,
                expected,
                actual,
            });
        }
        Ok(())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
