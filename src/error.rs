//! Narrator Error Types
//!
//! Error type for the synthesis and configuration layers. The fetch and
//! pipeline stages carry their own errors (`FetchError`, `PipelineError`).

use thiserror::Error;

/// Central error type for Narrator
#[derive(Error, Debug)]
pub enum NarratorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias for Narrator operations
pub type NarratorResult<T> = Result<T, NarratorError>;
