//! Analyzer error types.
//!
//! Tool failures never show up here; they degrade into the analysis result.
//! These errors cover dispatch and startup only.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("unknown analyzer: {0}")]
    UnknownAnalyzer(String),

    #[error("invalid JSON schema: {0}")]
    InvalidSchema(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AnalyzerResult<T> = std::result::Result<T, AnalyzerError>;
