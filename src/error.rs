use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Failures surfaced to the caller. Individual bad cells never show up
/// here; they degrade locally inside the aggregation pass.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("source file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed delimited input: {0}")]
    Csv(#[from] csv::Error),

    #[error("bad data-directory pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}
