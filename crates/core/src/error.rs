//! Error types for hydrocheck

use thiserror::Error;

/// Main error type for hydrocheck operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("unknown layer: {0}")]
    UnknownLayer(String),

    #[error("no spatial index built for layer {0}")]
    IndexMissing(String),

    #[error("no continuity adjacency configured for layer {0}")]
    MissingAdjacency(String),

    #[error("boundary layer has no feature to take the survey extent from")]
    EmptyBoundary,

    #[error("{0}")]
    Other(String),
}

/// Result type alias for hydrocheck operations
pub type Result<T> = std::result::Result<T, Error>;
