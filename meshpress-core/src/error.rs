//! Error types for meshpress

use thiserror::Error;

/// Main error type for meshpress operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Spatial index error: {0}")]
    SpatialIndex(String),
}

/// Result type alias for meshpress operations
pub type Result<T> = std::result::Result<T, Error>;
