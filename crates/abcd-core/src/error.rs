//! Error types shared by the ABCD crates.

use thiserror::Error;

/// ABCD error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input (bad edges, negative errors, empty sample list, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Histograms combined or divided together do not share a binning
    #[error("Binning mismatch: {0}")]
    Binning(String),

    /// Numerical failure (singular fit, non-finite result, ...)
    #[error("Computation error: {0}")]
    Computation(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
