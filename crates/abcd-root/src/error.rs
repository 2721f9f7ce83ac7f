//! Error type for ROOT file reading.

use thiserror::Error;

/// Errors raised while reading a ROOT file.
#[derive(Debug, Error)]
pub enum RootError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing `root` magic or file shorter than a header.
    #[error("not a ROOT file (bad magic)")]
    BadMagic,

    /// A read ran past the end of the buffer.
    #[error("buffer underflow at offset {offset}: need {need} bytes, have {have}")]
    BufferUnderflow {
        /// Read position.
        offset: usize,
        /// Bytes requested.
        need: usize,
        /// Bytes available.
        have: usize,
    },

    /// Structurally invalid streamed object.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Compressed block could not be decoded.
    #[error("decompression error: {0}")]
    Decompression(String),

    /// No key with this name (or path component).
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// Object class this reader does not decode.
    #[error("unsupported class: {0}")]
    UnsupportedClass(String),

    /// Decoded histogram failed validation.
    #[error(transparent)]
    Histogram(#[from] abcd_core::Error),
}

/// Result alias for ROOT reading.
pub type Result<T> = std::result::Result<T, RootError>;
