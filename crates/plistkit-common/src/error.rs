//! Error types for plistkit-common.

use thiserror::Error;

use crate::ErrorKind;

/// Common error type for low-level reading.
#[derive(Debug, Error)]
pub enum Error {
    /// End of buffer reached while reading.
    #[error("unexpected end of buffer: needed {needed} bytes but only {available} available")]
    UnexpectedEof { needed: usize, available: usize },

    /// Integer width outside of what the reader supports.
    #[error("unsupported integer width: {0} bytes")]
    InvalidWidth(usize),

    /// Seek target beyond the end of the buffer.
    #[error("seek to {position} out of bounds (buffer size: {size})")]
    SeekOutOfBounds { position: usize, size: usize },
}

impl Error {
    /// Every reader failure means the document does not match its declared layout.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::MalformedDocument
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
