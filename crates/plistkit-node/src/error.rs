//! Error types for node access and mutation.

use plistkit_common::ErrorKind;
use thiserror::Error;

use crate::Kind;

/// Errors that can occur when reading or mutating a node tree.
#[derive(Debug, Error)]
pub enum Error {
    /// Array index past the end of the array.
    #[error("index {index} out of range (length: {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Dictionary key not present.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// A typed operation was applied to a node of another kind.
    #[error("expected a {expected} node, found {actual}")]
    KindMismatch { expected: Kind, actual: Kind },

    /// Text that is not a valid ISO-8601 date.
    #[error("invalid date: {0:?}")]
    InvalidDate(String),
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::IndexOutOfRange { .. } | Error::KeyNotFound(_) => ErrorKind::OutOfRange,
            Error::KindMismatch { .. } => ErrorKind::UnsupportedType,
            Error::InvalidDate(_) => ErrorKind::MalformedDocument,
        }
    }
}

/// Result type for node operations.
pub type Result<T> = std::result::Result<T, Error>;
