//! Unified error type.

use plistkit_common::ErrorKind;
use thiserror::Error;

/// Any error raised by the plistkit crates.
#[derive(Debug, Error)]
pub enum Error {
    /// Node tree error.
    #[error("{0}")]
    Node(#[from] plistkit_node::Error),

    /// XML codec error.
    #[error("{0}")]
    Xml(#[from] plistkit_xml::Error),

    /// Binary codec error.
    #[error("{0}")]
    Binary(#[from] plistkit_binary::Error),
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Node(e) => e.kind(),
            Error::Xml(e) => e.kind(),
            Error::Binary(e) => e.kind(),
        }
    }
}

/// Result type for plistkit operations.
pub type Result<T> = std::result::Result<T, Error>;
