//! Error types for binary plist parsing and writing.

use plistkit_common::ErrorKind;
use thiserror::Error;

/// Errors that can occur when parsing or writing binary plists.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] plistkit_common::Error),

    /// Invalid magic bytes (not a binary plist).
    #[error("invalid binary plist magic: expected 'bplist', got {actual:?}")]
    InvalidMagic { actual: Vec<u8> },

    /// A binary plist version other than `00`.
    #[error("unsupported binary plist version: {0:?}")]
    UnsupportedVersion(String),

    /// Buffer too small to hold a header, one object and a trailer.
    #[error("file too short: {size} bytes (minimum {minimum})")]
    FileTooShort { size: usize, minimum: usize },

    /// Trailer field with an impossible value.
    #[error("invalid trailer: {0}")]
    InvalidTrailer(String),

    /// Offset table extends outside the space between header and trailer.
    #[error("offset table at {offset} with {count} entries does not fit in {size} bytes")]
    OffsetTableOutOfBounds { offset: u64, count: u64, size: usize },

    /// Declared object count disagrees with the size of the offset table.
    #[error("object count {declared} disagrees with offset table of {table_bytes} bytes")]
    ObjectCountMismatch { declared: u64, table_bytes: usize },

    /// Object table declared empty.
    #[error("object table is empty")]
    EmptyObjectTable,

    /// Root object index not in the object table.
    #[error("root object {root} out of range (object count: {count})")]
    RootOutOfRange { root: u64, count: u64 },

    /// Offset table entry pointing outside the object table.
    #[error("object {index} offset {offset} outside object table (ends at {end})")]
    ObjectOffsetOutOfBounds { index: usize, offset: u64, end: usize },

    /// Object reference past the end of the object table.
    #[error("object reference {reference} out of range (object count: {count})")]
    ObjectRefOutOfRange { reference: u64, count: usize },

    /// Unknown object marker byte.
    #[error("invalid object marker: {0:#04x}")]
    InvalidMarker(u8),

    /// Integer object with an unsupported body size.
    #[error("invalid integer width exponent: {0}")]
    InvalidIntegerWidth(u8),

    /// Real object with an unsupported body size.
    #[error("invalid real width exponent: {0}")]
    InvalidRealWidth(u8),

    /// UID object wider than 8 bytes.
    #[error("invalid UID width: {0} bytes")]
    InvalidUidWidth(usize),

    /// Extended length that is not a non-negative integer object.
    #[error("invalid extended length at offset {offset}")]
    InvalidLength { offset: usize },

    /// Date value that is not a finite number of seconds.
    #[error("invalid date value: {0}")]
    InvalidDate(f64),

    /// UTF-16 string with unpaired surrogates.
    #[error("invalid UTF-16 string in object {0}")]
    InvalidUtf16(usize),

    /// Dictionary key that is not a string.
    #[error("dictionary key object {0} is not a string")]
    NonStringKey(usize),

    /// Fill byte used as an object.
    #[error("fill byte used as object {0}")]
    UnexpectedFill(usize),

    /// An object that (indirectly) contains itself.
    #[error("cyclic reference to object {0}")]
    CyclicReference(usize),

    /// Containers nested deeper than the decoder allows.
    #[error("nesting deeper than {0} levels")]
    NestingTooDeep(usize),

    /// Shared references expanding into more nodes than the document can
    /// describe.
    #[error("object graph expands past {0} nodes")]
    TooManyNodes(usize),
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ObjectCountMismatch { .. }
            | Error::EmptyObjectTable
            | Error::RootOutOfRange { .. }
            | Error::ObjectOffsetOutOfBounds { .. } => ErrorKind::Integrity,
            Error::Io(_) => ErrorKind::Io,
            _ => ErrorKind::MalformedDocument,
        }
    }
}

/// Result type for binary plist operations.
pub type Result<T> = std::result::Result<T, Error>;
