//! Error types for XML plist parsing and writing.

use plistkit_common::ErrorKind;
use plistkit_node::Kind;
use thiserror::Error;

/// Errors that can occur when parsing or writing XML plists.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// XML syntax error reported by the tokenizer.
    #[error("XML error: {0}")]
    Xml(String),

    /// Top-level element other than `<plist>`.
    #[error("expected <plist> root element, found <{0}>")]
    InvalidRoot(String),

    /// No `<plist>` element, or a `<plist>` without a value.
    #[error("document has no root value")]
    MissingRoot,

    /// More than one value inside `<plist>`.
    #[error("<plist> contains more than one value")]
    MultipleRoots,

    /// Anything other than whitespace or comments after `</plist>`.
    #[error("content after </plist>")]
    ContentAfterRoot,

    /// Document ended with elements still open.
    #[error("unexpected end of document inside <{0}>")]
    UnexpectedEof(String),

    /// Element not allowed at this position.
    #[error("unexpected element <{name}> inside {context}")]
    UnexpectedElement { name: String, context: &'static str },

    /// Non-whitespace text outside a leaf element.
    #[error("unexpected text {0:?}")]
    UnexpectedText(String),

    /// Dictionary value without a preceding `<key>`.
    #[error("dictionary value <{0}> has no key")]
    MissingKey(String),

    /// Dictionary `<key>` without a following value.
    #[error("dictionary key {0:?} has no value")]
    UnbalancedKey(String),

    /// Unparsable `<integer>` text.
    #[error("invalid integer: {0:?}")]
    InvalidInteger(String),

    /// Unparsable `<real>` text.
    #[error("invalid real: {0:?}")]
    InvalidReal(String),

    /// Unparsable `<date>` text.
    #[error("invalid date: {0:?}")]
    InvalidDate(String),

    /// Invalid base64 inside `<data>`.
    #[error("invalid base64 data: {0}")]
    InvalidBase64(String),

    /// Boolean element with content.
    #[error("<{0}> must be empty")]
    NonEmptyBoolean(String),

    /// A node kind the XML format cannot express.
    #[error("{0} values cannot be written as XML")]
    UnsupportedType(Kind),

    /// A dictionary that would be read back as a UID.
    #[error("dictionary holding only a CF$UID integer would be read back as a UID")]
    UidShapedDictionary,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::UnsupportedType(_) | Error::UidShapedDictionary => ErrorKind::UnsupportedType,
            _ => ErrorKind::MalformedDocument,
        }
    }
}

/// Result type for XML plist operations.
pub type Result<T> = std::result::Result<T, Error>;
