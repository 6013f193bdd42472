//! Error classification shared by every plistkit crate.

use std::fmt;

/// Coarse category of a plistkit failure.
///
/// Each crate keeps its own detailed error enum; `kind()` on those errors maps
/// them onto one of these categories so callers can react without matching
/// every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Structural parse failure: bad magic, truncated data, unbalanced tags,
    /// unparsable literals, cycles.
    MalformedDocument,
    /// The requested conversion cannot be expressed in the target.
    UnsupportedType,
    /// Array index or dictionary key not present.
    OutOfRange,
    /// Decoded layout metadata disagrees with itself.
    Integrity,
    /// Writing to an output sink failed.
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::MalformedDocument => "malformed document",
            ErrorKind::UnsupportedType => "unsupported type",
            ErrorKind::OutOfRange => "out of range",
            ErrorKind::Integrity => "integrity",
            ErrorKind::Io => "I/O",
        };
        f.write_str(name)
    }
}
