//! Serialized plist formats and detection.

use std::fmt;

use plistkit_binary::Trailer;

/// A serialized plist format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Textual XML plist.
    Xml,
    /// Binary `bplist00` plist.
    Binary,
}

impl Format {
    /// Classify a buffer by its leading bytes.
    ///
    /// Anything that does not start with the `bplist00` magic is treated as
    /// XML. This never fails; decoding reports whether the guess was right.
    pub fn detect(data: &[u8]) -> Self {
        if data.starts_with(Trailer::MAGIC) {
            Format::Binary
        } else {
            Format::Xml
        }
    }

    /// Conventional lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Format::Xml => "xml",
            Format::Binary => "binary",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify a buffer by its leading bytes. See [`Format::detect`].
pub fn detect(data: &[u8]) -> Format {
    Format::detect(data)
}
