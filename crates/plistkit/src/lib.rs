//! plistkit - Apple property list library.
//!
//! This crate provides a unified interface to the plistkit crates for reading,
//! editing and writing property lists.
//!
//! # Crates
//!
//! - [`plistkit_common`] - Big-endian reader and error classification
//! - [`plistkit_node`] - Node tree with clone-on-insert containers
//! - [`plistkit_xml`] - XML plist codec
//! - [`plistkit_binary`] - Binary (`bplist00`) plist codec
//!
//! # Example
//!
//! ```
//! use plistkit::prelude::*;
//!
//! let person = Dictionary::new();
//! person.insert("name", "Bob");
//! person.insert("age", 30);
//!
//! let binary = plistkit::encode_binary(person.as_node())?;
//! assert_eq!(plistkit::detect(&binary), Format::Binary);
//!
//! let decoded = plistkit::decode_auto(&binary)?;
//! let xml = plistkit::encode_xml(&decoded)?;
//! assert_eq!(&plistkit::decode_xml(&xml)?, person.as_node());
//! # Ok::<(), plistkit::Error>(())
//! ```

mod document;
mod error;
mod format;

// Re-export all sub-crates
pub use plistkit_binary as binary;
pub use plistkit_common as common;
pub use plistkit_node as node;
pub use plistkit_xml as xml;

pub use document::Document;
pub use error::{Error, Result};
pub use format::{detect, Format};

pub use plistkit_common::ErrorKind;
pub use plistkit_node::{Array, Date, Dictionary, Kind, Node, Value};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{Document, Format};
    pub use plistkit_binary::{BinaryPlist, BinaryPlistBuilder, BuilderConfig};
    pub use plistkit_common::ErrorKind;
    pub use plistkit_node::{Array, Date, Dictionary, Kind, Node, Value};
    pub use plistkit_xml::WriterConfig;
}

/// Decode an XML plist.
pub fn decode_xml(xml: &str) -> Result<Node> {
    Ok(plistkit_xml::from_str(xml)?)
}

/// Decode a binary plist.
pub fn decode_binary(data: &[u8]) -> Result<Node> {
    Ok(plistkit_binary::from_bytes(data)?)
}

/// Decode a buffer in either format.
///
/// Buffers starting with `bplist` go to the binary decoder, so other binary
/// versions are reported as unsupported rather than as broken XML.
pub fn decode_auto(data: &[u8]) -> Result<Node> {
    if plistkit_binary::is_binary_plist(data) {
        decode_binary(data)
    } else {
        Ok(plistkit_xml::from_slice(data)?)
    }
}

/// Encode a tree as an XML plist.
pub fn encode_xml(root: &Node) -> Result<String> {
    Ok(plistkit_xml::to_string(root)?)
}

/// Encode a tree as a binary plist.
pub fn encode_binary(root: &Node) -> Result<Vec<u8>> {
    Ok(plistkit_binary::to_bytes(root)?)
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
