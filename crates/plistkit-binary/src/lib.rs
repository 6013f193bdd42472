//! Binary property list codec.
//!
//! Reads and writes the `bplist00` format: an 8-byte magic, a table of
//! objects, an offset table locating each object and a 32-byte trailer.
//!
//! - [`BinaryPlist`] - Validates the trailer and offset table, then decodes
//!   objects into a [`Node`] tree
//! - [`BinaryPlistBuilder`] - Flattens a tree back into an object table
//!
//! # Example
//!
//! ```
//! use plistkit_binary::{from_bytes, to_bytes};
//! use plistkit_node::Dictionary;
//!
//! let dict = Dictionary::new();
//! dict.insert("name", "Bob");
//!
//! let bytes = to_bytes(dict.as_node())?;
//! assert!(plistkit_binary::is_binary_plist(&bytes));
//!
//! let root = from_bytes(&bytes)?;
//! assert_eq!(&root, dict.as_node());
//! # Ok::<(), plistkit_binary::Error>(())
//! ```

mod builder;
mod error;
mod marker;
mod parser;
mod trailer;

pub use builder::{BinaryPlistBuilder, BuilderConfig};
pub use error::{Error, Result};
pub use marker::Marker;
pub use parser::{is_binary_plist, BinaryPlist, MAX_DEPTH};
pub use trailer::Trailer;

use plistkit_node::Node;

/// Decode a binary plist into its root node.
pub fn from_bytes(data: &[u8]) -> Result<Node> {
    BinaryPlist::parse(data)?.root()
}

/// Encode the tree rooted at `root` with default options.
pub fn to_bytes(root: &Node) -> Result<Vec<u8>> {
    BinaryPlistBuilder::new().build(root)
}

/// Encode the tree rooted at `root` with custom options.
pub fn to_bytes_with_config(root: &Node, config: BuilderConfig) -> Result<Vec<u8>> {
    BinaryPlistBuilder::with_config(config).build(root)
}
