//! XML property list codec.
//!
//! Parses and writes the textual plist format:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
//! <plist version="1.0">
//!     <dict>
//!         <key>name</key>
//!         <string>Bob</string>
//!     </dict>
//! </plist>
//! ```
//!
//! UIDs, which have no XML element of their own, are written as a dictionary
//! holding a single `CF$UID` integer and read back as UIDs. Null values, and
//! ordinary dictionaries of that exact shape, cannot be written.
//!
//! # Example
//!
//! ```
//! use plistkit_node::Dictionary;
//!
//! let dict = Dictionary::new();
//! dict.insert("name", "Bob");
//! dict.insert("age", 30);
//!
//! let xml = plistkit_xml::to_string(dict.as_node())?;
//! let root = plistkit_xml::from_str(&xml)?;
//! assert_eq!(&root, dict.as_node());
//! # Ok::<(), plistkit_xml::Error>(())
//! ```

mod error;
mod parser;
mod writer;

pub use error::{Error, Result};
pub use parser::{from_slice, from_str, MAX_DEPTH};
pub use writer::{to_string, to_string_with_config, to_writer, WriterConfig};

/// Dictionary key that marks a UID in XML.
pub const UID_KEY: &str = "CF$UID";
