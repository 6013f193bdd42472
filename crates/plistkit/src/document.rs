//! A decoded plist together with the format it came from.

use plistkit_node::Node;

use crate::{decode_auto, decode_xml, encode_binary, encode_xml, Format, Result};

/// A plist root node and its serialized format.
///
/// # Example
///
/// ```
/// use plistkit::{Document, Format};
///
/// let doc = Document::from_xml(
///     r#"<plist version="1.0"><array><true/><false/><real>3.14</real></array></plist>"#,
/// )?;
/// assert_eq!(doc.format(), Format::Xml);
///
/// let binary = doc.to_binary()?;
/// let reread = Document::from_bytes(&binary)?;
/// assert!(reread.is_binary());
/// assert_eq!(reread.root(), doc.root());
/// # Ok::<(), plistkit::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    root: Node,
    format: Format,
}

impl Document {
    /// Wrap a tree, tagging it with the format it should be written in.
    pub fn new(root: Node, format: Format) -> Self {
        Self { root, format }
    }

    /// Decode a buffer in either format.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let format = Format::detect(data);
        let root = decode_auto(data)?;
        Ok(Self { root, format })
    }

    /// Decode an XML plist.
    pub fn from_xml(xml: &str) -> Result<Self> {
        Ok(Self {
            root: decode_xml(xml)?,
            format: Format::Xml,
        })
    }

    /// The root node.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Take the root node.
    pub fn into_root(self) -> Node {
        self.root
    }

    /// Format the document was decoded from or created for.
    pub fn format(&self) -> Format {
        self.format
    }

    pub fn is_binary(&self) -> bool {
        self.format == Format::Binary
    }

    /// Encode as XML.
    pub fn to_xml(&self) -> Result<String> {
        encode_xml(&self.root)
    }

    /// Encode as a binary plist.
    pub fn to_binary(&self) -> Result<Vec<u8>> {
        encode_binary(&self.root)
    }

    /// Encode in `format`.
    pub fn to_format(&self, format: Format) -> Result<Vec<u8>> {
        match format {
            Format::Xml => self.to_xml().map(String::into_bytes),
            Format::Binary => self.to_binary(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plistkit_common::ErrorKind;
    use plistkit_node::Dictionary;

    #[test]
    fn test_format_follows_input() {
        let dict = Dictionary::new();
        dict.insert("name", "Bob");
        let doc = Document::new(dict.into_node(), Format::Binary);

        let binary = doc.to_format(Format::Binary).unwrap();
        let xml = doc.to_format(Format::Xml).unwrap();

        let from_binary = Document::from_bytes(&binary).unwrap();
        let from_xml = Document::from_bytes(&xml).unwrap();
        assert!(from_binary.is_binary());
        assert_eq!(from_xml.format(), Format::Xml);
        assert_eq!(from_binary.root(), from_xml.root());
    }

    #[test]
    fn test_null_cannot_become_xml() {
        let doc = Document::new(Node::null(), Format::Binary);
        assert!(doc.to_binary().is_ok());
        assert_eq!(doc.to_xml().unwrap_err().kind(), ErrorKind::UnsupportedType);
    }

    #[test]
    fn test_into_root() {
        let doc = Document::new(Node::integer(5), Format::Xml);
        assert_eq!(doc.into_root().as_i64(), Some(5));
    }
}
