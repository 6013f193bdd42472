//! XML plist parser.
//!
//! Walks the quick-xml event stream with an explicit stack of open elements,
//! so nesting depth is bounded by the document rather than the call stack.

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use plistkit_node::{Array, Date, Dictionary, Node};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::{Error, Result, UID_KEY};

/// Maximum element nesting accepted by the parser.
pub const MAX_DEPTH: usize = 512;

/// Leaf elements whose text becomes a scalar.
#[derive(Debug, Clone, Copy)]
enum Leaf {
    String,
    Integer,
    Real,
    Date,
    Data,
    Boolean(bool),
}

/// An open element.
enum Frame {
    Plist { value: Option<Node> },
    Dict { dict: Dictionary, key: Option<String> },
    Array(Array),
    Key(String),
    Leaf { leaf: Leaf, text: String },
}

impl Frame {
    fn tag(&self) -> &'static str {
        match self {
            Frame::Plist { .. } => "plist",
            Frame::Dict { .. } => "dict",
            Frame::Array(_) => "array",
            Frame::Key(_) => "key",
            Frame::Leaf { leaf, .. } => match leaf {
                Leaf::String => "string",
                Leaf::Integer => "integer",
                Leaf::Real => "real",
                Leaf::Date => "date",
                Leaf::Data => "data",
                Leaf::Boolean(true) => "true",
                Leaf::Boolean(false) => "false",
            },
        }
    }

    /// Text buffer of a leaf or key element.
    fn text_mut(&mut self) -> Option<&mut String> {
        match self {
            Frame::Key(text) | Frame::Leaf { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Parse an XML plist from UTF-8 bytes.
pub fn from_slice(xml: &[u8]) -> Result<Node> {
    from_str(std::str::from_utf8(xml)?)
}

/// Parse an XML plist from text.
///
/// # Example
///
/// ```
/// let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
/// <plist version="1.0">
/// <dict>
///     <key>name</key>
///     <string>Bob</string>
///     <key>age</key>
///     <integer>30</integer>
/// </dict>
/// </plist>"#;
///
/// let root = plistkit_xml::from_str(xml).unwrap();
/// let dict = root.as_dictionary().unwrap();
/// assert_eq!(dict.get("age").unwrap().as_i64(), Some(30));
/// ```
pub fn from_str(xml: &str) -> Result<Node> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut parser = Parser::default();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => parser.open(&e)?,
            Ok(Event::Empty(e)) => {
                parser.open(&e)?;
                parser.close()?;
            }
            Ok(Event::End(_)) => parser.close()?,
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(|e| Error::Xml(e.to_string()))?;
                parser.text(&text)?;
            }
            Ok(Event::CData(e)) => {
                let text = std::str::from_utf8(&e)?;
                parser.text(text)?;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {} // Declarations, DOCTYPE, comments, processing instructions
            Err(e) => return Err(Error::Xml(format!("XML parse error: {}", e))),
        }
    }
    parser.finish()
}

#[derive(Default)]
struct Parser {
    stack: Vec<Frame>,
    root: Option<Node>,
    closed: bool,
}

impl Parser {
    fn open(&mut self, start: &BytesStart<'_>) -> Result<()> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();

        let Some(top) = self.stack.last() else {
            if self.closed {
                return Err(Error::ContentAfterRoot);
            }
            if name != "plist" {
                return Err(Error::InvalidRoot(name));
            }
            self.stack.push(Frame::Plist { value: None });
            return Ok(());
        };

        if self.stack.len() >= MAX_DEPTH {
            return Err(Error::Xml(format!("nesting deeper than {MAX_DEPTH} levels")));
        }

        match top {
            Frame::Key(_) | Frame::Leaf { .. } => {
                return Err(Error::UnexpectedElement {
                    name,
                    context: top.tag(),
                })
            }
            Frame::Dict { key: None, .. } if name != "key" => return Err(Error::MissingKey(name)),
            Frame::Dict { key: Some(key), .. } if name == "key" => {
                return Err(Error::UnbalancedKey(key.clone()))
            }
            _ if name == "key" && !matches!(top, Frame::Dict { .. }) => {
                return Err(Error::UnexpectedElement {
                    name,
                    context: top.tag(),
                })
            }
            _ => {}
        }

        let frame = match name.as_str() {
            "key" => Frame::Key(String::new()),
            "dict" => Frame::Dict {
                dict: Dictionary::new(),
                key: None,
            },
            "array" => Frame::Array(Array::new()),
            "string" => leaf(Leaf::String),
            "integer" => leaf(Leaf::Integer),
            "real" => leaf(Leaf::Real),
            "date" => leaf(Leaf::Date),
            "data" => leaf(Leaf::Data),
            "true" => leaf(Leaf::Boolean(true)),
            "false" => leaf(Leaf::Boolean(false)),
            _ => {
                let context = self.stack.last().map_or("document", Frame::tag);
                return Err(Error::UnexpectedElement { name, context });
            }
        };
        self.stack.push(frame);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let frame = self
            .stack
            .pop()
            .ok_or_else(|| Error::Xml("unmatched closing tag".to_string()))?;

        let node = match frame {
            Frame::Plist { value } => {
                self.root = Some(value.ok_or(Error::MissingRoot)?);
                self.closed = true;
                return Ok(());
            }
            Frame::Key(text) => {
                if let Some(Frame::Dict { key, .. }) = self.stack.last_mut() {
                    *key = Some(text);
                }
                return Ok(());
            }
            Frame::Dict { dict, key } => {
                if let Some(key) = key {
                    return Err(Error::UnbalancedKey(key));
                }
                uid_or_dictionary(dict)
            }
            Frame::Array(array) => array.into_node(),
            Frame::Leaf { leaf, text } => parse_leaf(leaf, text)?,
        };
        self.attach(node)
    }

    /// Store a finished value in the enclosing element.
    fn attach(&mut self, node: Node) -> Result<()> {
        match self.stack.last_mut() {
            Some(Frame::Plist { value }) => {
                if value.is_some() {
                    return Err(Error::MultipleRoots);
                }
                *value = Some(node);
            }
            Some(Frame::Dict { dict, key }) => {
                let key = key.take().ok_or_else(|| Error::MissingKey(node.kind().to_string()))?;
                dict.insert(key, node);
            }
            Some(Frame::Array(array)) => {
                array.push(node);
            }
            Some(frame) => {
                return Err(Error::UnexpectedElement {
                    name: node.kind().to_string(),
                    context: frame.tag(),
                })
            }
            None => return Err(Error::MissingRoot),
        }
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<()> {
        match self.stack.last_mut().and_then(Frame::text_mut) {
            Some(buffer) => buffer.push_str(text),
            None if text.trim().is_empty() => {}
            None if self.closed => return Err(Error::ContentAfterRoot),
            None => return Err(Error::UnexpectedText(text.trim().to_string())),
        }
        Ok(())
    }

    fn finish(self) -> Result<Node> {
        if let Some(frame) = self.stack.last() {
            return Err(Error::UnexpectedEof(frame.tag().to_string()));
        }
        self.root.ok_or(Error::MissingRoot)
    }
}

fn leaf(leaf: Leaf) -> Frame {
    Frame::Leaf {
        leaf,
        text: String::new(),
    }
}

/// The UID encoded by a dictionary holding only `CF$UID` with an unsigned
/// integer.
pub(crate) fn uid_encoding(dict: &Dictionary) -> Option<u64> {
    if dict.len() != 1 {
        return None;
    }
    dict.get(UID_KEY).and_then(|value| value.as_u64())
}

fn uid_or_dictionary(dict: Dictionary) -> Node {
    match uid_encoding(&dict) {
        Some(uid) => Node::uid(uid),
        None => dict.into_node(),
    }
}

fn parse_leaf(leaf: Leaf, text: String) -> Result<Node> {
    let node = match leaf {
        Leaf::String => Node::string(text),
        Leaf::Integer => Node::integer(parse_integer(text.trim()).ok_or(Error::InvalidInteger(text))?),
        Leaf::Real => {
            let value = text.trim().parse::<f64>().map_err(|_| Error::InvalidReal(text))?;
            Node::real(value)
        }
        Leaf::Date => Node::date(text.trim().parse::<Date>().map_err(|_| Error::InvalidDate(text))?),
        Leaf::Data => {
            let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
            let bytes = BASE64_STANDARD
                .decode(compact)
                .map_err(|e| Error::InvalidBase64(e.to_string()))?;
            Node::data(bytes)
        }
        Leaf::Boolean(value) => {
            if !text.trim().is_empty() {
                return Err(Error::NonEmptyBoolean(value.to_string()));
            }
            Node::boolean(value)
        }
    };
    Ok(node)
}

/// Decimal with optional sign, or `0x` hexadecimal.
fn parse_integer(text: &str) -> Option<i128> {
    let (negative, digits) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    let magnitude = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => u128::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<u128>().ok()?,
    };
    if negative {
        0i128.checked_sub_unsigned(magnitude)
    } else {
        i128::try_from(magnitude).ok()
    }
}
