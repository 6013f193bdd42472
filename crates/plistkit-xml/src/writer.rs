//! XML plist writer.

use std::io::Write;

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use plistkit_node::{Kind, Node, Value};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::parser::uid_encoding;
use crate::{Error, Result, UID_KEY};

const DOCTYPE: &str = r#"plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd""#;

/// Output options for the XML writer.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Indentation character.
    pub indent_char: u8,
    /// Indentation characters per nesting level.
    pub indent_size: usize,
    /// Column at which base64 `<data>` is wrapped. 0 disables wrapping.
    pub data_line_width: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            indent_char: b'\t',
            indent_size: 1,
            data_line_width: 68,
        }
    }
}

/// Serialize a tree to an XML plist string with default options.
pub fn to_string(root: &Node) -> Result<String> {
    to_string_with_config(root, &WriterConfig::default())
}

/// Serialize a tree to an XML plist string.
pub fn to_string_with_config(root: &Node, config: &WriterConfig) -> Result<String> {
    let mut output = Vec::new();
    to_writer(&mut output, root, config)?;
    String::from_utf8(output).map_err(|e| Error::Xml(e.to_string()))
}

/// Serialize a tree as an XML plist into `writer`.
///
/// Fails with [`Error::UnsupportedType`] if the tree holds a null value, and
/// with [`Error::UidShapedDictionary`] if it holds a dictionary whose only
/// entry is a `CF$UID` unsigned integer. Nothing is written in either case.
pub fn to_writer<W: Write>(writer: W, root: &Node, config: &WriterConfig) -> Result<()> {
    ensure_representable(root)?;

    let mut xml_writer = Writer::new_with_indent(writer, config.indent_char, config.indent_size);
    xml_writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)?;
    xml_writer
        .write_event(Event::DocType(BytesText::from_escaped(DOCTYPE)))
        .map_err(xml_error)?;

    let plist = BytesStart::new("plist").with_attributes([("version", "1.0")]);
    xml_writer.write_event(Event::Start(plist)).map_err(xml_error)?;
    write_value(&mut xml_writer, root, config)?;
    xml_writer
        .write_event(Event::End(BytesEnd::new("plist")))
        .map_err(xml_error)?;

    xml_writer.get_mut().write_all(b"\n")?;
    Ok(())
}

fn xml_error(e: impl std::fmt::Display) -> Error {
    Error::Xml(e.to_string())
}

/// Reject trees that contain a kind XML cannot express, or a dictionary that
/// would read back as a UID.
fn ensure_representable(node: &Node) -> Result<()> {
    match node.value() {
        Value::Null => Err(Error::UnsupportedType(Kind::Null)),
        Value::Dictionary(dict) if uid_encoding(&dict).is_some() => {
            Err(Error::UidShapedDictionary)
        }
        Value::Dictionary(dict) => dict.values().iter().try_for_each(ensure_representable),
        Value::Array(array) => array.iter().try_for_each(|element| ensure_representable(&element)),
        _ => Ok(()),
    }
}

fn write_value<W: Write>(writer: &mut Writer<W>, node: &Node, config: &WriterConfig) -> Result<()> {
    match node.value() {
        Value::Dictionary(dict) => {
            if dict.is_empty() {
                return write_empty(writer, "dict");
            }
            writer
                .write_event(Event::Start(BytesStart::new("dict")))
                .map_err(xml_error)?;
            for (key, value) in dict.iter() {
                write_text_element(writer, "key", &key)?;
                write_value(writer, &value, config)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new("dict")))
                .map_err(xml_error)?;
        }
        Value::Array(array) => {
            if array.is_empty() {
                return write_empty(writer, "array");
            }
            writer
                .write_event(Event::Start(BytesStart::new("array")))
                .map_err(xml_error)?;
            for element in array.iter() {
                write_value(writer, &element, config)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new("array")))
                .map_err(xml_error)?;
        }
        Value::String(s) => write_text_element(writer, "string", &s)?,
        Value::Integer(i) => write_text_element(writer, "integer", &i.to_string())?,
        Value::Real(r) => write_text_element(writer, "real", &format_real(r))?,
        Value::Boolean(true) => write_empty(writer, "true")?,
        Value::Boolean(false) => write_empty(writer, "false")?,
        Value::Date(d) => write_text_element(writer, "date", &d.to_string())?,
        Value::Data(bytes) => {
            let encoded = wrap_base64(&BASE64_STANDARD.encode(bytes), config.data_line_width);
            write_text_element(writer, "data", &encoded)?;
        }
        Value::Uid(uid) => {
            writer
                .write_event(Event::Start(BytesStart::new("dict")))
                .map_err(xml_error)?;
            write_text_element(writer, "key", UID_KEY)?;
            write_text_element(writer, "integer", &uid.to_string())?;
            writer
                .write_event(Event::End(BytesEnd::new("dict")))
                .map_err(xml_error)?;
        }
        Value::Null => return Err(Error::UnsupportedType(Kind::Null)),
    }
    Ok(())
}

fn write_empty<W: Write>(writer: &mut Writer<W>, tag: &str) -> Result<()> {
    writer
        .write_event(Event::Empty(BytesStart::new(tag)))
        .map_err(xml_error)?;
    Ok(())
}

/// Write `<tag>text</tag>` on one line.
fn write_text_element<W: Write>(writer: &mut Writer<W>, tag: &str, text: &str) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(tag)))
        .map_err(xml_error)?;
    // Always emit the text event, even when empty, so the end tag stays inline.
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_error)?;
    writer
        .write_event(Event::End(BytesEnd::new(tag)))
        .map_err(xml_error)?;
    Ok(())
}

/// Shortest text that parses back to the same value.
fn format_real(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value == f64::INFINITY {
        "+infinity".to_string()
    } else if value == f64::NEG_INFINITY {
        "-infinity".to_string()
    } else {
        format!("{:?}", value)
    }
}

fn wrap_base64(encoded: &str, width: usize) -> String {
    if width == 0 || encoded.len() <= width {
        return encoded.to_string();
    }
    let mut wrapped = String::with_capacity(encoded.len() + encoded.len() / width + 2);
    wrapped.push('\n');
    // Base64 output is ASCII, so byte chunks are valid UTF-8.
    for line in encoded.as_bytes().chunks(width) {
        wrapped.push_str(std::str::from_utf8(line).unwrap_or_default());
        wrapped.push('\n');
    }
    wrapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::from_str;
    use plistkit_common::ErrorKind;
    use plistkit_node::{Array, Date, Dictionary};

    #[test]
    fn test_document_shape() {
        let dict = Dictionary::new();
        dict.insert("name", "Bob");
        dict.insert("age", 30);

        let xml = to_string(dict.as_node()).unwrap();
        let expected = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
            <!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n\
            <plist version=\"1.0\">\n\
            \t<dict>\n\
            \t\t<key>name</key>\n\
            \t\t<string>Bob</string>\n\
            \t\t<key>age</key>\n\
            \t\t<integer>30</integer>\n\
            \t</dict>\n\
            </plist>\n";
        assert_eq!(xml, expected);
        assert_eq!(&from_str(&xml).unwrap(), dict.as_node());
    }

    #[test]
    fn test_escaping() {
        let dict = Dictionary::new();
        dict.insert("a<b>&\"c'", "x < y && y > \"z\" 'w'");

        let xml = to_string(dict.as_node()).unwrap();
        assert!(xml.contains("<key>a&lt;b&gt;&amp;&quot;c&apos;</key>"));
        assert!(xml.contains("<string>x &lt; y &amp;&amp; y &gt; &quot;z&quot; &apos;w&apos;</string>"));
        assert_eq!(&from_str(&xml).unwrap(), dict.as_node());
    }

    #[test]
    fn test_scalars() {
        let array = Array::new();
        array.push(true);
        array.push(false);
        array.push(3.14);
        array.push(1.0);
        array.push(f64::NEG_INFINITY);
        array.push(-7);
        array.push(Date::new(0, 0));
        array.push(Date::new(1, 500));
        array.push("");
        array.push(Array::new());
        array.push(Dictionary::new());

        let xml = to_string(array.as_node()).unwrap();
        for fragment in [
            "<true/>",
            "<false/>",
            "<real>3.14</real>",
            "<real>1.0</real>",
            "<real>-infinity</real>",
            "<integer>-7</integer>",
            "<date>2001-01-01T00:00:00Z</date>",
            "<date>2001-01-01T00:00:01.000500Z</date>",
            "<string></string>",
            "<array/>",
            "<dict/>",
        ] {
            assert!(xml.contains(fragment), "missing {fragment} in {xml}");
        }
        assert_eq!(&from_str(&xml).unwrap(), array.as_node());
    }

    #[test]
    fn test_nan_round_trip() {
        let xml = to_string(&Node::real(f64::NAN)).unwrap();
        assert!(xml.contains("<real>nan</real>"));
        assert!(from_str(&xml).unwrap().as_real().unwrap().is_nan());
    }

    #[test]
    fn test_data_wrapping() {
        let bytes: Vec<u8> = (0..=255).collect();
        let xml = to_string(&Node::data(bytes.clone())).unwrap();
        let base64_lines: Vec<&str> = xml.lines().filter(|line| !line.contains('<')).collect();
        assert_eq!(base64_lines.len(), 6);
        assert!(base64_lines.iter().all(|line| line.len() <= 68));
        assert_eq!(from_str(&xml).unwrap().as_data(), Some(bytes.clone()));

        let config = WriterConfig {
            data_line_width: 0,
            ..WriterConfig::default()
        };
        let xml = to_string_with_config(&Node::data(bytes.clone()), &config).unwrap();
        assert!(xml.contains(&format!("<data>{}</data>", BASE64_STANDARD.encode(&bytes))));
    }

    #[test]
    fn test_date_extremes() {
        let array = Array::from_iter([Date::new(i64::MIN, 0), Date::new(i64::MAX / 2, 0)]);

        let xml = to_string(array.as_node()).unwrap();
        assert!(xml.contains("<date>0001-01-01T00:00:00Z</date>"));
        assert!(xml.contains("<date>9999-12-31T23:59:59.999999Z</date>"));
        assert_eq!(&from_str(&xml).unwrap(), array.as_node());
    }

    #[test]
    fn test_uid_round_trip() {
        let dict = Dictionary::new();
        dict.insert("ref", Node::uid(12));

        let xml = to_string(dict.as_node()).unwrap();
        assert!(xml.contains("<key>CF$UID</key>"));
        let decoded = from_str(&xml).unwrap();
        assert_eq!(decoded.as_dictionary().unwrap().get("ref").unwrap().as_uid(), Some(12));
    }

    #[test]
    fn test_uid_shaped_dictionary_is_rejected() {
        let dict = Dictionary::new();
        dict.insert(UID_KEY, 5);
        let array = Array::from_iter([dict.into_node()]);

        let mut output = Vec::new();
        let err = to_writer(&mut output, array.as_node(), &WriterConfig::default()).unwrap_err();
        assert!(matches!(err, Error::UidShapedDictionary));
        assert_eq!(err.kind(), ErrorKind::UnsupportedType);
        assert!(output.is_empty());

        // Anything that cannot be mistaken for a UID is written as is.
        let dict = Dictionary::new();
        dict.insert(UID_KEY, -5);
        let decoded = from_str(&to_string(dict.as_node()).unwrap()).unwrap();
        assert_eq!(&decoded, dict.as_node());

        dict.insert("other", true);
        let decoded = from_str(&to_string(dict.as_node()).unwrap()).unwrap();
        assert_eq!(&decoded, dict.as_node());
    }

    #[test]
    fn test_null_is_unsupported() {
        let array = Array::from_iter([Node::integer(1)]);
        array.push(Dictionary::from_iter([("nothing", Node::null())]));

        let mut output = Vec::new();
        let err = to_writer(&mut output, array.as_node(), &WriterConfig::default()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedType(Kind::Null)));
        assert_eq!(err.kind(), ErrorKind::UnsupportedType);
        assert!(output.is_empty());
    }

    #[test]
    fn test_custom_indent() {
        let config = WriterConfig {
            indent_char: b' ',
            indent_size: 2,
            ..WriterConfig::default()
        };
        let array = Array::from_iter([1]);
        let xml = to_string_with_config(array.as_node(), &config).unwrap();
        assert!(xml.contains("\n    <integer>1</integer>\n"));
    }
}
