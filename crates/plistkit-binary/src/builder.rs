//! Binary plist writer.
//!
//! The node tree is flattened into an object table. Containers become lists
//! of object references, and equal scalars can share one object.

use std::hash::BuildHasherDefault;

use byteorder::{BigEndian, WriteBytesExt};
use hashbrown::HashMap as FastHashMap;
use plistkit_common::IntoBytes;
use plistkit_node::{Date, Node, Value};
use rustc_hash::FxHasher;

use crate::marker::{Marker, EXTENDED_LENGTH};
use crate::trailer::Trailer;
use crate::Result;

type FxHashMap<K, V> = FastHashMap<K, V, BuildHasherDefault<FxHasher>>;

/// Options for [`BinaryPlistBuilder`].
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Write equal scalars (strings, numbers, dates, data, UIDs) once and
    /// reference that single object from every place it occurs.
    pub deduplicate: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self { deduplicate: true }
    }
}

/// A scalar value in hashable form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Scalar {
    String(String),
    Integer(i128),
    /// Bit pattern of an `f64`.
    Real(u64),
    Boolean(bool),
    Date(Date),
    Data(Vec<u8>),
    Uid(u64),
    Null,
}

/// An entry in the flattened object table.
#[derive(Debug)]
enum Object {
    Scalar(Scalar),
    Array(Vec<usize>),
    Dictionary { keys: Vec<usize>, values: Vec<usize> },
}

/// Builder for binary plists.
pub struct BinaryPlistBuilder {
    config: BuilderConfig,
    objects: Vec<Object>,
    scalars: FxHashMap<Scalar, usize>,
}

impl BinaryPlistBuilder {
    /// Create a builder with default options.
    pub fn new() -> Self {
        Self::with_config(BuilderConfig::default())
    }

    /// Create a builder with custom options.
    pub fn with_config(config: BuilderConfig) -> Self {
        Self {
            config,
            objects: Vec::new(),
            scalars: FxHashMap::default(),
        }
    }

    /// Serialize the tree rooted at `root` into a complete document.
    pub fn build(mut self, root: &Node) -> Result<Vec<u8>> {
        let root_index = self.flatten(root);

        let ref_size = min_width(self.objects.len().saturating_sub(1) as u64);

        let mut out = Vec::new();
        out.extend_from_slice(Trailer::MAGIC);

        let mut offsets = Vec::with_capacity(self.objects.len());
        for object in &self.objects {
            offsets.push(out.len() as u64);
            write_object(&mut out, object, ref_size)?;
        }

        let table_offset = out.len() as u64;
        let offset_size = min_width(offsets.last().copied().unwrap_or(0));
        for offset in &offsets {
            out.write_uint::<BigEndian>(*offset, offset_size)?;
        }

        let trailer = Trailer::new(
            offset_size as u8,
            ref_size as u8,
            offsets.len() as u64,
            root_index as u64,
            table_offset,
        );
        out.extend_from_slice(trailer.as_bytes());
        Ok(out)
    }

    /// Add `node` and everything below it, returning its object index.
    fn flatten(&mut self, node: &Node) -> usize {
        match node.value() {
            Value::Dictionary(dict) => {
                let index = self.reserve();
                let mut keys = Vec::with_capacity(dict.len());
                let mut values = Vec::with_capacity(dict.len());
                for (key, value) in dict.iter() {
                    keys.push(self.add_scalar(Scalar::String(key)));
                    values.push(self.flatten(&value));
                }
                self.objects[index] = Object::Dictionary { keys, values };
                index
            }
            Value::Array(array) => {
                let index = self.reserve();
                let refs = array.iter().map(|element| self.flatten(&element)).collect();
                self.objects[index] = Object::Array(refs);
                index
            }
            Value::String(s) => self.add_scalar(Scalar::String(s)),
            Value::Integer(i) => self.add_scalar(Scalar::Integer(i)),
            Value::Real(r) => self.add_scalar(Scalar::Real(r.to_bits())),
            Value::Boolean(b) => self.add_scalar(Scalar::Boolean(b)),
            Value::Date(d) => self.add_scalar(Scalar::Date(d)),
            Value::Data(d) => self.add_scalar(Scalar::Data(d)),
            Value::Uid(u) => self.add_scalar(Scalar::Uid(u)),
            Value::Null => self.add_scalar(Scalar::Null),
        }
    }

    /// Claim a slot for a container whose references are not known yet.
    fn reserve(&mut self) -> usize {
        self.objects.push(Object::Array(Vec::new()));
        self.objects.len() - 1
    }

    fn add_scalar(&mut self, scalar: Scalar) -> usize {
        if self.config.deduplicate {
            if let Some(&index) = self.scalars.get(&scalar) {
                return index;
            }
            self.scalars.insert(scalar.clone(), self.objects.len());
        }
        self.objects.push(Object::Scalar(scalar));
        self.objects.len() - 1
    }
}

impl Default for BinaryPlistBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Smallest of 1, 2, 4 or 8 bytes that holds `value`.
fn min_width(value: u64) -> usize {
    if value <= 0xFF {
        1
    } else if value <= 0xFFFF {
        2
    } else if value <= 0xFFFF_FFFF {
        4
    } else {
        8
    }
}

fn write_object(out: &mut Vec<u8>, object: &Object, ref_size: usize) -> Result<()> {
    match object {
        Object::Scalar(scalar) => write_scalar(out, scalar)?,
        Object::Array(refs) => {
            write_marker(out, Marker::Array, refs.len())?;
            write_refs(out, refs, ref_size)?;
        }
        Object::Dictionary { keys, values } => {
            write_marker(out, Marker::Dictionary, keys.len())?;
            write_refs(out, keys, ref_size)?;
            write_refs(out, values, ref_size)?;
        }
    }
    Ok(())
}

fn write_scalar(out: &mut Vec<u8>, scalar: &Scalar) -> Result<()> {
    match scalar {
        Scalar::Null => out.write_u8(Marker::Null.to_byte())?,
        Scalar::Boolean(false) => out.write_u8(Marker::False.to_byte())?,
        Scalar::Boolean(true) => out.write_u8(Marker::True.to_byte())?,
        Scalar::Integer(value) => write_integer(out, *value)?,
        Scalar::Real(bits) => {
            out.write_u8(Marker::Real(3).to_byte())?;
            out.write_u64::<BigEndian>(*bits)?;
        }
        Scalar::Date(date) => {
            out.write_u8(Marker::Date.to_byte())?;
            out.write_f64::<BigEndian>(date.to_apple_seconds())?;
        }
        Scalar::Data(bytes) => {
            write_marker(out, Marker::Data, bytes.len())?;
            out.extend_from_slice(bytes);
        }
        Scalar::String(s) if s.is_ascii() => {
            write_marker(out, Marker::AsciiString, s.len())?;
            out.extend_from_slice(s.as_bytes());
        }
        Scalar::String(s) => {
            let units: Vec<u16> = s.encode_utf16().collect();
            write_marker(out, Marker::Utf16String, units.len())?;
            for unit in units {
                out.write_u16::<BigEndian>(unit)?;
            }
        }
        Scalar::Uid(value) => {
            let width = min_width(*value);
            out.write_u8(Marker::Uid(width as u8 - 1).to_byte())?;
            out.write_uint::<BigEndian>(*value, width)?;
        }
    }
    Ok(())
}

/// Write an integer object in the narrowest body that round-trips.
///
/// Narrow bodies are read back unsigned, so negative values always take at
/// least 8 bytes.
fn write_integer(out: &mut Vec<u8>, value: i128) -> Result<()> {
    if (0..=0xFF).contains(&value) {
        out.write_u8(Marker::Integer(0).to_byte())?;
        out.write_u8(value as u8)?;
    } else if (0..=0xFFFF).contains(&value) {
        out.write_u8(Marker::Integer(1).to_byte())?;
        out.write_u16::<BigEndian>(value as u16)?;
    } else if (0..=0xFFFF_FFFF).contains(&value) {
        out.write_u8(Marker::Integer(2).to_byte())?;
        out.write_u32::<BigEndian>(value as u32)?;
    } else if let Ok(value) = i64::try_from(value) {
        out.write_u8(Marker::Integer(3).to_byte())?;
        out.write_i64::<BigEndian>(value)?;
    } else {
        out.write_u8(Marker::Integer(4).to_byte())?;
        out.write_i128::<BigEndian>(value)?;
    }
    Ok(())
}

/// Write a marker carrying `len`, spilling into an integer object when the
/// nibble is too small.
fn write_marker(out: &mut Vec<u8>, marker: fn(u8) -> Marker, len: usize) -> Result<()> {
    if len < EXTENDED_LENGTH as usize {
        out.write_u8(marker(len as u8).to_byte())?;
    } else {
        out.write_u8(marker(EXTENDED_LENGTH).to_byte())?;
        write_integer(out, len as i128)?;
    }
    Ok(())
}

fn write_refs(out: &mut Vec<u8>, refs: &[usize], ref_size: usize) -> Result<()> {
    for &reference in refs {
        out.write_uint::<BigEndian>(reference as u64, ref_size)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BinaryPlist;
    use plistkit_node::{Array, Dictionary};

    fn round_trip(node: &Node) -> Node {
        let bytes = BinaryPlistBuilder::new().build(node).unwrap();
        BinaryPlist::parse(&bytes).unwrap().root().unwrap()
    }

    #[test]
    fn test_builder_basic() {
        let array = Array::from_iter([Node::boolean(true), Node::boolean(false), Node::real(3.14)]);
        let bytes = BinaryPlistBuilder::new().build(array.as_node()).unwrap();

        assert_eq!(&bytes[..8], b"bplist00");
        assert_eq!(&bytes[8..12], &[0xA3, 0x01, 0x02, 0x03]);
        assert_eq!(&bytes[12..14], &[0x09, 0x08]);
        assert_eq!(bytes[14], 0x23);
        assert_eq!(&bytes[15..23], &3.14f64.to_be_bytes());
        assert_eq!(&bytes[23..27], &[8, 12, 13, 14]);
        assert_eq!(bytes.len(), 27 + Trailer::SIZE);

        let decoded = BinaryPlist::parse(&bytes).unwrap().root().unwrap();
        assert_eq!(&decoded, array.as_node());
    }

    #[test]
    fn test_round_trip_every_kind() {
        let dict = Dictionary::new();
        dict.insert("string", "Bob");
        dict.insert("unicode", "caf\u{e9} \u{1F600}");
        dict.insert("integer", -42);
        dict.insert("real", 0.1);
        dict.insert("boolean", true);
        dict.insert("date", Date::new(700_000_000, 250_000));
        dict.insert("data", vec![0u8, 1, 2, 255]);
        dict.insert("uid", Node::uid(70_000));
        dict.insert("null", Node::null());
        dict.insert("empty_array", Array::new());
        dict.insert("empty_dict", Dictionary::new());
        dict.insert("nested", Array::from_iter([Array::from_iter([1, 2])]));

        let decoded = round_trip(dict.as_node());
        assert_eq!(&decoded, dict.as_node());

        let decoded = decoded.as_dictionary().unwrap();
        assert_eq!(decoded.keys(), dict.keys());
        assert_eq!(decoded.get("uid").unwrap().as_uid(), Some(70_000));
    }

    #[test]
    fn test_date_extremes() {
        for date in [Date::MIN, Date::MAX, Date::new(i64::MAX, 0), Date::new(i64::MIN, 0)] {
            assert_eq!(round_trip(&Node::date(date)).as_date(), Some(date));
        }
    }

    #[test]
    fn test_integer_edges() {
        let values: [i128; 12] = [
            0,
            -1,
            255,
            256,
            65_536,
            u32::MAX as i128,
            u32::MAX as i128 + 1,
            i64::MIN as i128,
            i64::MAX as i128,
            u64::MAX as i128,
            i128::MIN,
            i128::MAX,
        ];
        for value in values {
            let decoded = round_trip(&Node::integer(value));
            assert_eq!(decoded.as_integer(), Some(value), "value {value}");
        }
    }

    #[test]
    fn test_negative_integers_use_eight_bytes() {
        let bytes = BinaryPlistBuilder::new().build(&Node::integer(-1)).unwrap();
        assert_eq!(bytes[8], 0x13);
        assert_eq!(&bytes[9..17], &[0xFF; 8]);
    }

    #[test]
    fn test_extended_lengths() {
        let text = "x".repeat(300);
        let array = Array::from_iter((0..20).map(|i| Node::integer(i)));
        let root = Array::from_iter([Node::string(text.as_str()), array.into_node()]);

        let decoded = round_trip(root.as_node()).as_array().unwrap();
        assert_eq!(decoded.get(0).unwrap().as_string(), Some(text));
        assert_eq!(decoded.get(1).unwrap().as_array().unwrap().len(), 20);
    }

    #[test]
    fn test_wide_references() {
        let array = Array::from_iter((0..300).map(|i| Node::integer(i)));
        let bytes = BinaryPlistBuilder::new().build(array.as_node()).unwrap();

        let plist = BinaryPlist::parse(&bytes).unwrap();
        assert_eq!(plist.trailer().object_ref_size, 2);
        assert_eq!(plist.trailer().offset_size, 2);
        assert_eq!(plist.object_count(), 301);
        assert_eq!(&plist.root().unwrap(), array.as_node());
    }

    #[test]
    fn test_scalar_deduplication() {
        let array = Array::from_iter(["same", "same", "same"]);
        let dict = Dictionary::new();
        dict.insert("same", "same");
        array.push(dict);

        let bytes = BinaryPlistBuilder::new().build(array.as_node()).unwrap();
        let plist = BinaryPlist::parse(&bytes).unwrap();
        // Root array, one "same" string and the dictionary.
        assert_eq!(plist.object_count(), 3);
        assert_eq!(&plist.root().unwrap(), array.as_node());

        let config = BuilderConfig { deduplicate: false };
        let bytes = BinaryPlistBuilder::with_config(config).build(array.as_node()).unwrap();
        let plist = BinaryPlist::parse(&bytes).unwrap();
        assert_eq!(plist.object_count(), 7);
        assert_eq!(&plist.root().unwrap(), array.as_node());
    }

    #[test]
    fn test_containers_are_never_shared() {
        let inner = Array::from_iter([1]);
        let root = Array::from_iter([&inner, &inner]);

        let bytes = BinaryPlistBuilder::new().build(root.as_node()).unwrap();
        let plist = BinaryPlist::parse(&bytes).unwrap();
        // Root, two arrays, one shared integer.
        assert_eq!(plist.object_count(), 4);
    }

    #[test]
    fn test_scalar_root() {
        let decoded = round_trip(&Node::string("just a string"));
        assert_eq!(decoded.as_string().as_deref(), Some("just a string"));
    }
}
