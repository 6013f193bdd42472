//! Binary plist parser.

use byteorder::{BigEndian, ByteOrder};
use plistkit_common::BinaryReader;
use plistkit_node::{Array, Date, Dictionary, Node};

use crate::marker::{Marker, EXTENDED_LENGTH};
use crate::trailer::Trailer;
use crate::{Error, Result};

/// Smallest possible document: magic, one single-byte object, one offset
/// entry and the trailer.
const MIN_SIZE: usize = Trailer::MAGIC_LEN + 2 + Trailer::SIZE;

/// Maximum container nesting accepted by the decoder.
pub const MAX_DEPTH: usize = 512;

/// Check if data starts with the binary plist magic (any version).
pub fn is_binary_plist(data: &[u8]) -> bool {
    data.len() >= 6 && &data[..6] == b"bplist"
}

/// A validated binary plist, ready to decode.
///
/// Parsing checks the header, trailer and offset table. Objects are decoded
/// on demand by [`root`](Self::root).
#[derive(Debug)]
pub struct BinaryPlist<'a> {
    data: &'a [u8],
    trailer: Trailer,
    offsets: Vec<usize>,
}

impl<'a> BinaryPlist<'a> {
    /// Parse the header, trailer and offset table of a binary plist.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if !is_binary_plist(data) {
            let actual = data[..data.len().min(6)].to_vec();
            return Err(Error::InvalidMagic { actual });
        }
        if data.len() < Trailer::MAGIC_LEN {
            return Err(Error::FileTooShort {
                size: data.len(),
                minimum: MIN_SIZE,
            });
        }
        if &data[..Trailer::MAGIC_LEN] != Trailer::MAGIC {
            let version = String::from_utf8_lossy(&data[6..Trailer::MAGIC_LEN]).into_owned();
            return Err(Error::UnsupportedVersion(version));
        }
        if data.len() < MIN_SIZE {
            return Err(Error::FileTooShort {
                size: data.len(),
                minimum: MIN_SIZE,
            });
        }

        let trailer_start = data.len() - Trailer::SIZE;
        let trailer: Trailer = BinaryReader::new_at(data, trailer_start)?.read_struct()?;

        let offset_size = trailer.offset_size as usize;
        if !(1..=8).contains(&offset_size) {
            return Err(Error::InvalidTrailer(format!(
                "offset entry width {offset_size}"
            )));
        }
        let ref_size = trailer.object_ref_size as usize;
        if !(1..=8).contains(&ref_size) {
            return Err(Error::InvalidTrailer(format!(
                "object reference width {ref_size}"
            )));
        }

        let count = trailer.object_count.get();
        let table_offset = trailer.offset_table_offset.get();
        let table_end = count
            .checked_mul(offset_size as u64)
            .and_then(|len| len.checked_add(table_offset));
        let table_end = match table_end {
            Some(end) if table_offset > Trailer::MAGIC_LEN as u64 && end <= trailer_start as u64 => {
                end as usize
            }
            _ => {
                return Err(Error::OffsetTableOutOfBounds {
                    offset: table_offset,
                    count,
                    size: data.len(),
                })
            }
        };
        let table_offset = table_offset as usize;

        if count == 0 {
            return Err(Error::EmptyObjectTable);
        }
        if table_end != trailer_start {
            return Err(Error::ObjectCountMismatch {
                declared: count,
                table_bytes: trailer_start - table_offset,
            });
        }
        let root = trailer.root_object.get();
        if root >= count {
            return Err(Error::RootOutOfRange { root, count });
        }

        let mut reader = BinaryReader::new_at(data, table_offset)?;
        let mut offsets = Vec::with_capacity(count as usize);
        for index in 0..count as usize {
            let offset = reader.read_uint(offset_size)?;
            if offset < Trailer::MAGIC_LEN as u64 || offset >= table_offset as u64 {
                return Err(Error::ObjectOffsetOutOfBounds {
                    index,
                    offset,
                    end: table_offset,
                });
            }
            offsets.push(offset as usize);
        }

        Ok(Self {
            data,
            trailer,
            offsets,
        })
    }

    /// The document trailer.
    pub fn trailer(&self) -> &Trailer {
        &self.trailer
    }

    /// Number of objects in the object table.
    pub fn object_count(&self) -> usize {
        self.offsets.len()
    }

    /// Byte offset of each object.
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Index of the root object.
    pub fn root_index(&self) -> usize {
        self.trailer.root_object.get() as usize
    }

    /// Decode the object tree starting at the root object.
    pub fn root(&self) -> Result<Node> {
        self.object(self.root_index())
    }

    /// Decode the object tree starting at object `index`.
    pub fn object(&self, index: usize) -> Result<Node> {
        if index >= self.offsets.len() {
            return Err(Error::ObjectRefOutOfRange {
                reference: index as u64,
                count: self.offsets.len(),
            });
        }
        let table_offset = self.trailer.offset_table_offset.get() as usize;
        let mut decoder = ObjectDecoder {
            objects: &self.data[..table_offset],
            offsets: &self.offsets,
            ref_size: self.trailer.object_ref_size as usize,
            visiting: vec![false; self.offsets.len()],
            depth: 0,
            node_limit: self.data.len(),
            nodes: 0,
        };
        decoder.decode(index)
    }
}

/// Walks the object graph, turning each reachable object into a node.
struct ObjectDecoder<'a> {
    /// Bytes up to the offset table; object bodies never extend past it.
    objects: &'a [u8],
    offsets: &'a [usize],
    ref_size: usize,
    /// Objects on the current path from the root.
    visiting: Vec<bool>,
    depth: usize,
    /// At most one decoded node per document byte.
    node_limit: usize,
    nodes: usize,
}

impl ObjectDecoder<'_> {
    fn decode(&mut self, index: usize) -> Result<Node> {
        if self.visiting[index] {
            return Err(Error::CyclicReference(index));
        }
        if self.depth >= MAX_DEPTH {
            return Err(Error::NestingTooDeep(MAX_DEPTH));
        }
        if self.nodes >= self.node_limit {
            return Err(Error::TooManyNodes(self.node_limit));
        }
        self.nodes += 1;
        self.visiting[index] = true;
        self.depth += 1;
        let node = self.decode_object(index);
        self.depth -= 1;
        self.visiting[index] = false;
        node
    }

    fn decode_object(&mut self, index: usize) -> Result<Node> {
        let mut reader = BinaryReader::new_at(self.objects, self.offsets[index])?;
        let marker = Marker::try_from(reader.read_u8()?)?;

        let node = match marker {
            Marker::Null => Node::null(),
            Marker::False => Node::boolean(false),
            Marker::True => Node::boolean(true),
            Marker::Fill => return Err(Error::UnexpectedFill(index)),
            Marker::Integer(exp) => Node::integer(read_integer_body(&mut reader, exp)?),
            Marker::Real(2) => Node::real(reader.read_f32()? as f64),
            Marker::Real(3) => Node::real(reader.read_f64()?),
            Marker::Real(exp) => return Err(Error::InvalidRealWidth(exp)),
            Marker::Date => {
                let seconds = reader.read_f64()?;
                Node::date(Date::from_apple_seconds(seconds).ok_or(Error::InvalidDate(seconds))?)
            }
            Marker::Data(low) => {
                let len = read_length(&mut reader, low)?;
                Node::data(reader.read_bytes(len)?)
            }
            Marker::AsciiString(low) => {
                let len = read_length(&mut reader, low)?;
                let bytes = reader.read_bytes(len)?;
                Node::string(bytes.iter().map(|&b| char::from(b)).collect::<String>())
            }
            Marker::Utf16String(low) => {
                let len = read_length(&mut reader, low)?;
                let byte_len = len.checked_mul(2).ok_or(Error::InvalidLength {
                    offset: reader.position(),
                })?;
                let bytes = reader.read_bytes(byte_len)?;
                let units: Vec<u16> = bytes.chunks_exact(2).map(BigEndian::read_u16).collect();
                let text = String::from_utf16(&units).map_err(|_| Error::InvalidUtf16(index))?;
                Node::string(text)
            }
            Marker::Uid(low) => {
                let width = low as usize + 1;
                if width > 8 {
                    return Err(Error::InvalidUidWidth(width));
                }
                Node::uid(reader.read_uint(width)?)
            }
            Marker::Array(low) | Marker::Set(low) => {
                let len = read_length(&mut reader, low)?;
                let refs = self.read_refs(&mut reader, len)?;
                let array = Array::new();
                for reference in refs {
                    array.push(self.decode(reference)?);
                }
                array.into_node()
            }
            Marker::Dictionary(low) => {
                let len = read_length(&mut reader, low)?;
                let keys = self.read_refs(&mut reader, len)?;
                let values = self.read_refs(&mut reader, len)?;
                let dict = Dictionary::new();
                for (key_ref, value_ref) in keys.into_iter().zip(values) {
                    let key = self
                        .decode(key_ref)?
                        .as_string()
                        .ok_or(Error::NonStringKey(key_ref))?;
                    dict.insert(key, self.decode(value_ref)?);
                }
                dict.into_node()
            }
        };
        Ok(node)
    }

    /// Read `len` object references, checking each against the object table.
    fn read_refs(&self, reader: &mut BinaryReader<'_>, len: usize) -> Result<Vec<usize>> {
        let total = len.checked_mul(self.ref_size).ok_or(Error::InvalidLength {
            offset: reader.position(),
        })?;
        let bytes = reader.read_bytes(total)?;
        bytes
            .chunks_exact(self.ref_size)
            .map(|chunk| {
                let reference = BigEndian::read_uint(chunk, self.ref_size);
                if reference >= self.offsets.len() as u64 {
                    Err(Error::ObjectRefOutOfRange {
                        reference,
                        count: self.offsets.len(),
                    })
                } else {
                    Ok(reference as usize)
                }
            })
            .collect()
    }
}

/// Read an integer body of `2^exp` bytes.
///
/// 1, 2 and 4 byte bodies are unsigned, 8 and 16 byte bodies are signed.
fn read_integer_body(reader: &mut BinaryReader<'_>, exp: u8) -> Result<i128> {
    let value = match exp {
        0 => reader.read_u8()? as i128,
        1 => reader.read_u16()? as i128,
        2 => reader.read_u32()? as i128,
        3 => reader.read_i64()? as i128,
        4 => reader.read_i128()?,
        _ => return Err(Error::InvalidIntegerWidth(exp)),
    };
    Ok(value)
}

/// Resolve a marker's length nibble, reading the extended length if needed.
fn read_length(reader: &mut BinaryReader<'_>, low: u8) -> Result<usize> {
    if low != EXTENDED_LENGTH {
        return Ok(low as usize);
    }
    let offset = reader.position();
    let length = match Marker::try_from(reader.read_u8()?) {
        Ok(Marker::Integer(exp)) => read_integer_body(reader, exp)?,
        _ => return Err(Error::InvalidLength { offset }),
    };
    usize::try_from(length).map_err(|_| Error::InvalidLength { offset })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BinaryPlistBuilder;
    use plistkit_common::{ErrorKind, IntoBytes};

    /// Assemble a document from raw object bodies, with 4-byte offsets.
    fn document(objects: &[&[u8]], ref_size: u8, root: u64) -> Vec<u8> {
        let mut out = Trailer::MAGIC.to_vec();
        let mut offsets = Vec::new();
        for object in objects {
            offsets.push(out.len() as u32);
            out.extend_from_slice(object);
        }
        let table_offset = out.len() as u64;
        for offset in offsets {
            out.extend_from_slice(&offset.to_be_bytes());
        }
        let trailer = Trailer::new(4, ref_size, objects.len() as u64, root, table_offset);
        out.extend_from_slice(trailer.as_bytes());
        out
    }

    fn decode(data: &[u8]) -> Result<Node> {
        BinaryPlist::parse(data)?.root()
    }

    /// Overwrite the big-endian trailer field starting at `field` bytes into
    /// the trailer.
    fn patch_trailer(data: &mut [u8], field: usize, value: u64) {
        let start = data.len() - Trailer::SIZE + field;
        data[start..start + 8].copy_from_slice(&value.to_be_bytes());
    }

    #[test]
    fn test_single_scalar() {
        let data = document(&[&[0x09]], 1, 0);
        let plist = BinaryPlist::parse(&data).unwrap();
        assert_eq!(plist.object_count(), 1);
        assert_eq!(plist.offsets(), &[8]);
        assert_eq!(plist.root().unwrap().as_boolean(), Some(true));
    }

    #[test]
    fn test_magic_and_version() {
        let err = BinaryPlist::parse(b"<?xml version=\"1.0\"?>").unwrap_err();
        assert!(matches!(err, Error::InvalidMagic { .. }));

        let mut data = document(&[&[0x09]], 1, 0);
        data[6..8].copy_from_slice(b"15");
        let err = BinaryPlist::parse(&data).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion(ref v) if v == "15"));
        assert_eq!(err.kind(), ErrorKind::MalformedDocument);

        assert!(matches!(
            BinaryPlist::parse(b"bplist00").unwrap_err(),
            Error::FileTooShort { size: 8, .. }
        ));
    }

    #[test]
    fn test_truncated_trailer_is_malformed() {
        let dict = Dictionary::new();
        dict.insert("name", "Bob");
        dict.insert("age", 30);
        let data = BinaryPlistBuilder::new().build(dict.as_node()).unwrap();

        for cut in 1..=8 {
            let err = decode(&data[..data.len() - cut]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedDocument, "cut {cut}: {err}");
        }
        for cut in 1..=data.len() {
            let _ = decode(&data[..data.len() - cut]);
        }
    }

    #[test]
    fn test_zero_widths_are_malformed() {
        let mut data = document(&[&[0x09]], 1, 0);
        let len = data.len();
        data[len - Trailer::SIZE + 6] = 0;
        let err = BinaryPlist::parse(&data).unwrap_err();
        assert!(matches!(err, Error::InvalidTrailer(_)));
        assert_eq!(err.kind(), ErrorKind::MalformedDocument);

        let data = document(&[&[0x09]], 0, 0);
        assert!(matches!(BinaryPlist::parse(&data).unwrap_err(), Error::InvalidTrailer(_)));
    }

    #[test]
    fn test_offset_table_out_of_bounds() {
        let mut data = document(&[&[0x09]], 1, 0);
        patch_trailer(&mut data, 24, 1_000);
        let err = BinaryPlist::parse(&data).unwrap_err();
        assert!(matches!(err, Error::OffsetTableOutOfBounds { .. }));
        assert_eq!(err.kind(), ErrorKind::MalformedDocument);

        let mut data = document(&[&[0x09]], 1, 0);
        patch_trailer(&mut data, 8, u64::MAX);
        let err = BinaryPlist::parse(&data).unwrap_err();
        assert!(matches!(err, Error::OffsetTableOutOfBounds { .. }));
    }

    #[test]
    fn test_integrity_failures() {
        let data = document(&[&[0x09]], 1, 1);
        let err = BinaryPlist::parse(&data).unwrap_err();
        assert!(matches!(err, Error::RootOutOfRange { root: 1, count: 1 }));
        assert_eq!(err.kind(), ErrorKind::Integrity);

        let mut data = document(&[&[0x09], &[0x08]], 1, 0);
        patch_trailer(&mut data, 8, 1);
        let err = BinaryPlist::parse(&data).unwrap_err();
        assert!(matches!(err, Error::ObjectCountMismatch { declared: 1, table_bytes: 8 }));
        assert_eq!(err.kind(), ErrorKind::Integrity);

        let mut data = document(&[&[0x09]], 1, 0);
        patch_trailer(&mut data, 8, 0);
        let err = BinaryPlist::parse(&data).unwrap_err();
        assert!(matches!(err, Error::EmptyObjectTable));
        assert_eq!(err.kind(), ErrorKind::Integrity);

        // Offset entry pointing at the offset table itself.
        let mut data = document(&[&[0x09]], 1, 0);
        data[12] = 9;
        let err = BinaryPlist::parse(&data).unwrap_err();
        assert!(matches!(err, Error::ObjectOffsetOutOfBounds { index: 0, offset: 9, end: 9 }));
        assert_eq!(err.kind(), ErrorKind::Integrity);
    }

    #[test]
    fn test_cycles_are_malformed() {
        let data = document(&[&[0xA1, 0x00]], 1, 0);
        let err = decode(&data).unwrap_err();
        assert!(matches!(err, Error::CyclicReference(0)));
        assert_eq!(err.kind(), ErrorKind::MalformedDocument);

        let data = document(&[&[0xA1, 0x01], &[0xD1, 0x02, 0x00], &[0x51, b'k']], 1, 0);
        assert!(matches!(decode(&data).unwrap_err(), Error::CyclicReference(0)));
    }

    #[test]
    fn test_shared_objects_decode_as_copies() {
        let data = document(&[&[0xA2, 0x01, 0x01], &[0x51, b'x']], 1, 0);
        let array = decode(&data).unwrap().as_array().unwrap();
        assert_eq!(array.len(), 2);

        let first = array.get(0).unwrap();
        let second = array.get(1).unwrap();
        assert!(!first.ptr_eq(&second));
        first.set_string("y").unwrap();
        assert_eq!(second.as_string().as_deref(), Some("x"));
    }

    #[test]
    fn test_shared_containers_cannot_expand_without_bound() {
        // Each array holds two references to the next, doubling the tree.
        let mut objects: Vec<Vec<u8>> = (1..24u8).map(|next| vec![0xA2, next, next]).collect();
        objects.push(vec![0x09]);
        let bodies: Vec<&[u8]> = objects.iter().map(Vec::as_slice).collect();

        let data = document(&bodies, 1, 0);
        let err = decode(&data).unwrap_err();
        assert!(matches!(err, Error::TooManyNodes(limit) if limit == data.len()));
        assert_eq!(err.kind(), ErrorKind::MalformedDocument);

        // A short chain of the same shape stays within the limit.
        let data = document(&[&[0xA2, 0x01, 0x01], &[0xA2, 0x02, 0x02], &[0x09]], 1, 0);
        let root = decode(&data).unwrap();
        assert_eq!(root.count(), 7);
    }

    #[test]
    fn test_bad_references() {
        let data = document(&[&[0xA1, 0x05]], 1, 0);
        let err = decode(&data).unwrap_err();
        assert!(matches!(err, Error::ObjectRefOutOfRange { reference: 5, count: 1 }));
        assert_eq!(err.kind(), ErrorKind::MalformedDocument);

        let data = document(&[&[0xD1, 0x01, 0x02], &[0x10, 0x05], &[0x09]], 1, 0);
        assert!(matches!(decode(&data).unwrap_err(), Error::NonStringKey(1)));

        let data = document(&[&[0x0F]], 1, 0);
        assert!(matches!(decode(&data).unwrap_err(), Error::UnexpectedFill(0)));

        let data = document(&[&[0x70]], 1, 0);
        assert!(matches!(decode(&data).unwrap_err(), Error::InvalidMarker(0x70)));
    }

    #[test]
    fn test_container_length_past_end() {
        let body = [0xAF, 0x13, 0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
        let data = document(&[&body], 1, 0);
        let err = decode(&data).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedDocument);

        // Negative extended length.
        let body = [0x5F, 0x13, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
        let data = document(&[&body], 1, 0);
        assert!(matches!(decode(&data).unwrap_err(), Error::InvalidLength { .. }));
    }

    #[test]
    fn test_object_body_cannot_read_offset_table() {
        // Claims 4 bytes of data but the object table ends after 1.
        let data = document(&[&[0x44, 0xAB]], 1, 0);
        let err = decode(&data).unwrap_err();
        assert!(matches!(err, Error::Common(_)));
        assert_eq!(err.kind(), ErrorKind::MalformedDocument);
    }

    #[test]
    fn test_integer_widths() {
        let cases: [(&[u8], i128); 6] = [
            (&[0x10, 0xFF], 255),
            (&[0x11, 0xFF, 0xFF], 65_535),
            (&[0x12, 0xFF, 0xFF, 0xFF, 0xFF], 4_294_967_295),
            (&[0x13, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF], -1),
            (&[0x13, 0x80, 0, 0, 0, 0, 0, 0, 0], i64::MIN as i128),
            (
                &[0x14, 0, 0, 0, 0, 0, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF],
                u64::MAX as i128,
            ),
        ];
        for (body, expected) in cases {
            let data = document(&[body], 1, 0);
            assert_eq!(decode(&data).unwrap().as_integer(), Some(expected));
        }

        let data = document(&[&[0x15, 0x00]], 1, 0);
        assert!(matches!(decode(&data).unwrap_err(), Error::InvalidIntegerWidth(5)));
    }

    #[test]
    fn test_strings() {
        let mut ascii = vec![0x5F, 0x10, 20];
        ascii.extend_from_slice(b"abcdefghijklmnopqrst");
        let data = document(&[&ascii], 1, 0);
        assert_eq!(decode(&data).unwrap().as_string().as_deref(), Some("abcdefghijklmnopqrst"));

        let data = document(&[&[0x62, 0x00, 0xE9, 0x00, 0x74]], 1, 0);
        assert_eq!(decode(&data).unwrap().as_string().as_deref(), Some("\u{e9}t"));

        let data = document(&[&[0x61, 0xD8, 0x00]], 1, 0);
        assert!(matches!(decode(&data).unwrap_err(), Error::InvalidUtf16(0)));
    }

    #[test]
    fn test_set_decodes_as_array() {
        let data = document(&[&[0xC2, 0x01, 0x02], &[0x09], &[0x08]], 1, 0);
        let array = decode(&data).unwrap().as_array().unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array.get(0).unwrap().as_boolean(), Some(true));
    }

    #[test]
    fn test_uid_and_date() {
        let data = document(&[&[0x81, 0x01, 0x00]], 1, 0);
        assert_eq!(decode(&data).unwrap().as_uid(), Some(256));

        let mut date = vec![0x33];
        date.extend_from_slice(&1.5f64.to_be_bytes());
        let data = document(&[&date], 1, 0);
        assert_eq!(decode(&data).unwrap().as_date(), Some(Date::new(1, 500_000)));

        let mut date = vec![0x33];
        date.extend_from_slice(&f64::NAN.to_be_bytes());
        let data = document(&[&date], 1, 0);
        assert!(matches!(decode(&data).unwrap_err(), Error::InvalidDate(_)));
    }

    #[test]
    fn test_nesting_limit() {
        let mut objects: Vec<Vec<u8>> = (1..=MAX_DEPTH as u16 + 10)
            .map(|next| {
                let [hi, lo] = next.to_be_bytes();
                vec![0xA1, hi, lo]
            })
            .collect();
        objects.push(vec![0x00]);
        let bodies: Vec<&[u8]> = objects.iter().map(Vec::as_slice).collect();

        let data = document(&bodies, 2, 0);
        let err = decode(&data).unwrap_err();
        assert!(matches!(err, Error::NestingTooDeep(MAX_DEPTH)));
        assert_eq!(err.kind(), ErrorKind::MalformedDocument);
    }
}
