//! Binary plist trailer structure.

use zerocopy::byteorder::big_endian::U64;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// The 32-byte trailer at the end of every binary plist.
///
/// All multi-byte fields are big-endian.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct Trailer {
    /// Unused padding.
    pub unused: [u8; 5],
    /// Sort version (always 0 in practice).
    pub sort_version: u8,
    /// Width in bytes of each offset table entry.
    pub offset_size: u8,
    /// Width in bytes of each object reference inside containers.
    pub object_ref_size: u8,
    /// Number of objects in the object table.
    pub object_count: U64,
    /// Index of the root object.
    pub root_object: U64,
    /// Byte offset of the offset table from the start of the file.
    pub offset_table_offset: U64,
}

impl Trailer {
    /// The magic bytes at the start of a binary plist.
    pub const MAGIC: &'static [u8; 8] = b"bplist00";

    /// Size of the magic bytes.
    pub const MAGIC_LEN: usize = 8;

    /// Size of the trailer.
    pub const SIZE: usize = 32;

    /// Create a trailer for a freshly written document.
    pub fn new(
        offset_size: u8,
        object_ref_size: u8,
        object_count: u64,
        root_object: u64,
        offset_table_offset: u64,
    ) -> Self {
        Self {
            unused: [0; 5],
            sort_version: 0,
            offset_size,
            object_ref_size,
            object_count: U64::new(object_count),
            root_object: U64::new(root_object),
            offset_table_offset: U64::new(offset_table_offset),
        }
    }
}
