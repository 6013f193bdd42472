//! Object marker bytes.
//!
//! Every object starts with a marker byte. The high nibble selects the object
//! type; the low nibble is a length, a width exponent or a sub-type.

use crate::{Error, Result};

/// Low nibble signalling that an integer object with the real length follows.
pub const EXTENDED_LENGTH: u8 = 0x0F;

/// A decoded object marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Null,
    False,
    True,
    Fill,
    /// Integer with a body of `2^n` bytes.
    Integer(u8),
    /// Real with a body of `2^n` bytes.
    Real(u8),
    Date,
    Data(u8),
    AsciiString(u8),
    Utf16String(u8),
    /// UID with a body of `n + 1` bytes.
    Uid(u8),
    Array(u8),
    Set(u8),
    Dictionary(u8),
}

impl Marker {
    /// Encode this marker as a byte.
    pub fn to_byte(self) -> u8 {
        match self {
            Marker::Null => 0x00,
            Marker::False => 0x08,
            Marker::True => 0x09,
            Marker::Fill => 0x0F,
            Marker::Integer(n) => 0x10 | (n & 0x0F),
            Marker::Real(n) => 0x20 | (n & 0x0F),
            Marker::Date => 0x33,
            Marker::Data(n) => 0x40 | (n & 0x0F),
            Marker::AsciiString(n) => 0x50 | (n & 0x0F),
            Marker::Utf16String(n) => 0x60 | (n & 0x0F),
            Marker::Uid(n) => 0x80 | (n & 0x0F),
            Marker::Array(n) => 0xA0 | (n & 0x0F),
            Marker::Set(n) => 0xC0 | (n & 0x0F),
            Marker::Dictionary(n) => 0xD0 | (n & 0x0F),
        }
    }
}

impl TryFrom<u8> for Marker {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self> {
        let low = byte & 0x0F;
        match byte >> 4 {
            0x0 => match low {
                0x0 => Ok(Marker::Null),
                0x8 => Ok(Marker::False),
                0x9 => Ok(Marker::True),
                0xF => Ok(Marker::Fill),
                _ => Err(Error::InvalidMarker(byte)),
            },
            0x1 => Ok(Marker::Integer(low)),
            0x2 => Ok(Marker::Real(low)),
            0x3 if low == 0x3 => Ok(Marker::Date),
            0x4 => Ok(Marker::Data(low)),
            0x5 => Ok(Marker::AsciiString(low)),
            0x6 => Ok(Marker::Utf16String(low)),
            0x8 => Ok(Marker::Uid(low)),
            0xA => Ok(Marker::Array(low)),
            0xC => Ok(Marker::Set(low)),
            0xD => Ok(Marker::Dictionary(low)),
            _ => Err(Error::InvalidMarker(byte)),
        }
    }
}
