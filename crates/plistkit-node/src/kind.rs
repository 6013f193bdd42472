//! Node kind tags.

use std::fmt;

/// The kind of value a [`Node`](crate::Node) holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Dictionary,
    Array,
    String,
    Integer,
    Real,
    Boolean,
    Date,
    Data,
    Uid,
    Null,
}

impl Kind {
    /// Whether nodes of this kind hold children.
    #[inline]
    pub const fn is_container(self) -> bool {
        matches!(self, Kind::Dictionary | Kind::Array)
    }

    /// Lowercase name of the kind.
    pub const fn name(self) -> &'static str {
        match self {
            Kind::Dictionary => "dictionary",
            Kind::Array => "array",
            Kind::String => "string",
            Kind::Integer => "integer",
            Kind::Real => "real",
            Kind::Boolean => "boolean",
            Kind::Date => "date",
            Kind::Data => "data",
            Kind::Uid => "uid",
            Kind::Null => "null",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
