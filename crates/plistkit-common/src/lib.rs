//! Common utilities for plistkit.
//!
//! This crate provides foundational types used across all plistkit crates:
//!
//! - [`BinaryReader`] - Bounds-checked big-endian reading from byte slices
//! - [`ErrorKind`] - The coarse error classification every crate maps onto
//! - [`Error`] - Errors raised by the reader itself

mod error;
mod kind;
mod reader;

pub use error::{Error, Result};
pub use kind::ErrorKind;
pub use reader::BinaryReader;

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};
