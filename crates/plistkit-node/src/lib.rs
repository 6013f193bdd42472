//! Property list node tree.
//!
//! A plist document is a tree of dictionaries, arrays and scalar values. This
//! crate holds that tree in memory:
//!
//! - [`Node`] - A handle to one value in a tree, carrying a back-reference to
//!   its parent container
//! - [`Dictionary`] / [`Array`] - Container views with clone-on-insert
//!   semantics
//! - [`Date`] - Timestamps anchored at 2001-01-01T00:00:00Z
//! - [`Kind`] / [`Value`] - Kind tags and payload snapshots
//!
//! Storing a node into a container always stores an independent deep copy, so
//! two trees never share a mutable child.
//!
//! # Example
//!
//! ```
//! use plistkit_node::{Dictionary, Node};
//!
//! let person = Dictionary::new();
//! person.insert("name", "Bob");
//! person.insert("age", 30);
//!
//! let nickname = Node::string("Bobby");
//! person.insert("nickname", &nickname);
//! nickname.set_string("Robert").unwrap();
//!
//! // The dictionary kept its own copy.
//! assert_eq!(person.get("nickname").unwrap().as_string().as_deref(), Some("Bobby"));
//! assert_eq!(person.get("age").unwrap().as_i64(), Some(30));
//! ```

mod array;
mod date;
mod dictionary;
mod error;
mod kind;
mod node;

#[cfg(feature = "serde")]
mod ser;

pub use array::Array;
pub use date::Date;
pub use dictionary::Dictionary;
pub use error::{Error, Result};
pub use kind::Kind;
pub use node::{Node, Value};
