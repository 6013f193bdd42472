//! The node handle and its payload.
//!
//! A [`Node`] is a shared handle to a cell holding one value and a weak
//! back-reference to the container that owns it. Handles returned by container
//! accessors alias the stored child, so mutating them mutates the tree.
//! `Node::clone` is a deep copy: the copy shares nothing with the original.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::dictionary::Entries;
use crate::{Array, Date, Dictionary, Error, Kind, Result};

pub(crate) type NodeCell = Rc<RefCell<NodeData>>;

pub(crate) struct NodeData {
    pub(crate) payload: Payload,
    pub(crate) parent: Weak<RefCell<NodeData>>,
}

pub(crate) enum Payload {
    Dictionary(Entries),
    Array(Vec<Node>),
    String(String),
    Integer(i128),
    Real(f64),
    Boolean(bool),
    Date(Date),
    Data(Vec<u8>),
    Uid(u64),
    Null,
}

impl Payload {
    fn kind(&self) -> Kind {
        match self {
            Payload::Dictionary(_) => Kind::Dictionary,
            Payload::Array(_) => Kind::Array,
            Payload::String(_) => Kind::String,
            Payload::Integer(_) => Kind::Integer,
            Payload::Real(_) => Kind::Real,
            Payload::Boolean(_) => Kind::Boolean,
            Payload::Date(_) => Kind::Date,
            Payload::Data(_) => Kind::Data,
            Payload::Uid(_) => Kind::Uid,
            Payload::Null => Kind::Null,
        }
    }
}

/// A snapshot of a node's payload.
///
/// Scalars are copied out of the node. Containers are live views onto the
/// node's children.
#[derive(Debug, Clone)]
pub enum Value {
    Dictionary(Dictionary),
    Array(Array),
    String(String),
    Integer(i128),
    Real(f64),
    Boolean(bool),
    Date(Date),
    Data(Vec<u8>),
    Uid(u64),
    Null,
}

impl Value {
    /// The kind of this value.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Dictionary(_) => Kind::Dictionary,
            Value::Array(_) => Kind::Array,
            Value::String(_) => Kind::String,
            Value::Integer(_) => Kind::Integer,
            Value::Real(_) => Kind::Real,
            Value::Boolean(_) => Kind::Boolean,
            Value::Date(_) => Kind::Date,
            Value::Data(_) => Kind::Data,
            Value::Uid(_) => Kind::Uid,
            Value::Null => Kind::Null,
        }
    }
}

/// Structural equality. Dictionaries compare without regard to key order and
/// two NaN reals are equal.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Dictionary(a), Value::Dictionary(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(key, value)| b.get(&key).is_some_and(|other| value == other))
            }
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Data(a), Value::Data(b)) => a == b,
            (Value::Uid(a), Value::Uid(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

/// A handle to one value in a property list tree.
pub struct Node(pub(crate) NodeCell);

impl Node {
    fn from_payload(payload: Payload) -> Self {
        Self(Rc::new(RefCell::new(NodeData {
            payload,
            parent: Weak::new(),
        })))
    }

    /// Create an empty dictionary node.
    pub fn dictionary() -> Self {
        Self::from_payload(Payload::Dictionary(Entries::default()))
    }

    /// Create an empty array node.
    pub fn array() -> Self {
        Self::from_payload(Payload::Array(Vec::new()))
    }

    /// Create a string node.
    pub fn string(value: impl Into<String>) -> Self {
        Self::from_payload(Payload::String(value.into()))
    }

    /// Create an integer node.
    pub fn integer(value: impl Into<i128>) -> Self {
        Self::from_payload(Payload::Integer(value.into()))
    }

    /// Create a real node.
    pub fn real(value: f64) -> Self {
        Self::from_payload(Payload::Real(value))
    }

    /// Create a boolean node.
    pub fn boolean(value: bool) -> Self {
        Self::from_payload(Payload::Boolean(value))
    }

    /// Create a date node.
    pub fn date(value: Date) -> Self {
        Self::from_payload(Payload::Date(value))
    }

    /// Create a data node.
    pub fn data(value: impl Into<Vec<u8>>) -> Self {
        Self::from_payload(Payload::Data(value.into()))
    }

    /// Create a UID node.
    pub fn uid(value: u64) -> Self {
        Self::from_payload(Payload::Uid(value))
    }

    /// Create a null node.
    pub fn null() -> Self {
        Self::from_payload(Payload::Null)
    }

    /// The kind of this node.
    #[inline]
    pub fn kind(&self) -> Kind {
        self.0.borrow().payload.kind()
    }

    /// Snapshot of this node's payload.
    pub fn value(&self) -> Value {
        match &self.0.borrow().payload {
            Payload::Dictionary(_) => Value::Dictionary(Dictionary::from_node(self.handle())),
            Payload::Array(_) => Value::Array(Array::from_node(self.handle())),
            Payload::String(s) => Value::String(s.clone()),
            Payload::Integer(i) => Value::Integer(*i),
            Payload::Real(r) => Value::Real(*r),
            Payload::Boolean(b) => Value::Boolean(*b),
            Payload::Date(d) => Value::Date(*d),
            Payload::Data(d) => Value::Data(d.clone()),
            Payload::Uid(u) => Value::Uid(*u),
            Payload::Null => Value::Null,
        }
    }

    pub fn as_string(&self) -> Option<String> {
        match &self.0.borrow().payload {
            Payload::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i128> {
        match self.0.borrow().payload {
            Payload::Integer(i) => Some(i),
            _ => None,
        }
    }

    /// The integer value, if it fits in an `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_integer().and_then(|i| i64::try_from(i).ok())
    }

    /// The integer value, if it fits in a `u64`.
    pub fn as_u64(&self) -> Option<u64> {
        self.as_integer().and_then(|i| u64::try_from(i).ok())
    }

    pub fn as_real(&self) -> Option<f64> {
        match self.0.borrow().payload {
            Payload::Real(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self.0.borrow().payload {
            Payload::Boolean(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<Date> {
        match self.0.borrow().payload {
            Payload::Date(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_data(&self) -> Option<Vec<u8>> {
        match &self.0.borrow().payload {
            Payload::Data(d) => Some(d.clone()),
            _ => None,
        }
    }

    pub fn as_uid(&self) -> Option<u64> {
        match self.0.borrow().payload {
            Payload::Uid(u) => Some(u),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.0.borrow().payload, Payload::Null)
    }

    /// Live dictionary view of this node.
    pub fn as_dictionary(&self) -> Option<Dictionary> {
        match self.kind() {
            Kind::Dictionary => Some(Dictionary::from_node(self.handle())),
            _ => None,
        }
    }

    /// Live array view of this node.
    pub fn as_array(&self) -> Option<Array> {
        match self.kind() {
            Kind::Array => Some(Array::from_node(self.handle())),
            _ => None,
        }
    }

    pub fn set_string(&self, value: impl Into<String>) -> Result<()> {
        self.replace_scalar(Payload::String(value.into()))
    }

    pub fn set_integer(&self, value: impl Into<i128>) -> Result<()> {
        self.replace_scalar(Payload::Integer(value.into()))
    }

    pub fn set_real(&self, value: f64) -> Result<()> {
        self.replace_scalar(Payload::Real(value))
    }

    pub fn set_boolean(&self, value: bool) -> Result<()> {
        self.replace_scalar(Payload::Boolean(value))
    }

    pub fn set_date(&self, value: Date) -> Result<()> {
        self.replace_scalar(Payload::Date(value))
    }

    pub fn set_data(&self, value: impl Into<Vec<u8>>) -> Result<()> {
        self.replace_scalar(Payload::Data(value.into()))
    }

    pub fn set_uid(&self, value: u64) -> Result<()> {
        self.replace_scalar(Payload::Uid(value))
    }

    /// Swap in a scalar payload of the same kind as the current one.
    fn replace_scalar(&self, payload: Payload) -> Result<()> {
        let mut data = self.0.borrow_mut();
        let actual = data.payload.kind();
        let expected = payload.kind();
        if actual != expected {
            return Err(Error::KindMismatch { expected, actual });
        }
        data.payload = payload;
        Ok(())
    }

    /// The container holding this node, if any.
    pub fn parent(&self) -> Option<Node> {
        self.0.borrow().parent.upgrade().map(Node)
    }

    /// Remove this node from its parent container.
    ///
    /// Returns `false` if the node had no parent.
    pub fn detach(&self) -> bool {
        let Some(parent) = self.parent() else {
            return false;
        };

        let removed = {
            let mut data = parent.0.borrow_mut();
            let removed = match &mut data.payload {
                Payload::Dictionary(entries) => entries.remove_node(self).map(|(_, node)| node),
                Payload::Array(items) => items
                    .iter()
                    .position(|child| child.ptr_eq(self))
                    .map(|index| items.remove(index)),
                _ => None,
            };
            removed
        };

        self.clear_parent();
        removed.is_some()
    }

    /// Whether two handles refer to the same node.
    #[inline]
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Number of nodes in this subtree, including this one.
    pub fn count(&self) -> usize {
        1 + match &self.0.borrow().payload {
            Payload::Dictionary(entries) => entries.iter().map(|(_, child)| child.count()).sum(),
            Payload::Array(items) => items.iter().map(Node::count).sum(),
            _ => 0,
        }
    }

    /// Another handle to the same node.
    #[inline]
    pub(crate) fn handle(&self) -> Node {
        Node(Rc::clone(&self.0))
    }

    pub(crate) fn set_parent(&self, parent: &Node) {
        self.0.borrow_mut().parent = Rc::downgrade(&parent.0);
    }

    pub(crate) fn clear_parent(&self) {
        self.0.borrow_mut().parent = Weak::new();
    }

    /// Whether `self` is `ancestor` or sits somewhere below it.
    fn is_within(&self, ancestor: &Node) -> bool {
        let mut current = Some(self.handle());
        while let Some(node) = current {
            if node.ptr_eq(ancestor) {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// Prepare `self` for storage inside `container`.
    ///
    /// The node is stored as-is only when no other handle can observe it and
    /// storing it would not create a cycle; otherwise a deep copy is stored.
    pub(crate) fn adopt_into(self, container: &Node) -> Node {
        if Rc::strong_count(&self.0) == 1 && !container.is_within(&self) {
            self
        } else {
            self.deep_copy()
        }
    }

    fn deep_copy(&self) -> Node {
        let data = self.0.borrow();
        match &data.payload {
            Payload::Dictionary(entries) => {
                let copy = Node::dictionary();
                let children: Vec<(String, Node)> = entries
                    .iter()
                    .map(|(key, child)| {
                        let child = child.deep_copy();
                        child.set_parent(&copy);
                        (key.clone(), child)
                    })
                    .collect();
                if let Payload::Dictionary(target) = &mut copy.0.borrow_mut().payload {
                    for (key, child) in children {
                        target.insert(key, child);
                    }
                }
                copy
            }
            Payload::Array(items) => {
                let copy = Node::array();
                let children: Vec<Node> = items
                    .iter()
                    .map(|child| {
                        let child = child.deep_copy();
                        child.set_parent(&copy);
                        child
                    })
                    .collect();
                if let Payload::Array(target) = &mut copy.0.borrow_mut().payload {
                    *target = children;
                }
                copy
            }
            Payload::String(s) => Node::string(s.clone()),
            Payload::Integer(i) => Node::integer(*i),
            Payload::Real(r) => Node::real(*r),
            Payload::Boolean(b) => Node::boolean(*b),
            Payload::Date(d) => Node::date(*d),
            Payload::Data(d) => Node::data(d.clone()),
            Payload::Uid(u) => Node::uid(*u),
            Payload::Null => Node::null(),
        }
    }
}

/// Deep copy. The copy has no parent and shares no node with `self`.
impl Clone for Node {
    fn clone(&self) -> Self {
        self.deep_copy()
    }
}

/// Structural equality, see [`Value`].
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.value() == other.value()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Value::Dictionary(dict) => fmt::Debug::fmt(&dict, f),
            Value::Array(array) => fmt::Debug::fmt(&array, f),
            Value::String(s) => f.debug_tuple("String").field(&s).finish(),
            Value::Integer(i) => f.debug_tuple("Integer").field(&i).finish(),
            Value::Real(r) => f.debug_tuple("Real").field(&r).finish(),
            Value::Boolean(b) => f.debug_tuple("Boolean").field(&b).finish(),
            Value::Date(d) => f.debug_tuple("Date").field(&format_args!("{d}")).finish(),
            Value::Data(d) => f.debug_tuple("Data").field(&d.len()).finish(),
            Value::Uid(u) => f.debug_tuple("Uid").field(&u).finish(),
            Value::Null => f.write_str("Null"),
        }
    }
}

impl From<&Node> for Node {
    fn from(node: &Node) -> Self {
        node.deep_copy()
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        match value {
            Value::Dictionary(dict) => dict.into_node(),
            Value::Array(array) => array.into_node(),
            Value::String(s) => Node::string(s),
            Value::Integer(i) => Node::integer(i),
            Value::Real(r) => Node::real(r),
            Value::Boolean(b) => Node::boolean(b),
            Value::Date(d) => Node::date(d),
            Value::Data(d) => Node::data(d),
            Value::Uid(u) => Node::uid(u),
            Value::Null => Node::null(),
        }
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::string(value)
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::string(value)
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Node::boolean(value)
    }
}

impl From<f64> for Node {
    fn from(value: f64) -> Self {
        Node::real(value)
    }
}

impl From<f32> for Node {
    fn from(value: f32) -> Self {
        Node::real(f64::from(value))
    }
}

impl From<Date> for Node {
    fn from(value: Date) -> Self {
        Node::date(value)
    }
}

impl From<Vec<u8>> for Node {
    fn from(value: Vec<u8>) -> Self {
        Node::data(value)
    }
}

impl From<&[u8]> for Node {
    fn from(value: &[u8]) -> Self {
        Node::data(value)
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Node {
                fn from(value: $ty) -> Self {
                    Node::integer(value)
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, i128, u8, u16, u32, u64);
