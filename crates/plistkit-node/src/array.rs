//! Indexable array container.

use std::fmt;

use crate::node::Payload;
use crate::{Error, Node, Result};

/// A live view of an array node.
///
/// Every element stored through this view is a deep copy of the argument and
/// gets this array as its parent.
pub struct Array {
    node: Node,
}

impl Array {
    /// Create a new, empty array.
    pub fn new() -> Self {
        Self { node: Node::array() }
    }

    pub(crate) fn from_node(node: Node) -> Self {
        Self { node }
    }

    /// The underlying node.
    pub fn as_node(&self) -> &Node {
        &self.node
    }

    /// Convert into the underlying node.
    pub fn into_node(self) -> Node {
        self.node
    }

    fn with_items<R>(&self, f: impl FnOnce(&Vec<Node>) -> R) -> R {
        match &self.node.0.borrow().payload {
            Payload::Array(items) => f(items),
            _ => unreachable!("array view over a non-array node"),
        }
    }

    fn with_items_mut<R>(&self, f: impl FnOnce(&mut Vec<Node>) -> R) -> R {
        match &mut self.node.0.borrow_mut().payload {
            Payload::Array(items) => f(items),
            _ => unreachable!("array view over a non-array node"),
        }
    }

    /// Turn `value` into a child of this array.
    fn prepare(&self, value: impl Into<Node>) -> Node {
        let child: Node = value.into();
        let child = child.adopt_into(&self.node);
        child.set_parent(&self.node);
        child
    }

    pub fn len(&self) -> usize {
        self.with_items(Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live handle to the element at `index`.
    pub fn get(&self, index: usize) -> Option<Node> {
        self.with_items(|items| items.get(index).map(Node::handle))
    }

    /// Like [`get`](Self::get), but a missing index is an error.
    pub fn try_get(&self, index: usize) -> Result<Node> {
        self.get(index).ok_or_else(|| Error::IndexOutOfRange {
            index,
            len: self.len(),
        })
    }

    /// Append a deep copy of `value`, returning a live handle to it.
    pub fn push(&self, value: impl Into<Node>) -> Node {
        let child = self.prepare(value);
        let stored = child.handle();
        self.with_items_mut(|items| items.push(child));
        stored
    }

    /// Insert a deep copy of `value` at `index`, shifting later elements.
    ///
    /// `index` may equal the length, which appends.
    pub fn insert(&self, index: usize, value: impl Into<Node>) -> Result<Node> {
        let len = self.len();
        if index > len {
            return Err(Error::IndexOutOfRange { index, len });
        }
        let child = self.prepare(value);
        let stored = child.handle();
        self.with_items_mut(|items| items.insert(index, child));
        Ok(stored)
    }

    /// Replace the element at `index` with a deep copy of `value`.
    ///
    /// The previous element is detached.
    pub fn set(&self, index: usize, value: impl Into<Node>) -> Result<Node> {
        let len = self.len();
        if index >= len {
            return Err(Error::IndexOutOfRange { index, len });
        }
        let child = self.prepare(value);
        let stored = child.handle();
        let replaced = self.with_items_mut(|items| std::mem::replace(&mut items[index], child));
        replaced.clear_parent();
        Ok(stored)
    }

    /// Remove and return the element at `index`, detached.
    pub fn remove(&self, index: usize) -> Result<Node> {
        let len = self.len();
        if index >= len {
            return Err(Error::IndexOutOfRange { index, len });
        }
        let removed = self.with_items_mut(|items| items.remove(index));
        removed.clear_parent();
        Ok(removed)
    }

    /// Remove and return the last element, detached.
    pub fn pop(&self) -> Option<Node> {
        let removed = self.with_items_mut(Vec::pop)?;
        removed.clear_parent();
        Some(removed)
    }

    /// Remove every element, detaching all of them.
    pub fn clear(&self) {
        for node in self.with_items_mut(std::mem::take) {
            node.clear_parent();
        }
    }

    /// Elements in order, as live handles into this array.
    pub fn iter(&self) -> impl Iterator<Item = Node> {
        let items: Vec<Node> = self.with_items(|items| items.iter().map(Node::handle).collect());
        items.into_iter()
    }
}

impl Default for Array {
    fn default() -> Self {
        Self::new()
    }
}

/// Deep copy.
impl Clone for Array {
    fn clone(&self) -> Self {
        Self::from_node(self.node.clone())
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl From<Array> for Node {
    fn from(array: Array) -> Self {
        array.into_node()
    }
}

impl From<&Array> for Node {
    fn from(array: &Array) -> Self {
        array.node.clone()
    }
}

impl<V: Into<Node>> FromIterator<V> for Array {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let array = Self::new();
        for value in iter {
            array.push(value);
        }
        array
    }
}
