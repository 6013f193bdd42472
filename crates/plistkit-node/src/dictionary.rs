//! Ordered dictionary container.

use std::fmt;
use std::hash::BuildHasherDefault;

use hashbrown::HashMap as FastHashMap;
use rustc_hash::FxHasher;

use crate::node::{NodeData, Payload};
use crate::{Error, Node, Result};

type FxHashMap<K, V> = FastHashMap<K, V, BuildHasherDefault<FxHasher>>;

/// Insertion-ordered key/value storage with O(1) key lookup.
#[derive(Default)]
pub(crate) struct Entries {
    items: Vec<(String, Node)>,
    index: FxHashMap<String, usize>,
}

impl Entries {
    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn get(&self, key: &str) -> Option<&Node> {
        self.index.get(key).map(|&pos| &self.items[pos].1)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&String, &Node)> {
        self.items.iter().map(|(key, node)| (key, node))
    }

    /// Insert or replace. A replaced value keeps the key's position and is
    /// returned.
    pub(crate) fn insert(&mut self, key: String, node: Node) -> Option<Node> {
        match self.index.get(&key).copied() {
            Some(pos) => Some(std::mem::replace(&mut self.items[pos].1, node)),
            None => {
                self.index.insert(key.clone(), self.items.len());
                self.items.push((key, node));
                None
            }
        }
    }

    pub(crate) fn remove(&mut self, key: &str) -> Option<(String, Node)> {
        let pos = self.index.get(key).copied()?;
        Some(self.remove_at(pos))
    }

    pub(crate) fn remove_node(&mut self, node: &Node) -> Option<(String, Node)> {
        let pos = self.items.iter().position(|(_, child)| child.ptr_eq(node))?;
        Some(self.remove_at(pos))
    }

    fn remove_at(&mut self, pos: usize) -> (String, Node) {
        let (key, node) = self.items.remove(pos);
        self.index.remove(&key);
        for (shifted, (later_key, _)) in self.items.iter().enumerate().skip(pos) {
            self.index.insert(later_key.clone(), shifted);
        }
        (key, node)
    }

    pub(crate) fn take_all(&mut self) -> Vec<(String, Node)> {
        self.index.clear();
        std::mem::take(&mut self.items)
    }
}

/// A live view of a dictionary node.
///
/// Keys are unique and iterate in insertion order. Every value stored through
/// this view is a deep copy of the argument, and gets this dictionary as its
/// parent.
///
/// # Example
///
/// ```
/// use plistkit_node::{Dictionary, Node};
///
/// let dict = Dictionary::new();
/// dict.insert("name", "Bob");
/// dict.insert("age", 30);
///
/// let keys: Vec<String> = dict.keys();
/// assert_eq!(keys, ["name", "age"]);
///
/// let removed = dict.remove("name").unwrap();
/// assert!(removed.parent().is_none());
/// assert_eq!(dict.len(), 1);
/// ```
pub struct Dictionary {
    node: Node,
}

impl Dictionary {
    /// Create a new, empty dictionary.
    pub fn new() -> Self {
        Self {
            node: Node::dictionary(),
        }
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

    fn with_entries<R>(&self, f: impl FnOnce(&Entries) -> R) -> R {
        let data = self.node.0.borrow();
        f(entries(&data))
    }

    fn with_entries_mut<R>(&self, f: impl FnOnce(&mut Entries) -> R) -> R {
        let mut data = self.node.0.borrow_mut();
        match &mut data.payload {
            Payload::Dictionary(entries) => f(entries),
            _ => unreachable!("dictionary view over a non-dictionary node"),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.with_entries(Entries::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.with_entries(|entries| entries.get(key).is_some())
    }

    /// Live handle to the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<Node> {
        self.with_entries(|entries| entries.get(key).map(Node::handle))
    }

    /// Like [`get`](Self::get), but a missing key is an error.
    pub fn try_get(&self, key: &str) -> Result<Node> {
        self.get(key).ok_or_else(|| Error::KeyNotFound(key.to_string()))
    }

    /// Store a deep copy of `value` under `key`.
    ///
    /// An existing entry keeps its position; the value it held is detached.
    /// Returns a live handle to the stored copy.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Node>) -> Node {
        let child: Node = value.into();
        let child = child.adopt_into(&self.node);
        child.set_parent(&self.node);
        let stored = child.handle();

        if let Some(replaced) = self.with_entries_mut(|entries| entries.insert(key.into(), child)) {
            replaced.clear_parent();
        }
        stored
    }

    /// Remove the entry under `key`, returning the detached value.
    pub fn remove(&self, key: &str) -> Option<Node> {
        let (_, node) = self.with_entries_mut(|entries| entries.remove(key))?;
        node.clear_parent();
        Some(node)
    }

    /// Remove every entry, detaching all values.
    pub fn clear(&self) {
        for (_, node) in self.with_entries_mut(Entries::take_all) {
            node.clear_parent();
        }
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.with_entries(|entries| entries.iter().map(|(key, _)| key.clone()).collect())
    }

    /// Live handles to the values, in insertion order.
    pub fn values(&self) -> Vec<Node> {
        self.with_entries(|entries| entries.iter().map(|(_, node)| node.handle()).collect())
    }

    /// Entries in insertion order. Values are live handles into this
    /// dictionary.
    pub fn iter(&self) -> impl Iterator<Item = (String, Node)> {
        let entries: Vec<(String, Node)> = self.with_entries(|entries| {
            entries
                .iter()
                .map(|(key, node)| (key.clone(), node.handle()))
                .collect()
        });
        entries.into_iter()
    }
}

fn entries(data: &NodeData) -> &Entries {
    match &data.payload {
        Payload::Dictionary(entries) => entries,
        _ => unreachable!("dictionary view over a non-dictionary node"),
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

/// Deep copy.
impl Clone for Dictionary {
    fn clone(&self) -> Self {
        Self::from_node(self.node.clone())
    }
}

impl PartialEq for Dictionary {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl From<Dictionary> for Node {
    fn from(dict: Dictionary) -> Self {
        dict.into_node()
    }
}

impl From<&Dictionary> for Node {
    fn from(dict: &Dictionary) -> Self {
        dict.node.clone()
    }
}

impl<K: Into<String>, V: Into<Node>> FromIterator<(K, V)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let dict = Self::new();
        for (key, value) in iter {
            dict.insert(key, value);
        }
        dict
    }
}
