use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::value::Value;

/// Where an attribute's current value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Set by the program itself, before or after loading.
    Program,
    /// A top-level binding of a parameter script.
    Script(PathBuf),
    /// A static config file read through the `config` crate.
    ConfigFile(PathBuf),
    /// A `-D name=value` define or a registered command-line option.
    CommandLine,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Program => write!(f, "program"),
            Origin::Script(p) => write!(f, "script {}", p.display()),
            Origin::ConfigFile(p) => write!(f, "config {}", p.display()),
            Origin::CommandLine => write!(f, "command line"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: String,
    pub val: Value,
    pub origin: Origin,
}

impl Entry {
    pub fn new<T: Into<String>, V: Into<Value>>(key: T, val: V, origin: Origin) -> Entry {
        Entry {
            key: key.into(),
            val: val.into(),
            origin,
        }
    }

    pub fn value(&self) -> &Value {
        &self.val
    }
}

/// The open attribute map behind every parameter object.
///
/// Names are kept in sorted order so listings and comparisons are stable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    tree: BTreeMap<String, Entry>,
}

impl Attributes {
    pub fn new() -> Self {
        Attributes::default()
    }

    pub fn get_entry(&self, key: &str) -> Option<&Entry> {
        self.tree.get(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.tree.get(key).map(|e| e.value())
    }

    /// Insert or overwrite `key`, returning the value it replaced.
    pub fn put<K: Into<String>, V: Into<Value>>(
        &mut self,
        key: K,
        val: V,
        origin: Origin,
    ) -> Option<Value> {
        let key: String = key.into();
        match self.tree.entry(key) {
            btree_map::Entry::Vacant(e) => {
                let key = e.key().clone();
                e.insert(Entry::new(key, val, origin));
                None
            }
            btree_map::Entry::Occupied(mut e) => {
                let entry = e.get_mut();
                entry.origin = origin;
                Some(std::mem::replace(&mut entry.val, val.into()))
            }
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.tree.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.tree.values()
    }
}

pub trait GetOrElse<K, T> {
    fn get_or_else(&self, key: K, dval: T) -> T;
}

impl<T> GetOrElse<&str, T> for Attributes
where
    T: for<'a> TryFrom<&'a Value>,
{
    fn get_or_else(&self, key: &str, dval: T) -> T {
        match self.get(key) {
            Some(val) => T::try_from(val).unwrap_or(dval),
            None => dval,
        }
    }
}
