//! Ordered key/value rows
//!
//! A Record is an association list, not a hash map: own keys only, in a
//! well-defined order, with no inherited members. This makes the key
//! enumeration rules of keyed joins an explicit invariant rather than an
//! artifact of some object model.
//!
//! # Key order
//!
//! `own_keys` enumerates array-index-like keys first, in ascending numeric
//! order, then all remaining keys in insertion order. An array-index-like
//! key is the canonical decimal form of an integer in `0..u32::MAX`
//! ("0", "7", "42" - but not "007", "-1", or "4294967295").

use crate::value::Value;
use std::sync::Arc;

/// Ordered collection of key/value pairs with last-write-wins insertion.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    entries: Vec<(Arc<str>, Value)>,
}

/// Parse a key as an array index: canonical decimal, below `u32::MAX`.
fn array_index(key: &str) -> Option<u32> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match key.parse::<u32>() {
        Ok(n) if n < u32::MAX => Some(n),
        _ => None,
    }
}

impl Record {
    /// Empty record
    pub fn new() -> Self {
        Record {
            entries: Vec::new(),
        }
    }

    /// Record from key/value pairs, applying last-write-wins per key
    pub fn from_pairs(pairs: Vec<(&str, Value)>) -> Self {
        let mut record = Record::new();
        for (key, value) in pairs {
            record.insert(key, value);
        }
        record
    }

    /// Insert or replace a key. Replacement keeps the original insertion
    /// position, like property assignment.
    pub fn insert(&mut self, key: impl Into<Arc<str>>, value: Value) {
        let key = key.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Look up a key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_ref() == key)
            .map(|(_, v)| v)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the record has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Keys in enumeration order: numeric-then-insertion (see module docs).
    ///
    /// This order defines both the pull order and the row shape of keyed
    /// joins, so it must be stable for a given record.
    pub fn own_keys(&self) -> Vec<Arc<str>> {
        let mut numeric: Vec<(u32, Arc<str>)> = Vec::new();
        let mut rest: Vec<Arc<str>> = Vec::new();
        for (key, _) in &self.entries {
            match array_index(key) {
                Some(n) => numeric.push((n, key.clone())),
                None => rest.push(key.clone()),
            }
        }
        numeric.sort_by_key(|(n, _)| *n);
        let mut keys: Vec<Arc<str>> = numeric.into_iter().map(|(_, k)| k).collect();
        keys.extend(rest);
        keys
    }
}
