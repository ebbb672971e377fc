//! In-memory index of cached keys
//!
//! The index itself is not synchronized. The cache keeps it behind its single
//! `RwLock`, so read-only methods take `&self` (read guard) and mutations take
//! `&mut self` (write guard).

use crate::types::Entry;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct Index {
    entries: HashMap<String, Entry>,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    /// Presence check, regardless of expiry
    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn lookup(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    /// Insert or overwrite, returning the previous mapping
    pub fn put(&mut self, key: String, entry: Entry) -> Option<Entry> {
        self.entries.insert(key, entry)
    }

    pub fn remove(&mut self, key: &str) -> Option<Entry> {
        self.entries.remove(key)
    }

    /// Iterate every mapping. The iterator borrows the index, so it cannot
    /// outlive the lock guard it was obtained through.
    pub fn all(&self) -> impl Iterator<Item = (&String, &Entry)> + '_ {
        self.entries.iter()
    }

    /// Owned snapshot of the entries that expired before `now`
    pub fn expired(&self, now: DateTime<Utc>) -> Vec<(String, Entry)> {
        self.all()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }

    /// Number of indexed keys, including expired ones not yet reclaimed
    pub fn count(&self) -> usize {
        self.entries.len()
    }
}
