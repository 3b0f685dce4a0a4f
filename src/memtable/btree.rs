//! Balanced-tree backed sorted store.

use super::SortedStore;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Sorted store built on `BTreeMap` behind a read-write lock.
///
/// Any number of readers may hold the lock at once; a writer excludes them.
#[derive(Default)]
pub struct BTreeStore {
    map: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl BTreeStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SortedStore for BTreeStore {
    fn set(&self, key: &str, value: Vec<u8>) {
        self.map.write().insert(key.to_string(), value);
    }

    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.map.read().get(key).cloned()
    }

    fn len(&self) -> usize {
        self.map.read().len()
    }

    fn sorted_entries(&self) -> Vec<(String, Vec<u8>)> {
        self.map.read().iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}
