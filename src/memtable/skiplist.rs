//! Skip-list backed sorted store.

use super::SortedStore;
use crossbeam_skiplist::SkipMap;

/// Sorted store built on `crossbeam-skiplist`.
///
/// Reads and writes are lock-free; concurrent readers never block writers.
#[derive(Default)]
pub struct SkipListStore {
    map: SkipMap<String, Vec<u8>>,
}

impl SkipListStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SortedStore for SkipListStore {
    fn set(&self, key: &str, value: Vec<u8>) {
        self.map.insert(key.to_string(), value);
    }

    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.map.get(key).map(|entry| entry.value().clone())
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn sorted_entries(&self) -> Vec<(String, Vec<u8>)> {
        self.map.iter().map(|entry| (entry.key().clone(), entry.value().clone())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skiplist_set_get() {
        let store = SkipListStore::new();
        assert!(store.is_empty());

        store.set("key1", b"value1".to_vec());
        store.set("key2", b"value2".to_vec());

        assert_eq!(store.get("key1"), Some(b"value1".to_vec()));
        assert_eq!(store.get("key2"), Some(b"value2".to_vec()));
        assert_eq!(store.get("key3"), None);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_skiplist_overwrite() {
        let store = SkipListStore::new();
        store.set("key1", b"old".to_vec());
        store.set("key1", b"new".to_vec());

        assert_eq!(store.get("key1"), Some(b"new".to_vec()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_skiplist_sorted_entries() {
        let store = SkipListStore::new();
        store.set("cherry", b"3".to_vec());
        store.set("apple", b"1".to_vec());
        store.set("banana", b"2".to_vec());

        let keys: Vec<_> = store.sorted_entries().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["apple", "banana", "cherry"]);
    }
}
