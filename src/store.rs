//! Keyed stores for sources and results
//!
//! The engine holds no global state. Callers pass a [`Store`] in wherever
//! something must be looked up by identifier (render sources, cached
//! analyses); [`MemoryStore`] is the in-process implementation.

use std::collections::HashMap;
use std::sync::Arc;

/// Get/put access to values by string identifier
pub trait Store<V> {
    /// Look up a value
    fn get(&self, id: &str) -> Option<Arc<V>>;

    /// Insert or replace a value, returning the stored handle
    fn put(&mut self, id: String, value: V) -> Arc<V>;
}

/// In-memory store backed by a `HashMap`
#[derive(Debug)]
pub struct MemoryStore<V> {
    entries: HashMap<String, Arc<V>>,
}

impl<V> MemoryStore<V> {
    /// Empty store
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Number of stored values
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if `id` is present
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }
}

impl<V> Default for MemoryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Store<V> for MemoryStore<V> {
    fn get(&self, id: &str) -> Option<Arc<V>> {
        self.entries.get(id).cloned()
    }

    fn put(&mut self, id: String, value: V) -> Arc<V> {
        let value = Arc::new(value);
        self.entries.insert(id, Arc::clone(&value));
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_then_get() {
        let mut store = MemoryStore::new();
        assert!(store.is_empty());
        store.put("a".to_string(), 1u32);
        assert_eq!(store.get("a").as_deref(), Some(&1));
        assert_eq!(store.get("b"), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_put_replaces() {
        let mut store = MemoryStore::new();
        let first = store.put("a".to_string(), "x".to_string());
        store.put("a".to_string(), "y".to_string());
        assert_eq!(first.as_str(), "x");
        assert_eq!(store.get("a").unwrap().as_str(), "y");
        assert!(store.contains("a"));
    }
}
