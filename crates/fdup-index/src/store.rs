//! Ordered byte-keyed storage abstraction
//!
//! The index persists everything through this trait: point reads and
//! writes, half-open range deletes, bounded forward iteration, and atomic
//! write batches. Keys are raw bytes compared lexicographically, which the
//! key schema exploits for its prefix partitioning.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Arc, RwLock};

use crate::error::IndexError;

/// Key type for the store.
pub type Key = Vec<u8>;
/// Value type for the store.
pub type Value = Vec<u8>;
/// A key-value pair.
pub type KvPair = (Key, Value);

/// Boxed forward cursor over a key range, in ascending key order.
pub type StoreIter<'a> = Box<dyn Iterator<Item = Result<KvPair, IndexError>> + 'a>;

/// Write durability for store mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Durability {
    /// Buffered write; may be lost if the process crashes
    #[default]
    BestEffort,
    /// Write is on stable storage before the call returns
    Sync,
}

/// A single operation in an atomic write batch.
pub enum BatchOp {
    /// Put a key-value pair.
    Put {
        /// The key to insert or update.
        key: Vec<u8>,
        /// The value to store.
        value: Vec<u8>,
    },
    /// Delete a key.
    Delete {
        /// The key to delete.
        key: Vec<u8>,
    },
}

/// Ordered key-value store trait for index persistence.
///
/// This abstracts over the storage backend, allowing the index to use an
/// in-memory store for testing and a RocksDB-backed store on disk. Range
/// bounds are half-open `[lower, upper)`; an upper bound of `None` means
/// the range extends to the end of the keyspace.
pub trait OrderedStore: Send + Sync {
    /// Get a value by key. Returns `Ok(None)` if the key doesn't exist.
    fn get(&self, key: &[u8]) -> Result<Option<Value>, IndexError>;

    /// Put a key-value pair, overwriting any existing value.
    fn set(&self, key: Key, value: Value, durability: Durability) -> Result<(), IndexError>;

    /// Delete every key in `[lower, upper)`. Deleting an empty range is not
    /// an error.
    fn delete_range(&self, lower: &[u8], upper: &[u8], durability: Durability)
        -> Result<(), IndexError>;

    /// Forward iterator over `[lower, upper)`.
    fn iter<'a>(&'a self, lower: &[u8], upper: Option<&[u8]>) -> Result<StoreIter<'a>, IndexError>;

    /// Last key-value pair in `[lower, upper)`, or `None` when the range is
    /// empty.
    fn last_in_range(&self, lower: &[u8], upper: Option<&[u8]>)
        -> Result<Option<KvPair>, IndexError>;

    /// Atomically apply a batch of operations: all land or none do.
    fn write_batch(&self, ops: Vec<BatchOp>, durability: Durability) -> Result<(), IndexError>;

    /// Force all earlier best-effort writes onto stable storage.
    fn sync(&self) -> Result<(), IndexError>;
}

/// In-memory store backed by a BTreeMap. Thread-safe via RwLock.
///
/// Used for tests and throwaway indexes; it does not persist across
/// restarts and `sync` is a no-op.
pub struct MemoryStore {
    data: Arc<RwLock<BTreeMap<Vec<u8>, Vec<u8>>>>,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn range_bounds(lower: &[u8], upper: Option<&[u8]>) -> (Bound<Vec<u8>>, Bound<Vec<u8>>) {
    let upper = match upper {
        Some(upper) => Bound::Excluded(upper.to_vec()),
        None => Bound::Unbounded,
    };
    (Bound::Included(lower.to_vec()), upper)
}

impl OrderedStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, IndexError> {
        let data = self
            .data
            .read()
            .map_err(|e| IndexError::Store(e.to_string()))?;
        Ok(data.get(key).cloned())
    }

    fn set(&self, key: Key, value: Value, _durability: Durability) -> Result<(), IndexError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| IndexError::Store(e.to_string()))?;
        data.insert(key, value);
        Ok(())
    }

    fn delete_range(
        &self,
        lower: &[u8],
        upper: &[u8],
        _durability: Durability,
    ) -> Result<(), IndexError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| IndexError::Store(e.to_string()))?;
        let doomed: Vec<Vec<u8>> = data
            .range::<Vec<u8>, _>((
                Bound::Included(lower.to_vec()),
                Bound::Excluded(upper.to_vec()),
            ))
            .map(|(k, _)| k.clone())
            .collect();
        for key in doomed {
            data.remove(&key);
        }
        Ok(())
    }

    fn iter<'a>(&'a self, lower: &[u8], upper: Option<&[u8]>) -> Result<StoreIter<'a>, IndexError> {
        let data = self
            .data
            .read()
            .map_err(|e| IndexError::Store(e.to_string()))?;
        let pairs: Vec<KvPair> = data
            .range::<Vec<u8>, _>(range_bounds(lower, upper))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(Box::new(pairs.into_iter().map(Ok)))
    }

    fn last_in_range(
        &self,
        lower: &[u8],
        upper: Option<&[u8]>,
    ) -> Result<Option<KvPair>, IndexError> {
        let data = self
            .data
            .read()
            .map_err(|e| IndexError::Store(e.to_string()))?;
        Ok(data
            .range::<Vec<u8>, _>(range_bounds(lower, upper))
            .next_back()
            .map(|(k, v)| (k.clone(), v.clone())))
    }

    fn write_batch(&self, ops: Vec<BatchOp>, _durability: Durability) -> Result<(), IndexError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| IndexError::Store(e.to_string()))?;
        for op in ops {
            match op {
                BatchOp::Put { key, value } => {
                    data.insert(key, value);
                }
                BatchOp::Delete { key } => {
                    data.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn sync(&self) -> Result<(), IndexError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put(store: &MemoryStore, key: &[u8], value: &[u8]) {
        store
            .set(key.to_vec(), value.to_vec(), Durability::BestEffort)
            .unwrap();
    }

    #[test]
    fn set_get() {
        let store = MemoryStore::new();
        put(&store, b"key1", b"value1");
        assert_eq!(store.get(b"key1").unwrap(), Some(b"value1".to_vec()));
        assert_eq!(store.get(b"key2").unwrap(), None);
    }

    #[test]
    fn overwrite() {
        let store = MemoryStore::new();
        put(&store, b"key", b"v1");
        put(&store, b"key", b"v2");
        assert_eq!(store.get(b"key").unwrap(), Some(b"v2".to_vec()));
    }

    #[test]
    fn iter_respects_bounds() {
        let store = MemoryStore::new();
        for key in [b"a", b"b", b"c", b"d"] {
            put(&store, key, b"1");
        }
        let keys: Vec<Vec<u8>> = store
            .iter(b"b", Some(b"d".as_slice()))
            .unwrap()
            .map(|r| r.unwrap().0)
            .collect();
        assert_eq!(keys, vec![b"b".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn iter_unbounded_upper_runs_to_end() {
        let store = MemoryStore::new();
        for key in [b"a", b"b", b"c"] {
            put(&store, key, b"1");
        }
        let keys: Vec<Vec<u8>> = store
            .iter(b"b", None)
            .unwrap()
            .map(|r| r.unwrap().0)
            .collect();
        assert_eq!(keys, vec![b"b".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn delete_range_is_half_open() {
        let store = MemoryStore::new();
        for key in [b"a", b"b", b"c", b"d"] {
            put(&store, key, b"1");
        }
        store
            .delete_range(b"b", b"d", Durability::BestEffort)
            .unwrap();
        assert_eq!(store.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.get(b"b").unwrap(), None);
        assert_eq!(store.get(b"c").unwrap(), None);
        assert_eq!(store.get(b"d").unwrap(), Some(b"1".to_vec()));
    }

    #[test]
    fn delete_empty_range_is_ok() {
        let store = MemoryStore::new();
        put(&store, b"a", b"1");
        store
            .delete_range(b"x", b"z", Durability::BestEffort)
            .unwrap();
        assert_eq!(store.get(b"a").unwrap(), Some(b"1".to_vec()));
    }

    #[test]
    fn last_in_range() {
        let store = MemoryStore::new();
        for key in [b"a", b"b", b"c", b"d"] {
            put(&store, key, b"1");
        }
        let (key, _) = store
            .last_in_range(b"a", Some(b"d".as_slice()))
            .unwrap()
            .unwrap();
        assert_eq!(key, b"c".to_vec());
        let (key, _) = store.last_in_range(b"a", None).unwrap().unwrap();
        assert_eq!(key, b"d".to_vec());
        assert!(store
            .last_in_range(b"x", Some(b"z".as_slice()))
            .unwrap()
            .is_none());
    }

    #[test]
    fn write_batch_applies_all_ops() {
        let store = MemoryStore::new();
        put(&store, b"existing", b"old");
        store
            .write_batch(
                vec![
                    BatchOp::Put {
                        key: b"new1".to_vec(),
                        value: b"v1".to_vec(),
                    },
                    BatchOp::Put {
                        key: b"new2".to_vec(),
                        value: b"v2".to_vec(),
                    },
                    BatchOp::Delete {
                        key: b"existing".to_vec(),
                    },
                ],
                Durability::BestEffort,
            )
            .unwrap();
        assert_eq!(store.get(b"new1").unwrap(), Some(b"v1".to_vec()));
        assert_eq!(store.get(b"new2").unwrap(), Some(b"v2".to_vec()));
        assert_eq!(store.get(b"existing").unwrap(), None);
    }

    #[test]
    fn sync_is_a_noop() {
        let store = MemoryStore::new();
        store.sync().unwrap();
    }
}
