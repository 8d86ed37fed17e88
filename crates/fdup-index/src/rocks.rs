//! RocksDB-backed ordered store
//!
//! One RocksDB instance holds the whole index keyspace. Batches map to
//! RocksDB write batches, `Durability::Sync` maps to synchronous WAL
//! writes, and `sync` flushes the WAL.

use std::path::Path;
use std::sync::Arc;

use rocksdb::{Direction, IteratorMode, Options, ReadOptions, WriteBatch, WriteOptions, DB};
use tracing::debug;

use crate::error::IndexError;
use crate::store::{BatchOp, Durability, Key, KvPair, OrderedStore, StoreIter, Value};

/// Persistent ordered store backed by RocksDB.
pub struct RocksStore {
    db: Arc<DB>,
}

impl RocksStore {
    /// Opens or creates a store at the given path.
    pub fn open(path: &Path) -> Result<Self, IndexError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path).map_err(|e| IndexError::Store(e.to_string()))?;
        debug!(path = %path.display(), "opened index store");
        Ok(Self { db: Arc::new(db) })
    }
}

fn write_opts(durability: Durability) -> WriteOptions {
    let mut opts = WriteOptions::default();
    opts.set_sync(durability == Durability::Sync);
    opts
}

fn read_opts(lower: &[u8], upper: Option<&[u8]>) -> ReadOptions {
    let mut opts = ReadOptions::default();
    opts.set_iterate_lower_bound(lower.to_vec());
    if let Some(upper) = upper {
        opts.set_iterate_upper_bound(upper.to_vec());
    }
    opts
}

impl OrderedStore for RocksStore {
    fn get(&self, key: &[u8]) -> Result<Option<Value>, IndexError> {
        self.db
            .get(key)
            .map_err(|e| IndexError::Store(e.to_string()))
    }

    fn set(&self, key: Key, value: Value, durability: Durability) -> Result<(), IndexError> {
        self.db
            .put_opt(key, value, &write_opts(durability))
            .map_err(|e| IndexError::Store(e.to_string()))
    }

    fn delete_range(
        &self,
        lower: &[u8],
        upper: &[u8],
        durability: Durability,
    ) -> Result<(), IndexError> {
        let mut batch = WriteBatch::default();
        batch.delete_range(lower, upper);
        self.db
            .write_opt(batch, &write_opts(durability))
            .map_err(|e| IndexError::Store(e.to_string()))
    }

    fn iter<'a>(&'a self, lower: &[u8], upper: Option<&[u8]>) -> Result<StoreIter<'a>, IndexError> {
        let iter = self.db.iterator_opt(
            IteratorMode::From(lower, Direction::Forward),
            read_opts(lower, upper),
        );
        Ok(Box::new(iter.map(|item| {
            item.map(|(k, v)| (k.into_vec(), v.into_vec()))
                .map_err(|e| IndexError::Store(e.to_string()))
        })))
    }

    fn last_in_range(
        &self,
        lower: &[u8],
        upper: Option<&[u8]>,
    ) -> Result<Option<KvPair>, IndexError> {
        let mut iter = self
            .db
            .iterator_opt(IteratorMode::End, read_opts(lower, upper));
        match iter.next() {
            None => Ok(None),
            Some(item) => item
                .map(|(k, v)| Some((k.into_vec(), v.into_vec())))
                .map_err(|e| IndexError::Store(e.to_string())),
        }
    }

    fn write_batch(&self, ops: Vec<BatchOp>, durability: Durability) -> Result<(), IndexError> {
        let mut batch = WriteBatch::default();
        for op in ops {
            match op {
                BatchOp::Put { key, value } => batch.put(key, value),
                BatchOp::Delete { key } => batch.delete(key),
            }
        }
        self.db
            .write_opt(batch, &write_opts(durability))
            .map_err(|e| IndexError::Store(e.to_string()))
    }

    fn sync(&self) -> Result<(), IndexError> {
        self.db
            .flush_wal(true)
            .map_err(|e| IndexError::Store(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open(dir: &TempDir) -> RocksStore {
        RocksStore::open(dir.path()).unwrap()
    }

    fn put(store: &RocksStore, key: &[u8], value: &[u8]) {
        store
            .set(key.to_vec(), value.to_vec(), Durability::BestEffort)
            .unwrap();
    }

    #[test]
    fn roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        put(&store, b"key1", b"value1");
        assert_eq!(store.get(b"key1").unwrap(), Some(b"value1".to_vec()));
        assert_eq!(store.get(b"missing").unwrap(), None);
    }

    #[test]
    fn iter_is_ordered_and_bounded() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        for key in [b"d", b"a", b"c", b"b"] {
            put(&store, key, b"1");
        }
        let keys: Vec<Vec<u8>> = store
            .iter(b"b", Some(b"d".as_slice()))
            .unwrap()
            .map(|r| r.unwrap().0)
            .collect();
        assert_eq!(keys, vec![b"b".to_vec(), b"c".to_vec()]);

        let all: Vec<Vec<u8>> = store
            .iter(b"", None)
            .unwrap()
            .map(|r| r.unwrap().0)
            .collect();
        assert_eq!(
            all,
            vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec(), b"d".to_vec()]
        );
    }

    #[test]
    fn delete_range_is_half_open() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
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
    fn last_in_range() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
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
    fn write_batch_and_sync() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        store
            .write_batch(
                vec![
                    BatchOp::Put {
                        key: b"k1".to_vec(),
                        value: b"v1".to_vec(),
                    },
                    BatchOp::Put {
                        key: b"k2".to_vec(),
                        value: b"v2".to_vec(),
                    },
                ],
                Durability::BestEffort,
            )
            .unwrap();
        store.sync().unwrap();
        assert_eq!(store.get(b"k1").unwrap(), Some(b"v1".to_vec()));
        assert_eq!(store.get(b"k2").unwrap(), Some(b"v2".to_vec()));
    }

    #[test]
    fn durable_set_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = open(&dir);
            store
                .set(b"key".to_vec(), b"value".to_vec(), Durability::Sync)
                .unwrap();
        }
        let store = open(&dir);
        assert_eq!(store.get(b"key").unwrap(), Some(b"value".to_vec()));
    }
}
