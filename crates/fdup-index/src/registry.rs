//! File entry registry: path identity and monotonic file ids
//!
//! Every path gets a stable numeric id the first time it is seen. The id
//! doubles as the per-file partition of the chunk keyspace, so it must
//! never be reused; allocation is seeded from the highest persisted entry
//! and only moves forward.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::error::IndexError;
use crate::hash;
use crate::keys;
use crate::store::{BatchOp, Durability, OrderedStore};
use crate::types::{FileEntry, FileId};

/// Registry of indexed files over an ordered store.
pub struct FileRegistry {
    store: Arc<dyn OrderedStore>,
    last_id: AtomicU64,
}

impl FileRegistry {
    /// Opens the registry, seeding the id allocator from the highest
    /// persisted entry. A malformed key in the entry keyspace is corrupt
    /// state, not an empty registry.
    pub fn open(store: Arc<dyn OrderedStore>) -> Result<Self, IndexError> {
        let lower = keys::PREFIX_FILE_ENTRY.to_vec();
        let upper = keys::prefix_range_end(keys::PREFIX_FILE_ENTRY);
        let last_id = match store.last_in_range(&lower, upper.as_deref())? {
            None => 0,
            Some((key, _)) => keys::file_entry_id(&key)?.as_u64(),
        };
        debug!(last_id, "file registry opened");
        Ok(Self {
            store,
            last_id: AtomicU64::new(last_id),
        })
    }

    /// Allocates the next file id. Compare-and-swap keeps concurrent
    /// allocations collision-free and dense.
    fn allocate_id(&self) -> FileId {
        loop {
            let current = self.last_id.load(Ordering::SeqCst);
            let next = current + 1;
            if self
                .last_id
                .compare_exchange(current, next, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return FileId::new(next);
            }
        }
    }

    /// Returns the stable id for `path`, registering a new entry on first
    /// sight. Registration hashes the whole file and commits the entry row
    /// and the path-identity row in one atomic batch.
    ///
    /// Two racing callers registering the same unseen path can both
    /// allocate ids; the later path-identity write wins. Callers that care
    /// serialize per path.
    pub fn ensure_entry(&self, path: &Path) -> Result<FileId, IndexError> {
        let path_str = path.to_string_lossy();
        let path_key = keys::path_index_key(hash::fast_hash(path_str.as_bytes()));
        if let Some(value) = self.store.get(&path_key)? {
            let raw: [u8; 8] = value.as_slice().try_into().map_err(|_| {
                IndexError::CorruptState(format!(
                    "path index value has {} bytes, want 8",
                    value.len()
                ))
            })?;
            return Ok(FileId::new(u64::from_be_bytes(raw)));
        }

        let mut file = fs::File::open(path)?;
        let fast_digest = hash::fast_hash_reader(&mut file)?;
        let id = self.allocate_id();
        let entry = FileEntry {
            id,
            path: path_str.into_owned(),
            fast_digest,
        };
        let value = bincode::serialize(&entry)
            .map_err(|e| IndexError::CorruptState(format!("encode file entry: {}", e)))?;
        self.store.write_batch(
            vec![
                BatchOp::Put {
                    key: keys::file_entry_key(id),
                    value,
                },
                BatchOp::Put {
                    key: path_key,
                    value: id.as_u64().to_be_bytes().to_vec(),
                },
            ],
            Durability::BestEffort,
        )?;
        debug!(id = %id, path = %entry.path, "registered file");
        Ok(id)
    }

    /// All registry rows in id order.
    pub fn entries(&self) -> Result<Vec<FileEntry>, IndexError> {
        let lower = keys::PREFIX_FILE_ENTRY.to_vec();
        let upper = keys::prefix_range_end(keys::PREFIX_FILE_ENTRY);
        let mut entries = Vec::new();
        for item in self.store.iter(&lower, upper.as_deref())? {
            let (key, value) = item?;
            let id = keys::file_entry_id(&key)?;
            let entry: FileEntry = bincode::deserialize(&value)
                .map_err(|e| IndexError::CorruptState(format!("file entry {}: {}", id, e)))?;
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Resolve one registry row. `Ok(None)` when the id was never
    /// allocated.
    pub fn entry(&self, id: FileId) -> Result<Option<FileEntry>, IndexError> {
        match self.store.get(&keys::file_entry_key(id))? {
            None => Ok(None),
            Some(value) => bincode::deserialize(&value)
                .map(Some)
                .map_err(|e| IndexError::CorruptState(format!("file entry {}: {}", id, e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::collections::BTreeSet;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(contents).unwrap();
        path
    }

    fn open_memory() -> (Arc<MemoryStore>, FileRegistry) {
        let store = Arc::new(MemoryStore::new());
        let registry = FileRegistry::open(store.clone() as Arc<dyn OrderedStore>).unwrap();
        (store, registry)
    }

    #[test]
    fn first_entry_gets_id_one() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "a.bin", b"hello");
        let (_, registry) = open_memory();
        let id = registry.ensure_entry(&path).unwrap();
        assert_eq!(id, FileId::new(1));
    }

    #[test]
    fn same_path_returns_same_id() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "a.bin", b"hello");
        let (_, registry) = open_memory();
        let first = registry.ensure_entry(&path).unwrap();
        let second = registry.ensure_entry(&path).unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.entries().unwrap().len(), 1);
    }

    #[test]
    fn distinct_paths_get_distinct_ids() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a.bin", b"same bytes");
        let b = write_file(&dir, "b.bin", b"same bytes");
        let (_, registry) = open_memory();
        let id_a = registry.ensure_entry(&a).unwrap();
        let id_b = registry.ensure_entry(&b).unwrap();
        assert_ne!(id_a, id_b);
    }

    #[test]
    fn entry_records_path_and_digest() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "a.bin", b"some file contents");
        let (_, registry) = open_memory();
        let id = registry.ensure_entry(&path).unwrap();
        let entry = registry.entry(id).unwrap().unwrap();
        assert_eq!(entry.id, id);
        assert_eq!(entry.path, path.to_string_lossy());
        assert_eq!(entry.fast_digest, hash::fast_hash(b"some file contents"));
        assert!(registry.entry(FileId::new(999)).unwrap().is_none());
    }

    #[test]
    fn digest_is_captured_at_first_sight() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "a.bin", b"before");
        let (_, registry) = open_memory();
        let id = registry.ensure_entry(&path).unwrap();
        write_file(&dir, "a.bin", b"after, and longer");
        // re-registering the same path must not touch the stored digest
        registry.ensure_entry(&path).unwrap();
        let entry = registry.entry(id).unwrap().unwrap();
        assert_eq!(entry.fast_digest, hash::fast_hash(b"before"));
    }

    #[test]
    fn allocation_continues_after_reopen() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a.bin", b"a");
        let b = write_file(&dir, "b.bin", b"b");
        let store: Arc<dyn OrderedStore> = Arc::new(MemoryStore::new());

        let registry = FileRegistry::open(store.clone()).unwrap();
        let id_a = registry.ensure_entry(&a).unwrap();
        drop(registry);

        let registry = FileRegistry::open(store).unwrap();
        let id_b = registry.ensure_entry(&b).unwrap();
        assert_eq!(id_b.as_u64(), id_a.as_u64() + 1);
    }

    #[test]
    fn concurrent_allocation_is_dense_and_collision_free() {
        let dir = TempDir::new().unwrap();
        let paths: Vec<_> = (0..16)
            .map(|i| write_file(&dir, &format!("f{}.bin", i), format!("data {}", i).as_bytes()))
            .collect();
        let store: Arc<dyn OrderedStore> = Arc::new(MemoryStore::new());
        let registry = Arc::new(FileRegistry::open(store).unwrap());

        let mut ids = BTreeSet::new();
        std::thread::scope(|scope| {
            let handles: Vec<_> = paths
                .iter()
                .map(|path| {
                    let registry = registry.clone();
                    scope.spawn(move || registry.ensure_entry(path).unwrap())
                })
                .collect();
            for handle in handles {
                ids.insert(handle.join().unwrap().as_u64());
            }
        });

        let expected: BTreeSet<u64> = (1..=16).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn corrupt_path_index_value_is_detected() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "a.bin", b"x");
        let (store, registry) = open_memory();
        let path_key =
            keys::path_index_key(hash::fast_hash(path.to_string_lossy().as_bytes()));
        store
            .set(path_key, b"short".to_vec(), Durability::BestEffort)
            .unwrap();
        assert!(matches!(
            registry.ensure_entry(&path),
            Err(IndexError::CorruptState(_))
        ));
    }

    #[test]
    fn corrupt_entry_key_fails_open() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(b"fezz".to_vec(), b"junk".to_vec(), Durability::BestEffort)
            .unwrap();
        assert!(matches!(
            FileRegistry::open(store as Arc<dyn OrderedStore>),
            Err(IndexError::CorruptState(_))
        ));
    }

    #[test]
    fn missing_file_surfaces_io_error() {
        let (_, registry) = open_memory();
        let result = registry.ensure_entry(Path::new("/no/such/file"));
        assert!(matches!(result, Err(IndexError::Io(_))));
    }
}
