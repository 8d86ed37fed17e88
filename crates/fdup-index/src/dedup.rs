//! Deduplication engine facade
//!
//! Ties the registry, the chunker and the chunk index together behind one
//! handle. `process_file` is the whole per-file pipeline: resolve the
//! file's id, re-chunk its content into the index, then push everything to
//! stable storage.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::chunker::ChunkerConfig;
use crate::dupes::{self, DuplicateGroups};
use crate::error::IndexError;
use crate::index::ChunkIndex;
use crate::registry::FileRegistry;
use crate::store::OrderedStore;
use crate::types::{ChunkRecord, FileEntry, FileId, ReindexStats};

/// Chunk-level deduplication engine over an ordered store.
pub struct Deduplicator {
    store: Arc<dyn OrderedStore>,
    registry: FileRegistry,
    index: ChunkIndex,
}

impl Deduplicator {
    /// Opens the engine over `store`. Seeds file-id allocation from the
    /// persisted registry, so ids keep growing across runs.
    pub fn open(store: Arc<dyn OrderedStore>, config: ChunkerConfig) -> Result<Self, IndexError> {
        let registry = FileRegistry::open(Arc::clone(&store))?;
        let index = ChunkIndex::new(Arc::clone(&store), config);
        Ok(Self {
            store,
            registry,
            index,
        })
    }

    /// Indexes one file: registers its identity, records its chunks, and
    /// makes the result durable before returning.
    pub fn process_file(&self, path: &Path) -> Result<ReindexStats, IndexError> {
        let id = self.registry.ensure_entry(path)?;
        let file = fs::File::open(path)?;
        let stats = self.index.reindex(id, file)?;
        self.store.sync()?;
        info!(path = %path.display(), file_id = %id, chunks = stats.chunks, bytes = stats.bytes, "indexed file");
        Ok(stats)
    }

    /// All registered files, in id order.
    pub fn entries(&self) -> Result<Vec<FileEntry>, IndexError> {
        self.registry.entries()
    }

    /// Resolve one registered file by id. `Ok(None)` for unknown ids.
    pub fn entry(&self, id: FileId) -> Result<Option<FileEntry>, IndexError> {
        self.registry.entry(id)
    }

    /// Every chunk record, in digest-major order.
    pub fn records(&self) -> Result<Vec<ChunkRecord>, IndexError> {
        self.index.records()
    }

    /// Chunks recorded at two or more locations, keyed by digest.
    pub fn duplicates(&self) -> Result<DuplicateGroups, IndexError> {
        dupes::duplicate_groups(self.store.as_ref())
    }
}
