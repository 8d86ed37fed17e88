//! Chunk index: per-file chunk records in a shared digest-ordered keyspace
//!
//! Each record is a key with an empty value: digest first, then file id,
//! offset and length. Equal content lands on adjacent keys no matter which
//! file it came from, so duplicate detection is a single forward scan.

use std::io::Read;
use std::sync::Arc;

use tracing::debug;

use crate::chunker::{Chunker, ChunkerConfig};
use crate::error::IndexError;
use crate::hash;
use crate::keys;
use crate::store::{Durability, OrderedStore};
use crate::types::{ChunkRecord, FileId, ReindexStats};

/// Writer and reader of chunk records.
pub struct ChunkIndex {
    store: Arc<dyn OrderedStore>,
    chunker: Chunker,
}

impl ChunkIndex {
    /// Creates a chunk index over `store` with the given chunking
    /// configuration.
    pub fn new(store: Arc<dyn OrderedStore>, config: ChunkerConfig) -> Self {
        Self {
            store,
            chunker: Chunker::with_config(config),
        }
    }

    /// Chunks `source` and records every chunk occurrence for `file_id`.
    ///
    /// The file's id-bounded sub-range is cleared first, then records are
    /// streamed in with best-effort durability; unchanged content rewrites
    /// the identical keys. Records for other files are never touched.
    /// Empty input writes no records.
    pub fn reindex<R: Read>(&self, file_id: FileId, source: R) -> Result<ReindexStats, IndexError> {
        let (lower, upper) = keys::chunk_range(file_id);
        self.store
            .delete_range(&lower, &upper, Durability::BestEffort)?;

        let mut stats = ReindexStats::default();
        for chunk in self.chunker.stream(source) {
            let chunk = chunk?;
            let digest = hash::content_hash(&chunk.data);
            let key = keys::chunk_key(&digest, file_id, chunk.offset, chunk.length);
            self.store.set(key, Vec::new(), Durability::BestEffort)?;
            stats.chunks += 1;
            stats.bytes += chunk.length;
        }
        debug!(file_id = %file_id, chunks = stats.chunks, bytes = stats.bytes, "reindexed file");
        Ok(stats)
    }

    /// Every chunk record in the index, in digest-major key order.
    pub fn records(&self) -> Result<Vec<ChunkRecord>, IndexError> {
        let lower = keys::PREFIX_FILE_CHUNK.to_vec();
        let upper = keys::prefix_range_end(keys::PREFIX_FILE_CHUNK);
        let mut records = Vec::new();
        for item in self.store.iter(&lower, upper.as_deref())? {
            let (key, _) = item?;
            records.push(keys::decode_chunk_key(&key)?);
        }
        Ok(records)
    }
}
