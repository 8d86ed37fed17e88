//! Shared record types for the deduplication index

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::hash::ContentHash;

/// Stable identifier for an indexed file. Allocated once per path,
/// monotonically increasing, never reused.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(u64);

impl FileId {
    /// Creates a FileId from a raw u64 value
    pub fn new(id: u64) -> Self {
        FileId(id)
    }

    /// Returns the raw u64 value of this file ID
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registry row describing one indexed file.
///
/// `fast_digest` is the whole-file XXH64 captured when the path was first
/// registered; re-indexing never refreshes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Stable file id
    pub id: FileId,
    /// Path the file was registered under
    pub path: String,
    /// XXH64 of the whole file at registration time
    pub fast_digest: u64,
}

/// A decoded chunk-index row: one chunk occurrence in one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRecord {
    /// BLAKE3 digest of the chunk content
    pub content_hash: ContentHash,
    /// File the chunk was observed in
    pub file_id: FileId,
    /// Byte offset of the chunk within the file
    pub offset: u64,
    /// Chunk length in bytes
    pub length: u64,
}

/// One occurrence of a chunk, without its digest. Duplicate groups map a
/// digest to every location it was recorded at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLocation {
    /// File the chunk was observed in
    pub file_id: FileId,
    /// Byte offset of the chunk within the file
    pub offset: u64,
    /// Chunk length in bytes
    pub length: u64,
}

impl ChunkRecord {
    /// The location part of this record
    pub fn location(&self) -> ChunkLocation {
        ChunkLocation {
            file_id: self.file_id,
            offset: self.offset,
            length: self.length,
        }
    }
}

/// Counters reported by one re-indexing pass over a file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReindexStats {
    /// Chunk records written
    pub chunks: u64,
    /// Source bytes consumed
    pub bytes: u64,
}
