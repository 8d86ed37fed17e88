#![warn(missing_docs)]

//! Chunk-level file deduplication index
//!
//! Write path: File → identity (XXH64 of path and content) → Chunk
//! (FastCDC) → Fingerprint (BLAKE3) → chunk records in an ordered store.
//! Read path: forward scans of the digest-ordered keyspace, from which
//! duplicate groups fall out contiguously.

pub mod chunker;
pub mod dedup;
pub mod dupes;
pub mod error;
pub mod hash;
pub mod index;
pub mod keys;
pub mod registry;
pub mod rocks;
pub mod store;
pub mod types;

pub use chunker::{Chunk, ChunkStream, Chunker, ChunkerConfig};
pub use dedup::Deduplicator;
pub use dupes::{duplicate_groups, reclaimable_bytes, DuplicateGroups};
pub use error::IndexError;
pub use hash::{content_hash, fast_hash, fast_hash_reader, ContentHash};
pub use index::ChunkIndex;
pub use keys::prefix_range_end;
pub use registry::FileRegistry;
pub use rocks::RocksStore;
pub use store::{BatchOp, Durability, MemoryStore, OrderedStore};
pub use types::{ChunkLocation, ChunkRecord, FileEntry, FileId, ReindexStats};
