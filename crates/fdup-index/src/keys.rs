//! Binary key schema for the deduplication index
//!
//! All persisted rows live in one ordered keyspace, partitioned by a
//! two-byte ASCII prefix:
//!
//! | prefix | key layout                                    | value            |
//! |--------|-----------------------------------------------|------------------|
//! | `pi`   | `pi` + path XXH64 (8B)                        | file id (8B)     |
//! | `fe`   | `fe` + file id (8B)                           | bincode FileEntry|
//! | `fc`   | `fc` + digest (32B) + id (8B) + offset (8B) + length (8B) | empty|
//!
//! Integers are big-endian so byte order equals numeric order. Chunk rows
//! carry everything in the key and sort digest-major, which is what the
//! duplicate scan relies on.

use crate::error::IndexError;
use crate::hash::ContentHash;
use crate::types::{ChunkRecord, FileId};

/// Prefix of path-identity rows
pub const PREFIX_PATH_INDEX: &[u8; 2] = b"pi";
/// Prefix of file-entry rows
pub const PREFIX_FILE_ENTRY: &[u8; 2] = b"fe";
/// Prefix of chunk rows
pub const PREFIX_FILE_CHUNK: &[u8; 2] = b"fc";

const FILE_ENTRY_KEY_LEN: usize = 2 + 8;
const CHUNK_KEY_LEN: usize = 2 + 32 + 8 + 8 + 8;

fn be_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_be_bytes(buf)
}

/// Key of the path-identity row for a hashed path string
pub fn path_index_key(path_hash: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(FILE_ENTRY_KEY_LEN);
    key.extend_from_slice(PREFIX_PATH_INDEX);
    key.extend_from_slice(&path_hash.to_be_bytes());
    key
}

/// Key of a file-entry row
pub fn file_entry_key(id: FileId) -> Vec<u8> {
    let mut key = Vec::with_capacity(FILE_ENTRY_KEY_LEN);
    key.extend_from_slice(PREFIX_FILE_ENTRY);
    key.extend_from_slice(&id.as_u64().to_be_bytes());
    key
}

/// Decode the file id from a file-entry key
pub fn file_entry_id(key: &[u8]) -> Result<FileId, IndexError> {
    if key.len() != FILE_ENTRY_KEY_LEN || !key.starts_with(PREFIX_FILE_ENTRY) {
        return Err(IndexError::CorruptState(format!(
            "malformed file entry key: {:02x?}",
            key
        )));
    }
    Ok(FileId::new(be_u64(&key[2..10])))
}

/// Key of one chunk occurrence. The value stored under it is empty; the key
/// itself is the record.
pub fn chunk_key(hash: &ContentHash, file_id: FileId, offset: u64, length: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(CHUNK_KEY_LEN);
    key.extend_from_slice(PREFIX_FILE_CHUNK);
    key.extend_from_slice(hash.as_bytes());
    key.extend_from_slice(&file_id.as_u64().to_be_bytes());
    key.extend_from_slice(&offset.to_be_bytes());
    key.extend_from_slice(&length.to_be_bytes());
    key
}

/// Decode a chunk key back into its record form
pub fn decode_chunk_key(key: &[u8]) -> Result<ChunkRecord, IndexError> {
    if key.len() != CHUNK_KEY_LEN || !key.starts_with(PREFIX_FILE_CHUNK) {
        return Err(IndexError::CorruptState(format!(
            "malformed chunk key: {} bytes, prefix {:02x?}",
            key.len(),
            &key[..key.len().min(2)]
        )));
    }
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&key[2..34]);
    Ok(ChunkRecord {
        content_hash: ContentHash(hash),
        file_id: FileId::new(be_u64(&key[34..42])),
        offset: be_u64(&key[42..50]),
        length: be_u64(&key[50..58]),
    })
}

/// Lower bound of a file's sub-range of the chunk keyspace
pub fn chunk_scan_start(file_id: FileId) -> Vec<u8> {
    let mut key = Vec::with_capacity(FILE_ENTRY_KEY_LEN);
    key.extend_from_slice(PREFIX_FILE_CHUNK);
    key.extend_from_slice(&file_id.as_u64().to_be_bytes());
    key
}

/// Half-open bounds `[fc + id, end)` used when clearing a file's chunk rows.
pub fn chunk_range(file_id: FileId) -> (Vec<u8>, Vec<u8>) {
    let lower = chunk_scan_start(file_id);
    // 'c' < 0xFF, so the range end always exists
    let upper = prefix_range_end(&lower).expect("fc prefix keeps the range bounded");
    (lower, upper)
}

/// Smallest key greater than every key carrying `prefix`, or `None` when no
/// such key exists (empty or all-0xFF prefixes cover the rest of the
/// keyspace).
///
/// Trailing 0xFF bytes are dropped, then the last remaining byte is
/// incremented.
pub fn prefix_range_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    loop {
        match end.last_mut() {
            None => return None,
            Some(b) if *b == 0xFF => {
                end.pop();
            }
            Some(b) => {
                *b += 1;
                return Some(end);
            }
        }
    }
}
