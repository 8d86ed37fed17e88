//! Error types for the deduplication index

/// All errors that can occur while building or querying the chunk index.
///
/// A missing key is not an error: lookups return `Ok(None)` and exhausted
/// iterators simply end. `CorruptState` means persisted bytes violate the
/// key schema or record format and the index cannot be trusted.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// I/O error reading source data
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Storage engine failure
    #[error("Store error: {0}")]
    Store(String),
    /// Persisted state violates the key schema or record format
    #[error("Corrupt index state: {0}")]
    CorruptState(String),
    /// Content-defined chunking failed
    #[error("Chunking failed: {0}")]
    Chunking(String),
}
