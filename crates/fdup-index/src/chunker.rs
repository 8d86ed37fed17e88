//! Content-defined chunking (FastCDC) over streaming input
//!
//! Boundaries are chosen from content, so inserting or removing bytes near
//! the front of a stream only disturbs chunking until the algorithm
//! resynchronizes; identical regions after that point produce identical
//! chunks.

use crate::error::IndexError;
use bytes::Bytes;
use fastcdc::v2020::StreamCDC;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// A content-defined chunk produced by the streaming chunker
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Chunk content
    pub data: Bytes,
    /// Byte offset of this chunk in the source stream
    pub offset: u64,
    /// Chunk length in bytes
    pub length: u64,
}

/// Configuration for the FastCDC chunker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Minimum chunk size in bytes
    pub min_size: usize,
    /// Average (target) chunk size in bytes
    pub avg_size: usize,
    /// Maximum chunk size in bytes
    pub max_size: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            min_size: 512,
            avg_size: 16 * 1024,
            max_size: 1024 * 1024,
        }
    }
}

/// Content-defined chunker using the FastCDC algorithm
pub struct Chunker {
    config: ChunkerConfig,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunker {
    /// Create a chunker with default sizes
    pub fn new() -> Self {
        Self {
            config: ChunkerConfig::default(),
        }
    }

    /// Create a chunker with custom configuration
    pub fn with_config(config: ChunkerConfig) -> Self {
        Self { config }
    }

    /// Lazily chunk a reader. Single pass: the source is consumed as chunks
    /// are pulled, and the stream cannot be restarted. Dropping the stream
    /// early is fine.
    pub fn stream<R: Read>(&self, source: R) -> ChunkStream<R> {
        ChunkStream {
            inner: StreamCDC::new(
                source,
                self.config.min_size as u32,
                self.config.avg_size as u32,
                self.config.max_size as u32,
            ),
            done: false,
        }
    }

    /// Chunk an in-memory buffer. Concatenating all chunk.data bytes
    /// reconstructs the original data.
    pub fn chunk(&self, data: &[u8]) -> Result<Vec<Chunk>, IndexError> {
        self.stream(data).collect()
    }
}

/// Lazy chunk iterator over a reader.
///
/// An I/O error ends the stream: the error is yielded once and every
/// subsequent `next()` returns `None`. Empty input yields no chunks.
pub struct ChunkStream<R: Read> {
    inner: StreamCDC<R>,
    done: bool,
}

impl<R: Read> Iterator for ChunkStream<R> {
    type Item = Result<Chunk, IndexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.inner.next() {
            None => {
                self.done = true;
                None
            }
            Some(Ok(chunk)) => Some(Ok(Chunk {
                offset: chunk.offset,
                length: chunk.length as u64,
                data: Bytes::from(chunk.data),
            })),
            // Empty is the library's internal end-of-source marker
            Some(Err(fastcdc::v2020::Error::Empty)) => {
                self.done = true;
                None
            }
            Some(Err(fastcdc::v2020::Error::IoError(e))) => {
                self.done = true;
                Some(Err(IndexError::Io(e)))
            }
            Some(Err(e)) => {
                self.done = true;
                Some(Err(IndexError::Chunking(e.to_string())))
            }
        }
    }
}
