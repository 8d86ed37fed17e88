//! Content fingerprinting: BLAKE3 content digests and XXH64 fast digests
//!
//! Chunks are identified by their 32-byte BLAKE3 digest. Whole files and
//! path strings use XXH64 (seed 0), which is cheap enough to run over every
//! file in a corpus.

use serde::{Deserialize, Serialize};
use std::io::Read;
use xxhash_rust::xxh64::{xxh64, Xxh64};

/// A 32-byte BLAKE3 hash identifying a chunk's content. Used as the index key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Return the hash as a lowercase hex string
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
    /// Return the raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Compute the BLAKE3 digest of data
pub fn content_hash(data: &[u8]) -> ContentHash {
    let hash = blake3::hash(data);
    ContentHash(*hash.as_bytes())
}

/// XXH64 (seed 0) of a byte slice
pub fn fast_hash(data: &[u8]) -> u64 {
    xxh64(data, 0)
}

/// XXH64 (seed 0) of an entire reader, streamed in 64 KiB blocks
pub fn fast_hash_reader<R: Read>(reader: &mut R) -> std::io::Result<u64> {
    let mut hasher = Xxh64::new(0);
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.digest())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn content_hash_is_deterministic() {
        let h1 = content_hash(b"hello world");
        let h2 = content_hash(b"hello world");
        assert_eq!(h1, h2);
    }

    #[test]
    fn different_data_produces_different_hashes() {
        let h1 = content_hash(b"hello");
        let h2 = content_hash(b"world");
        assert_ne!(h1, h2);
    }

    #[test]
    fn content_hash_empty_vector() {
        // BLAKE3 of the empty input, from the reference implementation
        assert_eq!(
            content_hash(b"").to_hex(),
            "af1349b9f5f9a1a6a0404dee36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
        );
    }

    #[test]
    fn fast_hash_empty_vector() {
        // XXH64 of the empty input with seed 0
        assert_eq!(fast_hash(b""), 0xEF46_DB37_51D8_E999);
    }

    #[test]
    fn fast_hash_reader_matches_slice() {
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let streamed = fast_hash_reader(&mut data.as_slice()).unwrap();
        assert_eq!(streamed, fast_hash(&data));
    }

    #[test]
    fn display_renders_hex() {
        let h = content_hash(b"x");
        assert_eq!(h.to_string(), h.to_hex());
        assert_eq!(h.to_hex().len(), 64);
    }

    proptest! {
        #[test]
        fn prop_content_hash_deterministic(data in prop::collection::vec(0u8..=255, 0..10_000)) {
            prop_assert_eq!(content_hash(&data), content_hash(&data));
        }

        #[test]
        fn prop_reader_and_slice_agree(data in prop::collection::vec(0u8..=255, 0..100_000)) {
            prop_assert_eq!(fast_hash_reader(&mut data.as_slice()).unwrap(), fast_hash(&data));
        }
    }
}
