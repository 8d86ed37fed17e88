//! Duplicate chunk detection over the persisted index
//!
//! Chunk keys sort digest-major, so every occurrence of the same content
//! sits in one contiguous run. One forward scan groups the runs; runs of
//! length one are not duplicates and are dropped.

use std::collections::BTreeMap;

use crate::error::IndexError;
use crate::hash::ContentHash;
use crate::keys;
use crate::store::OrderedStore;
use crate::types::ChunkLocation;

/// Duplicate groups keyed by content digest, each listing every recorded
/// location of that chunk.
pub type DuplicateGroups = BTreeMap<ContentHash, Vec<ChunkLocation>>;

fn commit(groups: &mut DuplicateGroups, pending: Option<(ContentHash, Vec<ChunkLocation>)>) {
    if let Some((hash, locations)) = pending {
        if locations.len() >= 2 {
            groups.insert(hash, locations);
        }
    }
}

/// Scans the whole chunk keyspace and returns every digest recorded at two
/// or more locations, with all of its locations, first occurrence included.
pub fn duplicate_groups(store: &dyn OrderedStore) -> Result<DuplicateGroups, IndexError> {
    let lower = keys::PREFIX_FILE_CHUNK.to_vec();
    let upper = keys::prefix_range_end(keys::PREFIX_FILE_CHUNK);

    let mut groups = DuplicateGroups::new();
    let mut pending: Option<(ContentHash, Vec<ChunkLocation>)> = None;
    for item in store.iter(&lower, upper.as_deref())? {
        let (key, _) = item?;
        let record = keys::decode_chunk_key(&key)?;
        match &mut pending {
            Some((hash, locations)) if *hash == record.content_hash => {
                locations.push(record.location());
            }
            _ => {
                commit(&mut groups, pending.take());
                pending = Some((record.content_hash, vec![record.location()]));
            }
        }
    }
    commit(&mut groups, pending);
    Ok(groups)
}

/// Bytes that would be freed by keeping one copy of each duplicated chunk.
pub fn reclaimable_bytes(groups: &DuplicateGroups) -> u64 {
    groups
        .values()
        .map(|locations| locations.iter().skip(1).map(|l| l.length).sum::<u64>())
        .sum()
}
