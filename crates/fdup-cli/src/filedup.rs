//! Whole-file deduplication between two trees.
//!
//! Every file is identified by a 32-byte key: its XXH64 digest in
//! big-endian followed by the first 24 bytes of its BLAKE3 digest. Both
//! trees are mapped key -> path into scratch stores, then every key in
//! the prune tree that also appears in the keep tree marks a file for
//! removal. Removal only happens with `execute`; the default is a dry
//! run that prints the plan.

use crate::walk;
use anyhow::Result;
use fdup_index::{Durability, OrderedStore, RocksStore};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use xxhash_rust::xxh64::Xxh64;

/// Outcome of a prune pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PruneSummary {
    /// Files in the prune tree whose content exists in the keep tree.
    pub duplicates: u64,
    /// How many of them were actually removed.
    pub removed: u64,
}

/// Whole-file identity: XXH64 (8 bytes, big-endian) then the leading
/// 24 bytes of BLAKE3, both computed in one streaming pass.
fn combined_key(path: &Path) -> Result<[u8; 32]> {
    let mut file = fs::File::open(path)?;
    let mut fast = Xxh64::new(0);
    let mut strong = blake3::Hasher::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        fast.update(&buf[..n]);
        strong.update(&buf[..n]);
    }
    let mut key = [0u8; 32];
    key[..8].copy_from_slice(&fast.digest().to_be_bytes());
    key[8..].copy_from_slice(&strong.finalize().as_bytes()[..24]);
    Ok(key)
}

fn map_tree(root: &Path, store: &RocksStore, label: &str) -> Result<u64> {
    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::with_template("{spinner:.green} {pos} files {msg}").unwrap());
    bar.enable_steady_tick(std::time::Duration::from_millis(100));
    bar.set_message(format!("hashing {label}"));

    let mut mapped = 0u64;
    for path in walk::files_under(root) {
        match combined_key(&path) {
            Ok(key) => {
                let value = path.to_string_lossy().into_owned().into_bytes();
                store.set(key.to_vec(), value, Durability::BestEffort)?;
                mapped += 1;
            }
            Err(err) => warn!(path = %path.display(), error = %err, "skipping file"),
        }
        bar.inc(1);
    }
    bar.finish_and_clear();
    Ok(mapped)
}

/// Removes (or, by default, just lists) files under `prune` whose
/// content also exists under `keep`.
pub fn prune_tree(keep: &Path, prune: &Path, execute: bool) -> Result<PruneSummary> {
    let scratch = tempfile::tempdir()?;
    let keep_db = RocksStore::open(&scratch.path().join("keep"))?;
    let prune_db = RocksStore::open(&scratch.path().join("prune"))?;

    let kept = map_tree(keep, &keep_db, "keep tree")?;
    let pruned = map_tree(prune, &prune_db, "prune tree")?;
    info!(kept, pruned, "trees hashed");

    let mut summary = PruneSummary::default();
    for item in prune_db.iter(b"", None)? {
        let (key, value) = item?;
        if keep_db.get(&key)?.is_none() {
            continue;
        }
        summary.duplicates += 1;
        let path = PathBuf::from(String::from_utf8_lossy(&value).into_owned());
        if !execute {
            println!("[dry run] would remove {}", path.display());
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => {
                summary.removed += 1;
                info!(path = %path.display(), "removed duplicate");
            }
            Err(err) => warn!(path = %path.display(), error = %err, "remove failed"),
        }
    }
    Ok(summary)
}
