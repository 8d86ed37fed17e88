//! Chunk-level indexing of a file tree.

use crate::walk;
use anyhow::Result;
use fdup_index::{
    reclaimable_bytes, ChunkerConfig, Deduplicator, IndexError, OrderedStore, RocksStore,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Outcome of indexing one tree.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IndexSummary {
    /// Files indexed.
    pub indexed: u64,
    /// Files skipped after a per-file error.
    pub skipped: u64,
    /// Duplicate chunk groups in the index afterwards.
    pub groups: u64,
    /// Bytes held by copies beyond the first in each group.
    pub reclaimable: u64,
}

/// Indexes every file under `root` into the chunk index at `dsn`.
/// Per-file errors are logged and skipped; a corrupt index aborts.
pub fn index_tree(root: &Path, dsn: &Path) -> Result<IndexSummary> {
    let store: Arc<dyn OrderedStore> = Arc::new(RocksStore::open(dsn)?);
    let engine = Deduplicator::open(store, ChunkerConfig::default())?;

    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::with_template("{spinner:.green} {pos} files {msg}").unwrap());
    bar.enable_steady_tick(std::time::Duration::from_millis(100));
    bar.set_message("indexing");

    let mut summary = IndexSummary::default();
    for path in walk::files_under(root) {
        match engine.process_file(&path) {
            Ok(_) => summary.indexed += 1,
            Err(err @ IndexError::CorruptState(_)) => return Err(err.into()),
            Err(err) => {
                summary.skipped += 1;
                warn!(path = %path.display(), error = %err, "skipping file");
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    let groups = engine.duplicates()?;
    summary.groups = groups.len() as u64;
    summary.reclaimable = reclaimable_bytes(&groups);
    Ok(summary)
}
