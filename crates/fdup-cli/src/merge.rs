//! Merge one directory tree into another.
//!
//! Every file under `src` moves to the mirrored directory under `dst`.
//! When the destination name is taken, equal content (by whole-file
//! XXH64) collapses to the destination copy and the source is removed;
//! differing content stays where it is and is reported as a conflict.

use crate::actions::{self, FileExists};
use anyhow::Result;
use fdup_index::fast_hash_reader;
use std::fs;
use std::path::Path;
use tracing::{info, warn};
use walkdir::WalkDir;

/// Outcome of a merge pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeSummary {
    /// Files moved into the destination tree.
    pub moved: u64,
    /// Source files removed because the destination already had the bytes.
    pub collapsed: u64,
    /// Name collisions with differing content, left in place.
    pub conflicts: u64,
}

fn same_content(a: &Path, b: &Path) -> Result<bool> {
    let digest_a = fast_hash_reader(&mut fs::File::open(a)?)?;
    let digest_b = fast_hash_reader(&mut fs::File::open(b)?)?;
    Ok(digest_a == digest_b)
}

/// Moves the files under `src` into `dst`, keeping relative paths.
/// Without `execute` nothing moves; the plan is printed instead.
pub fn merge_trees(dst: &Path, src: &Path, execute: bool) -> Result<MergeSummary> {
    let mut summary = MergeSummary::default();
    for entry in WalkDir::new(src) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let rel = path.strip_prefix(src)?;
        let dst_dir = dst.join(rel.parent().unwrap_or_else(|| Path::new("")));

        if !execute {
            println!(
                "[dry run] move {} -> {}",
                path.display(),
                dst_dir.display()
            );
            continue;
        }

        fs::create_dir_all(&dst_dir)?;
        match actions::move_into(path, &dst_dir) {
            Ok(()) => summary.moved += 1,
            Err(err) => match err.downcast_ref::<FileExists>() {
                None => return Err(err),
                Some(exists) => {
                    if same_content(path, &exists.path)? {
                        fs::remove_file(path)?;
                        summary.collapsed += 1;
                        info!(path = %path.display(), "collapsed into existing copy");
                    } else {
                        summary.conflicts += 1;
                        warn!(
                            src = %path.display(),
                            dst = %exists.path.display(),
                            "name collision with different content"
                        );
                    }
                }
            },
        }
    }
    Ok(summary)
}
