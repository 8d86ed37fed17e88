//! Filesystem traversal with glob filtering.
//!
//! Globs are matched against the full path, and `*` crosses directory
//! separators, so `-g '*.txt'` finds text files at any depth.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Which directory entries a search visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SearchKind {
    /// Regular files
    #[value(name = "file", alias = "f")]
    Files,
    /// Directories
    #[value(name = "dir", alias = "d")]
    Dirs,
    /// Directories with no entries
    #[value(name = "empty")]
    EmptyDirs,
    /// Files and directories
    #[default]
    #[value(name = "all")]
    All,
}

/// Include/exclude glob filter applied to full paths.
pub struct PathFilter {
    include: GlobSet,
    exclude: GlobSet,
}

impl PathFilter {
    /// Compiles one include glob and any number of exclude globs.
    pub fn new(include: &str, excludes: &[String]) -> anyhow::Result<Self> {
        let include = GlobSetBuilder::new().add(Glob::new(include)?).build()?;
        let mut builder = GlobSetBuilder::new();
        for pattern in excludes {
            builder.add(Glob::new(pattern)?);
        }
        Ok(Self {
            include,
            exclude: builder.build()?,
        })
    }

    /// True when the path matches the include glob and no exclude glob.
    pub fn matches(&self, path: &Path) -> bool {
        self.include.is_match(path) && !self.exclude.is_match(path)
    }
}

/// Walks `root` and returns every matching path. Unreadable entries are
/// logged and skipped.
pub fn collect(root: &Path, kind: SearchKind, filter: &PathFilter) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        let keep = match kind {
            SearchKind::Files => entry.file_type().is_file(),
            SearchKind::Dirs => entry.file_type().is_dir(),
            SearchKind::EmptyDirs => entry.file_type().is_dir() && dir_is_empty(entry.path()),
            SearchKind::All => true,
        };
        if keep && filter.matches(entry.path()) {
            found.push(entry.into_path());
        }
    }
    found
}

/// Iterates the regular files under `root`, logging and skipping
/// unreadable entries.
pub fn files_under(root: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root).into_iter().filter_map(|entry| match entry {
        Ok(entry) if entry.file_type().is_file() => Some(entry.into_path()),
        Ok(_) => None,
        Err(err) => {
            warn!(error = %err, "skipping unreadable entry");
            None
        }
    })
}

fn dir_is_empty(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}
