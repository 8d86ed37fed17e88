//! Per-path actions for `find`.

use anyhow::{anyhow, bail, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A destination name is already taken. Callers that can resolve the
/// collision (see `merge`) downcast to this.
#[derive(Debug, thiserror::Error)]
#[error("destination already exists: {}", .path.display())]
pub struct FileExists {
    /// The occupied destination path.
    pub path: PathBuf,
}

/// What to do with each path a search matches.
#[derive(Debug, Clone)]
pub enum FindAction {
    /// Print the path to stdout.
    Print,
    /// Remove the file or directory tree.
    Delete,
    /// Copy the file into a directory, keeping its name.
    CopyTo(PathBuf),
    /// Move the file into a directory, keeping its name.
    MoveTo(PathBuf),
}

impl FindAction {
    /// Parses the `-x` grammar: `delete` (or `rm`), `copy-to:<dir>`,
    /// `move-to:<dir>`. An empty string means print. Destination
    /// directories are created up front.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Ok(Self::Print);
        }
        if raw == "delete" || raw == "rm" {
            return Ok(Self::Delete);
        }
        if let Some(dir) = raw.strip_prefix("copy-to:") {
            return Ok(Self::CopyTo(prepare_dir(dir)?));
        }
        if let Some(dir) = raw.strip_prefix("move-to:") {
            return Ok(Self::MoveTo(prepare_dir(dir)?));
        }
        bail!("unknown action: {raw}");
    }

    /// Applies the action to one path.
    pub fn apply(&self, path: &Path) -> Result<()> {
        match self {
            Self::Print => {
                println!("{}", path.display());
                Ok(())
            }
            Self::Delete => {
                let meta = fs::symlink_metadata(path)?;
                if meta.is_dir() {
                    fs::remove_dir_all(path)?;
                } else {
                    fs::remove_file(path)?;
                }
                debug!(path = %path.display(), "removed");
                Ok(())
            }
            Self::CopyTo(dir) => copy_into(path, dir),
            Self::MoveTo(dir) => move_into(path, dir),
        }
    }
}

fn prepare_dir(dir: &str) -> Result<PathBuf> {
    if dir.is_empty() {
        bail!("action needs a destination directory");
    }
    let dir = PathBuf::from(dir);
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn destination(path: &Path, dir: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| anyhow!("path has no file name: {}", path.display()))?;
    let dest = dir.join(name);
    if dest.exists() {
        return Err(FileExists { path: dest }.into());
    }
    Ok(dest)
}

/// Copies `path` into directory `dir` under its own name. Refuses to
/// clobber an existing destination.
pub fn copy_into(path: &Path, dir: &Path) -> Result<()> {
    let dest = destination(path, dir)?;
    fs::copy(path, &dest)?;
    debug!(src = %path.display(), dst = %dest.display(), "copied");
    Ok(())
}

/// Moves `path` into directory `dir` under its own name. Refuses to
/// clobber; falls back to copy-and-remove when rename fails, which
/// covers moves across filesystems.
pub fn move_into(path: &Path, dir: &Path) -> Result<()> {
    let dest = destination(path, dir)?;
    if fs::rename(path, &dest).is_err() {
        fs::copy(path, &dest)?;
        fs::remove_file(path)?;
    }
    debug!(src = %path.display(), dst = %dest.display(), "moved");
    Ok(())
}
