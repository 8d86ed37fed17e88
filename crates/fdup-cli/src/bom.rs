//! UTF-8 BOM insertion.

use anyhow::{anyhow, Result};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Prepends a UTF-8 BOM to `path` unless one is already there. The
/// rewrite goes through a temp file in the same directory and a rename,
/// so the file is never observable half-written. Returns whether the
/// file changed.
pub fn add_utf8_bom(path: &Path) -> Result<bool> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut src = fs::File::open(path)?;
    let mut head = Vec::with_capacity(BOM.len());
    Read::by_ref(&mut src).take(BOM.len() as u64).read_to_end(&mut head)?;
    if head == BOM {
        return Ok(false);
    }

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(BOM)?;
    tmp.write_all(&head)?;
    io::copy(&mut src, &mut tmp)?;
    tmp.persist(path)
        .map_err(|err| anyhow!("replacing {}: {}", path.display(), err.error))?;
    Ok(true)
}
