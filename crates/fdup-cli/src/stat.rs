//! Per-file size report as CSV.

use anyhow::Result;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use walkdir::WalkDir;

/// Writes a `name,size` record for every file under `root`.
pub fn write_stats<W: Write>(root: &Path, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["name", "size"])?;
    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        let size = entry.metadata()?.len().to_string();
        csv.write_record([name.as_ref(), size.as_str()])?;
    }
    csv.flush()?;
    Ok(())
}

/// Reports to `output`, or stdout when no path is given.
pub fn report(root: &Path, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => write_stats(root, fs::File::create(path)?),
        None => write_stats(root, io::stdout()),
    }
}
