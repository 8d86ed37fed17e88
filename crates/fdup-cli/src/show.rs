//! Table rendering for persisted index state.

use anyhow::Result;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use fdup_index::{reclaimable_bytes, ChunkerConfig, Deduplicator, OrderedStore, RocksStore};
use indicatif::HumanBytes;
use std::path::Path;
use std::sync::Arc;

fn open_engine(dsn: &Path) -> Result<Deduplicator> {
    let store: Arc<dyn OrderedStore> = Arc::new(RocksStore::open(dsn)?);
    Ok(Deduplicator::open(store, ChunkerConfig::default())?)
}

fn table_with_header(columns: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            columns
                .iter()
                .map(|name| Cell::new(name).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
    table
}

/// Prints every registered file with its id and whole-file digest.
pub fn files(dsn: &Path) -> Result<()> {
    let engine = open_engine(dsn)?;
    let mut table = table_with_header(&["ID", "Path", "Hash"]);
    for entry in engine.entries()? {
        table.add_row(vec![
            entry.id.to_string(),
            entry.path.clone(),
            format!("{:#x}", entry.fast_digest),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Prints every chunk record in digest order.
pub fn chunks(dsn: &Path) -> Result<()> {
    let engine = open_engine(dsn)?;
    let mut table = table_with_header(&["Hash", "File", "Offset", "Length"]);
    for record in engine.records()? {
        table.add_row(vec![
            record.content_hash.to_hex(),
            record.file_id.to_string(),
            record.offset.to_string(),
            record.length.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Prints duplicate chunk groups and the total reclaimable size.
pub fn dupes(dsn: &Path) -> Result<()> {
    let engine = open_engine(dsn)?;
    let groups = engine.duplicates()?;
    let mut table = table_with_header(&["Hash", "Copies", "Length", "Locations"]);
    for (hash, locations) in &groups {
        let spots = locations
            .iter()
            .map(|l| format!("{}@{}", l.file_id, l.offset))
            .collect::<Vec<_>>()
            .join(" ");
        table.add_row(vec![
            hash.to_hex(),
            locations.len().to_string(),
            locations[0].length.to_string(),
            spots,
        ]);
    }
    println!("{table}");
    println!(
        "{} duplicate groups, {} reclaimable",
        groups.len(),
        HumanBytes(reclaimable_bytes(&groups))
    );
    Ok(())
}
