//! Command tree and dispatch.

use crate::actions::FindAction;
use crate::walk::{self, PathFilter, SearchKind};
use crate::{bom, chunkdup, filedup, merge, show, stat};
use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::HumanBytes;
use std::fs;
use std::path::PathBuf;
use tracing::{error, info};

/// Top-level argument parser.
#[derive(Parser)]
#[command(name = "fdup")]
#[command(about = "Find, deduplicate and merge files", long_about = None)]
pub struct Cli {
    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// All fdup subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Walk a tree and apply an action to every matching path
    Find {
        path: PathBuf,
        /// Glob matched against the full path
        #[arg(short, long, default_value = "*")]
        glob: String,
        /// Globs whose matches are dropped
        #[arg(short = 'e', long = "exclude")]
        excludes: Vec<String>,
        /// Entry kind to visit
        #[arg(short = 't', long = "type", value_enum, default_value = "all")]
        kind: SearchKind,
        /// `delete`, `copy-to:<dir>` or `move-to:<dir>`; prints when omitted
        #[arg(short = 'x', long)]
        action: Option<String>,
    },
    /// Deduplicate at whole-file or chunk granularity
    Dedup {
        #[command(subcommand)]
        cmd: DedupCmd,
    },
    /// Render persisted index state
    Show {
        #[command(subcommand)]
        cmd: ShowCmd,
    },
    /// Move one tree into another, collapsing files with equal content
    Merge {
        dst: PathBuf,
        src: PathBuf,
        /// Move files instead of printing the plan
        #[arg(short = 'x', long)]
        execute: bool,
    },
    /// Write a name,size CSV for every file under a path
    Stat {
        path: PathBuf,
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Prepend a UTF-8 BOM to files that lack one
    Bom {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Print the whole-file XXH64 digest of a path
    Hash { path: PathBuf },
}

/// Deduplication granularities.
#[derive(Subcommand)]
pub enum DedupCmd {
    /// Remove files under `prune` whose content also exists under `keep`
    File {
        keep: PathBuf,
        prune: PathBuf,
        /// Remove files instead of printing the plan
        #[arg(short = 'x', long)]
        execute: bool,
    },
    /// Index every file under a path into a chunk-level duplicate index
    Chunk {
        path: PathBuf,
        /// Index database directory
        #[arg(short, long)]
        dsn: PathBuf,
    },
}

/// Views over a persisted index.
#[derive(Subcommand)]
pub enum ShowCmd {
    /// Registered files
    Files {
        #[arg(short, long)]
        dsn: PathBuf,
    },
    /// Every chunk record, in digest order
    Chunks {
        #[arg(short, long)]
        dsn: PathBuf,
    },
    /// Duplicate chunk groups and reclaimable bytes
    Dupes {
        #[arg(short, long)]
        dsn: PathBuf,
    },
}

impl Cli {
    /// Run the parsed command to completion.
    pub fn run(self) -> Result<()> {
        match self.command {
            Command::Find {
                path,
                glob,
                excludes,
                kind,
                action,
            } => {
                let action = FindAction::parse(action.as_deref().unwrap_or(""))?;
                let filter = PathFilter::new(&glob, &excludes)?;
                for hit in walk::collect(&path, kind, &filter) {
                    if let Err(err) = action.apply(&hit) {
                        error!(path = %hit.display(), error = %err, "action failed");
                    }
                }
                Ok(())
            }
            Command::Dedup { cmd } => match cmd {
                DedupCmd::File {
                    keep,
                    prune,
                    execute,
                } => {
                    let summary = filedup::prune_tree(&keep, &prune, execute)?;
                    println!(
                        "{} duplicate files, {} removed",
                        summary.duplicates, summary.removed
                    );
                    if !execute && summary.duplicates > 0 {
                        println!("re-run with --execute to remove them");
                    }
                    Ok(())
                }
                DedupCmd::Chunk { path, dsn } => {
                    let summary = chunkdup::index_tree(&path, &dsn)?;
                    println!(
                        "{} files indexed, {} skipped; {} duplicate groups, {} reclaimable",
                        summary.indexed,
                        summary.skipped,
                        summary.groups,
                        HumanBytes(summary.reclaimable)
                    );
                    Ok(())
                }
            },
            Command::Show { cmd } => match cmd {
                ShowCmd::Files { dsn } => show::files(&dsn),
                ShowCmd::Chunks { dsn } => show::chunks(&dsn),
                ShowCmd::Dupes { dsn } => show::dupes(&dsn),
            },
            Command::Merge { dst, src, execute } => {
                let summary = merge::merge_trees(&dst, &src, execute)?;
                println!(
                    "{} moved, {} collapsed, {} conflicts",
                    summary.moved, summary.collapsed, summary.conflicts
                );
                Ok(())
            }
            Command::Stat { path, output } => stat::report(&path, output.as_deref()),
            Command::Bom { paths } => {
                for path in &paths {
                    match bom::add_utf8_bom(path) {
                        Ok(true) => info!(path = %path.display(), "BOM added"),
                        Ok(false) => info!(path = %path.display(), "BOM already present"),
                        Err(err) => {
                            error!(path = %path.display(), error = %err, "BOM rewrite failed")
                        }
                    }
                }
                Ok(())
            }
            Command::Hash { path } => {
                let mut file = fs::File::open(&path)?;
                let digest = fdup_index::fast_hash_reader(&mut file)?;
                println!("{digest:#x}");
                Ok(())
            }
        }
    }
}
