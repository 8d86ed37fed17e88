#![warn(missing_docs)]

//! fdup command line: filesystem search with per-path actions, whole-file and
//! chunk-level deduplication, tree merging, size reports, BOM fixes.

pub mod actions;
pub mod bom;
pub mod chunkdup;
pub mod cli;
pub mod filedup;
pub mod merge;
pub mod show;
pub mod stat;
pub mod walk;
