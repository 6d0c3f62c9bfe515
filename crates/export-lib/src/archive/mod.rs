//! CSV snapshot archives
//!
//! This module provides:
//! - Column schemas derived from the configured queries
//! - Flattening of cluster and node records into rows
//! - Append-only CSV files with a header locked at creation
//! - The directory layout of the output tree

mod layout;
mod schema;
mod writer;

pub use layout::ArchiveLayout;
pub use schema::{node_rows, ArchiveRow, ArchiveSchema};
pub use writer::CsvArchive;
