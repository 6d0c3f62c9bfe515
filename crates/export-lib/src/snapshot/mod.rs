//! Snapshot collection
//!
//! One round per cluster: cluster queries become a single row in the shared
//! cluster archive, node queries become one row per node in the cluster's
//! node archive. All rows of a round share one timestamp.

mod assembler;

#[cfg(test)]
mod tests;

pub use assembler::{RoundSummary, SnapshotAssembler};
