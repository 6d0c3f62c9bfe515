//! On-disk layout of the archive directory

use crate::error::ExportError;
use std::path::{Path, PathBuf};
use tracing::debug;

const SNAPSHOT_DIR: &str = "snapshot";
const TIME_SERIES_DIR: &str = "time_series";
const CLUSTER_DIR: &str = "cluster";
const NODES_DIR: &str = "nodes";
const CLUSTER_ARCHIVE: &str = "cluster_snapshots.csv";

/// Paths of every archive under an output directory
#[derive(Debug, Clone)]
pub struct ArchiveLayout {
    root: PathBuf,
}

impl ArchiveLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Shared cluster snapshot archive
    pub fn cluster_archive(&self) -> PathBuf {
        self.root
            .join(SNAPSHOT_DIR)
            .join(CLUSTER_DIR)
            .join(CLUSTER_ARCHIVE)
    }

    /// Per-cluster node snapshot archive
    pub fn node_archive(&self, cluster: &str) -> PathBuf {
        self.root
            .join(SNAPSHOT_DIR)
            .join(NODES_DIR)
            .join(format!("{}_node_snapshots.csv", cluster))
    }

    /// Create the directory tree for the enabled capture modes
    pub async fn prepare(
        &self,
        capture_snapshot: bool,
        capture_time_series: bool,
    ) -> Result<(), ExportError> {
        let mut dirs = Vec::new();
        if capture_time_series {
            dirs.push(self.root.join(TIME_SERIES_DIR).join(CLUSTER_DIR));
            dirs.push(self.root.join(TIME_SERIES_DIR).join(NODES_DIR));
        }
        if capture_snapshot {
            dirs.push(self.root.join(SNAPSHOT_DIR).join(CLUSTER_DIR));
            dirs.push(self.root.join(SNAPSHOT_DIR).join(NODES_DIR));
        }

        for dir in dirs {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|source| ExportError::Layout {
                    path: dir.clone(),
                    source,
                })?;
            debug!(path = %dir.display(), "Prepared output directory");
        }

        Ok(())
    }
}
