//! Export library for Prometheus snapshot archives
//!
//! This crate provides the core functionality for:
//! - Instant queries against Prometheus-compatible backends
//! - Normalization of cluster-wide and per-node results
//! - Snapshot rounds per cluster
//! - Append-only CSV archives

pub mod archive;
pub mod config;
pub mod error;
pub mod exporter;
pub mod models;
pub mod prom;
pub mod snapshot;

pub use self::config::{ExportConfig, MulticlusterConfig};
pub use error::{ArchiveError, ConfigError, ExportError, QueryError};
pub use exporter::{Exporter, RunReport};
pub use models::*;
pub use prom::{PromClient, QueryBackend, QueryTarget};
pub use snapshot::{RoundSummary, SnapshotAssembler};
