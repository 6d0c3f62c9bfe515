//! Snapshot round for a single cluster
//!
//! Runs every cluster query, appends the cluster row, then runs every node
//! query and appends one row per node. Queries run one after another in
//! configuration order.

use crate::archive::{node_rows, ArchiveLayout, ArchiveRow, ArchiveSchema, CsvArchive};
use crate::config::ExportConfig;
use crate::error::{QueryError, Result};
use crate::models::{Cluster, ClusterRecord, NodeRecord, Query};
use crate::prom::{extract_cluster_value, extract_node_values, QueryBackend, QueryData};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of one cluster's round
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoundSummary {
    pub cluster: String,
    pub time: i64,
    pub queries_succeeded: usize,
    pub queries_failed: usize,
    pub nodes: usize,
    pub cluster_rows: usize,
    pub node_rows: usize,
}

/// Drives the backend for one cluster and persists the results
pub struct SnapshotAssembler {
    backend: Arc<dyn QueryBackend>,
    config: Arc<ExportConfig>,
    layout: ArchiveLayout,
    cluster_schema: ArchiveSchema,
    node_schema: ArchiveSchema,
}

impl SnapshotAssembler {
    pub fn new(backend: Arc<dyn QueryBackend>, config: Arc<ExportConfig>, layout: ArchiveLayout) -> Self {
        let cluster_schema = ArchiveSchema::cluster(&config.cluster_queries);
        let node_schema = ArchiveSchema::node(&config.node_queries);

        Self {
            backend,
            config,
            layout,
            cluster_schema,
            node_schema,
        }
    }

    /// Run a full round for `cluster`, stamping every row with `time`
    pub async fn run_round(&self, cluster: &Cluster, time: i64) -> Result<RoundSummary> {
        let mut summary = RoundSummary {
            cluster: cluster.name.clone(),
            time,
            ..Default::default()
        };

        let record = self.collect_cluster_record(cluster, time, &mut summary).await?;
        let cluster_archive = CsvArchive::new(self.layout.cluster_archive(), self.cluster_schema.clone());
        summary.cluster_rows = cluster_archive.append(&[ArchiveRow::from(&record)])?;

        let nodes = self.collect_node_record(cluster, time, &mut summary).await?;
        summary.nodes = nodes.node_count();
        let node_archive = CsvArchive::new(self.layout.node_archive(&cluster.name), self.node_schema.clone());
        summary.node_rows = node_archive.append(&node_rows(&cluster.name, &nodes))?;

        info!(
            cluster = %summary.cluster,
            time = summary.time,
            succeeded = summary.queries_succeeded,
            failed = summary.queries_failed,
            nodes = summary.nodes,
            node_rows = summary.node_rows,
            "Snapshot round complete"
        );

        Ok(summary)
    }

    /// Evaluate every cluster query; failed queries are recorded as null
    pub async fn collect_cluster_record(
        &self,
        cluster: &Cluster,
        time: i64,
        summary: &mut RoundSummary,
    ) -> Result<ClusterRecord> {
        let mut record = ClusterRecord::new(&cluster.name, time);

        for query in &self.config.cluster_queries {
            let outcome = self
                .evaluate(cluster, query)
                .await?
                .and_then(extract_cluster_value);
            let value = absorb(cluster, query, outcome, summary)?.flatten();
            record.values.push((query.name.clone(), value));
        }

        Ok(record)
    }

    /// Evaluate every node query; failed queries contribute nothing
    pub async fn collect_node_record(
        &self,
        cluster: &Cluster,
        time: i64,
        summary: &mut RoundSummary,
    ) -> Result<NodeRecord> {
        let mut record = NodeRecord::new(time);

        for query in &self.config.node_queries {
            let outcome = self
                .evaluate(cluster, query)
                .await?
                .and_then(|data| extract_node_values(cluster, data));
            if let Some(values) = absorb(cluster, query, outcome, summary)? {
                record.merge(&query.name, values);
            }
        }

        Ok(record)
    }

    /// Send one query; the outer error is configuration, the inner one the query itself
    async fn evaluate(
        &self,
        cluster: &Cluster,
        query: &Query,
    ) -> Result<std::result::Result<QueryData, QueryError>> {
        let target = self.config.target_for(cluster, query)?;
        let expression = query.expression_for(&cluster.name);
        let timeout = self.config.timeout_for(query);

        Ok(self
            .backend
            .query_instant(&target, &expression, timeout, None)
            .await)
    }
}

/// Swallow recoverable query failures, propagate the rest
fn absorb<T>(
    cluster: &Cluster,
    query: &Query,
    outcome: std::result::Result<T, QueryError>,
    summary: &mut RoundSummary,
) -> Result<Option<T>> {
    match outcome {
        Ok(value) => {
            summary.queries_succeeded += 1;
            Ok(Some(value))
        }
        Err(e) if e.is_recoverable() => {
            warn!(cluster = %cluster.name, query = %query.name, error = %e, "Query failed, skipping");
            summary.queries_failed += 1;
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}
