//! Flattening of query results into snapshot values

use super::response::QueryData;
use crate::error::QueryError;
use crate::models::{Cluster, SampleValue};
use std::collections::BTreeMap;
use tracing::debug;

/// Label carrying the scrape target, `host:port`
const INSTANCE_LABEL: &str = "instance";

/// Reduce a cluster query result to a single value.
///
/// An empty vector yields `None`; otherwise the first series wins.
pub fn extract_cluster_value(data: QueryData) -> Result<Option<SampleValue>, QueryError> {
    match data {
        QueryData::Scalar(sample) | QueryData::String(sample) => Ok(Some(sample.1)),
        QueryData::Vector(samples) => Ok(samples.into_iter().next().map(|s| s.value.1)),
        QueryData::Matrix(_) => Err(QueryError::UnsupportedResultType("matrix")),
    }
}

/// Reduce a node query result to node -> value.
///
/// The node identifier is the `instance` label up to its first `:`, rewritten
/// through the cluster's `node_merge` table. When several series land on the
/// same node the last one is kept.
pub fn extract_node_values(
    cluster: &Cluster,
    data: QueryData,
) -> Result<BTreeMap<String, SampleValue>, QueryError> {
    let samples = match data {
        QueryData::Vector(samples) => samples,
        // Node queries are expected to produce vectors
        QueryData::Scalar(_) | QueryData::String(_) => return Ok(BTreeMap::new()),
        QueryData::Matrix(_) => return Err(QueryError::UnsupportedResultType("matrix")),
    };

    let mut values = BTreeMap::new();
    for sample in samples {
        let Some(instance) = sample.metric.get(INSTANCE_LABEL) else {
            debug!(cluster = %cluster.name, metric = ?sample.metric, "Skipping series without instance label");
            continue;
        };
        let node = node_id(instance);
        values.insert(cluster.canonical_node(node).to_string(), sample.value.1);
    }

    Ok(values)
}

/// Strip the port suffix from an instance label
fn node_id(instance: &str) -> &str {
    instance.split(':').next().unwrap_or(instance)
}
