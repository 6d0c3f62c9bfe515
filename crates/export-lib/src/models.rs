//! Core data models for the metrics exporter

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder substituted with the cluster name in query expressions
pub const CLUSTER_PLACEHOLDER: &str = "{{cluster}}";

/// Column names every archive reserves for itself
pub const RESERVED_FIELDS: &[&str] = &["cluster", "node", "time"];

/// A sample value exactly as the backend rendered it (e.g. `"1"`, `"NaN"`)
pub type SampleValue = String;

/// A monitored cluster and its Prometheus connection attributes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub name: String,
    pub prom_base_url: String,
    #[serde(default)]
    pub token: Option<String>,
    /// Raw node identifier -> canonical node identifier
    #[serde(default)]
    pub node_merge: BTreeMap<String, String>,
}

impl Cluster {
    /// Resolve a raw node identifier through the `node_merge` aliases
    pub fn canonical_node<'a>(&'a self, raw: &'a str) -> &'a str {
        self.node_merge.get(raw).map(String::as_str).unwrap_or(raw)
    }
}

/// Which endpoint a query is sent to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuerySource {
    /// The cluster's own Prometheus
    #[default]
    #[serde(alias = "cluster", alias = "prometheus")]
    Local,
    /// The shared multicluster endpoint
    Multicluster,
}

/// A named PromQL instant query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    /// Output column name
    pub name: String,
    pub promql: String,
    #[serde(default)]
    pub source: QuerySource,
    /// Backend-side evaluation timeout, e.g. `"30s"`
    #[serde(default)]
    pub timeout: Option<String>,
}

impl Query {
    /// The query expression with the cluster placeholder filled in
    pub fn expression_for(&self, cluster: &str) -> String {
        self.promql.replace(CLUSTER_PLACEHOLDER, cluster)
    }
}

/// One cluster-wide snapshot row
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterRecord {
    pub cluster: String,
    pub time: i64,
    /// Query name -> value, in query order; `None` when the query failed or was empty
    pub values: Vec<(String, Option<SampleValue>)>,
}

impl ClusterRecord {
    pub fn new(cluster: impl Into<String>, time: i64) -> Self {
        Self {
            cluster: cluster.into(),
            time,
            values: Vec::new(),
        }
    }

    pub fn get(&self, query: &str) -> Option<&SampleValue> {
        self.values
            .iter()
            .find(|(name, _)| name == query)
            .and_then(|(_, value)| value.as_ref())
    }
}

/// Per-node snapshot values for one cluster and round, before flattening
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeRecord {
    pub time: i64,
    /// Node identifier -> (query name -> value); ordered so rows come out deterministically
    pub nodes: BTreeMap<String, BTreeMap<String, SampleValue>>,
}

impl NodeRecord {
    pub fn new(time: i64) -> Self {
        Self {
            time,
            nodes: BTreeMap::new(),
        }
    }

    /// Merge one node query's results into the record
    pub fn merge(&mut self, query: &str, values: BTreeMap<String, SampleValue>) {
        for (node, value) in values {
            self.nodes
                .entry(node)
                .or_default()
                .insert(query.to_string(), value);
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_substitutes_every_placeholder() {
        let query = Query {
            name: "up".to_string(),
            promql: r#"sum(up{cluster="{{cluster}}"}) / count(up{cluster="{{cluster}}"})"#
                .to_string(),
            source: QuerySource::Local,
            timeout: None,
        };

        assert_eq!(
            query.expression_for("prod"),
            r#"sum(up{cluster="prod"}) / count(up{cluster="prod"})"#
        );
    }

    #[test]
    fn test_canonical_node_uses_merge_table() {
        let mut node_merge = BTreeMap::new();
        node_merge.insert("host1".to_string(), "hostA".to_string());
        let cluster = Cluster {
            name: "c1".to_string(),
            prom_base_url: "http://prom:9090".to_string(),
            token: None,
            node_merge,
        };

        assert_eq!(cluster.canonical_node("host1"), "hostA");
        assert_eq!(cluster.canonical_node("host2"), "host2");
    }

    #[test]
    fn test_node_record_merge_creates_and_extends_entries() {
        let mut record = NodeRecord::new(100);
        record.merge(
            "cpu",
            BTreeMap::from([
                ("n1".to_string(), "0.5".to_string()),
                ("n2".to_string(), "0.7".to_string()),
            ]),
        );
        record.merge("mem", BTreeMap::from([("n2".to_string(), "42".to_string())]));

        assert_eq!(record.node_count(), 2);
        assert_eq!(record.nodes["n1"].len(), 1);
        assert_eq!(record.nodes["n2"]["mem"], "42");
    }

    #[test]
    fn test_query_source_aliases() {
        let source: QuerySource = serde_json::from_str(r#""cluster""#).unwrap();
        assert_eq!(source, QuerySource::Local);
        let source: QuerySource = serde_json::from_str(r#""multicluster""#).unwrap();
        assert_eq!(source, QuerySource::Multicluster);
    }
}
