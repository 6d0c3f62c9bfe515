//! Archive column schemas and rows

use crate::models::{ClusterRecord, NodeRecord, Query};
use std::collections::BTreeMap;

/// Ordered column list of an archive file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSchema {
    fields: Vec<String>,
}

impl ArchiveSchema {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// `cluster`, `time`, then one column per cluster query
    pub fn cluster(queries: &[Query]) -> Self {
        Self::new(
            ["cluster", "time"]
                .into_iter()
                .map(String::from)
                .chain(queries.iter().map(|q| q.name.clone())),
        )
    }

    /// `cluster`, `node`, `time`, then one column per node query
    pub fn node(queries: &[Query]) -> Self {
        Self::new(
            ["cluster", "node", "time"]
                .into_iter()
                .map(String::from)
                .chain(queries.iter().map(|q| q.name.clone())),
        )
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

/// One archive row, keyed by column name. Missing columns are written empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveRow {
    cells: BTreeMap<String, Option<String>>,
}

impl ArchiveRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: Option<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: Option<String>) {
        self.cells.insert(field.into(), value);
    }

    /// Cell text for a column; empty when absent or null
    pub fn cell(&self, field: &str) -> &str {
        self.cells
            .get(field)
            .and_then(|value| value.as_deref())
            .unwrap_or("")
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }
}

impl From<&ClusterRecord> for ArchiveRow {
    fn from(record: &ClusterRecord) -> Self {
        let mut row = ArchiveRow::new()
            .with("cluster", Some(record.cluster.clone()))
            .with("time", Some(record.time.to_string()));
        for (query, value) in &record.values {
            row.set(query.clone(), value.clone());
        }
        row
    }
}

/// Flatten a node record into one row per node, in node order
pub fn node_rows(cluster: &str, record: &NodeRecord) -> Vec<ArchiveRow> {
    record
        .nodes
        .iter()
        .map(|(node, values)| {
            let mut row = ArchiveRow::new()
                .with("cluster", Some(cluster.to_string()))
                .with("node", Some(node.clone()))
                .with("time", Some(record.time.to_string()));
            for (query, value) in values {
                row.set(query.clone(), Some(value.clone()));
            }
            row
        })
        .collect()
}
