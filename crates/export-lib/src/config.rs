//! Exporter configuration
//!
//! The configuration is a YAML document listing the clusters to snapshot
//! and the cluster-level and node-level queries to run against each of them.
//! Environment lookups are the caller's business: the binary resolves the
//! config path and output-directory override and hands them in explicitly.

use crate::error::ConfigError;
use crate::models::{Cluster, Query, QuerySource, RESERVED_FIELDS};
use crate::prom::QueryTarget;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use url::Url;

/// Shared multicluster Prometheus endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct MulticlusterConfig {
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
}

/// Root configuration document
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Base directory for the archives
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    #[serde(default = "default_true")]
    pub capture_snapshot: bool,

    /// Only bootstraps the time-series directories; range export is not performed
    #[serde(default = "default_true")]
    pub capture_time_series: bool,

    /// Default backend evaluation timeout for queries without their own
    #[serde(default = "default_query_timeout")]
    pub query_timeout: String,

    #[serde(default)]
    pub multicluster: Option<MulticlusterConfig>,

    #[serde(default)]
    pub clusters: Vec<Cluster>,

    #[serde(default)]
    pub cluster_queries: Vec<Query>,

    #[serde(default)]
    pub node_queries: Vec<Query>,
}

fn default_true() -> bool {
    true
}

fn default_query_timeout() -> String {
    "60s".to_string()
}

impl ExportConfig {
    /// Load and validate configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Yaml))
            .build()?;

        Self::finish(settings)
    }

    /// Load and validate configuration from YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(content, config::FileFormat::Yaml))
            .build()?;

        Self::finish(settings)
    }

    fn finish(settings: config::Config) -> Result<Self, ConfigError> {
        let config: ExportConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the configured output directory when an override is given
    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = output_dir {
            self.output_dir = Some(dir);
        }
        self
    }

    /// The effective output directory
    pub fn output_dir(&self) -> Result<&Path, ConfigError> {
        self.output_dir
            .as_deref()
            .ok_or_else(|| ConfigError::Invalid("no output_dir configured".to_string()))
    }

    /// Check cross-field constraints the deserializer cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for cluster in &self.clusters {
            if cluster.name.trim().is_empty() {
                return Err(ConfigError::Invalid("cluster with empty name".to_string()));
            }
            if cluster.name.contains(['/', '\\']) {
                return Err(ConfigError::Invalid(format!(
                    "cluster name '{}' must not contain path separators",
                    cluster.name
                )));
            }
            if !names.insert(cluster.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate cluster '{}'",
                    cluster.name
                )));
            }
            check_url(&cluster.prom_base_url, &cluster.name)?;
        }

        check_queries("cluster_queries", &self.cluster_queries)?;
        check_queries("node_queries", &self.node_queries)?;

        let multicluster_query = self
            .cluster_queries
            .iter()
            .chain(&self.node_queries)
            .find(|q| q.source == QuerySource::Multicluster);

        match (&self.multicluster, multicluster_query) {
            (None, Some(query)) => return Err(ConfigError::MissingMulticluster(query.name.clone())),
            (Some(multicluster), _) => check_url(&multicluster.base_url, "multicluster")?,
            (None, None) => {}
        }

        Ok(())
    }

    /// Endpoint and token a query should be sent to for the given cluster
    pub fn target_for(&self, cluster: &Cluster, query: &Query) -> Result<QueryTarget, ConfigError> {
        match query.source {
            QuerySource::Local => Ok(QueryTarget {
                endpoint: cluster.prom_base_url.clone(),
                token: cluster.token.clone(),
            }),
            QuerySource::Multicluster => {
                let multicluster = self
                    .multicluster
                    .as_ref()
                    .ok_or_else(|| ConfigError::MissingMulticluster(query.name.clone()))?;
                Ok(QueryTarget {
                    endpoint: multicluster.base_url.clone(),
                    token: multicluster.token.clone(),
                })
            }
        }
    }

    /// Backend timeout for a query, falling back to the global default
    pub fn timeout_for<'a>(&'a self, query: &'a Query) -> &'a str {
        query.timeout.as_deref().unwrap_or(&self.query_timeout)
    }
}

fn check_url(raw: &str, owner: &str) -> Result<(), ConfigError> {
    Url::parse(raw)
        .map(|_| ())
        .map_err(|e| ConfigError::Invalid(format!("invalid endpoint '{}' for {}: {}", raw, owner, e)))
}

fn check_queries(section: &str, queries: &[Query]) -> Result<(), ConfigError> {
    let mut names = HashSet::new();
    for query in queries {
        if query.name.trim().is_empty() {
            return Err(ConfigError::Invalid(format!("{} entry with empty name", section)));
        }
        if RESERVED_FIELDS.contains(&query.name.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "{}: '{}' is a reserved column name",
                section, query.name
            )));
        }
        if !names.insert(query.name.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "{}: duplicate query '{}'",
                section, query.name
            )));
        }
    }
    Ok(())
}
