//! Error types for the export pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single instant query against the metrics backend
#[derive(Debug, Error)]
pub enum QueryError {
    /// The request could not be sent or the response body could not be decoded
    #[error("transport error querying {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered with a non-2xx HTTP status
    #[error("backend at {endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: reqwest::StatusCode,
        body: String,
    },

    /// The backend answered, but reported a non-success query status
    #[error("backend returned status '{status}' ({error_type}): {error}")]
    Backend {
        status: String,
        error_type: String,
        error: String,
    },

    /// The query resolved to a result type the normalizer does not accept
    #[error("unsupported result type '{0}'")]
    UnsupportedResultType(&'static str),
}

impl QueryError {
    /// Whether the failure only affects the query that produced it.
    ///
    /// Transport and HTTP status failures abort the round; everything else is
    /// absorbed by the snapshot assembler.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            QueryError::Backend { .. } | QueryError::UnsupportedResultType(_)
        )
    }
}

/// Failure while appending to a CSV archive
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error on {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A record carries fields the archive header does not have
    #[error("records for {path} carry fields missing from its header: {fields:?}")]
    SchemaDrift { path: PathBuf, fields: Vec<String> },
}

/// Invalid or unreadable configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("query '{0}' uses the multicluster source but no multicluster endpoint is configured")]
    MissingMulticluster(String),
}

/// Top-level error for an export run
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to prepare output directory {path}: {source}")]
    Layout {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = ExportError> = std::result::Result<T, E>;
