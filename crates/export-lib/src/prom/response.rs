//! Wire types for the Prometheus HTTP query API

use crate::error::QueryError;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::warn;

/// Body of a `/api/v1/query` response
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    pub status: String,
    #[serde(default)]
    pub data: Option<QueryData>,
    #[serde(default, rename = "errorType")]
    pub error_type: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl QueryResponse {
    /// Unwrap the result payload, turning a non-success status into a backend error
    pub fn into_data(self) -> Result<QueryData, QueryError> {
        for warning in &self.warnings {
            warn!(warning = %warning, "Prometheus returned a query warning");
        }

        if self.status != "success" {
            let error_type = self.error_type.unwrap_or_default();
            let error = self.error.unwrap_or_default();
            warn!(
                status = %self.status,
                error_type = %error_type,
                error = %error,
                "Prometheus returned bad status"
            );
            return Err(QueryError::Backend {
                status: self.status,
                error_type,
                error,
            });
        }

        self.data.ok_or_else(|| QueryError::Backend {
            status: self.status,
            error_type: "bad_data".to_string(),
            error: "success response without data".to_string(),
        })
    }
}

/// Query result, tagged by its `resultType`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "resultType", content = "result", rename_all = "lowercase")]
pub enum QueryData {
    Scalar(SamplePair),
    String(SamplePair),
    Vector(Vec<VectorSample>),
    Matrix(Vec<MatrixSeries>),
}

impl QueryData {
    pub fn result_type(&self) -> &'static str {
        match self {
            QueryData::Scalar(_) => "scalar",
            QueryData::String(_) => "string",
            QueryData::Vector(_) => "vector",
            QueryData::Matrix(_) => "matrix",
        }
    }
}

/// `[<unix time>, "<value>"]`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SamplePair(pub f64, pub String);

impl SamplePair {
    pub fn value(&self) -> &str {
        &self.1
    }
}

/// One series of an instant vector
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VectorSample {
    #[serde(default)]
    pub metric: BTreeMap<String, String>,
    pub value: SamplePair,
}

/// One series of a range vector
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MatrixSeries {
    #[serde(default)]
    pub metric: BTreeMap<String, String>,
    #[serde(default)]
    pub values: Vec<SamplePair>,
}
