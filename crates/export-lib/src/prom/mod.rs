//! Prometheus query API access
//!
//! This module provides:
//! - An HTTP client for instant queries (`/api/v1/query`)
//! - Typed response models keyed by result type
//! - Normalization of results into cluster and per-node values

mod client;
mod normalize;
mod response;

pub use client::{query_url, PromClient, QueryBackend, QueryTarget};
pub use normalize::{extract_cluster_value, extract_node_values};
pub use response::{MatrixSeries, QueryData, QueryResponse, SamplePair, VectorSample};
