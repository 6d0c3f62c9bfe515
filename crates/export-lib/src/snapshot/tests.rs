//! Round tests for the snapshot assembler
//!
//! These tests drive the assembler with an in-memory backend that answers
//! by expression, so query routing, failure handling and persistence can be
//! checked without a Prometheus server.

use super::*;
use crate::archive::ArchiveLayout;
use crate::config::ExportConfig;
use crate::error::{ExportError, QueryError};
use crate::prom::{QueryBackend, QueryData, QueryTarget, SamplePair, VectorSample};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Canned answer for one expression
#[derive(Clone)]
enum Reply {
    Data(QueryData),
    BadStatus,
    Unavailable,
}

#[derive(Default)]
struct FakeBackend {
    replies: HashMap<String, Reply>,
    calls: Mutex<Vec<(QueryTarget, String, String)>>,
}

impl FakeBackend {
    fn reply(mut self, expression: &str, reply: Reply) -> Self {
        self.replies.insert(expression.to_string(), reply);
        self
    }

    fn calls(&self) -> Vec<(QueryTarget, String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryBackend for FakeBackend {
    async fn query_instant(
        &self,
        target: &QueryTarget,
        expression: &str,
        timeout: &str,
        _time: Option<f64>,
    ) -> Result<QueryData, QueryError> {
        self.calls
            .lock()
            .unwrap()
            .push((target.clone(), expression.to_string(), timeout.to_string()));

        match self.replies.get(expression) {
            Some(Reply::Data(data)) => Ok(data.clone()),
            Some(Reply::BadStatus) | None => Err(QueryError::Backend {
                status: "error".to_string(),
                error_type: "bad_data".to_string(),
                error: "no reply configured".to_string(),
            }),
            Some(Reply::Unavailable) => Err(QueryError::Status {
                endpoint: target.endpoint.clone(),
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                body: String::new(),
            }),
        }
    }
}

fn scalar(value: &str) -> Reply {
    Reply::Data(QueryData::Scalar(SamplePair(1.0, value.to_string())))
}

fn vector(series: &[(&str, &str)]) -> Reply {
    Reply::Data(QueryData::Vector(
        series
            .iter()
            .map(|(instance, value)| VectorSample {
                metric: BTreeMap::from([("instance".to_string(), instance.to_string())]),
                value: SamplePair(1.0, value.to_string()),
            })
            .collect(),
    ))
}

const CONFIG: &str = r#"
query_timeout: 45s
multicluster:
  base_url: http://thanos:9090
  token: shared
clusters:
  - name: prod
    prom_base_url: http://prom-prod:9090
    token: prod-token
    node_merge:
      n1-ib: n1
cluster_queries:
  - name: up
    promql: up{cluster="{{cluster}}"}
    source: multicluster
  - name: cpu
    promql: cpu_total
    timeout: 5s
node_queries:
  - name: load1
    promql: node_load1
  - name: mem
    promql: node_mem
"#;

fn setup(backend: FakeBackend) -> (TempDir, Arc<FakeBackend>, SnapshotAssembler, Arc<ExportConfig>) {
    let dir = TempDir::new().unwrap();
    let config = Arc::new(ExportConfig::from_yaml_str(CONFIG).unwrap());
    let layout = ArchiveLayout::new(dir.path());
    std::fs::create_dir_all(dir.path().join("snapshot/cluster")).unwrap();
    std::fs::create_dir_all(dir.path().join("snapshot/nodes")).unwrap();

    let backend = Arc::new(backend);
    let assembler = SnapshotAssembler::new(backend.clone(), config.clone(), layout);
    (dir, backend, assembler, config)
}

#[tokio::test]
async fn test_queries_routed_by_source_with_placeholder() {
    let backend = FakeBackend::default()
        .reply(r#"up{cluster="prod"}"#, scalar("1"))
        .reply("cpu_total", scalar("64"));
    let (_dir, backend, assembler, config) = setup(backend);

    let mut summary = RoundSummary::default();
    let record = assembler
        .collect_cluster_record(&config.clusters[0], 100, &mut summary)
        .await
        .unwrap();

    assert_eq!(record.get("up"), Some(&"1".to_string()));
    assert_eq!(record.get("cpu"), Some(&"64".to_string()));

    let calls = backend.calls();
    assert_eq!(calls[0].0.endpoint, "http://thanos:9090");
    assert_eq!(calls[0].0.token.as_deref(), Some("shared"));
    assert_eq!(calls[0].2, "45s");
    assert_eq!(calls[1].0.endpoint, "http://prom-prod:9090");
    assert_eq!(calls[1].0.token.as_deref(), Some("prod-token"));
    assert_eq!(calls[1].2, "5s");
}

#[tokio::test]
async fn test_backend_error_yields_null_and_continues() {
    let backend = FakeBackend::default()
        .reply(r#"up{cluster="prod"}"#, Reply::BadStatus)
        .reply("cpu_total", scalar("64"));
    let (_dir, _backend, assembler, config) = setup(backend);

    let mut summary = RoundSummary::default();
    let record = assembler
        .collect_cluster_record(&config.clusters[0], 100, &mut summary)
        .await
        .unwrap();

    assert_eq!(
        record.values,
        vec![
            ("up".to_string(), None),
            ("cpu".to_string(), Some("64".to_string())),
        ]
    );
    assert_eq!(summary.queries_failed, 1);
    assert_eq!(summary.queries_succeeded, 1);
}

#[tokio::test]
async fn test_transport_error_aborts_round() {
    let backend = FakeBackend::default()
        .reply(r#"up{cluster="prod"}"#, Reply::Unavailable)
        .reply("cpu_total", scalar("64"));
    let (dir, backend, assembler, config) = setup(backend);

    let err = assembler.run_round(&config.clusters[0], 100).await.unwrap_err();

    assert!(matches!(err, ExportError::Query(QueryError::Status { .. })));
    assert_eq!(backend.calls().len(), 1);
    assert!(!dir.path().join("snapshot/cluster/cluster_snapshots.csv").exists());
}

#[tokio::test]
async fn test_node_queries_merge_by_alias() {
    let backend = FakeBackend::default()
        .reply("node_load1", vector(&[("n1-ib:9100", "0.5"), ("n2:9100", "1.5")]))
        .reply("node_mem", vector(&[("n1:9100", "100")]));
    let (_dir, _backend, assembler, config) = setup(backend);

    let mut summary = RoundSummary::default();
    let record = assembler
        .collect_node_record(&config.clusters[0], 100, &mut summary)
        .await
        .unwrap();

    assert_eq!(record.node_count(), 2);
    assert_eq!(record.nodes["n1"]["load1"], "0.5");
    assert_eq!(record.nodes["n1"]["mem"], "100");
    assert!(!record.nodes["n2"].contains_key("mem"));
}

#[tokio::test]
async fn test_failed_node_query_leaves_empty_column() {
    let backend = FakeBackend::default()
        .reply(r#"up{cluster="prod"}"#, scalar("1"))
        .reply("cpu_total", scalar("64"))
        .reply("node_load1", vector(&[("n2:9100", "1.5"), ("n1:9100", "0.5")]))
        .reply("node_mem", Reply::BadStatus);
    let (dir, _backend, assembler, config) = setup(backend);

    let summary = assembler.run_round(&config.clusters[0], 1700000000).await.unwrap();

    assert_eq!(summary.nodes, 2);
    assert_eq!(summary.node_rows, 2);
    assert_eq!(summary.queries_failed, 1);

    let cluster_csv =
        std::fs::read_to_string(dir.path().join("snapshot/cluster/cluster_snapshots.csv")).unwrap();
    assert_eq!(cluster_csv, "cluster,time,up,cpu\nprod,1700000000,1,64\n");

    let node_csv =
        std::fs::read_to_string(dir.path().join("snapshot/nodes/prod_node_snapshots.csv")).unwrap();
    assert_eq!(
        node_csv,
        "cluster,node,time,load1,mem\nprod,n1,1700000000,0.5,\nprod,n2,1700000000,1.5,\n"
    );
}

#[tokio::test]
async fn test_repeated_rounds_append_rows() {
    let backend = FakeBackend::default()
        .reply(r#"up{cluster="prod"}"#, scalar("1"))
        .reply("cpu_total", scalar("64"))
        .reply("node_load1", vector(&[("n1:9100", "0.5")]))
        .reply("node_mem", vector(&[("n1:9100", "7")]));
    let (dir, _backend, assembler, config) = setup(backend);

    assembler.run_round(&config.clusters[0], 100).await.unwrap();
    assembler.run_round(&config.clusters[0], 160).await.unwrap();

    let node_csv =
        std::fs::read_to_string(dir.path().join("snapshot/nodes/prod_node_snapshots.csv")).unwrap();
    assert_eq!(
        node_csv,
        "cluster,node,time,load1,mem\nprod,n1,100,0.5,7\nprod,n1,160,0.5,7\n"
    );
}
