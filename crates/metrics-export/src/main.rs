//! Metrics export - Prometheus snapshot exporter
//!
//! Runs one collection round over every configured cluster, appending
//! cluster-wide and per-node snapshot rows to CSV archives, then exits.

use anyhow::{Context, Result};
use clap::Parser;
use export_lib::{ExportConfig, Exporter, PromClient};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

mod cli;
mod logging;

use cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_format);

    info!(config = %cli.config.display(), "Starting metrics-export");

    let config = load_config(&cli.config, cli.output_dir.clone())?;

    if cli.check {
        info!(
            clusters = config.clusters.len(),
            cluster_queries = config.cluster_queries.len(),
            node_queries = config.node_queries.len(),
            "Configuration is valid"
        );
        return Ok(());
    }

    let client = PromClient::new().context("Failed to create HTTP client")?;
    let exporter = Exporter::new(config, Arc::new(client));

    let report = exporter.run().await.context("Export run failed")?;
    info!(
        clusters = report.rounds.len(),
        rows = report.rows_written(),
        failed_queries = report.queries_failed(),
        "Done"
    );

    Ok(())
}

/// Load the configuration file and apply the output directory override
fn load_config(path: &Path, output_dir: Option<PathBuf>) -> Result<ExportConfig> {
    let config = ExportConfig::load(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        .with_output_dir(output_dir);

    if config.capture_snapshot {
        config.output_dir().context("No output directory")?;
    }
    Ok(config)
}
