//! Command-line arguments

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Log output format
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum LogFormat {
    /// JSON lines (default)
    #[default]
    Json,
    /// Human-readable
    Pretty,
}

/// Prometheus snapshot exporter
#[derive(Parser, Debug)]
#[command(name = "metrics-export")]
#[command(author, version, about = "Export Prometheus cluster and node snapshots to CSV archives", long_about = None)]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, short, env = "METRICS_EXPORT_CONFIG", default_value = "config.yaml")]
    pub config: PathBuf,

    /// Output directory, overriding `output_dir` from the configuration
    #[arg(long, short, env = "METRICS_EXPORT_OUTDIR")]
    pub output_dir: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,

    /// Validate the configuration and exit without querying
    #[arg(long)]
    pub check: bool,
}
