//! Command-line argument parsing with clap.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};

/// Compress a must-gather directory, keeping only the most recent log content.
#[derive(Parser, Debug, Clone)]
#[command(name = "gather")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Source directory to be compressed.
    #[arg(long, env = "GATHER_SRC")]
    pub src: PathBuf,

    /// Destination archive name.
    #[arg(long, env = "GATHER_DST", default_value = "must-gather.tar.gz")]
    pub dst: PathBuf,

    /// Filter logs by time in minutes.
    ///
    /// Mutually exclusive with `--lines`; zero disables the filter.
    #[arg(long, env = "GATHER_SINCE", value_name = "MINUTES")]
    pub since: Option<u32>,

    /// Filter logs by last number of lines.
    ///
    /// Mutually exclusive with `--since`; zero disables the filter.
    #[arg(long, env = "GATHER_LINES", value_name = "N")]
    pub lines: Option<usize>,

    /// Time the `--since` window is measured back from (RFC3339). Defaults to now.
    #[arg(long, value_name = "RFC3339", value_parser = parse_reference_time)]
    pub reference_time: Option<DateTime<Utc>>,

    /// JSON file with path classification rules, replacing the defaults.
    #[arg(long, value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// Never filter paths containing this substring. Repeatable.
    #[arg(long, value_name = "SUBSTRING")]
    pub exempt: Vec<String>,

    /// Empty journal dumps that ended before the `--since` window.
    #[arg(long)]
    pub truncate_stale_journals: bool,

    /// File receiving the error message when the run fails.
    #[arg(long, env = "GATHER_TERMINATION_LOG", value_name = "FILE")]
    pub termination_log: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub log_json: bool,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

fn parse_reference_time(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC3339 timestamp {value:?}: {e}"))
}
