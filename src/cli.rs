//! CLI argument parsing for memtrace

use crate::call_tree::TraversalOrder;
use crate::retention::{DEFAULT_FILTER_MIN_MEMORY, DEFAULT_FILTER_MIN_TIME};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the replayed session
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary (default)
    Text,
    /// JSON report for machine parsing
    Json,
    /// CSV traversal for spreadsheet analysis
    Csv,
}

/// Traversal order of dumped and exported tuples
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Order {
    /// Calls in pre-order, returns in post-order
    Depth,
    /// Every node at depth 0, then depth 1, and so on
    Width,
}

impl From<Order> for TraversalOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::Depth => TraversalOrder::DepthFirst,
            Order::Width => TraversalOrder::WidthFirst,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "memtrace")]
#[command(version)]
#[command(about = "Rebuild time and memory call trees from a recorded event log", long_about = None)]
pub struct Cli {
    /// JSON-lines event log to replay
    #[arg(value_name = "EVENT_LOG")]
    pub event_log: PathBuf,

    /// Keep only invocations that took at least this many milliseconds (-1 keeps all)
    #[arg(
        short = 't',
        long = "filter-min-time",
        value_name = "MS",
        default_value_t = DEFAULT_FILTER_MIN_TIME,
        allow_negative_numbers = true
    )]
    pub filter_min_time: i64,

    /// Keep only invocations whose memory changed by at least this many kilobytes (0 keeps all)
    #[arg(
        short = 'm',
        long = "filter-min-memory",
        value_name = "KB",
        default_value_t = DEFAULT_FILTER_MIN_MEMORY,
        allow_negative_numbers = true
    )]
    pub filter_min_memory: i64,

    /// Dump the call tree and function table (text format only)
    #[arg(short = 'd', long = "dump")]
    pub dump: bool,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Traversal order for dumps and exports
    #[arg(long = "order", value_enum, default_value = "depth")]
    pub order: Order,

    /// Keep interpreter bookkeeping frames instead of skipping them
    #[arg(long = "keep-synthetic")]
    pub keep_synthetic: bool,

    /// Add a source_location column to CSV output
    #[arg(long = "csv-source")]
    pub csv_source: bool,

    /// Write the per-function summary as CSV instead of the traversal
    #[arg(long = "csv-stats")]
    pub csv_stats: bool,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_event_log() {
        let cli = Cli::parse_from(["memtrace", "events.jsonl"]);
        assert_eq!(cli.event_log, PathBuf::from("events.jsonl"));
        assert_eq!(cli.filter_min_time, -1);
        assert_eq!(cli.filter_min_memory, 0);
        assert!(!cli.dump);
        assert!(!cli.debug);
        assert!(!cli.keep_synthetic);
        assert_eq!(cli.format, OutputFormat::Text);
        assert_eq!(cli.order, Order::Depth);
    }

    #[test]
    fn test_cli_requires_event_log() {
        assert!(Cli::try_parse_from(["memtrace"]).is_err());
    }

    #[test]
    fn test_cli_filter_thresholds() {
        let cli = Cli::parse_from(["memtrace", "-t", "5", "-m", "64", "events.jsonl"]);
        assert_eq!(cli.filter_min_time, 5);
        assert_eq!(cli.filter_min_memory, 64);
    }

    #[test]
    fn test_cli_negative_memory_threshold_parses() {
        // Rejected later by RetentionFilter::from_thresholds
        let cli = Cli::parse_from(["memtrace", "--filter-min-memory", "-1", "events.jsonl"]);
        assert_eq!(cli.filter_min_memory, -1);
    }

    #[test]
    fn test_cli_format_and_order() {
        let cli = Cli::parse_from([
            "memtrace",
            "--format",
            "csv",
            "--order",
            "width",
            "--csv-source",
            "events.jsonl",
        ]);
        assert_eq!(cli.format, OutputFormat::Csv);
        assert_eq!(TraversalOrder::from(cli.order), TraversalOrder::WidthFirst);
        assert!(cli.csv_source);
        assert!(!cli.csv_stats);
    }

    #[test]
    fn test_cli_csv_stats_flag() {
        let cli = Cli::parse_from(["memtrace", "--format", "csv", "--csv-stats", "events.jsonl"]);
        assert!(cli.csv_stats);
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["memtrace", "--format", "xml", "events.jsonl"]).is_err());
    }

    #[test]
    fn test_cli_dump_and_debug_flags() {
        let cli = Cli::parse_from(["memtrace", "-d", "--debug", "--keep-synthetic", "events.jsonl"]);
        assert!(cli.dump);
        assert!(cli.debug);
        assert!(cli.keep_synthetic);
    }
}
