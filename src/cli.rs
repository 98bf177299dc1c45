//! CLI argument parsing for loggraph

use crate::config::PipelineConfig;
use crate::mining::MinSupport;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "loggraph")]
#[command(version)]
#[command(
    about = "Compare statically derived log graphs with patterns mined from runtime logs",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Pipeline configuration file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable trace-level logging to stderr
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the log graph of a source tree
    Graph {
        /// Root of the Java source tree
        source: PathBuf,

        #[arg(long = "format", value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Compare source log graph paths with patterns mined from log files
    Compare {
        /// Root of the Java source tree
        source: PathBuf,

        /// Runtime log files of the same system
        #[arg(required = true)]
        logs: Vec<PathBuf>,

        #[command(flatten)]
        pipeline: PipelineArgs,

        #[arg(long = "format", value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Statement statistics for every project directory under a path
    Stats {
        /// Directory whose subdirectories are projects
        #[arg(long, default_value = ".")]
        path: PathBuf,

        #[arg(long = "format", value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Split each log file's event stream into mined pattern runs
    Segment {
        /// Root of the Java source tree
        source: PathBuf,

        /// Runtime log files of the same system
        #[arg(required = true)]
        logs: Vec<PathBuf>,

        #[command(flatten)]
        pipeline: PipelineArgs,

        #[arg(long = "format", value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

/// Command line overrides for [`PipelineConfig`]
#[derive(Args, Debug, Default, Clone)]
pub struct PipelineArgs {
    /// Look-back window per event in milliseconds
    #[arg(long, value_name = "MS")]
    pub window_ms: Option<u64>,

    #[arg(long, value_name = "N")]
    pub min_sequence_length: Option<usize>,

    #[arg(long, value_name = "N")]
    pub max_sequence_length: Option<usize>,

    /// Maximum windows taken from each log file
    #[arg(long, value_name = "N")]
    pub max_dataset_size: Option<usize>,

    /// Minimum support as a fraction of the dataset size
    #[arg(long, value_name = "RATIO", conflicts_with = "min_support")]
    pub min_support_ratio: Option<f64>,

    /// Minimum support as an absolute sequence count
    #[arg(long, value_name = "COUNT")]
    pub min_support: Option<usize>,

    /// Similarity a pattern path must exceed to count a source path as similar
    #[arg(long, value_name = "SIM")]
    pub similarity_threshold: Option<f64>,

    /// Divergence budget of the trie beam search
    #[arg(long, value_name = "D")]
    pub max_divergence: Option<usize>,
}

impl PipelineArgs {
    /// Overwrite the fields of `config` that were given on the command line
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(window_ms) = self.window_ms {
            config.window_ms = window_ms;
        }
        if let Some(min) = self.min_sequence_length {
            config.min_sequence_length = min;
        }
        if let Some(max) = self.max_sequence_length {
            config.max_sequence_length = max;
        }
        if self.max_dataset_size.is_some() {
            config.max_dataset_size = self.max_dataset_size;
        }
        if let Some(ratio) = self.min_support_ratio {
            config.min_support = MinSupport::Ratio(ratio);
        }
        if let Some(count) = self.min_support {
            config.min_support = MinSupport::Absolute(count);
        }
        if let Some(threshold) = self.similarity_threshold {
            config.similarity_threshold = threshold;
        }
        if let Some(d) = self.max_divergence {
            config.max_divergence = d;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_graph() {
        let cli = Cli::parse_from(["loggraph", "graph", "src/main/java"]);
        match cli.command {
            Commands::Graph { source, format } => {
                assert_eq!(source, PathBuf::from("src/main/java"));
                assert_eq!(format, OutputFormat::Text);
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(!cli.debug);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_compare_overrides() {
        let cli = Cli::parse_from([
            "loggraph",
            "compare",
            "repo",
            "a.log",
            "b.log",
            "--window-ms",
            "20",
            "--min-support",
            "3",
            "--max-divergence",
            "0",
            "--format",
            "json",
        ]);
        let Commands::Compare {
            source,
            logs,
            pipeline,
            format,
        } = cli.command
        else {
            panic!("expected compare");
        };
        assert_eq!(source, PathBuf::from("repo"));
        assert_eq!(logs.len(), 2);
        assert_eq!(format, OutputFormat::Json);

        let mut config = PipelineConfig::default();
        pipeline.apply(&mut config);
        assert_eq!(config.window_ms, 20);
        assert_eq!(config.min_support, MinSupport::Absolute(3));
        assert_eq!(config.max_divergence, 0);
        assert_eq!(config.max_sequence_length, 16);
    }

    #[test]
    fn test_cli_compare_requires_logs() {
        assert!(Cli::try_parse_from(["loggraph", "compare", "repo"]).is_err());
    }

    #[test]
    fn test_cli_min_support_flags_conflict() {
        let result = Cli::try_parse_from([
            "loggraph",
            "compare",
            "repo",
            "a.log",
            "--min-support",
            "3",
            "--min-support-ratio",
            "0.1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "loggraph",
            "stats",
            "--path",
            "projects",
            "--debug",
            "--config",
            "loggraph.toml",
        ]);
        assert!(cli.debug);
        assert_eq!(cli.config, Some(PathBuf::from("loggraph.toml")));
        assert!(matches!(cli.command, Commands::Stats { .. }));
    }

    #[test]
    fn test_empty_overrides_keep_config() {
        let mut config = PipelineConfig::default();
        PipelineArgs::default().apply(&mut config);
        assert_eq!(config, PipelineConfig::default());
    }
}
