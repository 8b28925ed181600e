//! CLI argument parsing for convergent

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for the analysis report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV summary tables for spreadsheet analysis
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "convergent")]
#[command(version)]
#[command(about = "Screening, ANCOVA and Tukey post-hoc analysis of a between-subjects experiment", long_about = None)]
pub struct Cli {
    /// Enable debug tracing output to stderr
    #[arg(long = "debug", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the full analysis on participant, response and fluency CSVs
    Analyze {
        /// Participants CSV (one row per subject)
        #[arg(long, value_name = "FILE")]
        participants: PathBuf,

        /// Responses CSV (one row per trial)
        #[arg(long, value_name = "FILE")]
        responses: PathBuf,

        /// Verbal-fluency CSV (one row per listed word)
        #[arg(long, value_name = "FILE")]
        fluency: PathBuf,

        /// TOML file overriding labels, columns and thresholds
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long = "format", value_enum, default_value = "text")]
        format: OutputFormat,

        /// Write the report here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Write a seeded synthetic study as three CSV files
    Simulate {
        /// Directory to write participants.csv, responses.csv, fluency.csv into
        #[arg(long, value_name = "DIR")]
        out_dir: PathBuf,

        /// Participants per condition
        #[arg(long, default_value = "30")]
        per_condition: usize,

        /// Test-phase trials per participant
        #[arg(long, default_value = "10")]
        trials: usize,

        /// Exposure-phase trials per participant
        #[arg(long, default_value = "3")]
        practice_trials: usize,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Replace identifier columns with SHA-256 digests
    Anonymize {
        /// Input CSV
        #[arg(long, value_name = "FILE")]
        input: PathBuf,

        /// Output CSV
        #[arg(long, value_name = "FILE")]
        output: PathBuf,

        /// Column to hash (repeatable; defaults to workerid and hitId)
        #[arg(long = "column", value_name = "NAME")]
        columns: Vec<String>,
    },
}
