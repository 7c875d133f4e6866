//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

/// Shift & dispatch analytics for a volunteer transport organization.
///
/// Loads the shift and service spreadsheets, repairs their timestamps and
/// category labels, and computes KPIs and correlation statistics over a
/// date range.
#[derive(Debug, Parser)]
#[command(name = "vda", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compute KPIs for shifts and services over a date range.
    Report {
        #[command(flatten)]
        selection: Selection,

        /// Output as JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Join shifts and services day by day and measure coverage.
    Correlate {
        #[command(flatten)]
        selection: Selection,

        /// Compute even when the span exceeds the reliable window.
        #[arg(long)]
        force: bool,

        /// Output as JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Show rows rejected during normalization.
    Validate {
        #[command(flatten)]
        sources: Sources,

        /// Output as JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

/// Date range and record filters.
#[derive(Debug, Args)]
pub struct Selection {
    /// Start of the date range (YYYY-MM-DD); defaults to the datasets'
    /// common span.
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// End of the date range (YYYY-MM-DD), inclusive.
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Only include these display categories (repeatable).
    #[arg(long = "category", value_name = "LABEL")]
    pub categories: Vec<String>,

    /// Only include services run with these vehicles (repeatable).
    #[arg(long = "vehicle", value_name = "NAME")]
    pub vehicles: Vec<String>,

    #[command(flatten)]
    pub sources: Sources,
}

/// Dataset path overrides.
#[derive(Debug, Args)]
pub struct Sources {
    /// Override the configured shifts CSV path.
    #[arg(long, value_name = "PATH")]
    pub shifts: Option<PathBuf>,

    /// Override the configured services CSV path.
    #[arg(long, value_name = "PATH")]
    pub services: Option<PathBuf>,
}
