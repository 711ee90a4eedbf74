//! CLI definitions and entry point.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// Issue-tracker and git metrics reporting for drupal.org projects
#[derive(Parser, Debug)]
#[command(name = "tm", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory (default: $TRACKER_METRICS_DIR or ./tracker-data)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch recently-active issues into the weekly cache
    Fetch(FetchArgs),

    /// Fetch issues fixed on a branch into the weekly cache
    #[command(name = "fetch-fixed")]
    FetchFixed(FetchFixedArgs),

    /// Load the current week's cached fetches into the local database
    Populate(PopulateArgs),

    /// Report untriaged critical bugs as CSV
    Untriaged,

    /// Report issues fixed on a branch, cross-checked against git
    Fixes(FixesArgs),

    /// Report contrib-project commits as CSV
    Commits(CommitsArgs),

    /// Report a user's credited issue activity per organization
    Activity(ActivityArgs),

    /// Show how fresh the local database is
    Timestamp,
}

/// Arguments for the fetch command.
#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// Issue categories to fetch (repeatable or comma-separated)
    #[arg(
        long,
        value_delimiter = ',',
        default_values = ["bug", "task", "feature", "plan"]
    )]
    pub types: Vec<String>,

    /// Branches to fetch (default: the currently active branches)
    #[arg(long, value_delimiter = ',')]
    pub branches: Vec<String>,
}

/// Arguments for the fetch-fixed command.
#[derive(Args, Debug, Clone)]
pub struct FetchFixedArgs {
    /// Issue branch to collect fixes for (e.g. 9.4.x)
    pub branch: String,

    /// Issue categories to fetch (repeatable or comma-separated)
    #[arg(
        long,
        value_delimiter = ',',
        default_values = ["bug", "task", "feature", "plan"]
    )]
    pub types: Vec<String>,

    /// Only fetch issues whose status changed on or after this date
    /// (YYYY-MM-DD; default: three months ago)
    #[arg(long)]
    pub since: Option<String>,
}

/// Arguments for the populate command.
#[derive(Args, Debug, Clone)]
pub struct PopulateArgs {
    /// Issue categories to load (repeatable or comma-separated)
    #[arg(
        long,
        value_delimiter = ',',
        default_values = ["bug", "task", "feature", "plan"]
    )]
    pub types: Vec<String>,

    /// Branches to load (default: the currently active branches)
    #[arg(long, value_delimiter = ',')]
    pub branches: Vec<String>,

    /// Drop and recreate the tables before loading
    #[arg(long)]
    pub reset: bool,

    /// Delete all rows before loading, keeping the schema
    #[arg(long, conflicts_with = "reset")]
    pub truncate: bool,
}

/// Arguments for the fixes command.
#[derive(Args, Debug, Clone)]
pub struct FixesArgs {
    /// Issue branch the fixes target (e.g. 10.0.x)
    pub branch: String,

    /// Restrict to issue categories (repeatable or comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub types: Vec<String>,

    /// Restrict to issue priorities (repeatable or comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub priorities: Vec<String>,
}

/// Arguments for the commits command.
#[derive(Args, Debug, Clone, Default)]
pub struct CommitsArgs {
    /// Count commits on or after this date (YYYY-MM-DD; default:
    /// the 9.4.x branch start date)
    #[arg(long)]
    pub since: Option<String>,
}

/// Arguments for the activity command.
#[derive(Args, Debug, Clone)]
pub struct ActivityArgs {
    /// drupal.org username to report on
    pub username: String,

    /// Start of the reporting window (YYYY-MM-DD; default: last full week)
    pub start: Option<String>,

    /// End of the reporting window (YYYY-MM-DD; default: last full week)
    pub end: Option<String>,
}
