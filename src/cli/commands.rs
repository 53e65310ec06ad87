//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Onfleet Singer tap
#[derive(Parser, Debug)]
#[command(name = "tap-onfleet")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// State file (JSON)
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Inline state JSON
    #[arg(long, global = true, conflicts_with = "state")]
    pub state_json: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Test the API key against the API
    Check,

    /// Print the catalog of available streams
    Discover,

    /// Sync streams, writing Singer messages to stdout
    Read {
        /// Streams to sync (comma-separated, empty = all)
        #[arg(long, value_delimiter = ',')]
        streams: Vec<String>,

        /// Catalog file; streams marked `selected` are synced
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Emit state after each page
        #[arg(long)]
        state_per_page: bool,

        /// Stop at the first failed stream
        #[arg(long)]
        fail_fast: bool,
    },
}
