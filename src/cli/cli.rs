use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::application::data::LogLevel;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Directory tree snapshots and change detection")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[clap(long, short, global = true, default_value = "warn", value_enum)]
    pub log_level: LogLevel,

    /// Directory holding the profile file and stored snapshots
    #[clap(long, short, global = true, default_value = ".")]
    pub root: PathBuf,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Capture and store snapshots of the given directories, or of every
    /// configured profile when no path is given
    Scan {
        paths: Vec<PathBuf>,
        #[clap(long, short)]
        max_depth: Option<i64>,
        /// Fingerprint file contents as well as metadata
        #[clap(long)]
        hash: bool,
    },
    /// Compare a profile or directory against its stored baseline
    Diff {
        target: PathBuf,
        #[clap(long, short)]
        max_depth: Option<i64>,
        #[clap(long)]
        hash: bool,
        /// Replace the baseline with the fresh snapshot after reporting
        #[clap(long)]
        update: bool,
    },
    /// Rescan a profile or directory on an interval and report changes
    Watch {
        target: PathBuf,
        #[clap(long, short)]
        max_depth: Option<i64>,
        #[clap(long)]
        hash: bool,
        /// Seconds between rescans
        #[clap(long, short, default_value_t = 2)]
        interval: u64,
        /// Number of rescan rounds; 0 runs until interrupted
        #[clap(long, default_value_t = 0)]
        count: u64,
    },
}
