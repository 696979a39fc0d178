//! CLI definition using clap derive.

use std::path::PathBuf;

use activity_gateway::LateCompletionPolicy;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "activity-feed", about = "Server activity across all accounts")]
pub struct Cli {
    /// Accounts file (default: $XDG_CONFIG_HOME/activity-feed/accounts.json)
    #[arg(long, short = 'c', global = true, env = "ACTIVITY_FEED_CONFIG")]
    pub config: Option<PathBuf>,

    /// Activities requested per account
    #[arg(long, global = true, default_value = "100")]
    pub page_size: u32,

    /// Per-fetch timeout in milliseconds
    #[arg(long, global = true, default_value = "10000")]
    pub fetch_timeout_ms: u64,

    /// What to do with a fetch that finishes after its account was removed
    #[arg(long, global = true, value_enum, default_value = "drop")]
    pub late_completion: LateCompletion,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fetch all accounts and list activities, newest first
    Ls(LsOpts),
    /// Fetch all accounts and write a fixed-width report
    Export(ExportOpts),
    /// Re-fetch on an interval, picking up account changes from the config
    Watch(WatchOpts),
    /// List configured accounts
    Accounts,
}

#[derive(clap::Args, Default)]
pub struct LsOpts {
    /// Keep per-account order instead of sorting by time
    #[arg(long)]
    pub unsorted: bool,

    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args)]
pub struct ExportOpts {
    /// Write to this file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct WatchOpts {
    /// Refresh interval in seconds
    #[arg(long, default_value = "60")]
    pub interval: u64,

    /// Stop after this many refresh cycles
    #[arg(long)]
    pub cycles: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LateCompletion {
    Drop,
    Recreate,
}

impl From<LateCompletion> for LateCompletionPolicy {
    fn from(value: LateCompletion) -> Self {
        match value {
            LateCompletion::Drop => Self::Drop,
            LateCompletion::Recreate => Self::Recreate,
        }
    }
}

/// Default accounts file, honoring `$XDG_CONFIG_HOME`.
pub fn default_config_path() -> PathBuf {
    if let Ok(dir) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(dir).join("activity-feed/accounts.json");
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".config/activity-feed/accounts.json")
}
