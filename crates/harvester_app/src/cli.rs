use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use engine_logging::{LogDestination, DEFAULT_LOG_FILE};
use log::LevelFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    Terminal,
    File,
    Both,
}

/// Harvest plain-text resources listed across a sharded online catalog.
#[derive(Debug, Parser)]
#[command(name = "harvester", version, about)]
pub struct Cli {
    /// RON configuration file; command-line flags override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory downloaded resources and the manifest are written to.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Discovery shards and concurrent downloads.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Stop starting new downloads once this many succeeded.
    #[arg(long)]
    pub limit: Option<usize>,

    /// Attempts per resource, including the first.
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Delay between failed attempts, in milliseconds.
    #[arg(long)]
    pub backoff_ms: Option<u64>,

    /// Delay before every download request, in milliseconds.
    #[arg(long)]
    pub request_delay_ms: Option<u64>,

    /// Catalog page listing the index pages.
    #[arg(long)]
    pub root_url: Option<String>,

    /// Index page to scan; repeatable. Skips reading the catalog root.
    #[arg(long = "index-url")]
    pub index_urls: Vec<String>,

    /// Treat HTTP 404 as final instead of retrying it.
    #[arg(long)]
    pub give_up_on_not_found: bool,

    #[arg(long, value_enum, default_value_t = LogTarget::Terminal)]
    pub log: LogTarget,

    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log at debug level.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn log_destination(&self) -> LogDestination {
        let file = self
            .log_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
        match self.log {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File(file),
            LogTarget::Both => LogDestination::Both(file),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}
