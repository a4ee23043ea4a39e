use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use harvester_core::{DownloadUrlTemplate, NotFoundPolicy};
use harvester_engine::EngineConfig;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

pub const DEFAULT_OUTPUT_DIR: &str = "./books";

/// Optional on-disk configuration; every field falls back to the built-in default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub output_dir: Option<PathBuf>,
    pub workers: Option<usize>,
    pub quota_limit: Option<usize>,
    pub max_attempts: Option<u32>,
    pub backoff_ms: Option<u64>,
    pub request_delay_ms: Option<u64>,
    pub give_up_on_not_found: Option<bool>,
    pub download_url_template: Option<String>,
    pub catalog_root_url: Option<String>,
    pub index_urls: Option<Vec<String>>,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub max_bytes: Option<u64>,
    pub user_agent: Option<String>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub engine: EngineConfig,
    pub output_dir: PathBuf,
    /// Explicit index pages; empty means "read them from the catalog root".
    pub index_urls: Vec<String>,
}

pub fn load_file_config(path: &Path) -> Result<FileConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    ron::from_str(&content).with_context(|| format!("parsing config file {}", path.display()))
}

/// Merge defaults, the config file and command-line flags (highest priority).
pub fn resolve(cli: &Cli, file: FileConfig) -> Result<Settings> {
    let mut engine = EngineConfig::default();

    if let Some(workers) = cli.workers.or(file.workers) {
        engine.workers = workers;
    }
    if let Some(limit) = cli.limit.or(file.quota_limit) {
        engine.quota_limit = limit;
    }
    if let Some(max_attempts) = cli.max_attempts.or(file.max_attempts) {
        engine.retry.max_attempts = max_attempts;
    }
    if let Some(ms) = cli.backoff_ms.or(file.backoff_ms) {
        engine.retry.backoff = Duration::from_millis(ms);
    }
    if let Some(ms) = cli.request_delay_ms.or(file.request_delay_ms) {
        engine.request_delay = Duration::from_millis(ms);
    }
    if cli.give_up_on_not_found || file.give_up_on_not_found.unwrap_or(false) {
        engine.retry.not_found = NotFoundPolicy::GiveUp;
    }
    if let Some(template) = file.download_url_template {
        engine.download_url_template = DownloadUrlTemplate::new(template)?;
    }
    if let Some(root) = cli.root_url.clone().or(file.catalog_root_url) {
        engine.catalog_root_url = root;
    }
    if let Some(secs) = file.connect_timeout_secs {
        engine.fetch.connect_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = file.request_timeout_secs {
        engine.fetch.request_timeout = Duration::from_secs(secs);
    }
    if let Some(max_bytes) = file.max_bytes {
        engine.fetch.max_bytes = max_bytes;
    }
    if let Some(user_agent) = file.user_agent {
        engine.fetch.user_agent = user_agent;
    }

    if engine.workers == 0 {
        bail!("workers must be at least 1");
    }
    if engine.retry.max_attempts == 0 {
        bail!("max_attempts must be at least 1");
    }

    let output_dir = cli
        .output_dir
        .clone()
        .or(file.output_dir)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    let index_urls = if cli.index_urls.is_empty() {
        file.index_urls.unwrap_or_default()
    } else {
        cli.index_urls.clone()
    };

    Ok(Settings {
        engine,
        output_dir,
        index_urls,
    })
}
