use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use engine_logging::{engine_info, engine_warn};
use harvester_core::{extract_resources, partition_catalog, DownloadUrlTemplate, RetryPolicy};

use crate::discovery::{discover_links, harvest_page};
use crate::download::{DownloadCoordinator, DownloadSettings};
use crate::fetch::{FetchSettings, Fetcher, ReqwestFetcher};
use crate::links::{AnchorExtractor, LinkExtractor, SelectorError};
use crate::persist::{ensure_output_dir, AtomicFileWriter, PersistError, PersistenceSink};
use crate::progress::{NoopProgressSink, ProgressSink};
use crate::quota::QuotaTracker;
use crate::report::HarvestReport;
use crate::FetchError;

pub const DEFAULT_CATALOG_ROOT_URL: &str = "https://www.gutenberg.org/browse/languages/en";

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Discovery shard count and download admission width.
    pub workers: usize,
    pub retry: RetryPolicy,
    pub request_delay: Duration,
    pub quota_limit: usize,
    pub download_url_template: DownloadUrlTemplate,
    pub catalog_root_url: String,
    pub fetch: FetchSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: 3,
            retry: RetryPolicy::default(),
            request_delay: Duration::from_millis(100),
            quota_limit: 10_000,
            download_url_template: DownloadUrlTemplate::default(),
            catalog_root_url: DEFAULT_CATALOG_ROOT_URL.to_string(),
            fetch: FetchSettings::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("link extractor: {0}")]
    Selector(#[from] SelectorError),
    #[error("http client: {0}")]
    Fetch(#[from] FetchError),
    #[error("output: {0}")]
    Persist(#[from] PersistError),
}

/// Discovery plus download for one harvesting run.
pub struct HarvestEngine {
    config: EngineConfig,
    fetcher: Arc<dyn Fetcher>,
    index_extractor: Arc<dyn LinkExtractor>,
    resource_extractor: Arc<dyn LinkExtractor>,
    sink: Arc<dyn PersistenceSink>,
    events: Arc<dyn ProgressSink>,
}

impl HarvestEngine {
    pub fn new(
        config: EngineConfig,
        fetcher: Arc<dyn Fetcher>,
        sink: Arc<dyn PersistenceSink>,
    ) -> Result<Self, EngineError> {
        Ok(Self {
            config,
            fetcher,
            index_extractor: Arc::new(AnchorExtractor::catalog_navigation()?),
            resource_extractor: Arc::new(AnchorExtractor::marked_headings()?),
            sink,
            events: Arc::new(NoopProgressSink),
        })
    }

    /// HTTP transport from `config.fetch`, atomic file output under `output_dir`
    /// (created if missing).
    pub fn with_output_dir(config: EngineConfig, output_dir: PathBuf) -> Result<Self, EngineError> {
        ensure_output_dir(&output_dir)?;
        let fetcher = ReqwestFetcher::new(config.fetch.clone())?;
        Self::new(
            config,
            Arc::new(fetcher),
            Arc::new(AtomicFileWriter::new(output_dir)),
        )
    }

    pub fn with_index_extractor(mut self, extractor: Arc<dyn LinkExtractor>) -> Self {
        self.index_extractor = extractor;
        self
    }

    pub fn with_resource_extractor(mut self, extractor: Arc<dyn LinkExtractor>) -> Self {
        self.resource_extractor = extractor;
        self
    }

    pub fn with_progress_sink(mut self, events: Arc<dyn ProgressSink>) -> Self {
        self.events = events;
        self
    }

    /// Index-page URLs listed on the catalog root page; empty if it cannot be read.
    pub async fn discover_index_urls(&self) -> Vec<String> {
        let root = &self.config.catalog_root_url;
        match harvest_page(self.fetcher.as_ref(), self.index_extractor.as_ref(), root).await {
            Ok(urls) => {
                engine_info!("Catalog root {} lists {} index pages", root, urls.len());
                urls
            }
            Err(err) => {
                engine_warn!("Could not read catalog root {}: {}", root, err);
                Vec::new()
            }
        }
    }

    pub async fn run_from_catalog_root(&self) -> HarvestReport {
        let index_urls = self.discover_index_urls().await;
        self.run(index_urls).await
    }

    /// Harvest every resource reachable from `index_urls`.
    ///
    /// Discovery finishes completely before the first download starts. The run
    /// always completes; per-resource failures only show up in the report.
    pub async fn run(&self, index_urls: Vec<String>) -> HarvestReport {
        let workers = self.config.workers.max(1);
        let shards = partition_catalog(&index_urls, workers);
        engine_info!(
            "Discovering resources on {} index pages across {} shards",
            index_urls.len(),
            shards.len()
        );
        let shard_count = shards.len();

        let links = discover_links(
            self.fetcher.clone(),
            self.resource_extractor.clone(),
            shards,
            self.events.clone(),
        )
        .await;
        let resources = extract_resources(&links, &self.config.download_url_template);
        engine_info!(
            "Discovered {} links naming {} distinct resources",
            links.len(),
            resources.len()
        );

        let quota = Arc::new(QuotaTracker::new(self.config.quota_limit));
        let coordinator = DownloadCoordinator::new(
            self.fetcher.clone(),
            self.sink.clone(),
            self.events.clone(),
            DownloadSettings {
                workers,
                retry: self.config.retry,
                request_delay: self.config.request_delay,
            },
        );
        let downloads = if resources.is_empty() {
            engine_info!("No resources discovered; nothing to download");
            Default::default()
        } else {
            coordinator.run(&resources, quota.clone()).await
        };

        engine_info!(
            "Harvest finished: {} saved, {} counted past quota, {} failed, {} cancelled",
            downloads.saved.len(),
            downloads.counted_without_saving.len(),
            downloads.exhausted.len(),
            downloads.cancelled.len()
        );

        HarvestReport {
            index_pages: index_urls.len(),
            shards: shard_count,
            links_discovered: links.len(),
            resources: resources.len(),
            quota_limit: quota.limit(),
            quota_count: quota.count(),
            downloads,
        }
    }
}
