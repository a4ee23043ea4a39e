//! Harvester engine: concurrent catalog discovery and quota-bounded downloading.
mod decode;
mod discovery;
mod download;
mod engine;
mod fetch;
mod filename;
mod links;
mod persist;
mod progress;
mod quota;
mod report;
mod retry;
mod types;

pub use decode::{decode_page, DecodeError, DecodedPage};
pub use discovery::{discover_links, harvest_page, harvest_shard};
pub use download::{DownloadCoordinator, DownloadSettings, DownloadSummary};
pub use engine::{EngineConfig, EngineError, HarvestEngine, DEFAULT_CATALOG_ROOT_URL};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher, DEFAULT_USER_AGENT};
pub use filename::resource_filename;
pub use links::{
    AnchorExtractor, LinkExtractor, SelectorError, CATALOG_NAVIGATION_SELECTOR,
    RESOURCE_HEADING_MARKER, RESOURCE_HEADING_SELECTOR,
};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError, PersistenceSink};
pub use progress::{ChannelProgressSink, NoopProgressSink, ProgressSink};
pub use quota::{CancellationSignal, QuotaTracker, QuotaUpdate};
pub use report::{write_manifest, HarvestReport, MANIFEST_FILENAME};
pub use retry::{run_with_retry, RetryOutcome};
pub use types::{
    DownloadStatus, FailureKind, FetchError, FetchMetadata, FetchOutput, HarvestEvent, SaveOutcome,
};
