//! Harvester core: pure catalog partitioning, resource identification and retry decisions.
mod resource;
mod retry;
mod shard;
mod template;

pub use resource::{extract_resources, resource_id, ResourceCatalog, ResourceRecord};
pub use retry::{FailureClass, NotFoundPolicy, RetryEvent, RetryPolicy, RetryState};
pub use shard::{partition_catalog, CatalogShard};
pub use template::{DownloadUrlTemplate, TemplateError, DEFAULT_DOWNLOAD_URL_TEMPLATE};
