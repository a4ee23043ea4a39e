use std::path::{Path, PathBuf};

use serde_json::json;

use crate::download::DownloadSummary;
use crate::persist::{AtomicFileWriter, PersistError};

pub const MANIFEST_FILENAME: &str = "manifest.json";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestReport {
    pub index_pages: usize,
    pub shards: usize,
    pub links_discovered: usize,
    pub resources: usize,
    pub quota_limit: usize,
    /// Successful downloads counted against the quota, saved or not.
    pub quota_count: usize,
    pub downloads: DownloadSummary,
}

impl HarvestReport {
    pub fn to_json(&self, generated_utc: &str) -> serde_json::Value {
        let downloads = &self.downloads;
        json!({
            "generated_utc": generated_utc,
            "index_pages": self.index_pages,
            "shards": self.shards,
            "links_discovered": self.links_discovered,
            "resources": self.resources,
            "quota": {
                "limit": self.quota_limit,
                "count": self.quota_count,
            },
            "downloads": {
                "attempts": downloads.attempts,
                "saved": downloads.saved,
                "counted_without_saving": downloads.counted_without_saving,
                "exhausted": downloads.exhausted,
                "cancelled": downloads.cancelled.len(),
                "aborted": downloads.aborted,
            }
        })
    }
}

/// Write the run report as `manifest.json` into `output_dir`.
pub fn write_manifest(
    output_dir: &Path,
    report: &HarvestReport,
    generated_utc: &str,
) -> Result<PathBuf, PersistError> {
    let writer = AtomicFileWriter::new(output_dir.to_path_buf());
    let body = serde_json::to_vec_pretty(&report.to_json(generated_utc))
        .map_err(|err| PersistError::Io(err.into()))?;
    writer.write(MANIFEST_FILENAME, &body)
}
