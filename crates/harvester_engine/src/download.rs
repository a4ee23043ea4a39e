use std::sync::Arc;
use std::time::Duration;

use engine_logging::{engine_error, engine_info, engine_warn};
use harvester_core::{ResourceCatalog, ResourceRecord, RetryPolicy};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::fetch::Fetcher;
use crate::filename::resource_filename;
use crate::persist::PersistenceSink;
use crate::progress::ProgressSink;
use crate::quota::QuotaTracker;
use crate::retry::{run_with_retry, RetryOutcome};
use crate::{DownloadStatus, FailureKind, FetchError, HarvestEvent, SaveOutcome};

#[derive(Debug, Clone)]
pub struct DownloadSettings {
    /// Number of admission permits: how many tasks may fetch at once.
    pub workers: usize,
    pub retry: RetryPolicy,
    /// Pause before every download request.
    pub request_delay: Duration,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            workers: 3,
            retry: RetryPolicy::default(),
            request_delay: Duration::from_millis(100),
        }
    }
}

/// Per-status tally of a download phase. Id lists are sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub saved: Vec<String>,
    pub counted_without_saving: Vec<String>,
    pub exhausted: Vec<String>,
    pub cancelled: Vec<String>,
    /// Tasks that panicked before reporting a status.
    pub aborted: usize,
    pub attempts: u64,
}

impl DownloadSummary {
    fn record(&mut self, resource_id: String, status: &DownloadStatus) {
        let (list, attempts) = match status {
            DownloadStatus::Saved { attempts, .. } => (&mut self.saved, attempts),
            DownloadStatus::CountedWithoutSaving { attempts } => {
                (&mut self.counted_without_saving, attempts)
            }
            DownloadStatus::Exhausted { attempts, .. } => (&mut self.exhausted, attempts),
            DownloadStatus::Cancelled { attempts } => (&mut self.cancelled, attempts),
        };
        list.push(resource_id);
        self.attempts += u64::from(*attempts);
    }

    fn sort(&mut self) {
        self.saved.sort();
        self.counted_without_saving.sort();
        self.exhausted.sort();
        self.cancelled.sort();
    }
}

/// Everything a download task needs, shared by all tasks of one run.
struct TaskContext {
    fetcher: Arc<dyn Fetcher>,
    sink: Arc<dyn PersistenceSink>,
    events: Arc<dyn ProgressSink>,
    settings: DownloadSettings,
}

/// Schedules one task per resource and lets at most `workers` of them run their
/// fetch logic at any moment.
pub struct DownloadCoordinator {
    context: Arc<TaskContext>,
}

impl DownloadCoordinator {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        sink: Arc<dyn PersistenceSink>,
        events: Arc<dyn ProgressSink>,
        settings: DownloadSettings,
    ) -> Self {
        Self {
            context: Arc::new(TaskContext {
                fetcher,
                sink,
                events,
                settings,
            }),
        }
    }

    /// Download every resource and return once each task reached a terminal state.
    pub async fn run(&self, resources: &ResourceCatalog, quota: Arc<QuotaTracker>) -> DownloadSummary {
        let permits = Arc::new(Semaphore::new(self.context.settings.workers.max(1)));
        let mut tasks = JoinSet::new();

        for record in resources.values().cloned() {
            let context = self.context.clone();
            let permits = permits.clone();
            let quota = quota.clone();
            tasks.spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return (record.id, DownloadStatus::Cancelled { attempts: 0 });
                };
                let status = download_resource(&context, &record, &quota).await;
                context.events.emit(HarvestEvent::ResourceFinished {
                    resource_id: record.id.clone(),
                    status: status.clone(),
                });
                (record.id, status)
            });
        }

        let mut summary = DownloadSummary::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((resource_id, status)) => summary.record(resource_id, &status),
                Err(err) => {
                    engine_error!("Download task aborted: {}", err);
                    summary.aborted += 1;
                }
            }
        }
        summary.sort();
        summary
    }
}

async fn download_resource(
    context: &TaskContext,
    record: &ResourceRecord,
    quota: &QuotaTracker,
) -> DownloadStatus {
    let outcome = run_with_retry(&context.settings.retry, quota.signal(), |attempt| async move {
        let result = fetch_and_save(context, record, quota).await;
        if let Err(err) = &result {
            engine_warn!(
                "Attempt {} for resource {} failed: {}",
                attempt,
                record.id,
                err
            );
            context.events.emit(HarvestEvent::AttemptFailed {
                resource_id: record.id.clone(),
                attempt,
                kind: err.kind.clone(),
            });
        }
        result
    })
    .await;

    match outcome {
        RetryOutcome::Succeeded { attempts, value } => {
            let update = quota.observe_success();
            if update.signaled_now {
                engine_info!(
                    "Quota of {} resources reached; no new downloads will start",
                    quota.limit()
                );
                context
                    .events
                    .emit(HarvestEvent::QuotaReached { count: update.count });
            }
            match value {
                SaveOutcome::Saved(path) => DownloadStatus::Saved { path, attempts },
                SaveOutcome::QuotaAlreadyMet => DownloadStatus::CountedWithoutSaving { attempts },
            }
        }
        RetryOutcome::Exhausted {
            attempts,
            last_error,
        } => {
            engine_warn!(
                "Failed to fetch and save resource {} after {} attempts",
                record.id,
                attempts
            );
            DownloadStatus::Exhausted {
                attempts,
                last_error: last_error.kind,
            }
        }
        RetryOutcome::Cancelled { attempts } => DownloadStatus::Cancelled { attempts },
    }
}

/// One attempt: fetch the resource and write it unless the quota is already met.
async fn fetch_and_save(
    context: &TaskContext,
    record: &ResourceRecord,
    quota: &QuotaTracker,
) -> Result<SaveOutcome, FetchError> {
    if !context.settings.request_delay.is_zero() {
        tokio::time::sleep(context.settings.request_delay).await;
    }

    let output = context.fetcher.fetch(&record.download_url).await?;

    if quota.limit_reached() {
        return Ok(SaveOutcome::QuotaAlreadyMet);
    }

    // File writes and fsync run on the blocking pool, off the async workers.
    let sink = context.sink.clone();
    let filename = resource_filename(&record.id);
    let bytes = output.bytes;
    let path = tokio::task::spawn_blocking(move || sink.save(&filename, &bytes))
        .await
        .map_err(|err| FetchError::new(FailureKind::Persist, err.to_string()))?
        .map_err(|err| FetchError::new(FailureKind::Persist, err.to_string()))?;
    engine_info!("Resource {} saved to {:?}", record.id, path);
    Ok(SaveOutcome::Saved(path))
}
