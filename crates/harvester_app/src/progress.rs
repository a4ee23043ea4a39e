use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use engine_logging::{engine_debug, engine_info};
use harvester_engine::{DownloadStatus, HarvestEvent};

const SAVED_LOG_INTERVAL: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressTally {
    pub shards_done: usize,
    pub pages_failed: usize,
    pub attempts_failed: usize,
    pub saved: usize,
    pub finished: usize,
}

impl ProgressTally {
    fn apply(&mut self, event: &HarvestEvent) {
        match event {
            HarvestEvent::PageFailed { .. } => self.pages_failed += 1,
            HarvestEvent::ShardHarvested { shard_index, links } => {
                self.shards_done += 1;
                engine_debug!("Shard {} done with {} links", shard_index, links);
            }
            HarvestEvent::AttemptFailed { .. } => self.attempts_failed += 1,
            HarvestEvent::ResourceFinished { status, .. } => {
                self.finished += 1;
                if matches!(status, DownloadStatus::Saved { .. }) {
                    self.saved += 1;
                    if self.saved % SAVED_LOG_INTERVAL == 0 {
                        engine_info!("{} resources saved so far", self.saved);
                    }
                }
            }
            HarvestEvent::QuotaReached { count } => {
                engine_info!("Quota reached after {} successful downloads", count);
            }
        }
    }
}

/// Consume engine events on a background thread until every sender is dropped.
pub fn spawn_progress_logger(rx: mpsc::Receiver<HarvestEvent>) -> JoinHandle<ProgressTally> {
    thread::spawn(move || {
        let mut tally = ProgressTally::default();
        while let Ok(event) = rx.recv() {
            tally.apply(&event);
        }
        tally
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use harvester_engine::FailureKind;

    #[test]
    fn logger_tallies_events_until_senders_drop() {
        let (tx, rx) = mpsc::channel();
        let handle = spawn_progress_logger(rx);

        tx.send(HarvestEvent::ShardHarvested {
            shard_index: 0,
            links: 2,
        })
        .unwrap();
        tx.send(HarvestEvent::PageFailed {
            url: "https://a.example/x".into(),
            kind: FailureKind::Timeout,
        })
        .unwrap();
        tx.send(HarvestEvent::ResourceFinished {
            resource_id: "1".into(),
            status: DownloadStatus::Saved {
                path: PathBuf::from("1.txt"),
                attempts: 1,
            },
        })
        .unwrap();
        tx.send(HarvestEvent::ResourceFinished {
            resource_id: "2".into(),
            status: DownloadStatus::Cancelled { attempts: 0 },
        })
        .unwrap();
        drop(tx);

        let tally = handle.join().unwrap();
        assert_eq!(
            tally,
            ProgressTally {
                shards_done: 1,
                pages_failed: 1,
                attempts_failed: 0,
                saved: 1,
                finished: 2,
            }
        );
    }
}
