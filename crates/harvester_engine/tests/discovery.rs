use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use harvester_core::partition_catalog;
use harvester_engine::{
    discover_links, AnchorExtractor, FailureKind, FetchError, FetchMetadata, FetchOutput, Fetcher,
    HarvestEvent, ProgressSink,
};

/// Serves canned pages by URL, optionally after a delay.
struct PageFetcher {
    pages: HashMap<String, (Result<String, FailureKind>, Duration)>,
    completed: AtomicUsize,
}

impl PageFetcher {
    fn new() -> Self {
        Self {
            pages: HashMap::new(),
            completed: AtomicUsize::new(0),
        }
    }

    fn page(mut self, url: &str, links: &[&str]) -> Self {
        self.pages.insert(url.to_string(), (Ok(heading_page(links)), Duration::ZERO));
        self
    }

    fn slow_page(mut self, url: &str, links: &[&str], delay: Duration) -> Self {
        self.pages.insert(url.to_string(), (Ok(heading_page(links)), delay));
        self
    }

    fn failing_page(mut self, url: &str, kind: FailureKind) -> Self {
        self.pages.insert(url.to_string(), (Err(kind), Duration::ZERO));
        self
    }
}

fn heading_page(links: &[&str]) -> String {
    links
        .iter()
        .map(|href| format!(r#"<h2><a href="{href}">Title (English)</a></h2>"#))
        .collect()
}

#[async_trait::async_trait]
impl Fetcher for PageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError> {
        let (result, delay) = self
            .pages
            .get(url)
            .cloned()
            .unwrap_or((Err(FailureKind::HttpStatus(404)), Duration::ZERO));
        tokio::time::sleep(delay).await;
        self.completed.fetch_add(1, Ordering::SeqCst);
        let html = result.map_err(|kind| FetchError::new(kind, "canned failure"))?;
        Ok(FetchOutput {
            metadata: FetchMetadata {
                original_url: url.to_string(),
                final_url: url.to_string(),
                content_type: Some("text/html; charset=utf-8".to_string()),
                byte_len: html.len() as u64,
            },
            bytes: html.into_bytes(),
        })
    }
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<HarvestEvent>>,
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: HarvestEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn urls(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| format!("https://catalog.example/{n}")).collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_shard_contributes_and_duplicates_survive() {
    let fetcher = Arc::new(
        PageFetcher::new()
            .page("https://catalog.example/a", &["/ebooks/100"])
            .page("https://catalog.example/b", &["/ebooks/200"])
            .page("https://catalog.example/c", &["/ebooks/100", "/ebooks/300"])
            .page("https://catalog.example/d", &[]),
    );
    let sink = Arc::new(RecordingSink::default());
    let shards = partition_catalog(&urls(&["a", "b", "c", "d"]), 2);

    let mut links = discover_links(
        fetcher,
        Arc::new(AnchorExtractor::marked_headings().unwrap()),
        shards,
        sink.clone(),
    )
    .await;
    links.sort();

    assert_eq!(
        links,
        vec!["/ebooks/100", "/ebooks/100", "/ebooks/200", "/ebooks/300"]
    );
    let shard_events = sink
        .events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| matches!(e, HarvestEvent::ShardHarvested { .. }))
        .count();
    assert_eq!(shard_events, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failing_page_is_skipped_without_aborting_its_shard() {
    let fetcher = Arc::new(
        PageFetcher::new()
            .failing_page("https://catalog.example/a", FailureKind::Timeout)
            .page("https://catalog.example/b", &["/ebooks/7"]),
    );
    let sink = Arc::new(RecordingSink::default());
    let shards = partition_catalog(&urls(&["a", "b"]), 1);

    let links = discover_links(
        fetcher,
        Arc::new(AnchorExtractor::marked_headings().unwrap()),
        shards,
        sink.clone(),
    )
    .await;

    assert_eq!(links, vec!["/ebooks/7".to_string()]);
    let events = sink.events.lock().unwrap();
    assert!(events.contains(&HarvestEvent::PageFailed {
        url: "https://catalog.example/a".to_string(),
        kind: FailureKind::Timeout,
    }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn aggregation_waits_for_the_slowest_shard() {
    let fetcher = Arc::new(
        PageFetcher::new()
            .page("https://catalog.example/fast", &["/ebooks/1"])
            .slow_page(
                "https://catalog.example/slow",
                &["/ebooks/2"],
                Duration::from_millis(150),
            ),
    );
    let shards = partition_catalog(&urls(&["fast", "slow"]), 2);

    let links = discover_links(
        fetcher.clone(),
        Arc::new(AnchorExtractor::marked_headings().unwrap()),
        shards,
        Arc::new(RecordingSink::default()),
    )
    .await;

    assert_eq!(fetcher.completed.load(Ordering::SeqCst), 2);
    assert_eq!(links, vec!["/ebooks/1".to_string(), "/ebooks/2".to_string()]);
}

#[tokio::test]
async fn no_shards_means_no_links() {
    let links = discover_links(
        Arc::new(PageFetcher::new()),
        Arc::new(AnchorExtractor::marked_headings().unwrap()),
        Vec::new(),
        Arc::new(RecordingSink::default()),
    )
    .await;
    assert!(links.is_empty());
}
