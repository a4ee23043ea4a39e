use std::sync::Arc;

use engine_logging::{engine_debug, engine_error, engine_warn};
use harvester_core::CatalogShard;
use tokio::sync::mpsc;

use crate::decode::decode_page;
use crate::fetch::Fetcher;
use crate::links::LinkExtractor;
use crate::progress::ProgressSink;
use crate::{FailureKind, FetchError, HarvestEvent};

/// Fetch one page and run the extractor over its decoded text.
pub async fn harvest_page(
    fetcher: &dyn Fetcher,
    extractor: &dyn LinkExtractor,
    url: &str,
) -> Result<Vec<String>, FetchError> {
    let output = fetcher.fetch(url).await?;
    let page = decode_page(&output.bytes, output.metadata.content_type.as_deref())
        .map_err(|err| FetchError::new(FailureKind::Decode, err.to_string()))?;
    Ok(extractor.extract_links(&page.text, &output.metadata.final_url))
}

/// Visit every page of `shard` in order and return all links they yield.
///
/// A page that cannot be fetched or decoded contributes nothing; the rest of
/// the shard is still visited.
pub async fn harvest_shard(
    fetcher: &dyn Fetcher,
    extractor: &dyn LinkExtractor,
    shard: &CatalogShard,
    events: &dyn ProgressSink,
) -> Vec<String> {
    let mut links = Vec::new();
    for url in shard.urls() {
        match harvest_page(fetcher, extractor, url).await {
            Ok(found) => links.extend(found),
            Err(err) => {
                engine_warn!("Skipping index page {}: {}", url, err);
                events.emit(HarvestEvent::PageFailed {
                    url: url.clone(),
                    kind: err.kind,
                });
            }
        }
    }
    links
}

/// Run one harvester task per shard and merge their links once all have finished.
///
/// Shard results are concatenated in shard order; duplicates are kept.
pub async fn discover_links(
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn LinkExtractor>,
    shards: Vec<CatalogShard>,
    events: Arc<dyn ProgressSink>,
) -> Vec<String> {
    if shards.is_empty() {
        return Vec::new();
    }

    let (tx, mut rx) = mpsc::channel::<(usize, Vec<String>)>(shards.len());
    let mut handles = Vec::with_capacity(shards.len());

    for (shard_index, shard) in shards.into_iter().enumerate() {
        let fetcher = fetcher.clone();
        let extractor = extractor.clone();
        let events = events.clone();
        let tx = tx.clone();
        handles.push(tokio::spawn(async move {
            let links =
                harvest_shard(fetcher.as_ref(), extractor.as_ref(), &shard, events.as_ref()).await;
            engine_debug!(
                "Shard {} harvested {} links from {} pages",
                shard_index,
                links.len(),
                shard.len()
            );
            events.emit(HarvestEvent::ShardHarvested {
                shard_index,
                links: links.len(),
            });
            let _ = tx.send((shard_index, links)).await;
        }));
    }
    // Only the harvesters hold senders now; the intake closes when the last one finishes.
    drop(tx);

    let mut results = Vec::with_capacity(handles.len());
    while let Some(result) = rx.recv().await {
        results.push(result);
    }
    for handle in handles {
        if let Err(err) = handle.await {
            engine_error!("Shard harvester aborted: {}", err);
        }
    }

    results.sort_by_key(|(shard_index, _)| *shard_index);
    results.into_iter().flat_map(|(_, links)| links).collect()
}
