/// A contiguous run of catalog index-page URLs assigned to one discovery worker.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogShard {
    urls: Vec<String>,
}

impl CatalogShard {
    pub fn new(urls: Vec<String>) -> Self {
        Self { urls }
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Split `urls` into at most `workers` consecutive shards of `ceil(len / workers)` URLs.
///
/// Only the last shard may be shorter. An empty input yields no shards, and a
/// worker count of zero is treated as one.
pub fn partition_catalog(urls: &[String], workers: usize) -> Vec<CatalogShard> {
    if urls.is_empty() {
        return Vec::new();
    }
    let workers = workers.max(1);
    let shard_size = urls.len().div_ceil(workers);

    urls.chunks(shard_size)
        .map(|chunk| CatalogShard::new(chunk.to_vec()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::partition_catalog;

    #[test]
    fn zero_workers_behaves_like_one() {
        let urls = vec!["a".to_string(), "b".to_string()];
        let shards = partition_catalog(&urls, 0);
        assert_eq!(shards.len(), 1);
        assert_eq!(shards[0].urls(), urls.as_slice());
    }
}
