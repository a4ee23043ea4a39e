use std::collections::BTreeMap;

use crate::template::DownloadUrlTemplate;

/// A discovered resource: stable id plus the canonical URL its content is fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub id: String,
    pub download_url: String,
    /// The first discovered link that produced this id.
    pub source_link: String,
}

/// Resource records keyed by id, iterated in ascending id order.
pub type ResourceCatalog = BTreeMap<String, ResourceRecord>;

/// Trailing path segment of `link`, or `None` when there is no `/` or nothing follows it.
pub fn resource_id(link: &str) -> Option<&str> {
    let (_, id) = link.rsplit_once('/')?;
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// Map every link onto a resource record, collapsing links that share an id.
///
/// The first link seen for an id wins; later duplicates are ignored.
pub fn extract_resources<I, S>(links: I, template: &DownloadUrlTemplate) -> ResourceCatalog
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut catalog = ResourceCatalog::new();
    for link in links {
        let link = link.as_ref();
        let Some(id) = resource_id(link) else {
            continue;
        };
        catalog
            .entry(id.to_string())
            .or_insert_with(|| ResourceRecord {
                id: id.to_string(),
                download_url: template.render(id),
                source_link: link.to_string(),
            });
    }
    catalog
}
