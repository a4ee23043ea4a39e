use scraper::{Html, Selector};
use url::Url;

const DEFAULT_MAX_LINKS: usize = 50_000;

pub const RESOURCE_HEADING_SELECTOR: &str = "h2";
pub const RESOURCE_HEADING_MARKER: &str = "(English)";
pub const CATALOG_NAVIGATION_SELECTOR: &str = "div.pgdbnavbar > p:nth-of-type(2)";

/// Turns a fetched page into the raw link strings it advertises.
pub trait LinkExtractor: Send + Sync {
    fn extract_links(&self, html: &str, page_url: &str) -> Vec<String>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid css selector {selector:?}: {message}")]
pub struct SelectorError {
    pub selector: String,
    pub message: String,
}

/// Collects `a[href]` values inside every element matched by a container selector.
///
/// With a marker set, only containers whose text contains the marker contribute.
/// With resolution enabled, hrefs are joined against the page URL; otherwise
/// they are returned trimmed but otherwise untouched.
#[derive(Debug, Clone)]
pub struct AnchorExtractor {
    container: Selector,
    anchor: Selector,
    marker: Option<String>,
    resolve_against_page: bool,
    max_links: usize,
}

impl AnchorExtractor {
    pub fn new(
        container: &str,
        marker: Option<&str>,
        resolve_against_page: bool,
    ) -> Result<Self, SelectorError> {
        Ok(Self {
            container: parse_selector(container)?,
            anchor: parse_selector("a[href]")?,
            marker: marker.map(str::to_string),
            resolve_against_page,
            max_links: DEFAULT_MAX_LINKS,
        })
    }

    /// Resource links: anchors under `<h2>` headings marked "(English)".
    pub fn marked_headings() -> Result<Self, SelectorError> {
        Self::new(RESOURCE_HEADING_SELECTOR, Some(RESOURCE_HEADING_MARKER), false)
    }

    /// Index-page links from the catalog root's navigation bar, as absolute URLs.
    pub fn catalog_navigation() -> Result<Self, SelectorError> {
        Self::new(CATALOG_NAVIGATION_SELECTOR, None, true)
    }

    pub fn with_max_links(mut self, max_links: usize) -> Self {
        self.max_links = max_links;
        self
    }
}

impl LinkExtractor for AnchorExtractor {
    fn extract_links(&self, html: &str, page_url: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let base = Url::parse(page_url).ok();
        let mut links = Vec::new();

        for container in document.select(&self.container) {
            if let Some(marker) = self.marker.as_deref() {
                let text: String = container.text().collect();
                if !text.trim().contains(marker) {
                    continue;
                }
            }
            for anchor in container.select(&self.anchor) {
                if links.len() >= self.max_links {
                    return links;
                }
                let Some(href) = anchor.value().attr("href").map(str::trim) else {
                    continue;
                };
                if href.is_empty() {
                    continue;
                }
                if self.resolve_against_page {
                    if let Some(url) = resolve_url(href, base.as_ref()) {
                        links.push(url.into());
                    }
                } else {
                    links.push(href.to_string());
                }
            }
        }

        links
    }
}

fn parse_selector(selector: &str) -> Result<Selector, SelectorError> {
    Selector::parse(selector).map_err(|err| SelectorError {
        selector: selector.to_string(),
        message: err.to_string(),
    })
}

fn resolve_url(reference: &str, base: Option<&Url>) -> Option<Url> {
    let lower = reference.to_ascii_lowercase();
    if lower.starts_with('#') || lower.starts_with("javascript:") {
        return None;
    }
    if let Ok(url) = Url::parse(reference) {
        return Some(url);
    }
    base.and_then(|base| base.join(reference).ok())
}
