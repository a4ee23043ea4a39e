use thiserror::Error;
use url::Url;

const ID_PLACEHOLDER: &str = "{id}";
const SAMPLE_ID: &str = "0";

pub const DEFAULT_DOWNLOAD_URL_TEMPLATE: &str =
    "https://www.gutenberg.org/cache/epub/{id}/pg{id}.txt";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("download url template has no {{id}} placeholder: {0}")]
    MissingPlaceholder(String),
    #[error("download url template does not produce a valid url: {0}")]
    InvalidUrl(String),
}

/// Fixed URL pattern that turns a resource id into its canonical download URL.
///
/// Every `{id}` occurrence is substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadUrlTemplate {
    pattern: String,
}

impl DownloadUrlTemplate {
    pub fn new(pattern: impl Into<String>) -> Result<Self, TemplateError> {
        let pattern = pattern.into();
        if !pattern.contains(ID_PLACEHOLDER) {
            return Err(TemplateError::MissingPlaceholder(pattern));
        }
        let sample = pattern.replace(ID_PLACEHOLDER, SAMPLE_ID);
        Url::parse(&sample).map_err(|err| TemplateError::InvalidUrl(format!("{pattern}: {err}")))?;
        Ok(Self { pattern })
    }

    pub fn render(&self, id: &str) -> String {
        self.pattern.replace(ID_PLACEHOLDER, id)
    }
}

impl Default for DownloadUrlTemplate {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_DOWNLOAD_URL_TEMPLATE.to_string(),
        }
    }
}
