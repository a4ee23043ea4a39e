use std::fmt;
use std::path::PathBuf;

use harvester_core::FailureClass;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Vec<u8>,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub original_url: String,
    pub final_url: String,
    pub content_type: Option<String>,
    pub byte_len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    BodyRead,
    Decode,
    Persist,
    Network,
}

impl FailureKind {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FailureKind::HttpStatus(404))
    }

    pub fn retry_class(&self) -> FailureClass {
        if self.is_not_found() {
            FailureClass::NotFound
        } else {
            FailureClass::Transient
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(404) => write!(f, "not found (404)"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::BodyRead => write!(f, "body read error"),
            FailureKind::Decode => write!(f, "decode error"),
            FailureKind::Persist => write!(f, "persistence error"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Result of one successful fetch-and-save attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(PathBuf),
    /// Bytes were transferred but the quota was already met, so nothing was written.
    QuotaAlreadyMet,
}

/// Terminal state of one resource's download task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadStatus {
    Saved { path: PathBuf, attempts: u32 },
    CountedWithoutSaving { attempts: u32 },
    Exhausted { attempts: u32, last_error: FailureKind },
    Cancelled { attempts: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestEvent {
    PageFailed {
        url: String,
        kind: FailureKind,
    },
    ShardHarvested {
        shard_index: usize,
        links: usize,
    },
    AttemptFailed {
        resource_id: String,
        attempt: u32,
        kind: FailureKind,
    },
    ResourceFinished {
        resource_id: String,
        status: DownloadStatus,
    },
    QuotaReached {
        count: usize,
    },
}
