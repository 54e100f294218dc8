use std::fmt;

use crate::matcher::MatchResult;

/// Tag of the search run an event belongs to.
pub type Generation = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
    /// Indirected hosting: the gist owner is being looked up before any fetch.
    GistInfoLoading { generation: Generation },
    /// Every page URL resolved; fetching begins.
    Started {
        generation: Generation,
        pages_total: usize,
    },
    /// One page settled, successfully or not, with running totals.
    PageSettled(PageReport),
    /// Every batch settled.
    Finished {
        generation: Generation,
        results_found: usize,
        pages_total: usize,
    },
    /// The run aborted before fetching anything.
    Failed {
        generation: Generation,
        cause: AbortCause,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortCause {
    /// Gist owner lookup failed; sticky for the engine's lifetime.
    GistUnavailable,
    /// A page URL could not be built from the site location.
    PageUrl,
}

impl SearchEvent {
    pub fn generation(&self) -> Generation {
        match self {
            SearchEvent::GistInfoLoading { generation }
            | SearchEvent::Started { generation, .. }
            | SearchEvent::Finished { generation, .. }
            | SearchEvent::Failed { generation, .. } => *generation,
            SearchEvent::PageSettled(report) => report.generation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageReport {
    pub generation: Generation,
    pub page: String,
    pub outcome: Result<Vec<MatchResult>, FailureKind>,
    pub results_found: usize,
    pub pages_searched: usize,
    pub pages_total: usize,
}

impl PageReport {
    pub fn matches(&self) -> &[MatchResult] {
        match &self.outcome {
            Ok(matches) => matches,
            Err(_) => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Vec<u8>,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub url: String,
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
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
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
    UnsupportedScheme { scheme: String },
    Decode,
    Io,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnsupportedScheme { scheme } => write!(f, "unsupported scheme {scheme}"),
            FailureKind::Decode => write!(f, "decode error"),
            FailureKind::Io => write!(f, "io error"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
