//! Error types for relayzip-fetch.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("invalid link pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The request could not be started or the server answered with a non-2xx status.
    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    /// The response body failed after streaming had started.
    #[error("transport error while reading {url}: {message}")]
    Transport { url: String, message: String },

    #[error("no link matching '{pattern}' found on {page}")]
    NoMatchingLink { pattern: String, page: String },

    #[error("expected exactly one link matching '{pattern}' on {page}, found {count}")]
    AmbiguousLink {
        pattern: String,
        page: String,
        count: usize,
    },
}

impl FetchError {
    pub(crate) fn fetch(url: &str, e: impl std::fmt::Display) -> Self {
        Self::Fetch {
            url: url.to_string(),
            message: e.to_string(),
        }
    }

    pub(crate) fn transport(url: &str, e: impl std::fmt::Display) -> Self {
        Self::Transport {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
