//! Fetcher traits and error types
//!
//! The sync engine only sees these traits, so tests can substitute scripted
//! fetchers for the HTTP implementations.

use crate::model::ListingPage;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while fetching from the remote site
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to fetch {url}: {status} {reason}")]
    Status {
        url: String,
        status: u16,
        reason: String,
    },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("HTTP error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },
}

impl FetchError {
    /// Returns true if the same request may succeed when tried again
    ///
    /// Timeouts, connection failures, 5xx and 429 are transient. Other 4xx
    /// responses and malformed URLs are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Timeout { .. } | Self::Connect { .. } | Self::Transport { .. } => true,
            Self::InvalidUrl { .. } => false,
        }
    }

    /// Classifies a reqwest error for the given URL
    pub fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else if error.is_connect() {
            Self::Connect {
                url: url.to_string(),
                message: error.to_string(),
            }
        } else {
            Self::Transport {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}

/// Result type for fetch operations
pub type FetchResult<T> = Result<T, FetchError>;

/// Fetches one page of the paginated listing index
#[async_trait]
pub trait ListingFetcher: Send + Sync {
    /// Fetches page `page` (1-based) with `page_size` listings per page
    ///
    /// The returned `total_pages` is what the site reports for this page size;
    /// it is at least 1.
    async fn fetch_page(&self, page: u32, page_size: u32) -> FetchResult<ListingPage>;
}

/// Fetches the enrichment field from a listing's detail page
#[async_trait]
pub trait DetailFetcher: Send + Sync {
    /// Returns the posted date shown on the detail page, or `None` if the page
    /// has no parseable date
    async fn fetch_posted_date(&self, detail_url: &str) -> FetchResult<Option<String>>;
}
