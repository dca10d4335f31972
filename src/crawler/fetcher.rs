//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests to the jobs website, including:
//! - Building HTTP clients with the configured user agent and timeouts
//! - GET requests for listing index pages and detail pages
//! - Status classification and bounded retry

use crate::config::Config;
use crate::crawler::parser::{parse_listings, parse_posted_date, parse_total_pages};
use crate::crawler::retry::RetryPolicy;
use crate::crawler::traits::{DetailFetcher, FetchError, FetchResult, ListingFetcher};
use crate::model::ListingPage;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The full configuration (user agent and fetch timeouts)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use cityjobs_sync::config::load_config;
/// use cityjobs_sync::crawler::build_http_client;
/// use std::path::Path;
///
/// let config = load_config(Path::new("config.toml")).unwrap();
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    let timeout = config.fetch.timeout();

    Client::builder()
        .user_agent(config.user_agent.value.clone())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Sends a GET request and returns the body of a successful response
async fn get_html(client: &Client, url: &str) -> FetchResult<String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| FetchError::from_reqwest(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
        });
    }

    response
        .text()
        .await
        .map_err(|e| FetchError::from_reqwest(url, e))
}

fn parse_base_url(base_url: &str) -> FetchResult<Url> {
    Url::parse(base_url).map_err(|e| FetchError::InvalidUrl {
        url: base_url.to_string(),
        message: e.to_string(),
    })
}

/// Fetches pages of the listing index over HTTP
pub struct HttpListingFetcher {
    client: Client,
    listing_url: Url,
    retry: RetryPolicy,
}

impl HttpListingFetcher {
    /// Creates a fetcher for `{base-url}{listing-path}`
    pub fn new(client: Client, config: &Config) -> FetchResult<Self> {
        let base = parse_base_url(&config.site.base_url)?;
        let listing_url = base
            .join(&config.site.listing_path)
            .map_err(|e| FetchError::InvalidUrl {
                url: config.site.listing_path.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            listing_url,
            retry: RetryPolicy::from_config(&config.fetch),
        })
    }

    /// URL of one index page
    pub fn page_url(&self, page: u32, page_size: u32) -> String {
        let mut url = self.listing_url.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("page", &page.to_string())
            .append_pair("size", &page_size.to_string());
        url.to_string()
    }
}

#[async_trait]
impl ListingFetcher for HttpListingFetcher {
    async fn fetch_page(&self, page: u32, page_size: u32) -> FetchResult<ListingPage> {
        let url = self.page_url(page, page_size);
        let label = format!("Listing page {}", page);
        let html = self.retry.run(&label, || get_html(&self.client, &url)).await?;

        Ok(ListingPage {
            listings: parse_listings(&html),
            total_pages: parse_total_pages(&html, page_size),
        })
    }
}

/// Fetches listing detail pages over HTTP
pub struct HttpDetailFetcher {
    client: Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl HttpDetailFetcher {
    pub fn new(client: Client, config: &Config) -> FetchResult<Self> {
        Ok(Self {
            client,
            base_url: parse_base_url(&config.site.base_url)?,
            retry: RetryPolicy::from_config(&config.fetch),
        })
    }

    /// Resolves a possibly relative detail link against the site base URL
    pub fn resolve(&self, detail_url: &str) -> FetchResult<String> {
        self.base_url
            .join(detail_url.trim())
            .map(|url| url.to_string())
            .map_err(|e| FetchError::InvalidUrl {
                url: detail_url.to_string(),
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl DetailFetcher for HttpDetailFetcher {
    async fn fetch_posted_date(&self, detail_url: &str) -> FetchResult<Option<String>> {
        if detail_url.trim().is_empty() {
            return Err(FetchError::InvalidUrl {
                url: String::new(),
                message: "listing has no detail URL".to_string(),
            });
        }

        let url = self.resolve(detail_url)?;
        let html = self
            .retry
            .run("Detail page", || get_html(&self.client, &url))
            .await?;

        Ok(parse_posted_date(&html))
    }
}
