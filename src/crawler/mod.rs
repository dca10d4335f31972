//! Fetch layer for the jobs website
//!
//! This module contains everything that talks to the remote site:
//! - HTTP fetching with timeouts and bounded retry
//! - HTML parsing of listing pages and detail pages
//! - The `ListingFetcher` / `DetailFetcher` seams the sync engine depends on

mod fetcher;
mod parser;
mod retry;
mod traits;

pub use fetcher::{build_http_client, HttpDetailFetcher, HttpListingFetcher};
pub use parser::{parse_listings, parse_posted_date, parse_total_pages};
pub use retry::RetryPolicy;
pub use traits::{DetailFetcher, FetchError, FetchResult, ListingFetcher};
