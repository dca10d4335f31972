use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(rename = "rate-limit", default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub debug: DebugConfig,
}

impl Config {
    /// Page size used for both listing requests and the paginated view
    pub fn effective_page_size(&self) -> u32 {
        if self.debug.enabled {
            self.debug.page_size
        } else {
            self.site.page_size
        }
    }

    /// Upper bound on pages per rescan, if any
    ///
    /// Debug mode caps the count at `debug.max-pages`; a non-zero
    /// `site.max-pages` caps it as well.
    pub fn page_cap(&self) -> Option<u32> {
        let debug_cap = self.debug.enabled.then_some(self.debug.max_pages);
        let site_cap = (self.site.max_pages > 0).then_some(self.site.max_pages);
        match (debug_cap, site_cap) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Clamps a page count to the configured limits
    pub fn limit_pages(&self, total_pages: u32) -> u32 {
        self.page_cap()
            .map_or(total_pages, |cap| total_pages.min(cap))
    }
}

/// The jobs website being mirrored
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Scheme and host of the site; relative detail links resolve against it
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of the paginated listing page
    #[serde(rename = "listing-path", default = "default_listing_path")]
    pub listing_path: String,

    /// Listings requested per page
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,

    /// Hard cap on pages per rescan (0 = no cap)
    #[serde(rename = "max-pages", default)]
    pub max_pages: u32,
}

fn default_listing_path() -> String {
    "/jobs".to_string()
}

fn default_page_size() -> u32 {
    48
}

/// User agent sent with every request
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    pub value: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            value: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                    (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
        }
    }
}

/// Randomized delays inserted between requests (milliseconds)
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(rename = "page-delay-min-ms")]
    pub page_delay_min_ms: u64,

    #[serde(rename = "page-delay-max-ms")]
    pub page_delay_max_ms: u64,

    #[serde(rename = "detail-delay-min-ms")]
    pub detail_delay_min_ms: u64,

    #[serde(rename = "detail-delay-max-ms")]
    pub detail_delay_max_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            page_delay_min_ms: 300,
            page_delay_max_ms: 1300,
            detail_delay_min_ms: 1000,
            detail_delay_max_ms: 3000,
        }
    }
}

/// Background enrichment settings
#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentConfig {
    /// Listings enriched between two store commits
    #[serde(rename = "batch-size")]
    pub batch_size: usize,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self { batch_size: 10 }
    }
}

/// Timeout and retry settings applied to every HTTP fetch
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    #[serde(rename = "backoff-base-ms")]
    pub backoff_base_ms: u64,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_attempts: 3,
            backoff_base_ms: 500,
        }
    }
}

/// Which record store backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// `jobs.json` + `metadata.json` inside a directory
    Json,
    /// A single SQLite database file
    Sqlite,
}

/// Record store location
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,

    /// Directory for the JSON backend, database file for SQLite
    pub path: String,
}

fn default_backend() -> StoreBackend {
    StoreBackend::Json
}

/// Debug mode shrinks the scan to a couple of small pages
#[derive(Debug, Clone, Deserialize)]
pub struct DebugConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(rename = "page-size", default = "default_debug_page_size")]
    pub page_size: u32,

    #[serde(rename = "max-pages", default = "default_debug_max_pages")]
    pub max_pages: u32,
}

fn default_debug_page_size() -> u32 {
    12
}

fn default_debug_max_pages() -> u32 {
    2
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            page_size: default_debug_page_size(),
            max_pages: default_debug_max_pages(),
        }
    }
}
