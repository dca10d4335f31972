//! cityjobs-sync: an incremental mirror of a public jobs board
//!
//! This crate scrapes the paginated job listings of a jobs website, stores the
//! full collection in a flat record store, and enriches each listing with the
//! "posted on" date found on its detail page. Rescans merge against the stored
//! collection so enrichment work that is already done survives.

pub mod config;
pub mod crawler;
pub mod model;
pub mod output;
pub mod storage;
pub mod sync;

use thiserror::Error;

/// Main error type for sync operations
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid sync transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: sync::SyncPhase,
        to: sync::SyncPhase,
    },

    #[error("A {0:?} operation is already running")]
    Busy(sync::SyncPhase),

    #[error("Background enrichment ended without an outcome")]
    EnrichmentAborted,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use model::Listing;
pub use sync::{SyncOrchestrator, SyncPhase};
