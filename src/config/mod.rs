//! Configuration module
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use cityjobs_sync::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Listings per page: {}", config.effective_page_size());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, DebugConfig, EnrichmentConfig, FetchConfig, RateLimitConfig, SiteConfig,
    StoreBackend, StoreConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
