use crate::config::types::{
    Config, DebugConfig, EnrichmentConfig, FetchConfig, RateLimitConfig, SiteConfig, StoreConfig,
};
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_site_config(&config.site)?;
    validate_user_agent(&config.user_agent.value)?;
    validate_rate_limit_config(&config.rate_limit)?;
    validate_enrichment_config(&config.enrichment)?;
    validate_fetch_config(&config.fetch)?;
    validate_store_config(&config.store)?;
    validate_debug_config(&config.debug)?;
    Ok(())
}

/// Validates the site section
fn validate_site_config(config: &SiteConfig) -> ConfigResult<()> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if !config.listing_path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "listing-path must start with '/', got '{}'",
            config.listing_path
        )));
    }

    if config.page_size < 1 || config.page_size > 200 {
        return Err(ConfigError::Validation(format!(
            "page-size must be between 1 and 200, got {}",
            config.page_size
        )));
    }

    Ok(())
}

fn validate_user_agent(value: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent value cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates that every delay range is well formed
fn validate_rate_limit_config(config: &RateLimitConfig) -> ConfigResult<()> {
    validate_range(
        "page-delay",
        config.page_delay_min_ms,
        config.page_delay_max_ms,
    )?;
    validate_range(
        "detail-delay",
        config.detail_delay_min_ms,
        config.detail_delay_max_ms,
    )
}

fn validate_range(name: &str, min: u64, max: u64) -> ConfigResult<()> {
    if min > max {
        return Err(ConfigError::Validation(format!(
            "{}-min-ms ({}) must not exceed {}-max-ms ({})",
            name, min, name, max
        )));
    }
    Ok(())
}

fn validate_enrichment_config(config: &EnrichmentConfig) -> ConfigResult<()> {
    if config.batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "batch-size must be >= 1, got {}",
            config.batch_size
        )));
    }
    Ok(())
}

fn validate_fetch_config(config: &FetchConfig) -> ConfigResult<()> {
    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    Ok(())
}

fn validate_store_config(config: &StoreConfig) -> ConfigResult<()> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "store path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_debug_config(config: &DebugConfig) -> ConfigResult<()> {
    if config.enabled && (config.page_size < 1 || config.max_pages < 1) {
        return Err(ConfigError::Validation(
            "debug page-size and max-pages must be >= 1".to_string(),
        ));
    }
    Ok(())
}
