//! Storage traits and error types
//!
//! This module defines the trait interface for record store backends and
//! associated error types.

use crate::model::{Listing, StoreSnapshot};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid payload: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Store lock poisoned")]
    Poisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for record store implementations
///
/// The store holds exactly one collection of listings plus the time of the
/// last write. Every write replaces the whole collection; there are no
/// per-record updates. Implementations must be safe to share between the
/// foreground sync path and the background enrichment task.
pub trait RecordStore: Send + Sync {
    /// Reads the full collection
    ///
    /// A store that has never been written returns an empty snapshot with
    /// `last_scan = None`.
    fn read_all(&self) -> StorageResult<StoreSnapshot>;

    /// Replaces the full collection and stamps a new last-scan time
    ///
    /// The payload is validated before any I/O happens.
    ///
    /// # Returns
    ///
    /// The new last-scan timestamp
    fn write_all(&self, listings: &[Listing]) -> StorageResult<DateTime<Utc>>;
}

/// Checks a write payload: every id must be non-empty and unique
pub fn validate_listings(listings: &[Listing]) -> StorageResult<()> {
    let mut seen = HashSet::with_capacity(listings.len());
    for (index, listing) in listings.iter().enumerate() {
        if listing.id.trim().is_empty() {
            return Err(StorageError::Validation(format!(
                "listing at position {} has an empty id",
                index
            )));
        }
        if !seen.insert(listing.id.as_str()) {
            return Err(StorageError::Validation(format!(
                "duplicate listing id '{}'",
                listing.id
            )));
        }
    }
    Ok(())
}

/// Drops listings a write would reject: blank ids and repeats of an id
///
/// The first occurrence of an id is kept, in its original position.
pub fn drop_unwritable(listings: Vec<Listing>) -> Vec<Listing> {
    let total = listings.len();
    let mut seen = HashSet::with_capacity(total);
    let kept: Vec<Listing> = listings
        .into_iter()
        .filter(|listing| !listing.id.trim().is_empty() && seen.insert(listing.id.clone()))
        .collect();

    if kept.len() < total {
        tracing::warn!(
            "Ignoring {} stored listings with a blank or repeated id",
            total - kept.len()
        );
    }
    kept
}
