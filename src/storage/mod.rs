//! Storage module for persisting the listing collection
//!
//! This module handles all record store operations, including:
//! - The `RecordStore` trait (whole-collection read and write)
//! - A flat-file JSON backend
//! - A SQLite backend
//! - Payload validation shared by both

mod json_file;
mod schema;
mod sqlite;
mod traits;

pub use json_file::JsonFileStore;
pub use sqlite::SqliteStore;
pub use traits::{validate_listings, RecordStore, StorageError, StorageResult};

use crate::config::{StoreBackend, StoreConfig};
use std::path::Path;
use std::sync::Arc;

/// Opens the record store described by the configuration
///
/// # Arguments
///
/// * `config` - The store section of the configuration
///
/// # Returns
///
/// * `Ok(Arc<dyn RecordStore>)` - Store ready for shared use
/// * `Err(StorageError)` - Failed to open the store
pub fn open_store(config: &StoreConfig) -> StorageResult<Arc<dyn RecordStore>> {
    match config.backend {
        StoreBackend::Json => {
            tracing::debug!("Using JSON record store at {}", config.path);
            Ok(Arc::new(JsonFileStore::new(&config.path)))
        }
        StoreBackend::Sqlite => {
            tracing::debug!("Using SQLite record store at {}", config.path);
            Ok(Arc::new(SqliteStore::new(Path::new(&config.path))?))
        }
    }
}
