//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the RecordStore trait.

use crate::model::{Listing, StoreSnapshot};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{validate_listings, RecordStore, StorageError, StorageResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const LAST_SCAN_KEY: &str = "last_scan";

/// SQLite record store backend
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Creates a new SqliteStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }
}

impl RecordStore for SqliteStore {
    fn read_all(&self) -> StorageResult<StoreSnapshot> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT id, title, salary, location, job_type, category, experience_level,
             agency, description, url, posted_date, details_fetched
             FROM listings ORDER BY position",
        )?;

        let listings = stmt
            .query_map([], |row| {
                Ok(Listing {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    salary: row.get(2)?,
                    location: row.get(3)?,
                    job_type: row.get(4)?,
                    category: row.get(5)?,
                    experience_level: row.get(6)?,
                    agency: row.get(7)?,
                    description: row.get(8)?,
                    url: row.get(9)?,
                    posted_date: row.get(10)?,
                    details_fetched: row.get(11)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let last_scan: Option<String> = conn
            .query_row(
                "SELECT value FROM metadata WHERE key = ?1",
                params![LAST_SCAN_KEY],
                |row| row.get(0),
            )
            .optional()?;

        let last_scan = last_scan.and_then(|value| {
            DateTime::parse_from_rfc3339(&value)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| tracing::warn!("Ignoring unreadable last_scan '{}': {}", value, e))
                .ok()
        });

        Ok(StoreSnapshot {
            listings,
            last_scan,
        })
    }

    fn write_all(&self, listings: &[Listing]) -> StorageResult<DateTime<Utc>> {
        validate_listings(listings)?;

        let mut conn = self.lock()?;
        let now = Utc::now();

        let tx = conn.transaction()?;
        tx.execute("DELETE FROM listings", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO listings (position, id, title, salary, location, job_type, category,
                 experience_level, agency, description, url, posted_date, details_fetched)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            )?;
            for (position, listing) in listings.iter().enumerate() {
                stmt.execute(params![
                    position as i64,
                    listing.id,
                    listing.title,
                    listing.salary,
                    listing.location,
                    listing.job_type,
                    listing.category,
                    listing.experience_level,
                    listing.agency,
                    listing.description,
                    listing.url,
                    listing.posted_date,
                    listing.details_fetched,
                ])?;
            }
        }
        tx.execute(
            "INSERT INTO metadata (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![LAST_SCAN_KEY, now.to_rfc3339()],
        )?;
        tx.commit()?;

        tracing::debug!("Stored {} listings in SQLite", listings.len());
        Ok(now)
    }
}
