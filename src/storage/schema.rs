//! Database schema definitions
//!
//! This module contains the SQL schema for the SQLite record store.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- The listing collection, in scrape order
CREATE TABLE IF NOT EXISTS listings (
    position INTEGER PRIMARY KEY,
    id TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    salary TEXT NOT NULL,
    location TEXT NOT NULL,
    job_type TEXT NOT NULL,
    category TEXT NOT NULL,
    experience_level TEXT NOT NULL,
    agency TEXT NOT NULL,
    description TEXT NOT NULL,
    url TEXT NOT NULL,
    posted_date TEXT,
    details_fetched INTEGER NOT NULL DEFAULT 0
);

-- Store-level metadata (last_scan)
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The SQLite connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}
