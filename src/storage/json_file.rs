//! Flat-file storage implementation
//!
//! Listings live in `jobs.json` (a pretty-printed array) and the last-scan
//! stamp in `metadata.json`, both inside one data directory. The directory is
//! created on first use.

use crate::model::{Listing, StoreSnapshot};
use crate::storage::traits::{
    drop_unwritable, validate_listings, RecordStore, StorageError, StorageResult,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const JOBS_FILE: &str = "jobs.json";
const METADATA_FILE: &str = "metadata.json";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Metadata {
    last_scan: Option<DateTime<Utc>>,
}

/// JSON file record store backend
pub struct JsonFileStore {
    dir: PathBuf,
    // Serialises writers within the process; readers see whole files only
    write_guard: Mutex<()>,
}

impl JsonFileStore {
    /// Creates a store rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_guard: Mutex::new(()),
        }
    }

    pub fn jobs_path(&self) -> PathBuf {
        self.dir.join(JOBS_FILE)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.dir.join(METADATA_FILE)
    }

    fn read_metadata(&self) -> Metadata {
        let path = self.metadata_path();
        match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable {}: {}", path.display(), e);
                Metadata::default()
            }),
            Err(_) => Metadata::default(),
        }
    }
}

/// Writes `content` next to `path` and renames it into place
fn write_atomically(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(content)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)
}

impl RecordStore for JsonFileStore {
    fn read_all(&self) -> StorageResult<StoreSnapshot> {
        let metadata = self.read_metadata();

        let listings = match fs::read_to_string(self.jobs_path()) {
            Ok(content) => drop_unwritable(serde_json::from_str::<Vec<Listing>>(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(StorageError::Io(e)),
        };

        Ok(StoreSnapshot {
            listings,
            last_scan: metadata.last_scan,
        })
    }

    fn write_all(&self, listings: &[Listing]) -> StorageResult<DateTime<Utc>> {
        validate_listings(listings)?;

        let _guard = self.write_guard.lock().map_err(|_| StorageError::Poisoned)?;
        fs::create_dir_all(&self.dir)?;

        let jobs = serde_json::to_vec_pretty(listings)?;
        write_atomically(&self.jobs_path(), &jobs)?;

        let now = Utc::now();
        let metadata = serde_json::to_vec_pretty(&Metadata {
            last_scan: Some(now),
        })?;
        write_atomically(&self.metadata_path(), &metadata)?;

        tracing::debug!(
            "Stored {} listings in {}",
            listings.len(),
            self.jobs_path().display()
        );
        Ok(now)
    }
}
