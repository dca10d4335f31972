use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single job listing
///
/// Core fields are overwritten wholesale on every rescan. `posted_date` and
/// `details_fetched` are the enrichment fields: once `details_fetched` is set
/// the listing is never fetched again until an explicit reset, even when no
/// date was found on the detail page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub salary: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub job_type: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub experience_level: String,
    #[serde(default)]
    pub agency: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted_date: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub details_fetched: bool,
}

impl Listing {
    /// Creates a listing with only an id set
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Returns true if the enrichment pass still has to visit this listing
    pub fn needs_details(&self) -> bool {
        !self.details_fetched
    }

    /// Records a completed detail lookup, found or not
    pub fn record_details(&mut self, posted_date: Option<String>) {
        self.posted_date = posted_date;
        self.details_fetched = true;
    }

    /// Clears the enrichment fields so the next pass fetches them again
    pub fn reset_details(&mut self) {
        self.posted_date = None;
        self.details_fetched = false;
    }
}

/// One page of listings as returned by the listing fetcher
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    pub listings: Vec<Listing>,
    pub total_pages: u32,
}

/// Everything the record store holds
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub listings: Vec<Listing>,
    pub last_scan: Option<DateTime<Utc>>,
}

impl StoreSnapshot {
    /// Number of listings still lacking enrichment
    pub fn pending_details(&self) -> usize {
        self.listings.iter().filter(|l| l.needs_details()).count()
    }
}
