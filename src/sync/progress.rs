//! Transient progress reporting for scans and enrichment runs

use crate::model::Listing;
use serde::Serialize;

/// Seconds assumed per remaining index page when estimating scan time
pub const SECONDS_PER_PAGE_ESTIMATE: u64 = 3;

/// Progress of the paginated index scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanProgress {
    pub current_page: u32,
    pub total_pages: u32,
    pub jobs_scanned: usize,
    pub estimated_seconds_remaining: Option<u64>,
}

impl ScanProgress {
    /// Progress after `page` of `total_pages` has been fetched
    pub fn after_page(page: u32, total_pages: u32, jobs_scanned: usize) -> Self {
        let remaining_pages = u64::from(total_pages.saturating_sub(page));
        Self {
            current_page: page,
            total_pages,
            jobs_scanned,
            estimated_seconds_remaining: Some(remaining_pages * SECONDS_PER_PAGE_ESTIMATE),
        }
    }
}

/// Progress of one enrichment run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentProgress {
    pub processed: usize,
    pub total: usize,
}

impl EnrichmentProgress {
    pub fn is_complete(&self) -> bool {
        self.processed >= self.total
    }
}

/// Receives progress notifications from a running sync
///
/// All methods default to doing nothing.
pub trait SyncObserver: Send + Sync {
    /// Called after every fetched index page
    fn scan_progress(&self, _progress: ScanProgress) {}

    /// Called after every attempted listing
    fn enrichment_progress(&self, _progress: EnrichmentProgress) {}

    /// Called with the full collection after every successful batch commit
    fn batch_committed(&self, _listings: &[Listing]) {}
}

/// Observer that ignores every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentObserver;

impl SyncObserver for SilentObserver {}
