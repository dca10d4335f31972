//! Sync phases and the in-memory state container
//!
//! `SyncPhase` is the orchestrator's state machine. `SyncState` bundles the
//! phase with everything a front end shows: the current page of listings,
//! totals, the last scan stamp, progress and the last error.

use crate::model::Listing;
use crate::sync::progress::{EnrichmentProgress, ScanProgress};
use crate::{Result, SyncError};
use chrono::{DateTime, Utc};
use std::fmt;

/// Phase of the sync orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SyncPhase {
    /// Nothing running
    #[default]
    Idle,

    /// Fetching index pages
    Scanning,

    /// Reconciling the fresh scrape with the merge baseline
    Merging,

    /// Merged collection written to the store
    Persisted,

    /// Enrichment pipeline running in the background
    EnrichingBackground,
}

impl SyncPhase {
    /// Returns true if moving from `self` to `next` is a legal transition
    ///
    /// Any phase may fall back to `Idle`; that covers both completion and
    /// aborted rescans.
    pub fn can_transition_to(&self, next: SyncPhase) -> bool {
        use SyncPhase::*;
        matches!(
            (*self, next),
            (_, Idle)
                | (Idle, Scanning)
                | (Idle, EnrichingBackground)
                | (Scanning, Merging)
                | (Merging, Persisted)
                | (Persisted, EnrichingBackground)
        )
    }

    /// Returns true while a foreground rescan holds the orchestrator
    pub fn is_rescanning(&self) -> bool {
        matches!(self, Self::Scanning | Self::Merging | Self::Persisted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Scanning => "scanning",
            Self::Merging => "merging",
            Self::Persisted => "persisted",
            Self::EnrichingBackground => "enriching",
        }
    }
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the orchestrator exposes about the current sync
#[derive(Debug, Clone)]
pub struct SyncState {
    phase: SyncPhase,
    page_size: usize,
    max_view_pages: Option<u32>,
    view: Vec<Listing>,
    current_page: u32,
    total_pages: u32,
    total_listings: usize,
    last_scan: Option<DateTime<Utc>>,
    scan_progress: Option<ScanProgress>,
    enrichment_progress: Option<EnrichmentProgress>,
    error: Option<String>,
}

impl SyncState {
    /// Creates an idle state with an empty view
    ///
    /// # Arguments
    ///
    /// * `page_size` - Listings per view page (clamped to at least 1)
    /// * `max_view_pages` - Optional cap on the number of view pages
    pub fn new(page_size: usize, max_view_pages: Option<u32>) -> Self {
        Self {
            phase: SyncPhase::Idle,
            page_size: page_size.max(1),
            max_view_pages,
            view: Vec::new(),
            current_page: 1,
            total_pages: 0,
            total_listings: 0,
            last_scan: None,
            scan_progress: None,
            enrichment_progress: None,
            error: None,
        }
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn view(&self) -> &[Listing] {
        &self.view
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn total_listings(&self) -> usize {
        self.total_listings
    }

    pub fn last_scan(&self) -> Option<DateTime<Utc>> {
        self.last_scan
    }

    pub fn scan_progress(&self) -> Option<ScanProgress> {
        self.scan_progress
    }

    pub fn enrichment_progress(&self) -> Option<EnrichmentProgress> {
        self.enrichment_progress
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Moves to `next`, rejecting illegal transitions
    pub fn transition(&mut self, next: SyncPhase) -> Result<()> {
        if !self.phase.can_transition_to(next) {
            return Err(SyncError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::debug!("Sync phase {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }

    /// Number of view pages needed for `total_listings`
    pub fn view_pages_for(&self, total_listings: usize) -> u32 {
        let pages = total_listings.div_ceil(self.page_size) as u32;
        match self.max_view_pages {
            Some(cap) => pages.min(cap),
            None => pages,
        }
    }

    /// Replaces the view with page `page` of `listings`
    pub fn show(&mut self, listings: &[Listing], page: u32) {
        let page = page.max(1);
        let start = (page as usize - 1).saturating_mul(self.page_size);
        let end = start.saturating_add(self.page_size).min(listings.len());

        self.view = if start < end {
            listings[start..end].to_vec()
        } else {
            Vec::new()
        };
        self.current_page = page;
        self.total_listings = listings.len();
        self.total_pages = self.view_pages_for(listings.len());
    }

    /// Refreshes the view for the current page from a newer collection
    pub fn refresh(&mut self, listings: &[Listing]) {
        self.show(listings, self.current_page);
    }

    /// Records the requested page without touching the view
    pub fn set_current_page(&mut self, page: u32) {
        self.current_page = page.max(1);
    }

    pub fn set_last_scan(&mut self, last_scan: Option<DateTime<Utc>>) {
        self.last_scan = last_scan;
    }

    pub fn set_scan_progress(&mut self, progress: Option<ScanProgress>) {
        self.scan_progress = progress;
    }

    pub fn set_enrichment_progress(&mut self, progress: Option<EnrichmentProgress>) {
        self.enrichment_progress = progress;
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Records a failed foreground operation and returns to idle
    pub fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.scan_progress = None;
        self.enrichment_progress = None;
        self.phase = SyncPhase::Idle;
    }

    /// Marks the background enrichment run as finished
    pub fn finish_enrichment(&mut self) {
        self.enrichment_progress = None;
        if self.phase == SyncPhase::EnrichingBackground {
            self.phase = SyncPhase::Idle;
        }
    }
}

impl Default for SyncState {
    fn default() -> Self {
        Self::new(48, None)
    }
}
