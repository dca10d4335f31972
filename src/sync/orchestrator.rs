//! Sync orchestrator - rescan, load and reset over one record store
//!
//! The orchestrator drives a rescan through `Scanning -> Merging ->
//! Persisted` in the foreground and then hands the pending listings to an
//! enrichment pipeline running as a background task. It owns:
//! - The shared `SyncState` shown to front ends
//! - The write lock serialising every store write
//! - The handle of the current background enrichment run

use crate::config::Config;
use crate::crawler::{
    build_http_client, DetailFetcher, HttpDetailFetcher, HttpListingFetcher, ListingFetcher,
};
use crate::model::Listing;
use crate::storage::{open_store, RecordStore};
use crate::sync::delay::DelayRange;
use crate::sync::enrich::{EnrichmentOutcome, EnrichmentPipeline};
use crate::sync::merge::merge_preserving_details;
use crate::sync::progress::{EnrichmentProgress, ScanProgress, SyncObserver};
use crate::sync::state::{SyncPhase, SyncState};
use crate::{Result, SyncError};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockWriteGuard};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Tunables of a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    /// Listings requested per index page and shown per view page
    pub page_size: u32,

    /// Upper bound on index pages per rescan
    pub max_pages: Option<u32>,

    /// Pause between index pages
    pub page_delay: DelayRange,

    /// Pause between detail pages
    pub detail_delay: DelayRange,

    /// Attempted listings per enrichment commit
    pub batch_size: usize,
}

impl SyncSettings {
    pub fn from_config(config: &Config) -> Self {
        let rate = &config.rate_limit;
        Self {
            page_size: config.effective_page_size(),
            max_pages: config.page_cap(),
            page_delay: DelayRange::from_millis(rate.page_delay_min_ms, rate.page_delay_max_ms),
            detail_delay: DelayRange::from_millis(
                rate.detail_delay_min_ms,
                rate.detail_delay_max_ms,
            ),
            batch_size: config.enrichment.batch_size,
        }
    }

    /// Settings without any delays
    pub fn without_delays(mut self) -> Self {
        self.page_delay = DelayRange::disabled();
        self.detail_delay = DelayRange::disabled();
        self
    }

    fn limit_pages(&self, total_pages: u32) -> u32 {
        match self.max_pages {
            Some(cap) => total_pages.min(cap),
            None => total_pages,
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            page_size: 48,
            max_pages: None,
            page_delay: DelayRange::from_millis(300, 1300),
            detail_delay: DelayRange::from_millis(1000, 3000),
            batch_size: 10,
        }
    }
}

/// Summary of a completed rescan
#[derive(Debug, Clone)]
pub struct RescanReport {
    pub pages_scanned: u32,
    pub listings: usize,
    /// Listings whose details were carried over from the baseline
    pub preserved: usize,
    /// Listings handed to background enrichment
    pub pending: usize,
    pub last_scan: DateTime<Utc>,
    pub enrichment_started: bool,
}

/// Summary of loading the stored collection
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub listings: usize,
    pub pending: usize,
    pub last_scan: Option<DateTime<Utc>>,
    pub enrichment_started: bool,
}

/// A background enrichment task
///
/// The run publishes its outcome once it has wound down, so any number of
/// callers can wait on it while the orchestrator keeps the handle.
pub struct EnrichmentHandle {
    cancel: CancellationToken,
    done: watch::Receiver<Option<EnrichmentOutcome>>,
    task: JoinHandle<()>,
}

impl EnrichmentHandle {
    /// Asks the pipeline to stop before its next listing
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.done.borrow().is_some() || self.task.is_finished()
    }

    /// Resolves with the outcome of the run
    ///
    /// Fails if the task ended without publishing one.
    pub fn outcome(&self) -> impl Future<Output = Result<EnrichmentOutcome>> + Send + 'static {
        let mut done = self.done.clone();
        async move {
            let published = match done.wait_for(Option::is_some).await {
                Ok(outcome) => Option::clone(&outcome),
                Err(_) => None,
            };
            published.ok_or(SyncError::EnrichmentAborted)
        }
    }
}

/// Observer that mirrors progress into the shared state
///
/// Every notification is passed on to the caller's observer afterwards.
struct StateObserver {
    state: Arc<RwLock<SyncState>>,
    forward: Option<Arc<dyn SyncObserver>>,
}

impl StateObserver {
    fn state(&self) -> RwLockWriteGuard<'_, SyncState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SyncObserver for StateObserver {
    fn scan_progress(&self, progress: ScanProgress) {
        self.state().set_scan_progress(Some(progress));
        if let Some(forward) = &self.forward {
            forward.scan_progress(progress);
        }
    }

    fn enrichment_progress(&self, progress: EnrichmentProgress) {
        self.state().set_enrichment_progress(Some(progress));
        if let Some(forward) = &self.forward {
            forward.enrichment_progress(progress);
        }
    }

    fn batch_committed(&self, listings: &[Listing]) {
        self.state().refresh(listings);
        if let Some(forward) = &self.forward {
            forward.batch_committed(listings);
        }
    }
}

/// Drives rescans, loads and resets against one record store
pub struct SyncOrchestrator {
    listing_fetcher: Arc<dyn ListingFetcher>,
    detail_fetcher: Arc<dyn DetailFetcher>,
    store: Arc<dyn RecordStore>,
    settings: SyncSettings,
    state: Arc<RwLock<SyncState>>,
    observer: Arc<StateObserver>,
    write_lock: Arc<tokio::sync::Mutex<()>>,
    foreground: tokio::sync::Mutex<()>,
    enrichment: Mutex<Option<EnrichmentHandle>>,
}

impl SyncOrchestrator {
    /// Creates an idle orchestrator
    ///
    /// # Arguments
    ///
    /// * `listing_fetcher` - Source of index pages
    /// * `detail_fetcher` - Source of posted dates
    /// * `store` - The record store; the orchestrator is its only writer
    /// * `settings` - Page size, page cap, delays and batch size
    pub fn new(
        listing_fetcher: Arc<dyn ListingFetcher>,
        detail_fetcher: Arc<dyn DetailFetcher>,
        store: Arc<dyn RecordStore>,
        settings: SyncSettings,
    ) -> Self {
        let state = Arc::new(RwLock::new(SyncState::new(
            settings.page_size as usize,
            settings.max_pages,
        )));
        let observer = Arc::new(StateObserver {
            state: state.clone(),
            forward: None,
        });

        Self {
            listing_fetcher,
            detail_fetcher,
            store,
            settings,
            state,
            observer,
            write_lock: Arc::new(tokio::sync::Mutex::new(())),
            foreground: tokio::sync::Mutex::new(()),
            enrichment: Mutex::new(None),
        }
    }

    /// Creates an orchestrator over HTTP fetchers and the configured store
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(SyncOrchestrator)` - Ready to rescan or load
    /// * `Err(SyncError)` - Failed to build the HTTP client or open the store
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = build_http_client(config)?;
        let listing_fetcher = HttpListingFetcher::new(client.clone(), config)?;
        let detail_fetcher = HttpDetailFetcher::new(client, config)?;
        let store = open_store(&config.store)?;

        Ok(Self::new(
            Arc::new(listing_fetcher),
            Arc::new(detail_fetcher),
            store,
            SyncSettings::from_config(config),
        ))
    }

    /// Also reports progress to `observer`
    pub fn with_observer(mut self, observer: Arc<dyn SyncObserver>) -> Self {
        self.observer = Arc::new(StateObserver {
            state: self.state.clone(),
            forward: Some(observer),
        });
        self
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> SyncState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn phase(&self) -> SyncPhase {
        self.snapshot().phase()
    }

    fn state_mut(&self) -> RwLockWriteGuard<'_, SyncState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn enrichment_slot(&self) -> MutexGuard<'_, Option<EnrichmentHandle>> {
        self.enrichment.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, next: SyncPhase) -> Result<()> {
        self.state_mut().transition(next)
    }

    /// Returns true while a background enrichment run is active
    pub fn is_enriching(&self) -> bool {
        self.enrichment_slot()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Refetches every index page, merges with the store and persists
    ///
    /// The merge baseline is read before the first page is requested. Any
    /// failure before the merged collection is written leaves the store
    /// untouched and returns the state to idle. After a successful write,
    /// listings still lacking details are enriched in the background; this
    /// call does not wait for that.
    pub async fn rescan(&self) -> Result<RescanReport> {
        let _foreground = self
            .foreground
            .try_lock()
            .map_err(|_| SyncError::Busy(self.phase()))?;

        self.stop_enrichment().await;

        {
            let mut state = self.state_mut();
            state.transition(SyncPhase::Scanning)?;
            state.clear_error();
            state.set_scan_progress(Some(ScanProgress::default()));
        }

        let (merged, pages_scanned, last_scan) = match self.scan_merge_persist().await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Rescan failed: {}", e);
                self.state_mut().fail(e.to_string());
                return Err(e);
            }
        };

        let preserved = merged.iter().filter(|l| l.details_fetched).count();
        let pending = merged.len() - preserved;
        {
            let mut state = self.state_mut();
            state.show(&merged, 1);
            state.set_last_scan(Some(last_scan));
            state.set_scan_progress(None);
        }

        tracing::info!(
            "Rescan complete: {} jobs from {} pages ({} with details, {} pending)",
            merged.len(),
            pages_scanned,
            preserved,
            pending
        );

        let enrichment_started = if pending > 0 {
            self.start_enrichment_from_store()
        } else {
            self.transition(SyncPhase::Idle)?;
            false
        };

        Ok(RescanReport {
            pages_scanned,
            listings: merged.len(),
            preserved,
            pending,
            last_scan,
            enrichment_started,
        })
    }

    /// Baseline read through persist, all under the write lock
    async fn scan_merge_persist(&self) -> Result<(Vec<Listing>, u32, DateTime<Utc>)> {
        let _write = self.write_lock.lock().await;

        let baseline = self.store.read_all()?;
        tracing::debug!("Merge baseline holds {} listings", baseline.listings.len());

        let (fresh, pages_scanned) = self.scan_all_pages().await?;

        self.transition(SyncPhase::Merging)?;
        let merged = merge_preserving_details(fresh, &baseline.listings);

        let last_scan = self.store.write_all(&merged)?;
        self.transition(SyncPhase::Persisted)?;

        Ok((merged, pages_scanned, last_scan))
    }

    /// Fetches pages 1 through the reported total, pausing between pages
    async fn scan_all_pages(&self) -> Result<(Vec<Listing>, u32)> {
        let page_size = self.settings.page_size;
        let mut listings = Vec::new();
        let mut total_pages = 1;
        let mut page = 1;

        loop {
            if page > 1 {
                self.settings.page_delay.sleep().await;
            }

            let result = self.listing_fetcher.fetch_page(page, page_size).await?;
            if page == 1 {
                total_pages = self.settings.limit_pages(result.total_pages.max(1));
                tracing::info!("Scanning {} pages of {} jobs", total_pages, page_size);
            }

            let count = result.listings.len();
            listings.extend(result.listings);
            tracing::info!("Fetched page {}/{} ({} jobs)", page, total_pages, count);
            self.observer.scan_progress(ScanProgress::after_page(
                page,
                total_pages,
                listings.len(),
            ));

            if page >= total_pages {
                break;
            }
            page += 1;
        }

        Ok((listings, total_pages))
    }

    /// Shows the stored collection and resumes enrichment of pending listings
    ///
    /// Enrichment works on a fresh read of the store, not on the copy used
    /// for the view. Nothing is started if a run is already active.
    pub async fn load_stored(&self) -> Result<LoadReport> {
        let _foreground = self
            .foreground
            .try_lock()
            .map_err(|_| SyncError::Busy(self.phase()))?;

        let snapshot = match self.store.read_all() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!("Failed to load stored jobs: {}", e);
                self.state_mut().fail(e.to_string());
                return Err(e.into());
            }
        };

        let pending = snapshot.pending_details();
        {
            let mut state = self.state_mut();
            state.clear_error();
            state.show(&snapshot.listings, 1);
            state.set_last_scan(snapshot.last_scan);
        }

        tracing::info!(
            "Loaded {} stored jobs ({} pending details)",
            snapshot.listings.len(),
            pending
        );

        let enrichment_started = if pending == 0 {
            false
        } else if self.is_enriching() {
            tracing::debug!("Enrichment already running");
            false
        } else {
            self.start_enrichment_from_store()
        };

        Ok(LoadReport {
            listings: snapshot.listings.len(),
            pending,
            last_scan: snapshot.last_scan,
            enrichment_started,
        })
    }

    /// Clears the enrichment fields of every stored listing
    ///
    /// Any running enrichment is cancelled and awaited first. Returns the
    /// cleared collection.
    pub async fn reset_details(&self) -> Result<Vec<Listing>> {
        let _foreground = self
            .foreground
            .try_lock()
            .map_err(|_| SyncError::Busy(self.phase()))?;

        self.stop_enrichment().await;

        let listings = {
            let _write = self.write_lock.lock().await;
            let mut listings = self.store.read_all()?.listings;
            for listing in &mut listings {
                listing.reset_details();
            }
            let last_scan = self.store.write_all(&listings)?;
            self.state_mut().set_last_scan(Some(last_scan));
            listings
        };

        self.state_mut().refresh(&listings);
        tracing::info!("Reset details for {} jobs", listings.len());
        Ok(listings)
    }

    /// Shows view page `page` of the stored collection
    ///
    /// A failed store read is logged and leaves the view as it was; the
    /// page number is recorded either way.
    pub fn set_page(&self, page: u32) {
        match self.store.read_all() {
            Ok(snapshot) => self.state_mut().show(&snapshot.listings, page),
            Err(e) => {
                tracing::warn!("Failed to load page {}: {}", page, e);
                self.state_mut().set_current_page(page);
            }
        }
    }

    /// Waits for the current background enrichment run, if any
    ///
    /// The run stays owned by the orchestrator, so `cancel_enrichment`, a
    /// rescan or a reset still reach it while this is pending.
    pub async fn wait_for_enrichment(&self) -> Result<Option<EnrichmentOutcome>> {
        let outcome = self.enrichment_slot().as_ref().map(EnrichmentHandle::outcome);
        match outcome {
            Some(outcome) => Ok(Some(outcome.await?)),
            None => Ok(None),
        }
    }

    /// Asks the current background enrichment run to stop
    pub fn cancel_enrichment(&self) {
        if let Some(handle) = self.enrichment_slot().as_ref() {
            handle.cancel();
        }
    }

    /// Cancels the current enrichment run and waits for it to wind down
    async fn stop_enrichment(&self) {
        let outcome = {
            let slot = self.enrichment_slot();
            let Some(handle) = slot.as_ref() else {
                return;
            };
            if !handle.is_finished() {
                tracing::info!("Stopping background enrichment");
            }
            handle.cancel();
            handle.outcome()
        };

        match outcome.await {
            Ok(outcome) => tracing::debug!(
                "Background enrichment stopped after {}/{} jobs",
                outcome.attempted,
                outcome.pending
            ),
            Err(e) => tracing::warn!("Background enrichment ended abnormally: {}", e),
        }
    }

    /// Re-reads the store and spawns enrichment over it
    ///
    /// Returns false if the re-read failed; that is logged and the state
    /// returns to idle without touching stored data.
    fn start_enrichment_from_store(&self) -> bool {
        let listings = match self.store.read_all() {
            Ok(snapshot) => snapshot.listings,
            Err(e) => {
                tracing::error!("Failed to read jobs for enrichment: {}", e);
                self.state_mut().fail(e.to_string());
                return false;
            }
        };

        let pending = listings.iter().filter(|l| l.needs_details()).count();
        {
            let mut state = self.state_mut();
            if let Err(e) = state.transition(SyncPhase::EnrichingBackground) {
                tracing::error!("Cannot start enrichment: {}", e);
                state.fail(e.to_string());
                return false;
            }
            state.set_enrichment_progress(Some(EnrichmentProgress {
                processed: 0,
                total: pending,
            }));
        }

        let handle = self.spawn_enrichment(listings);
        *self.enrichment_slot() = Some(handle);
        true
    }

    fn spawn_enrichment(&self, listings: Vec<Listing>) -> EnrichmentHandle {
        let cancel = CancellationToken::new();
        let (publish, done) = watch::channel(None);
        let pipeline = EnrichmentPipeline::new(
            self.detail_fetcher.clone(),
            self.store.clone(),
            self.write_lock.clone(),
            self.settings.detail_delay,
            self.settings.batch_size,
        );
        let observer = self.observer.clone();
        let store = self.store.clone();
        let state = self.state.clone();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            let outcome = pipeline.run(listings, observer.as_ref(), &token).await;

            let last_scan = match store.read_all() {
                Ok(snapshot) => snapshot.last_scan,
                Err(e) => {
                    tracing::warn!("Failed to refresh last scan time: {}", e);
                    None
                }
            };

            let mut state = state.write().unwrap_or_else(PoisonError::into_inner);
            if last_scan.is_some() {
                state.set_last_scan(last_scan);
            }
            state.finish_enrichment();
            drop(state);

            publish.send_replace(Some(outcome));
        });

        EnrichmentHandle { cancel, done, task }
    }
}
