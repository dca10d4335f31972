//! Background enrichment of listings with their posted date
//!
//! The pipeline walks the listings that still need details, one at a time and
//! in list order, with a randomised pause before every fetch but the first.
//! The whole collection is committed to the store after every `batch_size`
//! attempted listings and once more after the last one, so a crash loses at
//! most one batch of work.

use crate::crawler::DetailFetcher;
use crate::model::Listing;
use crate::storage::RecordStore;
use crate::sync::delay::DelayRange;
use crate::sync::progress::{EnrichmentProgress, SyncObserver};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Result of one enrichment run
#[derive(Debug, Clone, Default)]
pub struct EnrichmentOutcome {
    /// The full collection after the run
    pub listings: Vec<Listing>,

    /// Listings that needed details when the run started
    pub pending: usize,

    /// Listings whose detail page was requested
    pub attempted: usize,

    /// Attempts that produced a terminal result
    pub enriched: usize,

    /// Attempts that failed and stay pending
    pub failed: usize,

    /// Successful store commits
    pub commits: usize,

    /// True when the run stopped early on request
    pub cancelled: bool,
}

/// Enrichment pipeline bound to a detail fetcher and a record store
pub struct EnrichmentPipeline {
    fetcher: Arc<dyn DetailFetcher>,
    store: Arc<dyn RecordStore>,
    write_lock: Arc<Mutex<()>>,
    delay: DelayRange,
    batch_size: usize,
}

impl EnrichmentPipeline {
    /// Creates a pipeline
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Source of posted dates
    /// * `store` - Store receiving the batch commits
    /// * `write_lock` - Lock held for every commit
    /// * `delay` - Pause drawn before every fetch except the first
    /// * `batch_size` - Attempted listings per commit (at least 1)
    pub fn new(
        fetcher: Arc<dyn DetailFetcher>,
        store: Arc<dyn RecordStore>,
        write_lock: Arc<Mutex<()>>,
        delay: DelayRange,
        batch_size: usize,
    ) -> Self {
        Self {
            fetcher,
            store,
            write_lock,
            delay,
            batch_size: batch_size.max(1),
        }
    }

    /// Enriches every listing that still needs details
    ///
    /// Listings that already have details are passed through untouched. A
    /// failed fetch leaves its listing pending and moves on. A failed commit
    /// is logged and the run continues. When `cancel` fires, the run stops
    /// before the next listing and commits whatever is still uncommitted.
    pub async fn run(
        &self,
        mut listings: Vec<Listing>,
        observer: &dyn SyncObserver,
        cancel: &CancellationToken,
    ) -> EnrichmentOutcome {
        let pending: Vec<usize> = listings
            .iter()
            .enumerate()
            .filter(|(_, listing)| listing.needs_details())
            .map(|(index, _)| index)
            .collect();
        let total = pending.len();

        let mut outcome = EnrichmentOutcome {
            pending: total,
            ..EnrichmentOutcome::default()
        };

        if total == 0 {
            tracing::info!("All {} jobs already have details", listings.len());
            outcome.listings = listings;
            return outcome;
        }

        tracing::info!(
            "Fetching details for {} jobs ({} already have details)",
            total,
            listings.len() - total
        );

        let mut uncommitted = 0;

        for (position, &index) in pending.iter().enumerate() {
            if cancel.is_cancelled() {
                outcome.cancelled = true;
                break;
            }
            if position > 0 && !self.delay.sleep_or_cancel(cancel).await {
                outcome.cancelled = true;
                break;
            }

            let url = listings[index].url.clone();
            match self.fetcher.fetch_posted_date(&url).await {
                Ok(posted_date) => {
                    tracing::debug!(
                        "Job {}: posted {}",
                        listings[index].id,
                        posted_date.as_deref().unwrap_or("(not found)")
                    );
                    listings[index].record_details(posted_date);
                    outcome.enriched += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to fetch details for job {}: {}",
                        listings[index].id,
                        e
                    );
                    outcome.failed += 1;
                }
            }

            outcome.attempted += 1;
            uncommitted += 1;
            observer.enrichment_progress(EnrichmentProgress {
                processed: outcome.attempted,
                total,
            });

            let finished = outcome.attempted == total;
            if uncommitted >= self.batch_size || finished {
                tracing::info!(
                    "Saving batch of {} jobs ({}/{} total)",
                    uncommitted,
                    outcome.attempted,
                    total
                );
                if self.commit(&listings).await {
                    uncommitted = 0;
                    outcome.commits += 1;
                    observer.batch_committed(&listings);
                }
            }

            if outcome.attempted % 10 == 0 || finished {
                tracing::info!("Fetched details for {}/{} jobs", outcome.attempted, total);
            }
        }

        if outcome.cancelled {
            tracing::info!(
                "Enrichment cancelled after {}/{} jobs",
                outcome.attempted,
                total
            );
            if uncommitted > 0 && self.commit(&listings).await {
                outcome.commits += 1;
                observer.batch_committed(&listings);
            }
        } else {
            tracing::info!(
                "Enrichment finished: {} enriched, {} failed",
                outcome.enriched,
                outcome.failed
            );
        }

        outcome.listings = listings;
        outcome
    }

    /// Writes the whole collection under the write lock
    ///
    /// Returns false when the write failed; the failure is only logged.
    async fn commit(&self, listings: &[Listing]) -> bool {
        let _guard = self.write_lock.lock().await;
        match self.store.write_all(listings) {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("Failed to save enrichment batch: {}", e);
                false
            }
        }
    }
}
