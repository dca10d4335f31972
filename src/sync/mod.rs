//! Incremental sync of the stored collection with the jobs website
//!
//! # Components
//!
//! - `merge_preserving_details`: reconciles a fresh scrape with the stored collection
//! - `EnrichmentPipeline`: fetches posted dates with batch commits
//! - `SyncOrchestrator`: rescan / load / reset state machine
//! - `SyncState`: phase, view and progress shown to front ends
//! - `DelayRange`: randomised pause between requests

mod delay;
mod enrich;
mod merge;
mod orchestrator;
mod progress;
mod state;

pub use delay::DelayRange;
pub use enrich::{EnrichmentOutcome, EnrichmentPipeline};
pub use merge::merge_preserving_details;
pub use orchestrator::{
    EnrichmentHandle, LoadReport, RescanReport, SyncOrchestrator, SyncSettings,
};
pub use progress::{
    EnrichmentProgress, ScanProgress, SilentObserver, SyncObserver, SECONDS_PER_PAGE_ESTIMATE,
};
pub use state::{SyncPhase, SyncState};
