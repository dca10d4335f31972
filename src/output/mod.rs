//! Output module for reporting on the stored collection
//!
//! This module handles:
//! - Computing and printing store statistics
//! - Rendering one page of the listing view

pub mod stats;
mod view;

pub use stats::{load_statistics, print_statistics, StoreStatistics};
pub use view::{print_page, render_page};
