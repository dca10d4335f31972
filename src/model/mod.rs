//! Data model for scraped job listings
//!
//! - `Listing`: one job posting, scraped fields plus the posted-date enrichment
//! - `StoreSnapshot`: the full stored collection and its last-scan stamp
//! - salary helpers used by the statistics output

mod listing;
mod salary;

pub use listing::{Listing, ListingPage, StoreSnapshot};
pub use salary::{format_salary, parse_minimum_annual_salary};
