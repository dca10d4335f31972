//! Statistics over the stored collection
//!
//! This module provides functionality for summarising the record store and
//! printing the summary.

use crate::model::{format_salary, parse_minimum_annual_salary, Listing};
use crate::storage::RecordStore;
use crate::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Number of agencies and categories listed in the summary
const TOP_N: usize = 5;

/// Store statistics summary
#[derive(Debug, Clone, Default)]
pub struct StoreStatistics {
    /// Total number of stored listings
    pub total_listings: usize,

    /// Listings whose detail page has been visited
    pub with_details: usize,

    /// Listings still waiting for enrichment
    pub pending_details: usize,

    /// Listings with a posted date
    pub with_posted_date: usize,

    /// When the store was last written
    pub last_scan: Option<DateTime<Utc>>,

    /// Most common agencies, largest first
    pub top_agencies: Vec<(String, usize)>,

    /// Most common categories, largest first
    pub top_categories: Vec<(String, usize)>,

    /// Lowest and highest minimum annual salary among parseable listings
    pub salary_range: Option<(f64, f64)>,

    /// Listings with a parseable salary
    pub salaried_listings: usize,
}

impl StoreStatistics {
    /// Computes statistics for a collection
    pub fn from_listings(listings: &[Listing], last_scan: Option<DateTime<Utc>>) -> Self {
        let with_details = listings.iter().filter(|l| l.details_fetched).count();

        let salaries: Vec<f64> = listings
            .iter()
            .map(|l| parse_minimum_annual_salary(&l.salary))
            .filter(|salary| *salary > 0.0)
            .collect();
        let salary_range = salaries.iter().copied().fold(None, |range, salary| match range {
            None => Some((salary, salary)),
            Some((low, high)) => Some((f64::min(low, salary), f64::max(high, salary))),
        });

        Self {
            total_listings: listings.len(),
            with_details,
            pending_details: listings.len() - with_details,
            with_posted_date: listings.iter().filter(|l| l.posted_date.is_some()).count(),
            last_scan,
            top_agencies: top_values(listings.iter().map(|l| l.agency.as_str())),
            top_categories: top_values(listings.iter().map(|l| l.category.as_str())),
            salary_range,
            salaried_listings: salaries.len(),
        }
    }
}

/// Counts non-empty values and returns the most common, ties by name
fn top_values<'a>(values: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values.map(str::trim).filter(|v| !v.is_empty()) {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut sorted: Vec<_> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    sorted
        .into_iter()
        .take(TOP_N)
        .map(|(value, count)| (value.to_string(), count))
        .collect()
}

/// Loads statistics from the record store
///
/// # Arguments
///
/// * `store` - The record store to summarise
///
/// # Returns
///
/// * `Ok(StoreStatistics)` - Successfully computed statistics
/// * `Err(SyncError)` - Failed to read the store
pub fn load_statistics(store: &dyn RecordStore) -> Result<StoreStatistics> {
    let snapshot = store.read_all()?;
    Ok(StoreStatistics::from_listings(
        &snapshot.listings,
        snapshot.last_scan,
    ))
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &StoreStatistics) {
    println!("=== Job Store Statistics ===\n");

    println!("Overview:");
    println!("  Total jobs: {}", stats.total_listings);
    match stats.last_scan {
        Some(last_scan) => println!("  Last scan: {}", last_scan.to_rfc3339()),
        None => println!("  Last scan: never"),
    }
    println!();

    let percentage = |count: usize| {
        if stats.total_listings > 0 {
            (count as f64 / stats.total_listings as f64) * 100.0
        } else {
            0.0
        }
    };

    println!("Details:");
    println!(
        "  Fetched: {} ({:.1}%)",
        stats.with_details,
        percentage(stats.with_details)
    );
    println!(
        "  Pending: {} ({:.1}%)",
        stats.pending_details,
        percentage(stats.pending_details)
    );
    println!("  With posted date: {}", stats.with_posted_date);
    println!();

    if !stats.top_agencies.is_empty() {
        println!("Top Agencies:");
        for (agency, count) in &stats.top_agencies {
            println!("  {}: {}", agency, count);
        }
        println!();
    }

    if !stats.top_categories.is_empty() {
        println!("Top Categories:");
        for (category, count) in &stats.top_categories {
            println!("  {}: {}", category, count);
        }
        println!();
    }

    match stats.salary_range {
        Some((low, high)) => println!(
            "Minimum Salary Range: {} - {} ({} jobs with salary)",
            format_salary(low),
            format_salary(high),
            stats.salaried_listings
        ),
        None => println!("Minimum Salary Range: no parseable salaries"),
    }
}
