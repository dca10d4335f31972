//! Plain-text rendering of the current page view

use crate::sync::SyncState;
use std::fmt::Write;

/// Renders the view held by `state` as a table-like listing
pub fn render_page(state: &SyncState) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Page {} of {} ({} jobs)",
        state.current_page(),
        state.total_pages().max(1),
        state.total_listings()
    );
    if let Some(last_scan) = state.last_scan() {
        let _ = writeln!(out, "Last scan: {}", last_scan.to_rfc3339());
    }
    let _ = writeln!(out);

    if state.view().is_empty() {
        let _ = writeln!(out, "No jobs on this page.");
        return out;
    }

    for listing in state.view() {
        let posted = match (&listing.posted_date, listing.details_fetched) {
            (Some(date), _) => date.as_str(),
            (None, true) => "unknown",
            (None, false) => "pending",
        };
        let _ = writeln!(out, "{} [{}]", listing.title, listing.id);
        let _ = writeln!(out, "  {} | {}", listing.agency, listing.location);
        let _ = writeln!(out, "  Salary: {} | Posted: {}", listing.salary, posted);
    }

    out
}

/// Prints the view held by `state` to stdout
pub fn print_page(state: &SyncState) {
    print!("{}", render_page(state));
}
