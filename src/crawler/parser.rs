//! HTML parser for listing and detail pages
//!
//! This module handles parsing HTML content to extract:
//! - Listing tiles from the paginated index
//! - The total result count (and from it, the page count)
//! - The "Posted on:" date from a listing's detail page
//!
//! Parsing is best effort. Missing elements produce empty strings or `None`
//! rather than errors, and an unreadable result count means a single page.

use crate::model::Listing;
use scraper::{ElementRef, Html, Selector};

const TILE: &str = ".attrax-vacancy-tile";
const TITLE: &str = ".attrax-vacancy-tile__title";
const SALARY: &str = ".attrax-vacancy-tile__salary-value";
const LOCATION: &str = ".attrax-vacancy-tile__location-freetext .attrax-vacancy-tile__item-value";
const JOB_TYPE: &str = ".attrax-vacancy-tile__option-job-type .attrax-vacancy-tile__item-value";
const CATEGORY: &str = ".attrax-vacancy-tile__option-category .attrax-vacancy-tile__item-value";
const EXPERIENCE: &str =
    ".attrax-vacancy-tile__option-experience-level .attrax-vacancy-tile__item-value";
const AGENCY: &str = ".attrax-vacancy-tile__option-agency .attrax-vacancy-tile__item-value";
const DESCRIPTION: &str = ".attrax-vacancy-tile__description-value";
const TOTAL_RESULTS: &str = ".attrax-pagination__total-results";
const DATE_WIDGET: &str = ".date-widget";
const DATE_LABEL: &str = ".date-label";
const POSTED_LABEL: &str = "Posted on:";

/// Parses all listing tiles on an index page
///
/// Tiles without a `data-jobid` attribute are skipped since a listing
/// without an id cannot be merged or stored.
///
/// # Example
///
/// ```no_run
/// use cityjobs_sync::crawler::parse_listings;
///
/// let html = r#"<div class="attrax-vacancy-tile" data-jobid="1">
///     <a class="attrax-vacancy-tile__title" href="/job/1">Analyst</a></div>"#;
/// let listings = parse_listings(html);
/// assert_eq!(listings[0].title, "Analyst");
/// ```
pub fn parse_listings(html: &str) -> Vec<Listing> {
    let document = Html::parse_document(html);
    let Ok(tile_selector) = Selector::parse(TILE) else {
        return Vec::new();
    };

    let mut listings = Vec::new();
    for tile in document.select(&tile_selector) {
        let id = tile.value().attr("data-jobid").unwrap_or("").trim();
        if id.is_empty() {
            tracing::debug!("Skipping listing tile without data-jobid");
            continue;
        }

        let title_element = select_first(&tile, TITLE);

        listings.push(Listing {
            id: id.to_string(),
            title: title_element.map(element_text).unwrap_or_default(),
            url: title_element
                .and_then(|e| e.value().attr("href"))
                .unwrap_or("")
                .to_string(),
            salary: field_text(&tile, SALARY),
            location: field_text(&tile, LOCATION),
            job_type: field_text(&tile, JOB_TYPE),
            category: field_text(&tile, CATEGORY),
            experience_level: field_text(&tile, EXPERIENCE),
            agency: field_text(&tile, AGENCY),
            description: field_text(&tile, DESCRIPTION),
            posted_date: None,
            details_fetched: false,
        });
    }

    listings
}

/// Computes the number of index pages from the "N results" counter
///
/// Returns 1 when the counter is missing, has no number, or reports zero
/// results; page 1 is always fetched.
pub fn parse_total_pages(html: &str, page_size: u32) -> u32 {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse(TOTAL_RESULTS) else {
        return 1;
    };

    let Some(element) = document.select(&selector).next() else {
        return 1;
    };

    let text = element_text(element);
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();

    match digits.parse::<u64>() {
        Ok(total) if total > 0 && page_size > 0 => {
            let pages = total.div_ceil(u64::from(page_size));
            u32::try_from(pages).unwrap_or(u32::MAX)
        }
        _ => 1,
    }
}

/// Extracts the "Posted on:" date from a detail page
///
/// Scans every date widget; the first one labelled `Posted on:` yields its
/// text with the label removed.
pub fn parse_posted_date(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let widget_selector = Selector::parse(DATE_WIDGET).ok()?;

    for widget in document.select(&widget_selector) {
        let Some(label) = select_first(&widget, DATE_LABEL) else {
            continue;
        };
        if element_text(label) != POSTED_LABEL {
            continue;
        }

        let date = element_text(widget)
            .replacen(POSTED_LABEL, "", 1)
            .trim()
            .to_string();
        return if date.is_empty() { None } else { Some(date) };
    }

    None
}

fn select_first<'a>(element: &ElementRef<'a>, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).ok()?;
    element.select(&selector).next()
}

fn field_text(element: &ElementRef<'_>, selector: &str) -> String {
    select_first(element, selector)
        .map(element_text)
        .unwrap_or_default()
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
