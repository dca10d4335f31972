//! Merge of a fresh scrape against the stored collection

use crate::model::Listing;
use std::collections::{HashMap, HashSet};

/// Merges freshly scraped listings with the stored collection
///
/// The result contains exactly the fresh ids, in fresh order. Core fields
/// always come from the fresh scrape. Enrichment fields are carried over
/// only from stored listings whose details were already fetched; listings
/// that disappeared from the site are dropped. When the scrape repeats an
/// id, the first occurrence wins.
pub fn merge_preserving_details(fresh: Vec<Listing>, stored: &[Listing]) -> Vec<Listing> {
    let enriched: HashMap<&str, &Listing> = stored
        .iter()
        .filter(|listing| listing.details_fetched)
        .map(|listing| (listing.id.as_str(), listing))
        .collect();

    let mut seen = HashSet::with_capacity(fresh.len());
    let mut merged = Vec::with_capacity(fresh.len());

    for mut listing in fresh {
        if !seen.insert(listing.id.clone()) {
            tracing::debug!("Dropping repeated listing {}", listing.id);
            continue;
        }

        match enriched.get(listing.id.as_str()) {
            Some(previous) => {
                listing.posted_date = previous.posted_date.clone();
                listing.details_fetched = previous.details_fetched;
            }
            None => listing.reset_details(),
        }
        merged.push(listing);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh(id: &str, title: &str) -> Listing {
        Listing {
            title: title.to_string(),
            url: format!("/job/{}", id),
            ..Listing::new(id)
        }
    }

    fn enriched(id: &str, title: &str, date: Option<&str>) -> Listing {
        let mut listing = fresh(id, title);
        listing.record_details(date.map(str::to_string));
        listing
    }

    fn ids(listings: &[Listing]) -> Vec<&str> {
        listings.iter().map(|l| l.id.as_str()).collect()
    }

    #[test]
    fn test_preserves_enrichment_and_takes_fresh_fields() {
        let stored = vec![enriched("1", "Old Title", Some("03/01/2024"))];
        let merged = merge_preserving_details(vec![fresh("1", "New Title")], &stored);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].title, "New Title");
        assert_eq!(merged[0].posted_date.as_deref(), Some("03/01/2024"));
        assert!(merged[0].details_fetched);
    }

    #[test]
    fn test_preserves_terminal_not_found() {
        let stored = vec![enriched("1", "A", None)];
        let merged = merge_preserving_details(vec![fresh("1", "A")], &stored);

        assert!(merged[0].details_fetched);
        assert!(merged[0].posted_date.is_none());
    }

    #[test]
    fn test_drops_delisted() {
        let stored = vec![enriched("1", "A", Some("x")), enriched("2", "B", Some("y"))];
        let merged = merge_preserving_details(vec![fresh("1", "A")], &stored);

        assert_eq!(ids(&merged), vec!["1"]);
    }

    #[test]
    fn test_does_not_carry_unfinished_enrichment() {
        let mut stale = fresh("1", "A");
        stale.posted_date = Some("03/01/2024".to_string());
        let merged = merge_preserving_details(vec![fresh("1", "A")], &[stale]);

        assert!(!merged[0].details_fetched);
        assert!(merged[0].posted_date.is_none());
    }

    #[test]
    fn test_fresh_enrichment_fields_are_ignored() {
        let scraped = enriched("1", "A", Some("01/01/2020"));
        let merged = merge_preserving_details(vec![scraped], &[]);

        assert!(!merged[0].details_fetched);
        assert!(merged[0].posted_date.is_none());
    }

    #[test]
    fn test_keeps_fresh_order() {
        let stored = vec![enriched("3", "C", Some("z")), enriched("1", "A", Some("x"))];
        let merged = merge_preserving_details(
            vec![fresh("1", "A"), fresh("2", "B"), fresh("3", "C")],
            &stored,
        );

        assert_eq!(ids(&merged), vec!["1", "2", "3"]);
        assert!(merged[0].details_fetched);
        assert!(!merged[1].details_fetched);
        assert!(merged[2].details_fetched);
    }

    #[test]
    fn test_first_occurrence_wins() {
        let merged = merge_preserving_details(
            vec![fresh("1", "First"), fresh("2", "B"), fresh("1", "Second")],
            &[],
        );

        assert_eq!(ids(&merged), vec!["1", "2"]);
        assert_eq!(merged[0].title, "First");
    }

    #[test]
    fn test_idempotent_on_fully_enriched_input() {
        let x = vec![
            enriched("1", "A", Some("01/01/2024")),
            enriched("2", "B", None),
        ];

        let once = merge_preserving_details(x.clone(), &x);
        let twice = merge_preserving_details(x.clone(), &once);
        assert_eq!(once, twice);
        assert_eq!(once, x);
    }

    #[test]
    fn test_empty_scrape_empties_collection() {
        let stored = vec![enriched("1", "A", Some("x"))];
        assert!(merge_preserving_details(Vec::new(), &stored).is_empty());
    }
}
