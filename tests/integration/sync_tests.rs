//! End-to-end sync tests
//!
//! A wiremock server plays the jobs board; the JSON record store lives in a
//! temporary directory.

use crate::common::{detail_page, index_page, load_test_config};
use cityjobs_sync::model::Listing;
use cityjobs_sync::storage::{JsonFileStore, RecordStore};
use cityjobs_sync::sync::{SyncOrchestrator, SyncPhase};
use std::fs;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_index_page(server: &MockServer, page: u32, size: u32, body: String) {
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .and(query_param("page", page.to_string()))
        .and(query_param("size", size.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_details(server: &MockServer, posted: &str) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/job/\d+$"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page(posted)))
        .mount(server)
        .await;
}

fn stored(id: usize, posted: Option<&str>) -> Listing {
    let mut listing = Listing {
        title: format!("Old title {}", id),
        url: format!("/job/{}", id),
        ..Listing::new(id.to_string())
    };
    if let Some(date) = posted {
        listing.record_details(Some(date.to_string()));
    }
    listing
}

#[tokio::test]
async fn test_rescan_into_empty_store() {
    let server = MockServer::start().await;
    mount_index_page(&server, 1, 48, index_page(0..48, 96)).await;
    mount_index_page(&server, 2, 48, index_page(48..96, 96)).await;
    mount_details(&server, "03/01/2024").await;

    let dir = TempDir::new().unwrap();
    let store_dir = dir.path().join("data");
    let config = load_test_config(&server.uri(), &store_dir, "");
    let sync = SyncOrchestrator::from_config(&config).unwrap();

    let report = sync.rescan().await.unwrap();
    assert_eq!(report.pages_scanned, 2);
    assert_eq!(report.listings, 96);
    assert_eq!(report.pending, 96);
    assert!(report.enrichment_started);

    let outcome = sync.wait_for_enrichment().await.unwrap().unwrap();
    assert_eq!(outcome.attempted, 96);
    assert_eq!(outcome.commits, 11);

    let store = JsonFileStore::new(&store_dir);
    let snapshot = store.read_all().unwrap();
    assert_eq!(snapshot.listings.len(), 96);
    assert!(snapshot.last_scan.is_some());
    assert!(snapshot
        .listings
        .iter()
        .all(|l| l.details_fetched && l.posted_date.as_deref() == Some("03/01/2024")));
    assert_eq!(sync.phase(), SyncPhase::Idle);
}

#[tokio::test]
async fn test_rescan_keeps_posted_dates_and_drops_delisted() {
    let server = MockServer::start().await;
    mount_index_page(&server, 1, 48, index_page([0, 1], 2)).await;
    Mock::given(method("GET"))
        .and(path("/job/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page("04/04/2024")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/job/0"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path());
    store
        .write_all(&[stored(0, Some("01/01/2020")), stored(999, Some("02/02/2020"))])
        .unwrap();

    let config = load_test_config(&server.uri(), dir.path(), "");
    let sync = SyncOrchestrator::from_config(&config).unwrap();

    let report = sync.rescan().await.unwrap();
    assert_eq!(report.preserved, 1);
    assert_eq!(report.pending, 1);
    sync.wait_for_enrichment().await.unwrap();

    let listings = store.read_all().unwrap().listings;
    let ids: Vec<&str> = listings.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, vec!["0", "1"]);
    assert_eq!(listings[0].title, "Analyst 0");
    assert_eq!(listings[0].posted_date.as_deref(), Some("01/01/2020"));
    assert_eq!(listings[1].posted_date.as_deref(), Some("04/04/2024"));
}

#[tokio::test]
async fn test_failed_page_leaves_store_untouched() {
    let server = MockServer::start().await;
    mount_index_page(&server, 1, 48, index_page(0..48, 96)).await;
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path());
    store.write_all(&[stored(5, Some("01/01/2024"))]).unwrap();
    let jobs_before = fs::read(store.jobs_path()).unwrap();
    let metadata_before = fs::read(store.metadata_path()).unwrap();

    let config = load_test_config(&server.uri(), dir.path(), "");
    let sync = SyncOrchestrator::from_config(&config).unwrap();

    let err = sync.rescan().await.unwrap_err();
    assert!(err.to_string().contains("500"));

    assert_eq!(fs::read(store.jobs_path()).unwrap(), jobs_before);
    assert_eq!(fs::read(store.metadata_path()).unwrap(), metadata_before);

    let state = sync.snapshot();
    assert_eq!(state.phase(), SyncPhase::Idle);
    assert!(state.error().is_some());
    assert!(sync.wait_for_enrichment().await.unwrap().is_none());
}

#[tokio::test]
async fn test_failed_detail_stays_pending() {
    let server = MockServer::start().await;
    mount_index_page(&server, 1, 48, index_page(0..3, 3)).await;
    Mock::given(method("GET"))
        .and(path("/job/1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    mount_details(&server, "07/07/2024").await;

    let dir = TempDir::new().unwrap();
    let config = load_test_config(&server.uri(), dir.path(), "");
    let sync = SyncOrchestrator::from_config(&config).unwrap();

    sync.rescan().await.unwrap();
    let outcome = sync.wait_for_enrichment().await.unwrap().unwrap();
    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.enriched, 2);

    let listings = JsonFileStore::new(dir.path()).read_all().unwrap().listings;
    assert!(listings[0].details_fetched);
    assert!(!listings[1].details_fetched);
    assert!(listings[1].posted_date.is_none());
    assert!(listings[2].details_fetched);
}

#[tokio::test]
async fn test_debug_mode_limits_scan() {
    let server = MockServer::start().await;
    mount_index_page(&server, 1, 12, index_page(0..12, 100)).await;
    mount_index_page(&server, 2, 12, index_page(12..24, 100)).await;
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    mount_details(&server, "08/08/2024").await;

    let dir = TempDir::new().unwrap();
    let config = load_test_config(&server.uri(), dir.path(), "[debug]\nenabled = true\n");
    let sync = SyncOrchestrator::from_config(&config).unwrap();

    let report = sync.rescan().await.unwrap();
    assert_eq!(report.pages_scanned, 2);
    assert_eq!(report.listings, 24);

    let state = sync.snapshot();
    assert_eq!(state.view().len(), 12);
    assert_eq!(state.total_pages(), 2);

    sync.wait_for_enrichment().await.unwrap();
}

#[tokio::test]
async fn test_load_resumes_enrichment_without_scanning() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/job/\d+$"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page("09/09/2024")))
        .expect(2)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path());
    store
        .write_all(&[stored(1, Some("01/01/2024")), stored(2, None), stored(3, None)])
        .unwrap();

    let config = load_test_config(&server.uri(), dir.path(), "");
    let sync = SyncOrchestrator::from_config(&config).unwrap();

    let report = sync.load_stored().await.unwrap();
    assert_eq!(report.listings, 3);
    assert_eq!(report.pending, 2);
    assert!(report.enrichment_started);

    sync.wait_for_enrichment().await.unwrap();
    let listings = store.read_all().unwrap().listings;
    assert_eq!(listings[0].posted_date.as_deref(), Some("01/01/2024"));
    assert_eq!(listings[1].posted_date.as_deref(), Some("09/09/2024"));
    assert_eq!(listings[2].posted_date.as_deref(), Some("09/09/2024"));
}

#[tokio::test]
async fn test_reset_clears_stored_details() {
    let server = MockServer::start().await;

    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path());
    store
        .write_all(&[stored(1, Some("01/01/2024")), stored(2, Some("02/02/2024"))])
        .unwrap();

    let config = load_test_config(&server.uri(), dir.path(), "");
    let sync = SyncOrchestrator::from_config(&config).unwrap();

    let cleared = sync.reset_details().await.unwrap();
    assert_eq!(cleared.len(), 2);

    let listings = store.read_all().unwrap().listings;
    assert!(listings
        .iter()
        .all(|l| !l.details_fetched && l.posted_date.is_none()));

    let jobs = fs::read_to_string(store.jobs_path()).unwrap();
    assert!(!jobs.contains("postedDate"));
}

#[tokio::test]
async fn test_load_with_repeated_id_commits_enrichment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/job/\d+$"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page("10/10/2024")))
        .expect(2)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path());
    let jobs = serde_json::to_vec_pretty(&[stored(1, None), stored(1, None), stored(2, None)])
        .unwrap();
    fs::write(store.jobs_path(), jobs).unwrap();

    let config = load_test_config(&server.uri(), dir.path(), "");
    let sync = SyncOrchestrator::from_config(&config).unwrap();

    let report = sync.load_stored().await.unwrap();
    assert_eq!(report.listings, 2);
    assert_eq!(report.pending, 2);

    let outcome = sync.wait_for_enrichment().await.unwrap().unwrap();
    assert_eq!(outcome.attempted, 2);
    assert_eq!(outcome.commits, 1);

    let snapshot = store.read_all().unwrap();
    assert_eq!(snapshot.pending_details(), 0);
    assert_eq!(snapshot.listings.len(), 2);
}
