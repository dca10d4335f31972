//! Integration tests for the HTTP fetchers
//!
//! These tests use wiremock to serve index and detail pages.

use crate::common::{detail_page, index_page, load_test_config};
use cityjobs_sync::crawler::{
    build_http_client, DetailFetcher, FetchError, HttpDetailFetcher, HttpListingFetcher,
    ListingFetcher,
};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_fetch_index_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .and(query_param("page", "1"))
        .and(query_param("size", "48"))
        .respond_with(ResponseTemplate::new(200).set_body_string(index_page([11, 12], 96)))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = load_test_config(&server.uri(), dir.path(), "");
    let client = build_http_client(&config).unwrap();
    let fetcher = HttpListingFetcher::new(client, &config).unwrap();

    let page = fetcher.fetch_page(1, 48).await.unwrap();

    assert_eq!(page.total_pages, 2);
    assert_eq!(page.listings.len(), 2);
    assert_eq!(page.listings[0].id, "11");
    assert_eq!(page.listings[0].title, "Analyst 11");
    assert_eq!(page.listings[0].url, "/job/11");
    assert_eq!(page.listings[0].agency, "Parks");
    assert_eq!(page.listings[0].location, "Downtown");
    assert!(!page.listings[0].details_fetched);
}

#[tokio::test]
async fn test_index_without_counter_is_one_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body>Nothing here</body></html>"),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = load_test_config(&server.uri(), dir.path(), "");
    let fetcher =
        HttpListingFetcher::new(build_http_client(&config).unwrap(), &config).unwrap();

    let page = fetcher.fetch_page(1, 48).await.unwrap();
    assert_eq!(page.total_pages, 1);
    assert!(page.listings.is_empty());
}

#[tokio::test]
async fn test_status_error_embeds_code_and_reason() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = load_test_config(&server.uri(), dir.path(), "");
    let fetcher =
        HttpListingFetcher::new(build_http_client(&config).unwrap(), &config).unwrap();

    let err = fetcher.fetch_page(1, 48).await.unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 404, .. }));
    assert!(err.to_string().contains("404 Not Found"));
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job/7"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/job/7"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page("05/06/2024")))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = load_test_config(&server.uri(), dir.path(), "");
    config.fetch.max_attempts = 3;
    let fetcher = HttpDetailFetcher::new(build_http_client(&config).unwrap(), &config).unwrap();

    let date = fetcher.fetch_posted_date("/job/7").await.unwrap();
    assert_eq!(date.as_deref(), Some("05/06/2024"));
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job/8"))
        .respond_with(ResponseTemplate::new(410))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = load_test_config(&server.uri(), dir.path(), "");
    config.fetch.max_attempts = 3;
    let fetcher = HttpDetailFetcher::new(build_http_client(&config).unwrap(), &config).unwrap();

    let err = fetcher.fetch_posted_date("/job/8").await.unwrap_err();
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_detail_page_without_posted_date() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job/9"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body><h1>Analyst</h1></body></html>"),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = load_test_config(&server.uri(), dir.path(), "");
    let fetcher = HttpDetailFetcher::new(build_http_client(&config).unwrap(), &config).unwrap();

    assert_eq!(fetcher.fetch_posted_date("/job/9").await.unwrap(), None);
}

#[tokio::test]
async fn test_detail_without_url_fails_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = load_test_config(&server.uri(), dir.path(), "");
    let fetcher = HttpDetailFetcher::new(build_http_client(&config).unwrap(), &config).unwrap();

    let err = fetcher.fetch_posted_date("  ").await.unwrap_err();
    assert!(matches!(err, FetchError::InvalidUrl { .. }));
}
