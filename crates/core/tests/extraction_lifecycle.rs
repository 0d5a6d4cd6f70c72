//! Extraction lifecycle integration tests.
//!
//! These tests run complete extractions against a scripted page whose tile
//! requests point at a local HTTP server:
//! idle -> page_loading -> viewer_ready -> zoom/sweeps -> summarizing ->
//! download_phase -> done

use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;
use tokio_test::assert_ok;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tileharvest_core::{
    testing::{fixtures, MockBrowserPage, MockLauncher},
    DownloadOutcome, ExtractionError, ExtractionRequest, ExtractionService, ExtractionStatus,
    TierSelection,
};

/// Test helper bundling the scripted page, tile server and output directory.
struct TestHarness {
    page: MockBrowserPage,
    server: MockServer,
    service: ExtractionService,
    out: TempDir,
}

impl TestHarness {
    async fn new() -> Self {
        let page = MockBrowserPage::new();
        let server = MockServer::start().await;
        let launcher = Arc::new(MockLauncher::new(page.clone()));
        let service = ExtractionService::new(&fixtures::fast_config(), launcher)
            .expect("Failed to create service");
        let out = TempDir::new().expect("Failed to create temp dir");

        Self {
            page,
            server,
            service,
            out,
        }
    }

    fn url(&self, tile_path: &str) -> String {
        format!("{}{}", self.server.uri(), tile_path)
    }

    /// Serve `body` at `tile_path`, expecting exactly `hits` fetches.
    async fn serve(&self, tile_path: &str, body: &'static [u8], hits: u64) {
        Mock::given(method("GET"))
            .and(path(tile_path))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .expect(hits)
            .mount(&self.server)
            .await;
    }

    fn request(&self) -> ExtractionRequest {
        ExtractionRequest::for_url("https://viewer.test/city/ext_360").with_destination(self.out.path())
    }

    fn files(&self) -> Vec<String> {
        list_dir(self.out.path())
    }
}

fn list_dir(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_tiles_are_classified_and_named() {
    let h = TestHarness::new().await;
    h.serve("/tiles/cf_01.jpg", b"high", 1).await;
    h.serve("/tiles/interior/basic_a.jpg", b"basic", 1).await;
    h.page
        .set_load_requests(vec![
            h.url("/index.html"),
            h.url("/tiles/interior/basic_a.jpg"),
        ])
        .await;
    h.page.set_zoom_requests(vec![h.url("/tiles/cf_01.jpg")]).await;

    let handle = assert_ok!(h.service.start_extraction(h.request()).await);
    let summary = assert_ok!(h.service.await_completion(handle).await);

    assert_eq!(summary.counts.observed, 2);
    assert_eq!(summary.counts.high, 1);
    assert_eq!(summary.counts.basic, 1);
    assert_eq!(summary.download.downloaded, 2);
    assert_eq!(summary.download.high_on_disk, 1);
    assert_eq!(h.files(), vec!["basic_basic_a.jpg", "high_cf_01.jpg"]);
}

#[tokio::test]
async fn test_existing_tile_is_skipped() {
    let h = TestHarness::new().await;
    h.serve("/tiles/cf_01.jpg", b"new", 0).await;
    h.serve("/tiles/interior/basic_a.jpg", b"basic", 1).await;
    std::fs::write(h.out.path().join("high_cf_01.jpg"), b"old").unwrap();
    h.page
        .set_load_requests(vec![
            h.url("/tiles/cf_01.jpg"),
            h.url("/tiles/interior/basic_a.jpg"),
        ])
        .await;

    let handle = assert_ok!(h.service.start_extraction(h.request()).await);
    let summary = assert_ok!(h.service.await_completion(handle).await);

    assert_eq!(summary.download.skipped, 1);
    assert_eq!(summary.download.downloaded, 1);
    assert_eq!(
        summary.download.outcome_of(&h.url("/tiles/cf_01.jpg")),
        Some(&DownloadOutcome::SkippedExisting)
    );
    assert_eq!(
        std::fs::read(h.out.path().join("high_cf_01.jpg")).unwrap(),
        b"old"
    );
}

#[tokio::test]
async fn test_one_failed_fetch_does_not_stop_the_run() {
    let h = TestHarness::new().await;
    h.serve("/tiles/cf_01.jpg", b"one", 1).await;
    h.serve("/tiles/cf_02.jpg", b"two", 1).await;
    Mock::given(method("GET"))
        .and(path("/tiles/cf_03.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&h.server)
        .await;
    h.page
        .set_pan_requests(vec![
            h.url("/tiles/cf_01.jpg"),
            h.url("/tiles/cf_02.jpg"),
            h.url("/tiles/cf_03.jpg"),
        ])
        .await;

    let handle = assert_ok!(h.service.start_extraction(h.request()).await);
    let summary = assert_ok!(h.service.await_completion(handle).await);

    assert_eq!(summary.download.downloaded, 2);
    assert_eq!(summary.download.failed.len(), 1);
    assert_eq!(summary.download.failed[0].url, h.url("/tiles/cf_03.jpg"));
    assert_eq!(summary.download.high_on_disk, 2);
    assert_eq!(h.files(), vec!["high_cf_01.jpg", "high_cf_02.jpg"]);
}

#[tokio::test]
async fn test_viewer_never_ready_downloads_nothing() {
    let h = TestHarness::new().await;
    h.serve("/tiles/cf_01.jpg", b"high", 0).await;
    h.page.set_viewer_ready(false).await;
    h.page.set_load_requests(vec![h.url("/tiles/cf_01.jpg")]).await;
    let destination = h.out.path().join("never");

    let handle = assert_ok!(
        h.service
            .start_extraction(h.request().with_destination(&destination))
            .await
    );
    let id = handle.id().to_string();
    let result = h.service.await_completion(handle).await;

    assert!(matches!(result, Err(ExtractionError::ViewerNotReady(_))));
    assert!(list_dir(&destination).is_empty());
    assert!(h.page.is_closed().await);

    let record = h.service.status(&id).await.unwrap();
    assert_eq!(record.status, ExtractionStatus::Failed);
    assert!(record.counts.is_none());
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let h = TestHarness::new().await;
    h.serve("/tiles/cf_01.jpg", b"high", 1).await;
    h.serve("/tiles/interior/basic_a.jpg", b"basic", 1).await;
    h.page
        .set_load_requests(vec![
            h.url("/tiles/cf_01.jpg"),
            h.url("/tiles/interior/basic_a.jpg"),
        ])
        .await;

    let first = h.service.start_extraction(h.request()).await.unwrap();
    let first = assert_ok!(h.service.await_completion(first).await);
    let files_after_first = h.files();

    let second = h.service.start_extraction(h.request()).await.unwrap();
    let second = assert_ok!(h.service.await_completion(second).await);

    assert_eq!(first.download.downloaded, 2);
    assert_eq!(second.download.downloaded, 0);
    assert_eq!(second.download.skipped, 2);
    assert_eq!(h.files(), files_after_first);
    assert_eq!(h.service.list().await.len(), 2);
}

#[tokio::test]
async fn test_high_tier_selection_writes_only_high_tiles() {
    let h = TestHarness::new().await;
    h.serve("/tiles/cf_01.jpg", b"high", 1).await;
    h.serve("/tiles/interior/basic_a.jpg", b"basic", 0).await;
    h.page
        .set_load_requests(vec![
            h.url("/tiles/cf_01.jpg"),
            h.url("/tiles/interior/basic_a.jpg"),
        ])
        .await;

    let request = h.request().with_tiers(TierSelection::High);
    let handle = assert_ok!(h.service.start_extraction(request).await);
    let summary = assert_ok!(h.service.await_completion(handle).await);

    assert_eq!(summary.counts.observed, 2);
    assert_eq!(summary.download.downloaded, 1);
    assert_eq!(h.files(), vec!["high_cf_01.jpg"]);
}
