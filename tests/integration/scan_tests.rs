//! End-to-end roster scans against mock station websites

use crate::test_config;
use station_mail::store::StoreError;
use station_mail::{RecordStore, ScanOrchestrator};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

#[tokio::test]
async fn test_scan_writes_results_back_to_roster() {
    let found = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/equipe">Equipe</a>"#))
        .mount(&found)
        .await;
    Mock::given(method("GET"))
        .and(path("/equipe"))
        .respond_with(html("Contact: desk@partner-agency.net"))
        .mount(&found)
        .await;

    let broken = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&broken)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let roster_path = dir.path().join("stations.csv");
    fs::write(
        &roster_path,
        format!(
            "Ain;;;\n\
             Radio Found;{};;\n\
             Radio Broken;{};;\n\
             Aisne;;;\n\
             Radio Offline;;studio@offline.invalid;\n\
             Radio Known;https://known.invalid;hello@known.invalid;\n",
            found.uri(),
            broken.uri()
        ),
    )
    .expect("Failed to write roster");

    let store = Arc::new(RecordStore::open(&roster_path).expect("Failed to open roster"));
    let orchestrator =
        ScanOrchestrator::with_http(test_config()).expect("Failed to build orchestrator");

    let report = orchestrator
        .run(Arc::clone(&store))
        .await
        .expect("Scan should succeed");

    assert_eq!(report.total, 4);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.dispatched, 3);
    assert_eq!(report.timed_out, 0);
    assert_eq!(report.with_unsure, 1);

    let written = fs::read_to_string(&roster_path).expect("Failed to read roster");
    assert_eq!(
        written,
        format!(
            "Ain;;;\n\
             Radio Found;{};;desk@partner-agency.net\n\
             Radio Broken;{};;\n\
             Aisne;;;\n\
             Radio Offline;;studio@offline.invalid;\n\
             Radio Known;https://known.invalid;hello@known.invalid;\n",
            found.uri(),
            broken.uri()
        )
    );
}

#[test]
fn test_missing_roster_is_reported() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let result = RecordStore::open(dir.path().join("absent.csv"));
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}
