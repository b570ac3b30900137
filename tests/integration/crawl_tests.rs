//! Fetcher and single-site crawl tests against a mock HTTP server

use crate::test_config;
use station_mail::crawler::{FetchError, HttpFetcher, PageFetcher};
use station_mail::SiteCrawler;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher() -> HttpFetcher {
    let config = test_config();
    HttpFetcher::new(&config.crawler, &config.user_agent).expect("Failed to build fetcher")
}

fn page_url(server: &MockServer, page: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), page)).expect("Failed to parse mock URL")
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

#[tokio::test]
async fn test_fetch_text_page_with_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "TestBot/1.0.0 (+https://example.com/bot)"))
        .respond_with(html("<p>hello</p>"))
        .expect(1)
        .mount(&server)
        .await;

    let body = fetcher()
        .fetch(&page_url(&server, "/"))
        .await
        .expect("Fetch should succeed");

    assert_eq!(body, "<p>hello</p>");
}

#[tokio::test]
async fn test_fetch_not_found() {
    let server = MockServer::start().await;

    let result = fetcher().fetch(&page_url(&server, "/missing")).await;

    assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));
}

#[tokio::test]
async fn test_fetch_non_ok_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/moved"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let result = fetcher().fetch(&page_url(&server, "/moved")).await;

    assert!(matches!(result, Err(FetchError::Status { status: 204, .. })));
}

#[tokio::test]
async fn test_fetch_rejects_binary_content() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/logo"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0x89, 0x50, 0x4e, 0x47])
                .insert_header("content-type", "image/png"),
        )
        .mount(&server)
        .await;

    let result = fetcher().fetch(&page_url(&server, "/logo")).await;

    assert!(matches!(result, Err(FetchError::ContentMismatch { .. })));
}

#[tokio::test]
async fn test_fetch_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("late").set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let result = fetcher().fetch(&page_url(&server, "/slow")).await;

    assert!(matches!(result, Err(FetchError::Timeout { .. })));
}

#[tokio::test]
async fn test_fetch_stops_at_body_limit() {
    let server = MockServer::start().await;
    let mut page = "contact@station.example.org ".to_string();
    page.push_str(&"x".repeat(8192));
    page.push_str(" late@station.example.org");
    Mock::given(method("GET"))
        .and(path("/big"))
        .respond_with(html(&page))
        .mount(&server)
        .await;

    let mut config = test_config();
    config.crawler.max_body_size = 1024;
    let fetcher =
        HttpFetcher::new(&config.crawler, &config.user_agent).expect("Failed to build fetcher");

    let body = fetcher
        .fetch(&page_url(&server, "/big"))
        .await
        .expect("Fetch should succeed");

    assert_eq!(body.len(), 1024);
    assert!(body.starts_with("contact@station.example.org"));
    assert!(!body.contains("late@station.example.org"));
}

#[tokio::test]
async fn test_fetch_connection_refused() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let port = listener.local_addr().expect("No local address").port();
    drop(listener);
    let url = Url::parse(&format!("http://127.0.0.1:{}/", port)).expect("Invalid URL");

    let result = fetcher().fetch(&url).await;

    assert!(matches!(result, Err(FetchError::Connect { .. })));
}

#[tokio::test]
async fn test_crawl_keeps_unsure_address_in_desperate_mode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><body>
            <a href="/team">Team</a>
            <a href="/missing">Broken</a>
            <a href="/logo.png">Logo</a>
            <a href="https://elsewhere.example.net/">Partner</a>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/team"))
        .respond_with(html(
            r#"<p>Write to <a href="mailto:Webmaster@ThirdParty.com">us</a></p>
            <img src="/img/banner@2x.png">"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config();
    let fetcher = Arc::new(fetcher());
    let mut crawler = SiteCrawler::new(&server.uri(), fetcher, config.crawler, false)
        .expect("Mock URI should be a valid site");

    let result = crawler.find_mail().await;

    assert!(result.domain_emails.is_empty());
    assert_eq!(
        result.unsure_emails.into_iter().collect::<Vec<_>>(),
        vec!["webmaster@thirdparty.com"]
    );

    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.iter().all(|r| r.url.path() != "/logo.png"));
}

#[tokio::test]
async fn test_crawl_follows_link_cycle_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/about">About</a>"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html(r#"<a href="/">Home</a> <a href="/about">Self</a>"#))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config();
    let mut crawler = SiteCrawler::new(&server.uri(), Arc::new(fetcher()), config.crawler, false)
        .expect("Mock URI should be a valid site");

    let result = crawler.find_mail().await;

    assert!(result.is_empty());
    assert_eq!(crawler.state().visited_count(), 2);
}
