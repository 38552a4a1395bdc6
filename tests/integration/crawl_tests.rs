//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use hostcrawl::config::RequestsConfig;
use hostcrawl::{scrap_links, CrawlError, Crawler, ExitContext};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Creates a test configuration with short timeouts
fn create_test_config(retries: u32, max_concurrent: usize) -> RequestsConfig {
    RequestsConfig {
        timeout: 5,
        retries,
        max_concurrent,
        user_agent: "TestBot/1.0".to_string(),
        progress_interval: 50,
    }
}

fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, page: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html_page(body))
        .mount(server)
        .await;
}

/// Serves a slow page and records when each request arrived
#[derive(Clone, Default)]
struct SlowPage {
    arrivals: Arc<Mutex<Vec<Instant>>>,
}

impl Respond for SlowPage {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        self.arrivals.lock().unwrap().push(Instant::now());
        html_page(r#"<a href="/">Home</a>"#).set_delay(Duration::from_millis(200))
    }
}

#[tokio::test]
async fn test_single_page_exhausts_links() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", "<p>No links here</p>").await;

    let crawler = Crawler::new(create_test_config(2, 0)).unwrap();
    let mut results = tokio::time::timeout(
        Duration::from_secs(10),
        crawler.fetch_links(&mock_server.uri(), Duration::ZERO),
    )
    .await
    .expect("crawl did not finish")
    .unwrap();

    assert!(results.links().is_empty());
    assert_eq!(results.exit_context(), Some(ExitContext::LinksExhausted));

    let stats = results.wait().await;
    assert_eq!(stats.visited, 1);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.exit_context, Some(ExitContext::LinksExhausted));
}

#[tokio::test]
async fn test_full_crawl_single_host() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        &format!(
            r#"<a href="{}/page1">Page 1</a>
               <a href="/page2?ref=home">Page 2</a>
               <a href="https://elsewhere.example/page3">Elsewhere</a>
               <a href="mailto:admin@example.com">Mail</a>"#,
            base_url
        ),
    )
    .await;
    mount_page(
        &mock_server,
        "/page1",
        r#"<a href="/page2">Page 2</a><a href="/">Home</a><a href="deep">Deep</a>"#,
    )
    .await;
    mount_page(&mock_server, "/page2", "<p>Leaf</p>").await;
    mount_page(&mock_server, "/deep", r#"<a href="/page1#top">Back</a>"#).await;

    let crawler = Crawler::new(create_test_config(2, 0)).unwrap();
    let mut results = tokio::time::timeout(
        Duration::from_secs(10),
        crawler.fetch_links(&base_url, Duration::ZERO),
    )
    .await
    .expect("crawl did not finish")
    .unwrap();

    let expected = vec![
        format!("{}/deep", base_url),
        format!("{}/page1", base_url),
        format!("{}/page2", base_url),
    ];
    assert_eq!(results.links(), expected.as_slice());
    assert_eq!(results.exit_context(), Some(ExitContext::LinksExhausted));

    let stats = results.wait().await;
    assert_eq!(stats.visited, 4);
    assert_eq!(stats.links_found, 3);
}

#[tokio::test]
async fn test_stream_reports_each_page_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", r#"<a href="/a">A</a><a href="/b">B</a>"#).await;
    mount_page(&mock_server, "/a", r#"<a href="/b">B</a>"#).await;
    mount_page(&mock_server, "/b", r#"<a href="/a">A</a>"#).await;

    let crawler = Crawler::new(create_test_config(2, 0)).unwrap();
    let mut results = crawler.stream_links(&base_url, Duration::ZERO).unwrap();

    let mut pages = Vec::new();
    let mut all_links = Vec::new();
    while let Some(response) = results.next().await {
        assert!(response.error.is_none());
        pages.push(response.url);
        all_links.extend(response.links);
    }

    pages.sort();
    all_links.sort();
    assert_eq!(
        pages,
        vec![
            format!("{}/", base_url),
            format!("{}/a", base_url),
            format!("{}/b", base_url),
        ]
    );
    // Every link is reported by exactly one page
    assert_eq!(
        all_links,
        vec![format!("{}/a", base_url), format!("{}/b", base_url)]
    );
    assert_eq!(results.exit_context(), Some(ExitContext::LinksExhausted));
}

#[tokio::test]
async fn test_failing_page_is_retried_then_discarded() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "/", r#"<a href="/broken">Broken</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let crawler = Crawler::new(create_test_config(3, 0)).unwrap();
    let mut results = tokio::time::timeout(
        Duration::from_secs(10),
        crawler.fetch_links(&mock_server.uri(), Duration::ZERO),
    )
    .await
    .expect("crawl did not finish")
    .unwrap();

    assert_eq!(results.exit_context(), Some(ExitContext::LinksExhausted));

    let stats = results.wait().await;
    assert_eq!(stats.visited, 1);
    assert_eq!(stats.failed, 1);
}

#[tokio::test]
async fn test_zero_retries_discard_on_first_failure() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "/", r#"<a href="/missing">Missing</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let crawler = Crawler::new(create_test_config(0, 0)).unwrap();
    let mut results = crawler
        .fetch_links(&mock_server.uri(), Duration::ZERO)
        .await
        .unwrap();

    let stats = results.wait().await;
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.exit_context, Some(ExitContext::LinksExhausted));
}

#[tokio::test]
async fn test_crawl_timeout() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html_page("<p>slow</p>").set_delay(Duration::from_secs(10)))
        .mount(&mock_server)
        .await;

    let crawler = Crawler::new(create_test_config(2, 0)).unwrap();
    let mut results = crawler
        .stream_links(&mock_server.uri(), Duration::from_millis(300))
        .unwrap();

    let next = tokio::time::timeout(Duration::from_secs(5), results.next())
        .await
        .expect("stream did not close after the crawl timeout");
    assert!(next.is_none());
    assert_eq!(results.exit_context(), Some(ExitContext::Timeout));

    let stats = results.wait().await;
    assert_eq!(stats.visited, 0);
    assert_eq!(stats.exit_context, Some(ExitContext::Timeout));
}

#[tokio::test]
async fn test_interrupt_stops_crawl() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html_page("<p>slow</p>").set_delay(Duration::from_secs(10)))
        .mount(&mock_server)
        .await;

    let crawler = Crawler::new(create_test_config(2, 0)).unwrap();
    let mut results = crawler
        .stream_links(&mock_server.uri(), Duration::ZERO)
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(results.exit_context(), None);
    assert!(results.interrupt());
    assert!(!results.interrupt());

    let stats = tokio::time::timeout(Duration::from_secs(5), results.wait())
        .await
        .expect("crawl did not shut down after interrupt");

    assert_eq!(stats.exit_context, Some(ExitContext::Signal));
    assert_eq!(results.exit_context(), Some(ExitContext::Signal));
}

#[tokio::test]
async fn test_malformed_anchor_keeps_page() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="http://[broken">Broken</a><a href="/ok">Fine</a>"#,
    )
    .await;
    mount_page(&mock_server, "/ok", "<p>Leaf</p>").await;

    let crawler = Crawler::new(create_test_config(2, 0)).unwrap();
    let mut results = crawler.stream_links(&base_url, Duration::ZERO).unwrap();

    let mut start_page = None;
    while let Some(response) = results.next().await {
        if response.url == format!("{}/", base_url) {
            start_page = Some(response);
        }
    }

    let start_page = start_page.expect("start page was not reported");
    assert_eq!(start_page.links, vec![format!("{}/ok", base_url)]);
    match start_page.error {
        Some(CrawlError::LinkExtraction { errors, .. }) => assert_eq!(errors.len(), 1),
        other => panic!("expected a link extraction error, got {:?}", other),
    }

    let stats = results.wait().await;
    assert_eq!(stats.visited, 2);
    assert_eq!(stats.failed, 0);
}

#[tokio::test]
async fn test_bounded_worker_pool() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let index: String = (0..10)
        .map(|i| format!(r#"<a href="/page{}">Page {}</a>"#, i, i))
        .collect();
    mount_page(&mock_server, "/", &index).await;

    let slow_page = SlowPage::default();
    Mock::given(method("GET"))
        .and(path_regex(r"^/page\d+$"))
        .respond_with(slow_page.clone())
        .mount(&mock_server)
        .await;

    let crawler = Crawler::new(create_test_config(2, 2)).unwrap();
    let mut results = tokio::time::timeout(
        Duration::from_secs(10),
        crawler.fetch_links(&base_url, Duration::ZERO),
    )
    .await
    .expect("crawl did not finish")
    .unwrap();

    assert_eq!(results.links().len(), 10);
    let stats = results.wait().await;
    assert_eq!(stats.visited, 11);

    // With two slots, a third request can only start once one of the two
    // before it has finished its 200ms response
    let mut arrivals = slow_page.arrivals.lock().unwrap().clone();
    arrivals.sort();
    assert_eq!(arrivals.len(), 10);
    for window in arrivals.windows(3) {
        assert!(
            window[2] - window[0] >= Duration::from_millis(150),
            "more than two requests were in flight"
        );
    }
}

#[tokio::test]
async fn test_invalid_start_url() {
    let crawler = Crawler::new(create_test_config(2, 0)).unwrap();

    for bad in ["", "not a url", "ftp://example.com/file"] {
        assert!(matches!(
            crawler.stream_links(bad, Duration::ZERO),
            Err(CrawlError::InvalidInput(_))
        ));
    }
}

#[tokio::test]
async fn test_scrap_links_single_page() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/docs",
        r#"<a href="/docs/intro">Intro</a><a href="https://elsewhere.example/x">Out</a>"#,
    )
    .await;

    let response = scrap_links(&create_test_config(0, 0), &format!("{}/docs", base_url))
        .await
        .unwrap();

    assert_eq!(response.url, format!("{}/docs", base_url));
    assert_eq!(
        response.links,
        vec![
            format!("{}/docs/intro", base_url),
            "https://elsewhere.example/x".to_string(),
        ]
    );
    assert!(response.error.is_none());
}

#[tokio::test]
async fn test_scrap_links_error_status() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let result = scrap_links(&create_test_config(0, 0), &mock_server.uri()).await;
    assert!(matches!(
        result,
        Err(CrawlError::HttpStatus { status: 404, .. })
    ));
}
