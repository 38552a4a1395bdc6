//! Process signal handling
//!
//! Kept in its own test binary: the SIGINT sent here is delivered to the
//! whole test process.

#![cfg(unix)]

use hostcrawl::config::RequestsConfig;
use hostcrawl::{Crawler, ExitContext};
use std::process::Command;
use std::time::Duration;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_sigint_stops_crawl() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body><p>slow</p></body></html>")
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&mock_server)
        .await;

    let config = RequestsConfig {
        progress_interval: 50,
        ..RequestsConfig::default()
    };
    let crawler = Crawler::new(config).unwrap();
    let mut results = crawler
        .stream_links(&mock_server.uri(), Duration::ZERO)
        .unwrap();

    // Give the interrupt listener time to install its handlers
    tokio::time::sleep(Duration::from_millis(300)).await;

    let status = Command::new("kill")
        .args(["-INT", &std::process::id().to_string()])
        .status()
        .expect("failed to run kill");
    assert!(status.success());

    let stats = tokio::time::timeout(Duration::from_secs(5), results.wait())
        .await
        .expect("crawl did not shut down after SIGINT");

    assert_eq!(stats.exit_context, Some(ExitContext::Signal));
    assert_eq!(results.exit_context(), Some(ExitContext::Signal));
    assert_eq!(stats.visited, 0);
}
