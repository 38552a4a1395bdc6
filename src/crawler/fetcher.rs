//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client with the configured user agent
//! - GET requests that can be abandoned mid-flight on shutdown
//! - Error classification

use crate::config::{resolve_user_agent, RequestsConfig};
use crate::url::normalize_url;
use crate::CrawlError;
use reqwest::Client;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// The response was received in full
    Success {
        /// HTTP status code
        status_code: u16,
        /// Page body content
        body: String,
    },

    /// The request could not be built or did not complete
    Error(CrawlError),

    /// Shutdown was requested before the request completed; there is no result
    Cancelled,
}

/// Builds the HTTP client shared by every worker of a crawl
///
/// The `user-agent` setting is resolved through
/// [`resolve_user_agent`](crate::config::resolve_user_agent), so preset names
/// like `Firefox` expand to a full browser string.
///
/// # Example
///
/// ```no_run
/// use hostcrawl::config::RequestsConfig;
/// use hostcrawl::crawler::build_http_client;
///
/// let client = build_http_client(&RequestsConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &RequestsConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(resolve_user_agent(&config.user_agent))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL, giving up as soon as `cancel` fires
///
/// # Request Flow
///
/// 1. Validate the URL; a malformed URL fails before any network activity
/// 2. Return `Cancelled` if shutdown was already requested
/// 3. Race the GET request and body read against `cancel`
///
/// A zero `timeout` means the request has no deadline of its own. Dropping
/// the in-flight future closes any partially read body.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
/// * `timeout` - Per-request deadline covering headers and body
/// * `cancel` - Shutdown token
///
/// # Returns
///
/// Exactly one of `Success`, `Error` or `Cancelled`
pub async fn fetch_url(
    client: &Client,
    url: &str,
    timeout: Duration,
    cancel: &CancellationToken,
) -> FetchResult {
    let target = match normalize_url(url) {
        Ok(target) => target,
        Err(source) => {
            return FetchResult::Error(CrawlError::InvalidRequest {
                url: url.to_string(),
                source,
            })
        }
    };

    if cancel.is_cancelled() {
        return FetchResult::Cancelled;
    }

    let mut request = client.get(target);
    if !timeout.is_zero() {
        request = request.timeout(timeout);
    }

    let download = async {
        let response = request.send().await?;
        let status_code = response.status().as_u16();
        let body = response.text().await?;

        Ok::<_, reqwest::Error>(FetchResult::Success {
            status_code,
            body,
        })
    };

    tokio::select! {
        biased;

        _ = cancel.cancelled() => {
            tracing::trace!("Request to {} cancelled", url);
            FetchResult::Cancelled
        }
        result = download => match result {
            Ok(success) => success,
            Err(e) => FetchResult::Error(classify_error(url, e)),
        },
    }
}

/// Maps a transport error onto the crate error type
fn classify_error(url: &str, error: reqwest::Error) -> CrawlError {
    if error.is_timeout() {
        CrawlError::Timeout {
            url: url.to_string(),
        }
    } else {
        CrawlError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
