//! Public entry points for running a crawl
//!
//! [`Crawler::stream_links`] starts a crawl in the background and hands
//! back a [`CrawlerResults`] to read pages from as they are discovered.
//! [`Crawler::fetch_links`] runs a crawl to completion and collects every
//! link found.

use crate::config::RequestsConfig;
use crate::crawler::control::{run_interrupt_listener, run_timer};
use crate::crawler::engine::{run_engine, EngineParams};
use crate::crawler::fetcher::{build_http_client, fetch_url, FetchResult};
use crate::crawler::parser::extract_links;
use crate::crawler::response::Response;
use crate::crawler::synchron::Synchron;
use crate::output::CrawlStats;
use crate::state::ExitContext;
use crate::url::normalize_url;
use crate::{CrawlError, Result};
use chrono::Utc;
use reqwest::Client;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Capacity of the stream handed to the caller
const OUTPUT_BUFFER: usize = 64;

/// Converts a crawl duration given in seconds
///
/// Zero means the crawl runs until it runs out of links or is interrupted.
///
/// # Examples
///
/// ```
/// use hostcrawl::crawl_timeout_from_secs;
/// use std::time::Duration;
///
/// assert_eq!(crawl_timeout_from_secs(30).unwrap(), Duration::from_secs(30));
/// assert!(crawl_timeout_from_secs(-1).is_err());
/// ```
pub fn crawl_timeout_from_secs(secs: i64) -> Result<Duration> {
    u64::try_from(secs)
        .map(Duration::from_secs)
        .map_err(|_| CrawlError::InvalidInput(format!("crawl timeout cannot be negative: {}s", secs)))
}

/// Checks a start URL before any task is spawned
fn validate_input(start: &str) -> Result<url::Url> {
    let start = start.trim();
    if start.is_empty() {
        return Err(CrawlError::InvalidInput("start URL is empty".to_string()));
    }

    normalize_url(start).map_err(|e| CrawlError::InvalidInput(format!("{}: {}", start, e)))
}

/// Same-host crawler
///
/// One `Crawler` can run any number of crawls; they share its HTTP connection
/// pool but nothing else.
#[derive(Debug, Clone)]
pub struct Crawler {
    config: RequestsConfig,
    client: Client,
}

impl Crawler {
    /// Creates a crawler with the given request settings
    pub fn new(config: RequestsConfig) -> Result<Self> {
        let client = build_http_client(&config)
            .map_err(|e| CrawlError::Init(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &RequestsConfig {
        &self.config
    }

    /// Starts crawling from `start` in the background
    ///
    /// Returns as soon as the input is validated. A `timeout` of zero lets the
    /// crawl run until it exhausts its links or is interrupted. Must be called
    /// from within a Tokio runtime.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use hostcrawl::config::RequestsConfig;
    /// use hostcrawl::Crawler;
    /// use std::time::Duration;
    ///
    /// # async fn run() -> hostcrawl::Result<()> {
    /// let crawler = Crawler::new(RequestsConfig::default())?;
    /// let mut results = crawler.stream_links("https://example.com", Duration::from_secs(60))?;
    /// while let Some(response) = results.next().await {
    ///     println!("{} links on {}", response.links.len(), response.url);
    /// }
    /// println!("Stopped: {:?}", results.exit_context());
    /// # Ok(())
    /// # }
    /// ```
    pub fn stream_links(&self, start: &str, timeout: Duration) -> Result<CrawlerResults> {
        let start_url = validate_input(start)?;
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(CrawlError::Init(
                "stream_links must be called within a Tokio runtime".to_string(),
            ));
        }

        let synchron = Arc::new(Synchron::new());
        let (output, stream) = mpsc::channel(OUTPUT_BUFFER);
        let span = tracing::info_span!("crawl", url = %start_url);

        let supervisor = tokio::spawn(
            supervise(
                start_url.to_string(),
                timeout,
                EngineParams::from(&self.config),
                self.client.clone(),
                output,
                Arc::clone(&synchron),
            )
            .instrument(span),
        );

        Ok(CrawlerResults {
            start: start_url.to_string(),
            stream,
            links: Vec::new(),
            synchron,
            supervisor: Some(supervisor),
            stats: None,
        })
    }

    /// Crawls from `start` to completion and collects every link found
    ///
    /// The returned handle has [`CrawlerResults::links`] populated and its
    /// exit context set.
    pub async fn fetch_links(&self, start: &str, timeout: Duration) -> Result<CrawlerResults> {
        let mut results = self.stream_links(start, timeout)?;

        let mut links = BTreeSet::new();
        while let Some(response) = results.next().await {
            links.extend(response.links);
        }
        results.links = links.into_iter().collect();
        results.wait().await;

        Ok(results)
    }
}

/// Runs the timer, the interrupt listener and the engine of one crawl
///
/// The output stream closes only after all three have terminated.
async fn supervise(
    start: String,
    timeout: Duration,
    params: EngineParams,
    client: Client,
    output: mpsc::Sender<Response>,
    synchron: Arc<Synchron>,
) -> CrawlStats {
    let started_at = Utc::now();

    synchron.spawn(run_interrupt_listener(Arc::clone(&synchron)).in_current_span());
    synchron.spawn(run_timer(Arc::clone(&synchron), timeout).in_current_span());
    let engine = synchron.spawn(
        run_engine(
            start.clone(),
            params,
            client,
            output.clone(),
            Arc::clone(&synchron),
        )
        .in_current_span(),
    );

    let stats = match engine.await {
        Ok(stats) => stats,
        Err(e) => {
            tracing::error!("Crawl engine task failed: {}", e);
            // Release the timer and the listener
            synchron.notify_stop(ExitContext::Signal);
            CrawlStats {
                exit_context: synchron.exit_context(),
                ..CrawlStats::empty(start, started_at)
            }
        }
    };

    synchron.wait().await;

    if let Some(reason) = synchron.exit_context() {
        tracing::info!("Shutting down: {}", reason);
    }

    drop(output);
    stats
}

/// Handle on a running or finished crawl
#[derive(Debug)]
pub struct CrawlerResults {
    start: String,
    stream: mpsc::Receiver<Response>,
    links: Vec<String>,
    synchron: Arc<Synchron>,
    supervisor: Option<JoinHandle<CrawlStats>>,
    stats: Option<CrawlStats>,
}

impl CrawlerResults {
    /// Receives the next crawled page
    ///
    /// Returns `None` once the crawl has stopped and every task has exited.
    pub async fn next(&mut self) -> Option<Response> {
        self.stream.recv().await
    }

    /// Why the crawl stopped, or `None` while it is still running
    pub fn exit_context(&self) -> Option<ExitContext> {
        self.synchron.exit_context()
    }

    /// Links accumulated by [`Crawler::fetch_links`], sorted
    ///
    /// Always empty for a handle returned by [`Crawler::stream_links`].
    pub fn links(&self) -> &[String] {
        &self.links
    }

    /// Stops the crawl as if the process had been interrupted
    ///
    /// Returns false if the crawl was already stopping.
    pub fn interrupt(&self) -> bool {
        self.synchron.notify_stop(ExitContext::Signal)
    }

    /// Statistics of the crawl, once [`CrawlerResults::wait`] has returned
    pub fn stats(&self) -> Option<&CrawlStats> {
        self.stats.as_ref()
    }

    /// Waits for the crawl to terminate and returns its statistics
    ///
    /// Pages not yet read from the stream are discarded.
    pub async fn wait(&mut self) -> CrawlStats {
        while self.stream.recv().await.is_some() {}

        if let Some(supervisor) = self.supervisor.take() {
            let stats = match supervisor.await {
                Ok(stats) => stats,
                Err(e) => {
                    tracing::error!("Crawl supervisor failed: {}", e);
                    CrawlStats {
                        exit_context: self.synchron.exit_context(),
                        ..CrawlStats::empty(self.start.clone(), Utc::now())
                    }
                }
            };
            self.stats = Some(stats);
        }

        match &self.stats {
            Some(stats) => stats.clone(),
            None => CrawlStats::empty(self.start.clone(), Utc::now()),
        }
    }
}

impl Drop for CrawlerResults {
    fn drop(&mut self) {
        // An abandoned crawl would otherwise run until its timer fires
        if self.supervisor.is_some() {
            self.synchron.notify_stop(ExitContext::Signal);
        }
    }
}

/// Fetches a single page and returns every link on it, without crawling
///
/// Links are not restricted to the page's host. Malformed anchors are
/// reported in the response's `error` field.
pub async fn scrap_links(config: &RequestsConfig, url: &str) -> Result<Response> {
    let target = validate_input(url)?;
    let client = build_http_client(config)
        .map_err(|e| CrawlError::Init(format!("failed to build HTTP client: {}", e)))?;
    let target = target.to_string();

    match fetch_url(&client, &target, config.timeout(), &CancellationToken::new()).await {
        FetchResult::Success { status_code, .. } if !(200..300).contains(&status_code) => {
            Err(CrawlError::HttpStatus {
                url: target,
                status: status_code,
            })
        }
        FetchResult::Success { body, .. } => {
            let parsed = extract_links(&target, &body);
            let error = parsed.error().map(|errors| CrawlError::LinkExtraction {
                url: target.clone(),
                errors,
            });
            let mut links: Vec<String> = parsed.links.into_iter().collect();
            links.sort();

            Ok(Response {
                url: target,
                links,
                error,
            })
        }
        FetchResult::Error(e) => Err(e),
        FetchResult::Cancelled => Ok(Response {
            url: target,
            links: Vec::new(),
            error: None,
        }),
    }
}
