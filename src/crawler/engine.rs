//! The crawl engine event loop
//!
//! The engine owns the task queue, the link states and the worker pool.
//! It is the only task that mutates crawl state: workers fetch and parse a
//! page, then report a [`Response`] back over a channel.
//!
//! # Lifecycle
//!
//! 1. **Running**: each loop iteration handles exactly one event (stop
//!    requested, response received, task dispatched, progress tick)
//! 2. **Draining**: workers are cancelled and joined
//! 3. **Stopped**: statistics are returned and the output sender is dropped

use crate::config::RequestsConfig;
use crate::crawler::fetcher::{fetch_url, FetchResult};
use crate::crawler::parser::extract_links;
use crate::crawler::response::Response;
use crate::crawler::synchron::Synchron;
use crate::output::CrawlStats;
use crate::state::{ExitContext, LinkStates, RetryDecision};
use crate::url::{filter_host, host_key, normalize_url};
use crate::CrawlError;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

/// Capacity of the worker to engine result channel
const RESULT_BUFFER: usize = 100;

const MIN_TICK: Duration = Duration::from_millis(10);

/// Tunables of one engine run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineParams {
    /// Deadline for a single request (zero disables it)
    pub request_timeout: Duration,

    /// Attempts per URL before it is marked failed
    pub max_retry: u32,

    /// Maximum in-flight workers (zero means unbounded)
    pub max_workers: usize,

    /// Interval of progress reports and exhaustion checks
    pub tick_interval: Duration,
}

impl From<&RequestsConfig> for EngineParams {
    fn from(config: &RequestsConfig) -> Self {
        Self {
            request_timeout: config.timeout(),
            max_retry: config.retries,
            max_workers: config.max_concurrent,
            tick_interval: config.progress_interval(),
        }
    }
}

/// Runs one crawl from `start` until the crawl is stopped
///
/// A start URL that cannot be normalized stops the crawl with
/// [`ExitContext::InitError`] without fetching anything.
///
/// # Arguments
///
/// * `start` - The start URL
/// * `params` - Engine tunables
/// * `client` - HTTP client shared by all workers
/// * `output` - Receives one `Response` per successfully fetched page
/// * `synchron` - Shutdown coordinator of this crawl
pub async fn run_engine(
    start: String,
    params: EngineParams,
    client: Client,
    output: mpsc::Sender<Response>,
    synchron: Arc<Synchron>,
) -> CrawlStats {
    let started_at = Utc::now();

    match Engine::new(&start, params, client, output, Arc::clone(&synchron)) {
        Ok(engine) => engine.run(started_at).await,
        Err(e) => {
            tracing::error!("{}", e);
            synchron.notify_stop(ExitContext::InitError);
            CrawlStats {
                exit_context: synchron.exit_context(),
                ..CrawlStats::empty(start, started_at)
            }
        }
    }
}

/// Everything a worker needs to crawl one page
#[derive(Clone)]
struct Worker {
    client: Client,
    host: String,
    timeout: Duration,
    results: mpsc::Sender<Response>,
    stop: CancellationToken,
}

impl Worker {
    /// Fetches `url`, extracts its same-host links and reports back
    ///
    /// Nothing is reported when the engine is draining.
    async fn crawl(self, url: String, permit: Option<OwnedSemaphorePermit>) {
        let response = match fetch_url(&self.client, &url, self.timeout, &self.stop).await {
            FetchResult::Cancelled => return,
            FetchResult::Error(e) => Response::failure(url, e),
            FetchResult::Success { status_code, .. } if !(200..300).contains(&status_code) => {
                let error = CrawlError::HttpStatus {
                    url: url.clone(),
                    status: status_code,
                };
                Response::failure(url, error)
            }
            FetchResult::Success { body, .. } => {
                let parsed = extract_links(&url, &body);
                let error = parsed.error().map(|errors| CrawlError::LinkExtraction {
                    url: url.clone(),
                    errors,
                });
                let links = filter_host(parsed.links, &self.host);

                Response { url, links, error }
            }
        };

        // Free the slot before a potentially blocking send
        drop(permit);

        if self.stop.is_cancelled() {
            tracing::trace!("Engine draining, dropping response for {}", response.url);
            return;
        }

        let url = response.url.clone();
        tokio::select! {
            biased;

            _ = self.stop.cancelled() => {
                tracing::trace!("Engine draining, dropping response for {}", url);
            }
            result = self.results.send(response) => {
                if result.is_err() {
                    tracing::trace!("Engine gone, dropping response for {}", url);
                }
            }
        }
    }
}

/// State of one engine run
struct Engine {
    start: String,
    params: EngineParams,
    states: LinkStates,
    queue: VecDeque<String>,
    results: mpsc::Receiver<Response>,
    workers: TaskTracker,
    worker: Worker,
    permits: Option<Arc<Semaphore>>,
    output: mpsc::Sender<Response>,
    synchron: Arc<Synchron>,
    span: tracing::Span,
    links_found: usize,
}

impl Engine {
    fn new(
        start: &str,
        params: EngineParams,
        client: Client,
        output: mpsc::Sender<Response>,
        synchron: Arc<Synchron>,
    ) -> Result<Self, CrawlError> {
        let start_url = normalize_url(start)
            .map_err(|e| CrawlError::Init(format!("invalid start URL {}: {}", start, e)))?;
        let host = host_key(&start_url)
            .ok_or_else(|| CrawlError::Init(format!("start URL {} has no host", start)))?;

        let (results_tx, results) = mpsc::channel(RESULT_BUFFER);
        let permits = match params.max_workers {
            0 => None,
            n => Some(Arc::new(Semaphore::new(n.min(Semaphore::MAX_PERMITS)))),
        };

        let worker = Worker {
            client,
            host,
            timeout: params.request_timeout,
            results: results_tx,
            stop: CancellationToken::new(),
        };

        let mut engine = Self {
            start: start_url.to_string(),
            params,
            states: LinkStates::new(),
            queue: VecDeque::new(),
            results,
            workers: TaskTracker::new(),
            worker,
            permits,
            output,
            synchron,
            span: tracing::Span::current(),
            links_found: 0,
        };

        let seed = engine.start.clone();
        engine.enqueue(seed);
        Ok(engine)
    }

    async fn run(mut self, started_at: DateTime<Utc>) -> CrawlStats {
        tracing::info!(
            "Crawling {} (host {}, max retries {})",
            self.start,
            self.worker.host,
            self.params.max_retry
        );

        let synchron = Arc::clone(&self.synchron);
        // interval_at panics on a zero period
        let tick = self.params.tick_interval.max(MIN_TICK);
        let mut ticker = interval_at(Instant::now() + tick, tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let can_dispatch = !self.queue.is_empty() && self.has_free_slot();

            tokio::select! {
                biased;

                _ = synchron.stopped() => break,
                Some(response) = self.results.recv() => {
                    if let Some(forward) = self.apply_response(response) {
                        self.forward(forward).await;
                    }
                    self.check_exhausted();
                }
                _ = std::future::ready(()), if can_dispatch => self.dispatch(),
                _ = ticker.tick() => {
                    self.report_progress();
                    self.check_exhausted();
                }
            }
        }

        drop(ticker);
        self.drain(started_at).await
    }

    /// Registers `url` as pending and queues it for dispatch
    fn enqueue(&mut self, url: String) {
        if self.states.register(&url) {
            self.queue.push_back(url);
        }
    }

    fn has_free_slot(&self) -> bool {
        self.permits
            .as_ref()
            .map_or(true, |permits| permits.available_permits() > 0)
    }

    /// Hands the next queued URL to a new worker
    fn dispatch(&mut self) {
        let permit = match &self.permits {
            Some(permits) => match Arc::clone(permits).try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => return,
            },
            None => None,
        };

        let url = match self.queue.pop_front() {
            Some(url) => url,
            None => return,
        };

        let attempt = self.states.start_attempt(&url);
        tracing::debug!("Dispatching {} (attempt {})", url, attempt);

        let worker = self.worker.clone();
        self.workers
            .spawn(worker.crawl(url, permit).instrument(self.span.clone()));
    }

    /// Applies a worker report to the link states
    ///
    /// Returns the response to forward to the output stream, carrying only
    /// the links never seen before, or `None` after a failed fetch.
    fn apply_response(&mut self, response: Response) -> Option<Response> {
        if response.is_fetch_failure() {
            self.handle_failure(response);
            return None;
        }

        let Response { url, links, error } = response;
        if let Some(error) = &error {
            tracing::warn!("{}", error);
        }

        self.states.mark_visited(&url);
        let unseen = self.states.filter_unseen(links);
        for link in &unseen {
            self.enqueue(link.clone());
        }
        self.links_found += unseen.len();

        tracing::info!("Found {} unvisited links on {}", unseen.len(), url);

        Some(Response {
            url,
            links: unseen,
            error,
        })
    }

    fn handle_failure(&mut self, response: Response) {
        let reason = response
            .error
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();

        match self.states.record_failure(&response.url, self.params.max_retry) {
            RetryDecision::Retry { attempts } => {
                tracing::debug!(
                    "Retrying {} after {} failed attempt(s): {}",
                    response.url,
                    attempts,
                    reason
                );
                self.queue.push_back(response.url);
            }
            RetryDecision::GiveUp { attempts } => {
                tracing::error!(
                    "Discarding {}: unreachable after {} attempt(s): {}",
                    response.url,
                    attempts,
                    reason
                );
            }
            RetryDecision::Settled => {
                tracing::trace!("Ignoring late failure for {}", response.url);
            }
        }
    }

    /// Sends a response to the output stream unless the crawl is stopping
    async fn forward(&self, response: Response) {
        if self.synchron.is_stopped() {
            return;
        }

        tokio::select! {
            biased;

            _ = self.synchron.stopped() => {
                tracing::trace!("Crawl stopping, not forwarding response");
            }
            result = self.output.send(response) => {
                if result.is_err() {
                    tracing::debug!("Output stream closed, dropping response");
                }
            }
        }
    }

    fn is_exhausted(&self) -> bool {
        self.queue.is_empty() && self.states.is_settled()
    }

    fn check_exhausted(&self) {
        if self.is_exhausted() && self.synchron.notify_stop(ExitContext::LinksExhausted) {
            tracing::info!("No links left to visit");
        }
    }

    fn report_progress(&self) {
        tracing::info!(
            pending = self.states.pending_count(),
            queued = self.queue.len(),
            visited = self.states.visited_count(),
            failed = self.states.failed_count(),
            "Crawl progress"
        );
    }

    async fn drain(self, started_at: DateTime<Utc>) -> CrawlStats {
        self.worker.stop.cancel();
        self.workers.close();
        self.workers.wait().await;

        let visited = self.states.visited_count();
        let failed = self.states.failed_count();
        tracing::info!("Crawl stopped: {} visited, {} failed", visited, failed);

        CrawlStats {
            start_url: self.start,
            visited,
            failed,
            links_found: self.links_found,
            exit_context: self.synchron.exit_context(),
            started_at,
            finished_at: Utc::now(),
        }
    }
}
