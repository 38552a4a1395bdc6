//! Crawler module for same-host link discovery
//!
//! This module contains the core crawling logic, including:
//! - Cancellable HTTP fetching
//! - HTML parsing and link extraction
//! - The engine event loop and its worker pool
//! - Shutdown coordination (timer, signals, link exhaustion)

mod control;
mod crawl;
mod engine;
mod fetcher;
mod parser;
mod response;
mod synchron;

pub use control::{run_interrupt_listener, run_timer};
pub use crawl::{crawl_timeout_from_secs, scrap_links, Crawler, CrawlerResults};
pub use engine::{run_engine, EngineParams};
pub use fetcher::{build_http_client, fetch_url, FetchResult};
pub use parser::{extract_links, ParsedPage};
pub use response::Response;
pub use synchron::Synchron;
