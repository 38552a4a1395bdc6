//! Output module for crawl summaries
//!
//! This module handles:
//! - Recording crawl statistics
//! - Formatting crawl records for the terminal

pub mod stats;

pub use stats::{print_statistics, CrawlStats};

use crate::crawler::Response;

/// Formats one crawl record as `url -> [link, link, ...]`
///
/// Links are sorted so the output is stable between runs.
pub fn format_response(response: &Response) -> String {
    let mut links: Vec<&str> = response.links.iter().map(String::as_str).collect();
    links.sort_unstable();
    format!("{} -> [{}]", response.url, links.join(", "))
}
