//! Statistics for a finished crawl
//!
//! This module provides the summary the engine produces when it stops, and
//! a formatter for displaying it.

use crate::state::ExitContext;
use chrono::{DateTime, Utc};

/// Crawl statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlStats {
    /// The normalized start URL (or the raw input if it could not be normalized)
    pub start_url: String,

    /// Number of pages fetched successfully
    pub visited: usize,

    /// Number of pages given up on after exhausting their retries
    pub failed: usize,

    /// Number of new links forwarded to the output stream
    pub links_found: usize,

    /// Why the crawl stopped
    pub exit_context: Option<ExitContext>,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlStats {
    /// Statistics for a crawl that never fetched anything
    pub fn empty(start_url: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            start_url: start_url.into(),
            visited: 0,
            failed: 0,
            links_found: 0,
            exit_context: None,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Wall-clock duration of the crawl in seconds
    pub fn duration_seconds(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    /// Percentage of settled pages that were fetched successfully
    pub fn success_rate(&self) -> f64 {
        let settled = self.visited + self.failed;
        if settled > 0 {
            (self.visited as f64 / settled as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStats) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Start URL: {}", stats.start_url);
    println!(
        "  Stopped: {}",
        stats
            .exit_context
            .map_or("unknown", |context| context.as_str())
    );
    println!("  Duration: {:.1}s", stats.duration_seconds());
    println!();

    println!("Pages:");
    println!("  Visited: {}", stats.visited);
    println!("  Failed: {}", stats.failed);
    println!("  Success rate: {:.1}%", stats.success_rate());
    println!("  Links found: {}", stats.links_found);
}
