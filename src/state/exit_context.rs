//! Exit context definitions for a crawl run
//!
//! The first shutdown trigger to fire records one of these; it never changes
//! afterwards.

use std::fmt;

/// Represents the reason a crawl stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitContext {
    /// An interrupt was received (SIGINT/SIGTERM or a programmatic interrupt)
    Signal,

    /// The crawl duration budget elapsed
    Timeout,

    /// No task is queued and none is in flight
    LinksExhausted,

    /// The engine could not start (malformed start URL)
    InitError,
}

impl ExitContext {
    /// Returns true if the crawl ran to completion on its own
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::LinksExhausted)
    }

    /// Returns a short human readable description
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Signal => "Received Signal",
            Self::Timeout => "Timeout",
            Self::LinksExhausted => "No links left to visit",
            Self::InitError => "Initialisation error",
        }
    }
}

impl fmt::Display for ExitContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
