//! Hostcrawl: a concurrent same-host link crawler
//!
//! This crate walks every page reachable from a start URL on the same host,
//! streaming the links it has not seen before until the link graph is
//! exhausted, a timeout elapses, or the crawl is interrupted.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use std::fmt;
use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Could not build a GET request for {url}: {source}")]
    InvalidRequest { url: String, source: UrlError },

    #[error("Error in downloading {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Malformed links in {url}: {errors}")]
    LinkExtraction { url: String, errors: ErrorList },

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Engine initialisation failed: {0}")]
    Init(String),
}

impl CrawlError {
    /// Returns true if the error means the page itself could not be retrieved
    ///
    /// Per-anchor extraction errors are not fetch failures: the page was
    /// downloaded and its valid links are still usable.
    pub fn is_fetch_failure(&self) -> bool {
        !matches!(self, Self::LinkExtraction { .. })
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid value for environment variable {key}: {value}")]
    Env { key: String, value: String },
}

/// URL-specific errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),

    #[error("URL contains ASCII control characters: {0:?}")]
    ControlCharacter(String),

    #[error("Invalid percent-escape in URL: {0}")]
    InvalidEscape(String),
}

/// A collection of errors gathered while processing a single page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorList(pub Vec<UrlError>);

impl ErrorList {
    /// Returns `None` when no error was collected
    pub fn error_or_none(self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(self)
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [] => write!(f, "no errors"),
            [single] => write!(f, "{}", single),
            errors => {
                let joined = errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                write!(f, "multiple errors: {}", joined)
            }
        }
    }
}

impl std::error::Error for ErrorList {}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl_timeout_from_secs, scrap_links, Crawler, CrawlerResults, Response};
pub use output::CrawlStats;
pub use state::{ExitContext, LinkState, LinkStates};
pub use crate::url::{filter_host, host_key, normalize_url, sanitise};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_list_display_single() {
        let list = ErrorList(vec![UrlError::MissingDomain]);
        assert_eq!(list.to_string(), "Missing domain in URL");
    }

    #[test]
    fn test_error_list_display_multiple() {
        let list = ErrorList(vec![
            UrlError::MissingDomain,
            UrlError::InvalidEscape("%".to_string()),
        ]);
        assert_eq!(
            list.to_string(),
            "multiple errors: Missing domain in URL; Invalid percent-escape in URL: %"
        );
    }

    #[test]
    fn test_error_list_error_or_none() {
        assert!(ErrorList::default().error_or_none().is_none());
        assert!(ErrorList(vec![UrlError::MissingDomain])
            .error_or_none()
            .is_some());
    }

    #[test]
    fn test_link_extraction_is_not_fetch_failure() {
        let err = CrawlError::LinkExtraction {
            url: "https://example.com/".to_string(),
            errors: ErrorList(vec![UrlError::MissingDomain]),
        };
        assert!(!err.is_fetch_failure());

        let err = CrawlError::Timeout {
            url: "https://example.com/".to_string(),
        };
        assert!(err.is_fetch_failure());
    }
}
