//! URL handling module
//!
//! This module provides start-URL normalization, link sanitisation
//! (resolution against the origin page, query/fragment stripping) and the
//! same-host filter that scopes a crawl to its target.

mod host;
mod normalize;

// Re-export main functions
pub use host::{filter_host, host_key};
pub use normalize::{normalize_url, sanitise};
