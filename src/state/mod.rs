//! State module for tracking crawl progress
//!
//! This module provides the bookkeeping the crawl engine runs on.
//!
//! # Components
//!
//! - `LinkStates`: The pending/visited/failed partition of every URL the engine has seen
//! - `LinkState`: The state a single URL currently occupies
//! - `ExitContext`: Why a crawl stopped

mod exit_context;
mod link_state;

// Re-export main types
pub use exit_context::ExitContext;
pub use link_state::{LinkState, LinkStates, RetryDecision};
