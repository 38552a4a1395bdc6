//! Link state tracking for the crawl engine
//!
//! Every URL the engine has ever enqueued lives in exactly one of three
//! mappings: pending (with its attempt count), visited, or failed. Only the
//! engine loop touches a `LinkStates`, so it carries no locking.

use std::collections::{HashMap, HashSet};

/// The state a single URL occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkState {
    /// Queued or in flight; the value is the number of attempts dispatched so far
    Pending(u32),

    /// Fetched successfully and its outbound links enqueued. Never fetched again.
    Visited,

    /// Exhausted its retry budget. Never enqueued again.
    Failed,
}

/// Outcome of recording a failed fetch attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// The URL stays pending and should be enqueued again
    Retry { attempts: u32 },

    /// The URL exhausted its retries and moved to the failed set
    GiveUp { attempts: u32 },

    /// The URL was already visited or failed; nothing to do
    Settled,
}

/// The pending/visited/failed partition of a crawl
#[derive(Debug, Default)]
pub struct LinkStates {
    pending: HashMap<String, u32>,
    visited: HashSet<String>,
    failed: HashSet<String>,
}

impl LinkStates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a newly enqueued URL as pending with zero attempts
    ///
    /// Returns false (and changes nothing) if the URL is already known in
    /// any state.
    pub fn register(&mut self, url: &str) -> bool {
        if self.is_known(url) {
            return false;
        }
        self.pending.insert(url.to_string(), 0);
        true
    }

    /// Records that a task for `url` was handed to a worker
    ///
    /// Returns the attempt count including this one.
    pub fn start_attempt(&mut self, url: &str) -> u32 {
        let attempts = self.pending.entry(url.to_string()).or_insert(0);
        *attempts += 1;
        *attempts
    }

    /// Records a failed fetch for `url` against a retry budget of `max_retry`
    ///
    /// The URL moves to the failed set once its attempt count has reached
    /// `max_retry`; with a budget of zero the first failure is final.
    pub fn record_failure(&mut self, url: &str, max_retry: u32) -> RetryDecision {
        if self.visited.contains(url) || self.failed.contains(url) {
            return RetryDecision::Settled;
        }

        let attempts = self.pending.get(url).copied().unwrap_or(0);
        if attempts >= max_retry {
            self.pending.remove(url);
            self.failed.insert(url.to_string());
            RetryDecision::GiveUp { attempts }
        } else {
            RetryDecision::Retry { attempts }
        }
    }

    /// Moves `url` from pending to visited
    pub fn mark_visited(&mut self, url: &str) {
        self.pending.remove(url);
        self.failed.remove(url);
        self.visited.insert(url.to_string());
    }

    /// Returns the links that are neither pending, visited nor failed
    ///
    /// Duplicates within `links` are reported once, in first-seen order.
    pub fn filter_unseen<I>(&self, links: I) -> Vec<String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut seen = HashSet::new();
        links
            .into_iter()
            .filter(|link| !self.is_known(link) && seen.insert(link.clone()))
            .collect()
    }

    /// Returns the state `url` currently occupies, if the engine has seen it
    pub fn state_of(&self, url: &str) -> Option<LinkState> {
        if let Some(attempts) = self.pending.get(url) {
            Some(LinkState::Pending(*attempts))
        } else if self.visited.contains(url) {
            Some(LinkState::Visited)
        } else if self.failed.contains(url) {
            Some(LinkState::Failed)
        } else {
            None
        }
    }

    /// Returns true if `url` is in any of the three states
    pub fn is_known(&self, url: &str) -> bool {
        self.pending.contains_key(url) || self.visited.contains(url) || self.failed.contains(url)
    }

    /// Returns true when nothing is pending
    pub fn is_settled(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Checks that no URL occupies more than one state
    pub fn is_partitioned(&self) -> bool {
        self.pending
            .keys()
            .all(|url| !self.visited.contains(url) && !self.failed.contains(url))
            && self.visited.is_disjoint(&self.failed)
    }
}
