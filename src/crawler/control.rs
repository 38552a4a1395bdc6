//! Crawl stop triggers other than link exhaustion: the crawl timer and the
//! process signal listener

use crate::crawler::synchron::Synchron;
use crate::state::ExitContext;
use std::sync::Arc;
use std::time::Duration;

/// Stops the crawl with [`ExitContext::Timeout`] once `timeout` elapses
///
/// A zero timeout disables the timer. Returns early without firing if the
/// crawl is stopped for another reason first.
pub async fn run_timer(synchron: Arc<Synchron>, timeout: Duration) {
    if timeout.is_zero() {
        tracing::debug!("Crawl timer disabled");
        return;
    }

    tokio::select! {
        _ = synchron.stopped() => {
            tracing::trace!("Crawl timer cancelled");
        }
        _ = tokio::time::sleep(timeout) => {
            if synchron.notify_stop(ExitContext::Timeout) {
                tracing::info!("Crawl timeout of {:?} reached", timeout);
            }
        }
    }
}

/// Stops the crawl with [`ExitContext::Signal`] on SIGINT or SIGTERM
///
/// Signal handlers are registered for the lifetime of the call only.
pub async fn run_interrupt_listener(synchron: Arc<Synchron>) {
    tokio::select! {
        _ = synchron.stopped() => {
            tracing::trace!("Interrupt listener stopped");
        }
        received = wait_for_interrupt() => {
            if synchron.notify_stop(ExitContext::Signal) {
                tracing::info!("Received {}, stopping crawl", received);
            }
        }
    }
}

/// Resolves with the name of the first termination signal received
async fn wait_for_interrupt() -> &'static str {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            match result {
                Ok(()) => "SIGINT",
                Err(e) => {
                    tracing::warn!("Failed to listen for Ctrl-C: {}", e);
                    std::future::pending::<&'static str>().await
                }
            }
        }
        name = wait_for_sigterm() => name,
    }
}

#[cfg(unix)]
async fn wait_for_sigterm() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
            "SIGTERM"
        }
        Err(e) => {
            tracing::warn!("Failed to install SIGTERM handler: {}", e);
            std::future::pending().await
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() -> &'static str {
    std::future::pending().await
}
