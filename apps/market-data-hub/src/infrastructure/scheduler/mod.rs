//! Feed Scheduler
//!
//! One refresh task per feed type. Each task performs an immediate fetch,
//! then loops: sleep for the feed's interval (raced against the shared
//! cancellation token), re-check cancellation, fetch, ingest.
//!
//! # Failure policy
//!
//! A failed or timed-out fetch is logged and counted, and the loop
//! continues to the next interval. One feed's failures never stop other
//! feeds and never terminate the process.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{FeedFetcher, FetchError};
use crate::domain::feed::FeedType;
use crate::infrastructure::metrics;
use crate::infrastructure::pipeline::IngestPipeline;

// =============================================================================
// Task States
// =============================================================================

/// Lifecycle state of one feed's refresh task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedTaskState {
    /// Task not yet spawned.
    Idle,
    /// Task fetching on its interval.
    Running,
    /// Cancellation observed, task winding down.
    Stopping,
    /// Task exited.
    Stopped,
}

/// Per-feed task states, shared with the health surface.
#[derive(Debug)]
pub struct FeedStates {
    inner: RwLock<HashMap<FeedType, FeedTaskState>>,
}

impl FeedStates {
    /// All feeds start `Idle`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(
                FeedType::ALL
                    .into_iter()
                    .map(|feed| (feed, FeedTaskState::Idle))
                    .collect(),
            ),
        }
    }

    /// Current state of one feed's task.
    #[must_use]
    pub fn get(&self, feed: FeedType) -> FeedTaskState {
        self.inner
            .read()
            .get(&feed)
            .copied()
            .unwrap_or(FeedTaskState::Idle)
    }

    /// Snapshot of every feed's state.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<FeedType, FeedTaskState> {
        self.inner.read().clone()
    }

    fn set(&self, feed: FeedType, state: FeedTaskState) {
        self.inner.write().insert(feed, state);
    }
}

impl Default for FeedStates {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Scheduler
// =============================================================================

/// Spawns and tracks the per-feed refresh tasks.
pub struct FeedScheduler {
    pipeline: Arc<IngestPipeline>,
    states: Arc<FeedStates>,
}

impl FeedScheduler {
    /// Create a scheduler writing through the given pipeline.
    #[must_use]
    pub const fn new(pipeline: Arc<IngestPipeline>, states: Arc<FeedStates>) -> Self {
        Self { pipeline, states }
    }

    /// Spawn the refresh task for one feed. The task runs until the token
    /// is cancelled; cancellation interrupts the interval sleep.
    pub fn spawn(
        &self,
        fetcher: Arc<dyn FeedFetcher>,
        interval: Duration,
        fetch_timeout: Option<Duration>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let pipeline = Arc::clone(&self.pipeline);
        let states = Arc::clone(&self.states);
        tokio::spawn(async move {
            run_refresh_loop(fetcher, interval, fetch_timeout, pipeline, states, cancel).await;
        })
    }
}

async fn run_refresh_loop(
    fetcher: Arc<dyn FeedFetcher>,
    interval: Duration,
    fetch_timeout: Option<Duration>,
    pipeline: Arc<IngestPipeline>,
    states: Arc<FeedStates>,
    cancel: CancellationToken,
) {
    let feed = fetcher.feed_type();
    states.set(feed, FeedTaskState::Running);
    tracing::info!(
        topic = %feed,
        interval_secs = interval.as_secs_f64(),
        "feed refresh task started"
    );

    // Initial fetch before the interval loop.
    fetch_once(feed, fetcher.as_ref(), fetch_timeout, &pipeline).await;

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(interval) => {}
        }
        if cancel.is_cancelled() {
            break;
        }
        fetch_once(feed, fetcher.as_ref(), fetch_timeout, &pipeline).await;
    }

    states.set(feed, FeedTaskState::Stopping);
    tracing::info!(topic = %feed, "feed refresh task stopped");
    states.set(feed, FeedTaskState::Stopped);
}

async fn fetch_once(
    feed: FeedType,
    fetcher: &dyn FeedFetcher,
    fetch_timeout: Option<Duration>,
    pipeline: &IngestPipeline,
) {
    let started = Instant::now();
    let result = match fetch_timeout {
        Some(limit) => match tokio::time::timeout(limit, fetcher.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::msg(format!(
                "fetch exceeded {:.1}s timeout",
                limit.as_secs_f64()
            ))),
        },
        None => fetcher.fetch().await,
    };

    match result {
        Ok(batch) => {
            metrics::record_fetch(feed, started.elapsed());
            tracing::debug!(topic = %feed, entries = batch.len(), "feed refreshed");
            pipeline.ingest_batch(batch);
        }
        Err(error) => {
            metrics::record_fetch_error(feed);
            tracing::warn!(topic = %feed, error = %error, "feed fetch failed");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
