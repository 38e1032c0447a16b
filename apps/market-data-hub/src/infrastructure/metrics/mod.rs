//! Prometheus Metrics Module
//!
//! Exposes hub metrics via Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Fetches**: scheduled fetch attempts, failures, and durations per feed
//! - **Streams**: synthetic ticks produced per feed
//! - **Fan-out**: publishes, deliveries, and callback panics
//! - **History**: records appended
//!
//! Metrics are rendered at `/metrics` on the health server port.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::domain::feed::FeedType;

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// # Panics
///
/// Panics if the recorder cannot be installed.
#[allow(clippy::expect_used)]
pub fn init_metrics() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let builder = PrometheusBuilder::new();
            let handle = builder
                .install_recorder()
                .expect("failed to install Prometheus recorder");

            register_metrics();
            handle
        })
        .clone()
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "market_hub_fetches_total",
        "Scheduled fetches completed successfully, per feed"
    );
    describe_counter!(
        "market_hub_fetch_errors_total",
        "Scheduled fetches that failed or timed out, per feed"
    );
    describe_counter!(
        "market_hub_stream_ticks_total",
        "Synthetic stream ticks produced, per feed"
    );
    describe_counter!(
        "market_hub_publishes_total",
        "Events published to subscribers, per topic"
    );
    describe_counter!(
        "market_hub_deliveries_total",
        "Per-subscriber deliveries, per topic"
    );
    describe_counter!(
        "market_hub_callback_panics_total",
        "Subscriber callbacks that panicked during delivery"
    );
    describe_counter!(
        "market_hub_history_records_total",
        "Records appended to the historical store"
    );

    describe_gauge!(
        "market_hub_subscribers",
        "Currently registered subscriber callbacks, per topic"
    );

    describe_histogram!(
        "market_hub_fetch_duration_seconds",
        "Wall-clock duration of scheduled fetches"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Record a successful scheduled fetch and its duration.
pub fn record_fetch(feed: FeedType, duration: Duration) {
    counter!("market_hub_fetches_total", "feed" => feed.topic()).increment(1);
    histogram!("market_hub_fetch_duration_seconds", "feed" => feed.topic())
        .record(duration.as_secs_f64());
}

/// Record a failed scheduled fetch.
pub fn record_fetch_error(feed: FeedType) {
    counter!("market_hub_fetch_errors_total", "feed" => feed.topic()).increment(1);
}

/// Record one synthetic stream tick.
pub fn record_stream_tick(feed: FeedType) {
    counter!("market_hub_stream_ticks_total", "feed" => feed.topic()).increment(1);
}

/// Record a publish and how many subscribers it reached.
pub fn record_publish(feed: FeedType, delivered: u64) {
    counter!("market_hub_publishes_total", "topic" => feed.topic()).increment(1);
    counter!("market_hub_deliveries_total", "topic" => feed.topic()).increment(delivered);
}

/// Record a subscriber callback panic.
pub fn record_callback_panic(feed: FeedType) {
    counter!("market_hub_callback_panics_total", "topic" => feed.topic()).increment(1);
}

/// Record one appended history record.
pub fn record_history_append(feed: FeedType) {
    counter!("market_hub_history_records_total", "feed" => feed.topic()).increment(1);
}

/// Update the subscriber count for a topic.
pub fn set_subscribers(feed: FeedType, count: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("market_hub_subscribers", "topic" => feed.topic()).set(count as f64);
}

// =============================================================================
// Tests
// =============================================================================
