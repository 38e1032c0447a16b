//! Market Data Hub
//!
//! Composition root: owns the cache, history store, and broker, wires the
//! per-feed fetchers into the scheduler and the stream simulator, and
//! exposes the read surface external consumers use.
//!
//! Hubs are explicitly constructed and passed to callers — there is no
//! process-wide instance, so tests and embedders can run several
//! independent hubs in one process.
//!
//! # Lifecycle
//!
//! `start()` spawns five scheduler tasks and two stream tasks sharing one
//! cancellation token. `stop()` cancels the token and returns immediately;
//! tasks observe cancellation at their next wake (the token also
//! interrupts in-progress interval sleeps). `shutdown()` additionally
//! awaits every task handle under a bounded timeout, for callers that
//! need the stronger guarantee.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::application::ports::FeedFetcher;
use crate::domain::feed::{FeedType, UnknownTopic};
use crate::domain::history::HistoryRecord;
use crate::domain::market::{CountryIndicators, FeedBatch, NewsItem, StockQuote};
use crate::infrastructure::broker::{
    BrokerError, SubscriberCallback, SubscriptionBroker, SubscriptionId,
};
use crate::infrastructure::cache::{CacheLimits, FeedCache};
use crate::infrastructure::config::{ConfigError, HubConfig};
use crate::infrastructure::export::{ExportError, SnapshotWriter};
use crate::infrastructure::feeds;
use crate::infrastructure::history::{HistoryError, HistoryStore};
use crate::infrastructure::pipeline::IngestPipeline;
use crate::infrastructure::scheduler::{FeedScheduler, FeedStates, FeedTaskState};
use crate::infrastructure::stream::StreamSimulator;

/// Errors from hub construction.
#[derive(Debug, thiserror::Error)]
pub enum HubBuildError {
    /// Configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// History store could not be opened.
    #[error(transparent)]
    History(#[from] HistoryError),

    /// Snapshot directory could not be prepared.
    #[error(transparent)]
    Export(#[from] ExportError),
}

struct RuntimeState {
    running: bool,
    cancel: Option<CancellationToken>,
    handles: Vec<JoinHandle<()>>,
}

/// The data hub: five scheduled feeds plus two synthetic streams funneled
/// into one cache / history / pub-sub pipeline.
pub struct MarketDataHub {
    config: HubConfig,
    cache: Arc<FeedCache>,
    history: Arc<HistoryStore>,
    broker: Arc<SubscriptionBroker>,
    pipeline: Arc<IngestPipeline>,
    states: Arc<FeedStates>,
    fetchers: HashMap<FeedType, Arc<dyn FeedFetcher>>,
    runtime: Mutex<RuntimeState>,
}

/// Builder for [`MarketDataHub`]; swap any feed's fetcher before `build`.
pub struct MarketDataHubBuilder {
    config: HubConfig,
    overrides: Vec<Arc<dyn FeedFetcher>>,
}

impl MarketDataHubBuilder {
    /// Replace the fetcher for the feed type the given fetcher reports.
    #[must_use]
    pub fn fetcher(mut self, fetcher: Arc<dyn FeedFetcher>) -> Self {
        self.overrides.push(fetcher);
        self
    }

    /// Construct the hub. Does not spawn anything.
    ///
    /// # Errors
    ///
    /// Returns `HubBuildError` for invalid configuration or when the
    /// configured storage locations cannot be prepared.
    pub fn build(self) -> Result<MarketDataHub, HubBuildError> {
        self.config.validate()?;

        let cache = Arc::new(FeedCache::new(CacheLimits {
            news_items: self.config.retention.news_items,
            entries_per_feed: self.config.retention.max_entries_per_feed,
        }));
        let history = Arc::new(HistoryStore::open(
            self.config.storage.history_dir(),
            self.config.retention.max_series_len,
        )?);
        let broker = Arc::new(SubscriptionBroker::new(Arc::clone(&cache)));

        let snapshots = match &self.config.storage.data_dir {
            Some(dir) => Some(SnapshotWriter::new(dir.clone())?),
            None => None,
        };
        let pipeline = Arc::new(IngestPipeline::new(
            Arc::clone(&cache),
            Arc::clone(&history),
            Arc::clone(&broker),
            snapshots,
        ));

        let mut fetchers = feeds::default_fetchers(&cache);
        for fetcher in self.overrides {
            fetchers.insert(fetcher.feed_type(), fetcher);
        }

        Ok(MarketDataHub {
            config: self.config,
            cache,
            history,
            broker,
            pipeline,
            states: Arc::new(FeedStates::new()),
            fetchers,
            runtime: Mutex::new(RuntimeState {
                running: false,
                cancel: None,
                handles: Vec::new(),
            }),
        })
    }
}

impl MarketDataHub {
    /// Start building a hub with the given configuration.
    #[must_use]
    pub fn builder(config: HubConfig) -> MarketDataHubBuilder {
        MarketDataHubBuilder {
            config,
            overrides: Vec::new(),
        }
    }

    /// Hub with the bundled synthetic fetchers.
    ///
    /// # Errors
    ///
    /// See [`MarketDataHubBuilder::build`].
    pub fn with_defaults(config: HubConfig) -> Result<Self, HubBuildError> {
        Self::builder(config).build()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Spawn the producer tasks. Must be called within a Tokio runtime.
    /// Warns and returns when the hub is already running.
    pub fn start(&self) {
        let mut runtime = self.runtime.lock();
        if runtime.running {
            tracing::warn!("market data hub is already running");
            return;
        }

        let cancel = CancellationToken::new();
        let scheduler = FeedScheduler::new(Arc::clone(&self.pipeline), Arc::clone(&self.states));

        let mut handles = Vec::with_capacity(FeedType::ALL.len() + 2);
        for feed in FeedType::ALL {
            if let Some(fetcher) = self.fetchers.get(&feed) {
                handles.push(scheduler.spawn(
                    Arc::clone(fetcher),
                    self.config.refresh.interval(feed),
                    self.config.refresh.fetch_timeout,
                    cancel.clone(),
                ));
            }
        }

        let simulator = StreamSimulator::new(Arc::clone(&self.pipeline), &self.config.stream);
        handles.extend(simulator.spawn(cancel.clone()));

        runtime.cancel = Some(cancel);
        runtime.handles = handles;
        runtime.running = true;
        tracing::info!(tasks = runtime.handles.len(), "market data hub started");
    }

    /// Request shutdown and return immediately, without waiting for the
    /// producer tasks to finish. Warns when the hub is not running.
    pub fn stop(&self) {
        let mut runtime = self.runtime.lock();
        if !runtime.running {
            tracing::warn!("market data hub is not running");
            return;
        }
        if let Some(cancel) = runtime.cancel.take() {
            cancel.cancel();
        }
        runtime.running = false;
        tracing::info!("market data hub stop requested");
    }

    /// Stop and await every producer task, up to `timeout`.
    pub async fn shutdown(&self, timeout: Duration) {
        if self.is_running() {
            self.stop();
        }
        let handles = {
            let mut runtime = self.runtime.lock();
            std::mem::take(&mut runtime.handles)
        };
        if handles.is_empty() {
            return;
        }

        if tokio::time::timeout(timeout, futures::future::join_all(handles))
            .await
            .is_err()
        {
            tracing::warn!(
                timeout_secs = timeout.as_secs_f64(),
                "tasks did not stop within the shutdown timeout"
            );
        } else {
            tracing::info!("market data hub stopped");
        }
    }

    /// Whether `start()` has been called without a matching `stop()`.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.runtime.lock().running
    }

    /// Refresh task state for one feed.
    #[must_use]
    pub fn feed_state(&self, feed: FeedType) -> FeedTaskState {
        self.states.get(feed)
    }

    // =========================================================================
    // Read Surface
    // =========================================================================

    /// Current snapshot for a feed, or `None` if never populated.
    #[must_use]
    pub fn data(&self, feed: FeedType) -> Option<FeedBatch> {
        self.cache.get(feed)
    }

    /// Current snapshot by topic name.
    ///
    /// # Errors
    ///
    /// `UnknownTopic` for a name that is not one of the five feed topics.
    pub fn data_by_topic(&self, topic: &str) -> Result<Option<FeedBatch>, UnknownTopic> {
        Ok(self.cache.get(topic.parse()?))
    }

    /// Time since the feed's last write, or `None` if never populated.
    #[must_use]
    pub fn data_age(&self, feed: FeedType) -> Option<Duration> {
        self.cache.age(feed)
    }

    /// Feed age by topic name.
    ///
    /// # Errors
    ///
    /// `UnknownTopic` for a name that is not one of the five feed topics.
    pub fn data_age_by_topic(&self, topic: &str) -> Result<Option<Duration>, UnknownTopic> {
        Ok(self.cache.age(topic.parse()?))
    }

    /// Stock quotes, optionally filtered by symbol.
    #[must_use]
    pub fn stock_quotes(&self, symbols: Option<&[String]>) -> Option<HashMap<String, StockQuote>> {
        self.cache.stock_quotes(symbols)
    }

    /// Economic indicators, optionally filtered by country.
    #[must_use]
    pub fn economic_indicators(
        &self,
        countries: Option<&[String]>,
    ) -> Option<HashMap<String, CountryIndicators>> {
        self.cache.economic_indicators(countries)
    }

    /// The most recent news items, newest first.
    #[must_use]
    pub fn latest_news(&self, limit: usize) -> Option<Vec<NewsItem>> {
        self.cache.latest_news(limit)
    }

    /// Historical records for a symbol/pair, filtered to an inclusive
    /// timestamp range. `None` for a series never appended to.
    #[must_use]
    pub fn history(
        &self,
        series: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Option<Vec<HistoryRecord>> {
        self.history.read(series, start, end)
    }

    /// Subscribe a callback to a topic; the cached snapshot, if any, is
    /// delivered before this returns.
    ///
    /// # Errors
    ///
    /// See [`SubscriptionBroker::subscribe`].
    pub fn subscribe(
        &self,
        topic: &str,
        callback: SubscriberCallback,
    ) -> Result<SubscriptionId, BrokerError> {
        self.broker.subscribe(topic, callback)
    }

    /// Remove a subscription from a topic.
    ///
    /// # Errors
    ///
    /// See [`SubscriptionBroker::unsubscribe`].
    pub fn unsubscribe(&self, topic: &str, id: SubscriptionId) -> Result<(), BrokerError> {
        self.broker.unsubscribe(topic, id)
    }

    // =========================================================================
    // Component Access (wiring, tests)
    // =========================================================================

    /// The shared cache.
    #[must_use]
    pub const fn cache(&self) -> &Arc<FeedCache> {
        &self.cache
    }

    /// The shared history store.
    #[must_use]
    pub const fn history_store(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    /// The subscription broker.
    #[must_use]
    pub const fn broker(&self) -> &Arc<SubscriptionBroker> {
        &self.broker
    }

    /// Per-feed task states.
    #[must_use]
    pub const fn states(&self) -> &Arc<FeedStates> {
        &self.states
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_hub_has_no_data() {
        let hub = MarketDataHub::with_defaults(HubConfig::default()).unwrap();
        assert!(!hub.is_running());
        for feed in FeedType::ALL {
            assert!(hub.data(feed).is_none());
            assert!(hub.data_age(feed).is_none());
            assert_eq!(hub.feed_state(feed), FeedTaskState::Idle);
        }
        assert!(hub.history("BHP.AX", None, None).is_none());
    }

    #[test]
    fn topic_surface_rejects_unknown_names() {
        let hub = MarketDataHub::with_defaults(HubConfig::default()).unwrap();
        assert!(hub.data_by_topic("stock_quotes").unwrap().is_none());
        assert!(hub.data_by_topic("options").is_err());
        assert!(hub.data_age_by_topic("forex").is_err());
    }

    #[test]
    fn invalid_config_fails_build() {
        let mut config = HubConfig::default();
        config.retention.news_items = 0;
        assert!(matches!(
            MarketDataHub::with_defaults(config),
            Err(HubBuildError::Config(_))
        ));
    }

    #[tokio::test]
    async fn stop_without_start_is_harmless() {
        let hub = MarketDataHub::with_defaults(HubConfig::default()).unwrap();
        hub.stop();
        hub.shutdown(Duration::from_millis(100)).await;
        assert!(!hub.is_running());
    }

    #[tokio::test]
    async fn double_start_keeps_one_task_set() {
        let hub = MarketDataHub::with_defaults(HubConfig::default()).unwrap();
        hub.start();
        assert!(hub.is_running());
        hub.start();
        assert!(hub.is_running());

        hub.shutdown(Duration::from_secs(2)).await;
        assert!(!hub.is_running());
        for feed in FeedType::ALL {
            assert_eq!(hub.feed_state(feed), FeedTaskState::Stopped);
        }
    }
}
