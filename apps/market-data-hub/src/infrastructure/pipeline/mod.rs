//! Ingest Pipeline
//!
//! The single write path every producer funnels through:
//! cache put → history append → snapshot export → broker publish.
//! Scheduled refreshes and stream ticks differ only in the first and last
//! step (whole-snapshot vs. single-entry, `Refresh` vs. `Tick` event).
//!
//! Nothing here propagates errors to the producer: history and export
//! failures are logged and counted, and the pipeline moves on.

use std::sync::Arc;

use crate::domain::feed::FeedType;
use crate::domain::history::HistoryRecord;
use crate::domain::market::{FeedBatch, FeedEvent, StreamTick};
use crate::infrastructure::broker::SubscriptionBroker;
use crate::infrastructure::cache::FeedCache;
use crate::infrastructure::export::SnapshotWriter;
use crate::infrastructure::history::HistoryStore;
use crate::infrastructure::metrics;

/// Shared write path into the cache, history store, and broker.
pub struct IngestPipeline {
    cache: Arc<FeedCache>,
    history: Arc<HistoryStore>,
    broker: Arc<SubscriptionBroker>,
    snapshots: Option<SnapshotWriter>,
}

impl IngestPipeline {
    /// Wire a pipeline over the shared state.
    #[must_use]
    pub const fn new(
        cache: Arc<FeedCache>,
        history: Arc<HistoryStore>,
        broker: Arc<SubscriptionBroker>,
        snapshots: Option<SnapshotWriter>,
    ) -> Self {
        Self {
            cache,
            history,
            broker,
            snapshots,
        }
    }

    /// The cache this pipeline writes into.
    #[must_use]
    pub const fn cache(&self) -> &Arc<FeedCache> {
        &self.cache
    }

    /// Ingest one scheduled refresh.
    pub fn ingest_batch(&self, batch: FeedBatch) {
        let feed = batch.feed();
        self.cache.put(batch.clone());
        self.append_series(&batch);

        if let Some(writer) = &self.snapshots
            && let Some(current) = self.cache.get(feed)
            && let Err(error) = writer.write(feed, &current)
        {
            tracing::warn!(topic = %feed, error = %error, "snapshot export failed");
        }

        self.broker.publish(&FeedEvent::Refresh { feed, batch });
    }

    /// Ingest one synthetic stream tick.
    pub fn ingest_tick(&self, tick: StreamTick) {
        let feed = tick.feed();
        self.cache.apply(&tick);

        let record = match &tick {
            StreamTick::Trade {
                symbol,
                price,
                volume,
                timestamp,
            } => HistoryRecord::new(symbol.clone(), *price, Some(*volume), *timestamp),
            StreamTick::Rate {
                pair,
                rate,
                timestamp,
            } => HistoryRecord::new(pair.clone(), *rate, None, *timestamp),
        };
        self.append(feed, record);
        metrics::record_stream_tick(feed);

        self.broker.publish(&FeedEvent::Tick { feed, tick });
    }

    /// One history record per symbol/pair for the numeric feeds. News and
    /// indicators carry no per-symbol numeric series; their state is
    /// covered by the cache and snapshot export.
    fn append_series(&self, batch: &FeedBatch) {
        match batch {
            FeedBatch::MarketIndices(indices) => {
                for quote in indices.values() {
                    self.append(
                        batch.feed(),
                        HistoryRecord::new(quote.symbol.clone(), quote.value, None, quote.timestamp),
                    );
                }
            }
            FeedBatch::StockQuotes(quotes) => {
                for quote in quotes.values() {
                    self.append(
                        batch.feed(),
                        HistoryRecord::new(
                            quote.symbol.clone(),
                            quote.price,
                            Some(quote.volume),
                            quote.timestamp,
                        ),
                    );
                }
            }
            FeedBatch::ForexRates(rates) => {
                for rate in rates.values() {
                    self.append(
                        batch.feed(),
                        HistoryRecord::new(rate.pair.clone(), rate.rate, None, rate.timestamp),
                    );
                }
            }
            FeedBatch::TariffNews(_) | FeedBatch::EconomicIndicators(_) => {}
        }
    }

    fn append(&self, feed: FeedType, record: HistoryRecord) {
        let series = record.series.clone();
        if let Err(error) = self.history.append(record) {
            tracing::warn!(topic = %feed, series, error = %error, "history append failed");
        } else {
            metrics::record_history_append(feed);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::Utc;

    use super::*;
    use crate::domain::market::{NewsItem, Sentiment, StockQuote};
    use crate::infrastructure::cache::CacheLimits;

    fn pipeline_with(
        snapshots: Option<SnapshotWriter>,
    ) -> (IngestPipeline, Arc<SubscriptionBroker>) {
        let cache = Arc::new(FeedCache::new(CacheLimits::default()));
        let history = Arc::new(HistoryStore::in_memory().unwrap());
        let broker = Arc::new(SubscriptionBroker::new(Arc::clone(&cache)));
        let pipeline = IngestPipeline::new(cache, history, Arc::clone(&broker), snapshots);
        (pipeline, broker)
    }

    fn quotes_batch() -> FeedBatch {
        let mut map = HashMap::new();
        map.insert(
            "BHP.AX".to_string(),
            StockQuote {
                symbol: "BHP.AX".to_string(),
                name: Some("BHP Group".to_string()),
                price: 44.5,
                change_pct: Some(1.1),
                volume: 320_000,
                timestamp: Utc::now(),
            },
        );
        FeedBatch::StockQuotes(map)
    }

    fn captured_events(broker: &SubscriptionBroker, feed: FeedType) -> Arc<Mutex<Vec<FeedEvent>>> {
        let events: Arc<Mutex<Vec<FeedEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        broker.subscribe_feed(
            feed,
            Arc::new(move |event| sink.lock().unwrap().push(event.clone())),
        );
        events
    }

    #[test]
    fn batch_flows_to_cache_history_and_subscribers() {
        let (pipeline, broker) = pipeline_with(None);
        let events = captured_events(&broker, FeedType::StockQuotes);

        pipeline.ingest_batch(quotes_batch());

        assert!(pipeline.cache().get(FeedType::StockQuotes).is_some());

        let history = pipeline.history.read("BHP.AX", None, None).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].volume, Some(320_000));

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], FeedEvent::Refresh { .. }));
    }

    #[test]
    fn news_batch_appends_no_series() {
        let (pipeline, _broker) = pipeline_with(None);
        pipeline.ingest_batch(FeedBatch::TariffNews(vec![NewsItem {
            id: "news-1-0".to_string(),
            headline: "ASX Drops as Tariff Tensions Escalate".to_string(),
            source: "Reuters".to_string(),
            url: "https://example.com/news/1".to_string(),
            timestamp: Utc::now(),
            sentiment: Sentiment::Negative,
            summary: String::new(),
        }]));

        assert!(pipeline.history.series_ids().is_empty());
        assert!(pipeline.cache().latest_news(5).is_some());
    }

    #[test]
    fn tick_flows_to_cache_history_and_subscribers() {
        let (pipeline, broker) = pipeline_with(None);
        let events = captured_events(&broker, FeedType::ForexRates);

        pipeline.ingest_tick(StreamTick::Rate {
            pair: "AUD/USD".to_string(),
            rate: 0.6689,
            timestamp: Utc::now(),
        });

        assert!(pipeline.cache().forex_rate("AUD/USD").is_some());
        assert_eq!(pipeline.history.read("AUD/USD", None, None).unwrap().len(), 1);

        let events = events.lock().unwrap();
        assert!(matches!(events[0], FeedEvent::Tick { .. }));
    }

    #[test]
    fn snapshot_export_written_on_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(dir.path().to_path_buf()).unwrap();
        let (pipeline, _broker) = pipeline_with(Some(writer));

        pipeline.ingest_batch(quotes_batch());

        assert!(dir.path().join("stock_quotes.json").exists());
    }
}
