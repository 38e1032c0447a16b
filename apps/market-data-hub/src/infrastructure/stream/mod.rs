//! Stream Simulator
//!
//! Two always-on tasks that synthesize incremental updates at a higher
//! frequency than the scheduled feeds: one trade tick per interval on a
//! random tracked stock, one rate move per interval on a random currency
//! pair. Both push through the same pipeline as the scheduler, so a
//! consumer can only tell the paths apart by the payload's `type` tag.
//!
//! Each tick drifts off the last cached value; when a symbol has never
//! been cached, a plausible seed is drawn from the catalog band.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use rand::seq::IndexedRandom;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::domain::market::StreamTick;
use crate::infrastructure::cache::FeedCache;
use crate::infrastructure::config::StreamSettings;
use crate::infrastructure::feeds::catalog;
use crate::infrastructure::pipeline::IngestPipeline;

/// Relative size of one synthetic trade move.
const TRADE_DRIFT: f64 = 0.005;

/// Relative size of one synthetic rate move.
const RATE_DRIFT: f64 = 0.002;

/// Seed band for stocks first seen on the stream path.
const STREAM_SEED_BAND: (f64, f64) = (10.0, 100.0);

/// Spawns the synthetic quote and rate streams.
pub struct StreamSimulator {
    pipeline: Arc<IngestPipeline>,
    symbols: Vec<String>,
    pairs: Vec<String>,
    quote_interval: Duration,
    rate_interval: Duration,
}

impl StreamSimulator {
    /// Simulator over the full catalog universe.
    #[must_use]
    pub fn new(pipeline: Arc<IngestPipeline>, settings: &StreamSettings) -> Self {
        Self::with_universe(
            pipeline,
            settings,
            catalog::ASX_STOCKS.iter().map(|s| (*s).to_string()).collect(),
            catalog::FOREX_PAIRS
                .iter()
                .map(|p| p.pair.to_string())
                .collect(),
        )
    }

    /// Simulator over an explicit symbol/pair universe.
    #[must_use]
    pub const fn with_universe(
        pipeline: Arc<IngestPipeline>,
        settings: &StreamSettings,
        symbols: Vec<String>,
        pairs: Vec<String>,
    ) -> Self {
        Self {
            pipeline,
            symbols,
            pairs,
            quote_interval: settings.quote_interval,
            rate_interval: settings.rate_interval,
        }
    }

    /// Spawn both stream tasks; they run until the token is cancelled.
    #[must_use]
    pub fn spawn(&self, cancel: CancellationToken) -> Vec<JoinHandle<()>> {
        vec![
            self.spawn_stream("quote stream", self.quote_interval, {
                let symbols = self.symbols.clone();
                move |cache| next_trade_tick(cache, &symbols)
            }, cancel.clone()),
            self.spawn_stream("rate stream", self.rate_interval, {
                let pairs = self.pairs.clone();
                move |cache| next_rate_tick(cache, &pairs)
            }, cancel),
        ]
    }

    fn spawn_stream<F>(
        &self,
        label: &'static str,
        interval: Duration,
        mut next_tick: F,
        cancel: CancellationToken,
    ) -> JoinHandle<()>
    where
        F: FnMut(&FeedCache) -> Option<StreamTick> + Send + 'static,
    {
        let pipeline = Arc::clone(&self.pipeline);
        tokio::spawn(async move {
            tracing::info!(stream = label, interval_secs = interval.as_secs_f64(), "stream task started");
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(interval) => {}
                }
                if cancel.is_cancelled() {
                    break;
                }
                if let Some(tick) = next_tick(pipeline.cache().as_ref()) {
                    tracing::debug!(stream = label, key = tick.key(), "tick");
                    pipeline.ingest_tick(tick);
                }
            }
            tracing::info!(stream = label, "stream task stopped");
        })
    }
}

/// One synthetic trade on a random tracked stock.
fn next_trade_tick(cache: &FeedCache, symbols: &[String]) -> Option<StreamTick> {
    let mut rng = rand::rng();
    let symbol = symbols.choose(&mut rng)?;

    let last = cache
        .stock_price(symbol)
        .unwrap_or_else(|| rng.random_range(STREAM_SEED_BAND.0..STREAM_SEED_BAND.1));
    let price = last + last * rng.random_range(-TRADE_DRIFT..TRADE_DRIFT);

    Some(StreamTick::Trade {
        symbol: symbol.clone(),
        price,
        volume: rng.random_range(1_000..10_000),
        timestamp: Utc::now(),
    })
}

/// One synthetic move on a random tracked currency pair.
fn next_rate_tick(cache: &FeedCache, pairs: &[String]) -> Option<StreamTick> {
    let mut rng = rand::rng();
    let pair = pairs.choose(&mut rng)?;

    let last = cache.forex_rate(pair).unwrap_or_else(|| {
        let (low, high) = catalog::pair_seed_band(pair);
        rng.random_range(low..high)
    });
    let rate = last + last * rng.random_range(-RATE_DRIFT..RATE_DRIFT);

    Some(StreamTick::Rate {
        pair: pair.clone(),
        rate,
        timestamp: Utc::now(),
    })
}

// =============================================================================
// Tests
// =============================================================================
