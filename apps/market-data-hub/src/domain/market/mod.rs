//! Market Data Payload Types
//!
//! Canonical internal representation of everything the feeds produce:
//! index levels, exchange rates, stock quotes, news articles, and
//! per-country indicator readings, plus the snapshot/delta envelopes
//! the broker delivers to subscribers.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::feed::FeedType;

// =============================================================================
// Per-Entry Payloads
// =============================================================================

/// Level of one tracked equity index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexQuote {
    /// Index symbol (e.g. `^AXJO`).
    pub symbol: String,
    /// Display name (e.g. "ASX 200").
    pub name: String,
    /// Current index level.
    pub value: f64,
    /// Percentage change since the prior session.
    pub change_pct: f64,
    /// Capture time.
    pub timestamp: DateTime<Utc>,
}

/// Exchange rate of one tracked currency pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForexRate {
    /// Pair in `BASE/QUOTE` form (e.g. `AUD/USD`).
    pub pair: String,
    /// Current exchange rate.
    pub rate: f64,
    /// Percentage change; absent on stream-sourced entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_pct: Option<f64>,
    /// Capture time.
    pub timestamp: DateTime<Utc>,
}

/// Quote for one tracked stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockQuote {
    /// Ticker symbol (e.g. `BHP.AX`).
    pub symbol: String,
    /// Display name; absent on stream-sourced entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Last price.
    pub price: f64,
    /// Percentage change; absent on stream-sourced entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_pct: Option<f64>,
    /// Traded volume.
    pub volume: u64,
    /// Capture time.
    pub timestamp: DateTime<Utc>,
}

/// Sentiment classification attached to a news article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    /// Market-positive coverage.
    Positive,
    /// Market-negative coverage.
    Negative,
    /// Neither.
    Neutral,
}

/// One tariff/trade news article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    /// Unique id within the news cache (`news-{timestamp_ms}-{seq}`).
    pub id: String,
    /// Article headline.
    pub headline: String,
    /// Publishing outlet.
    pub source: String,
    /// Link to the article.
    pub url: String,
    /// Publication time.
    pub timestamp: DateTime<Utc>,
    /// Sentiment classification.
    pub sentiment: Sentiment,
    /// Short summary.
    pub summary: String,
}

/// One reading of an economic indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorReading {
    /// Current value (percentage points).
    pub value: f64,
    /// Prior reading.
    pub previous: f64,
    /// Capture time.
    pub timestamp: DateTime<Utc>,
}

/// Indicator readings for one country, keyed by indicator name.
pub type CountryIndicators = HashMap<String, IndicatorReading>;

// =============================================================================
// Feed Snapshots and Stream Deltas
// =============================================================================

/// Complete snapshot of one feed's data, as produced by a scheduled fetch
/// and as held by the cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeedBatch {
    /// Index levels keyed by symbol.
    MarketIndices(HashMap<String, IndexQuote>),
    /// Exchange rates keyed by pair.
    ForexRates(HashMap<String, ForexRate>),
    /// Stock quotes keyed by symbol.
    StockQuotes(HashMap<String, StockQuote>),
    /// News articles, newest first.
    TariffNews(Vec<NewsItem>),
    /// Indicator readings keyed by country.
    EconomicIndicators(HashMap<String, CountryIndicators>),
}

impl FeedBatch {
    /// Feed type this snapshot belongs to.
    #[must_use]
    pub const fn feed(&self) -> FeedType {
        match self {
            Self::MarketIndices(_) => FeedType::MarketIndices,
            Self::ForexRates(_) => FeedType::ForexRates,
            Self::StockQuotes(_) => FeedType::StockQuotes,
            Self::TariffNews(_) => FeedType::TariffNews,
            Self::EconomicIndicators(_) => FeedType::EconomicIndicators,
        }
    }

    /// Number of entries (symbols, pairs, articles, or countries).
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::MarketIndices(map) => map.len(),
            Self::ForexRates(map) => map.len(),
            Self::StockQuotes(map) => map.len(),
            Self::TariffNews(items) => items.len(),
            Self::EconomicIndicators(map) => map.len(),
        }
    }

    /// Whether the snapshot holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Incremental update synthesized by one of the streaming tasks.
///
/// The `type` tag (`trade` / `rate`) is the only thing that distinguishes
/// a stream-sourced update from a scheduled refresh once it reaches a
/// subscriber.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamTick {
    /// Simulated trade on a tracked stock.
    Trade {
        /// Ticker symbol.
        symbol: String,
        /// Trade price.
        price: f64,
        /// Trade volume.
        volume: u64,
        /// Tick time.
        timestamp: DateTime<Utc>,
    },
    /// Simulated move on a tracked currency pair.
    Rate {
        /// Currency pair.
        pair: String,
        /// New exchange rate.
        rate: f64,
        /// Tick time.
        timestamp: DateTime<Utc>,
    },
}

impl StreamTick {
    /// Feed type this tick updates.
    #[must_use]
    pub const fn feed(&self) -> FeedType {
        match self {
            Self::Trade { .. } => FeedType::StockQuotes,
            Self::Rate { .. } => FeedType::ForexRates,
        }
    }

    /// Symbol or pair this tick is for.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Trade { symbol, .. } => symbol,
            Self::Rate { pair, .. } => pair,
        }
    }
}

/// Update delivered to subscribers of a topic.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedEvent {
    /// Whole-feed snapshot from a scheduled refresh, also used for the
    /// initial delivery when a subscriber registers.
    Refresh {
        /// Feed the snapshot belongs to.
        feed: FeedType,
        /// The snapshot.
        batch: FeedBatch,
    },
    /// Single-entry update from a streaming task.
    Tick {
        /// Feed the update belongs to.
        feed: FeedType,
        /// The update.
        tick: StreamTick,
    },
}

impl FeedEvent {
    /// Topic this event is published under.
    #[must_use]
    pub const fn feed(&self) -> FeedType {
        match self {
            Self::Refresh { feed, .. } | Self::Tick { feed, .. } => *feed,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
