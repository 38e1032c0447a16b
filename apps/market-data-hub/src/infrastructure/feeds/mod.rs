//! Synthetic Feed Fetchers
//!
//! The bundled `FeedFetcher` implementations, one per feed type. Each
//! generates a plausible batch from the catalog's value bands in place of
//! a real upstream API; a production deployment swaps these for HTTP
//! clients at hub-construction time without touching anything downstream.

pub mod catalog;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::application::ports::{FeedFetcher, FetchError};
use crate::domain::feed::FeedType;
use crate::domain::market::{
    CountryIndicators, FeedBatch, ForexRate, IndexQuote, IndicatorReading, NewsItem, Sentiment,
    StockQuote,
};
use crate::infrastructure::cache::FeedCache;

/// Articles generated per news fetch.
const NEWS_BATCH_SIZE: usize = 5;

/// Milliseconds in the 24h window news timestamps are spread over.
const NEWS_AGE_WINDOW_MS: i64 = 24 * 60 * 60 * 1000;

// =============================================================================
// Market Indices
// =============================================================================

/// Generates market index levels from the catalog bands.
#[derive(Debug, Default)]
pub struct SyntheticIndicesFetcher;

#[async_trait]
impl FeedFetcher for SyntheticIndicesFetcher {
    fn feed_type(&self) -> FeedType {
        FeedType::MarketIndices
    }

    async fn fetch(&self) -> Result<FeedBatch, FetchError> {
        let mut rng = rand::rng();
        let now = Utc::now();
        let indices: HashMap<String, IndexQuote> = catalog::MARKET_INDICES
            .iter()
            .map(|profile| {
                (
                    profile.symbol.to_string(),
                    IndexQuote {
                        symbol: profile.symbol.to_string(),
                        name: profile.name.to_string(),
                        value: rng.random_range(profile.low..profile.high),
                        change_pct: rng.random_range(-1.0..1.0),
                        timestamp: now,
                    },
                )
            })
            .collect();
        Ok(FeedBatch::MarketIndices(indices))
    }
}

// =============================================================================
// Forex Rates
// =============================================================================

/// Generates exchange rates from the catalog bands.
#[derive(Debug, Default)]
pub struct SyntheticForexFetcher;

#[async_trait]
impl FeedFetcher for SyntheticForexFetcher {
    fn feed_type(&self) -> FeedType {
        FeedType::ForexRates
    }

    async fn fetch(&self) -> Result<FeedBatch, FetchError> {
        let mut rng = rand::rng();
        let now = Utc::now();
        let rates: HashMap<String, ForexRate> = catalog::FOREX_PAIRS
            .iter()
            .map(|profile| {
                (
                    profile.pair.to_string(),
                    ForexRate {
                        pair: profile.pair.to_string(),
                        rate: rng.random_range(profile.low..profile.high),
                        change_pct: Some(rng.random_range(-0.5..0.5)),
                        timestamp: now,
                    },
                )
            })
            .collect();
        Ok(FeedBatch::ForexRates(rates))
    }
}

// =============================================================================
// Stock Quotes
// =============================================================================

/// Generates stock quotes, drifting ±1% off the cached price once one
/// exists and seeding from the sector band otherwise.
pub struct SyntheticQuotesFetcher {
    cache: Arc<FeedCache>,
}

impl SyntheticQuotesFetcher {
    /// Create a fetcher drifting off the given cache.
    #[must_use]
    pub const fn new(cache: Arc<FeedCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl FeedFetcher for SyntheticQuotesFetcher {
    fn feed_type(&self) -> FeedType {
        FeedType::StockQuotes
    }

    async fn fetch(&self) -> Result<FeedBatch, FetchError> {
        let mut rng = rand::rng();
        let now = Utc::now();
        let quotes: HashMap<String, StockQuote> = catalog::ASX_STOCKS
            .iter()
            .map(|&symbol| {
                let price = match self.cache.stock_price(symbol) {
                    Some(last) => last + last * rng.random_range(-0.01..0.01),
                    None => {
                        let (low, high) = catalog::stock_seed_band(symbol);
                        rng.random_range(low..high)
                    }
                };
                (
                    symbol.to_string(),
                    StockQuote {
                        symbol: symbol.to_string(),
                        name: catalog::stock_name(symbol).map(str::to_string),
                        price,
                        change_pct: Some(rng.random_range(-2.0..2.0)),
                        volume: rng.random_range(100_000..1_000_000),
                        timestamp: now,
                    },
                )
            })
            .collect();
        Ok(FeedBatch::StockQuotes(quotes))
    }
}

// =============================================================================
// Tariff News
// =============================================================================

/// Generates tariff news articles from the headline and source pools.
#[derive(Debug, Default)]
pub struct SyntheticNewsFetcher;

fn sample_sentiment<R: Rng>(rng: &mut R) -> Sentiment {
    // Weighted 0.3 / 0.4 / 0.3, matching the observed coverage mix.
    let roll: f64 = rng.random_range(0.0..1.0);
    if roll < 0.3 {
        Sentiment::Positive
    } else if roll < 0.7 {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

#[async_trait]
impl FeedFetcher for SyntheticNewsFetcher {
    fn feed_type(&self) -> FeedType {
        FeedType::TariffNews
    }

    async fn fetch(&self) -> Result<FeedBatch, FetchError> {
        let mut rng = rand::rng();
        let now_ms = Utc::now().timestamp_millis();

        let mut items: Vec<NewsItem> = (0..NEWS_BATCH_SIZE)
            .map(|seq| {
                let headline = catalog::NEWS_HEADLINES
                    .choose(&mut rng)
                    .copied()
                    .unwrap_or_default();
                let source = catalog::NEWS_SOURCES
                    .choose(&mut rng)
                    .copied()
                    .unwrap_or_default();
                let published_ms = now_ms - rng.random_range(0..NEWS_AGE_WINDOW_MS);
                NewsItem {
                    // Sequence suffix keeps ids unique within a batch even
                    // when two articles land on the same millisecond.
                    id: format!("news-{published_ms}-{seq}"),
                    headline: headline.to_string(),
                    source: source.to_string(),
                    url: format!("https://example.com/news/{published_ms}"),
                    timestamp: DateTime::from_timestamp_millis(published_ms)
                        .unwrap_or_else(Utc::now),
                    sentiment: sample_sentiment(&mut rng),
                    summary: format!(
                        "This is a summary of the news article about {}. The article \
                         discusses the potential impact on markets and specific companies.",
                        headline.to_lowercase()
                    ),
                }
            })
            .collect();

        items.sort_by_key(|item| std::cmp::Reverse(item.timestamp));
        Ok(FeedBatch::TariffNews(items))
    }
}

// =============================================================================
// Economic Indicators
// =============================================================================

/// Generates per-country indicator readings from the catalog bands.
#[derive(Debug, Default)]
pub struct SyntheticIndicatorsFetcher;

#[async_trait]
impl FeedFetcher for SyntheticIndicatorsFetcher {
    fn feed_type(&self) -> FeedType {
        FeedType::EconomicIndicators
    }

    async fn fetch(&self) -> Result<FeedBatch, FetchError> {
        let mut rng = rand::rng();
        let now = Utc::now();
        let indicators: HashMap<String, CountryIndicators> = catalog::ECONOMIC_INDICATORS
            .iter()
            .map(|country| {
                let readings: CountryIndicators = country
                    .indicators
                    .iter()
                    .map(|profile| {
                        (
                            profile.name.to_string(),
                            IndicatorReading {
                                value: rng.random_range(profile.value.0..profile.value.1),
                                previous: rng
                                    .random_range(profile.previous.0..profile.previous.1),
                                timestamp: now,
                            },
                        )
                    })
                    .collect();
                (country.country.to_string(), readings)
            })
            .collect();
        Ok(FeedBatch::EconomicIndicators(indicators))
    }
}

// =============================================================================
// Wiring
// =============================================================================

/// The full synthetic fetcher set, one per feed type.
#[must_use]
pub fn default_fetchers(cache: &Arc<FeedCache>) -> HashMap<FeedType, Arc<dyn FeedFetcher>> {
    let mut fetchers: HashMap<FeedType, Arc<dyn FeedFetcher>> = HashMap::new();
    fetchers.insert(FeedType::MarketIndices, Arc::new(SyntheticIndicesFetcher));
    fetchers.insert(FeedType::ForexRates, Arc::new(SyntheticForexFetcher));
    fetchers.insert(
        FeedType::StockQuotes,
        Arc::new(SyntheticQuotesFetcher::new(Arc::clone(cache))),
    );
    fetchers.insert(FeedType::TariffNews, Arc::new(SyntheticNewsFetcher));
    fetchers.insert(
        FeedType::EconomicIndicators,
        Arc::new(SyntheticIndicatorsFetcher),
    );
    fetchers
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::infrastructure::cache::CacheLimits;

    #[tokio::test]
    async fn indices_batch_covers_the_universe() {
        let batch = SyntheticIndicesFetcher.fetch().await.unwrap();
        let FeedBatch::MarketIndices(indices) = batch else {
            panic!("expected indices batch");
        };
        assert_eq!(indices.len(), catalog::MARKET_INDICES.len());
        let axjo = &indices["^AXJO"];
        assert_eq!(axjo.name, "ASX 200");
        assert!((7400.0..7500.0).contains(&axjo.value));
        assert!((-1.0..=1.0).contains(&axjo.change_pct));
    }

    #[tokio::test]
    async fn forex_batch_stays_in_band() {
        let batch = SyntheticForexFetcher.fetch().await.unwrap();
        let FeedBatch::ForexRates(rates) = batch else {
            panic!("expected forex batch");
        };
        assert_eq!(rates.len(), catalog::FOREX_PAIRS.len());
        assert!((0.65..0.70).contains(&rates["AUD/USD"].rate));
    }

    #[tokio::test]
    async fn quotes_seed_from_band_then_drift_from_cache() {
        let cache = Arc::new(FeedCache::new(CacheLimits::default()));
        let fetcher = SyntheticQuotesFetcher::new(Arc::clone(&cache));

        let batch = fetcher.fetch().await.unwrap();
        let FeedBatch::StockQuotes(quotes) = &batch else {
            panic!("expected quotes batch");
        };
        assert_eq!(quotes.len(), catalog::ASX_STOCKS.len());
        assert!((250.0..270.0).contains(&quotes["CSL.AX"].price));

        cache.put(batch.clone());
        let second = fetcher.fetch().await.unwrap();
        let FeedBatch::StockQuotes(drifted) = second else {
            panic!("expected quotes batch");
        };
        let before = quotes["CSL.AX"].price;
        let after = drifted["CSL.AX"].price;
        assert!((after - before).abs() <= before * 0.01 + f64::EPSILON);
    }

    #[tokio::test]
    async fn news_batch_has_unique_ids_sorted_newest_first() {
        let batch = SyntheticNewsFetcher.fetch().await.unwrap();
        let FeedBatch::TariffNews(items) = batch else {
            panic!("expected news batch");
        };
        assert_eq!(items.len(), NEWS_BATCH_SIZE);

        let ids: HashSet<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids.len(), items.len());

        for pair in items.windows(2) {
            assert!(pair[0].timestamp >= pair[1].timestamp);
        }
        for item in &items {
            assert!(catalog::NEWS_HEADLINES.contains(&item.headline.as_str()));
            assert!(catalog::NEWS_SOURCES.contains(&item.source.as_str()));
        }
    }

    #[tokio::test]
    async fn indicators_cover_countries_and_names() {
        let batch = SyntheticIndicatorsFetcher.fetch().await.unwrap();
        let FeedBatch::EconomicIndicators(map) = batch else {
            panic!("expected indicators batch");
        };
        assert_eq!(map.len(), 3);
        let us = &map["US"];
        assert_eq!(us.len(), 4);
        let rate = &us["Interest Rate"];
        assert!((4.4..4.6).contains(&rate.value));
    }

    #[test]
    fn default_set_covers_every_feed() {
        let cache = Arc::new(FeedCache::new(CacheLimits::default()));
        let fetchers = default_fetchers(&cache);
        for feed in FeedType::ALL {
            assert_eq!(fetchers[&feed].feed_type(), feed);
        }
    }
}
