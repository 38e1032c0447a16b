//! Feed Cache
//!
//! Thread-safe store of the latest-known snapshot per feed type, with a
//! freshness instant stamped on every successful write.
//!
//! # Semantics
//!
//! - Writes are last-write-wins per feed type: a scheduled refresh replaces
//!   the whole snapshot. The one exception is tariff news, which merges:
//!   new items are prepended, de-duplicated by id, and the list truncated
//!   to the configured cap.
//! - Stream ticks upsert a single symbol/pair inside the feed's map and
//!   stamp the whole feed type fresh.
//! - Reads of a feed that was never populated return `None` — an explicit
//!   "not available", never an empty default.
//!
//! There is no eviction: the key space is the configured symbol universe,
//! bounded and known in advance. `CacheLimits::entries_per_feed` exists as
//! a guard for deployments that stream unvetted symbols.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::domain::feed::FeedType;
use crate::domain::market::{
    CountryIndicators, FeedBatch, ForexRate, NewsItem, StockQuote, StreamTick,
};

// =============================================================================
// Limits
// =============================================================================

/// Capacity limits applied by the cache.
#[derive(Debug, Clone, Copy)]
pub struct CacheLimits {
    /// Most recent news items retained after a merge.
    pub news_items: usize,
    /// Maximum entries per feed map; `None` means unbounded. Only enforced
    /// for stream upserts introducing new keys — scheduled refreshes replace
    /// the snapshot wholesale.
    pub entries_per_feed: Option<usize>,
}

impl Default for CacheLimits {
    fn default() -> Self {
        Self {
            news_items: 20,
            entries_per_feed: None,
        }
    }
}

// =============================================================================
// Cache
// =============================================================================

struct Slot {
    batch: FeedBatch,
    refreshed_at: Instant,
}

/// Latest-known value store, one slot per feed type.
pub struct FeedCache {
    slots: RwLock<HashMap<FeedType, Slot>>,
    limits: CacheLimits,
}

impl FeedCache {
    /// Create an empty cache with the given limits.
    #[must_use]
    pub fn new(limits: CacheLimits) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            limits,
        }
    }

    /// Store a feed snapshot, replacing the prior one (tariff news merges
    /// instead, see module docs) and stamping the feed type fresh.
    pub fn put(&self, batch: FeedBatch) {
        let feed = batch.feed();
        let mut slots = self.slots.write();

        let batch = match batch {
            FeedBatch::TariffNews(fresh) => {
                let existing = match slots.remove(&feed) {
                    Some(Slot {
                        batch: FeedBatch::TariffNews(items),
                        ..
                    }) => items,
                    _ => Vec::new(),
                };
                FeedBatch::TariffNews(self.merge_news(fresh, existing))
            }
            other => other,
        };

        slots.insert(
            feed,
            Slot {
                batch,
                refreshed_at: Instant::now(),
            },
        );
    }

    /// Prepend fresh items not already cached, keeping ids unique and the
    /// list capped at `limits.news_items`, newest retained.
    fn merge_news(&self, fresh: Vec<NewsItem>, existing: Vec<NewsItem>) -> Vec<NewsItem> {
        let mut seen: std::collections::HashSet<String> =
            existing.iter().map(|item| item.id.clone()).collect();

        let mut merged: Vec<NewsItem> = fresh
            .into_iter()
            .filter(|item| seen.insert(item.id.clone()))
            .collect();
        merged.extend(existing);
        merged.truncate(self.limits.news_items);
        merged
    }

    /// Apply a single-entry stream update, stamping the feed type fresh.
    ///
    /// Updates the tick's symbol/pair in place, preserving fields the tick
    /// does not carry (display name, change percentage); inserts a minimal
    /// entry when the symbol is not cached yet.
    pub fn apply(&self, tick: &StreamTick) {
        let feed = tick.feed();
        let mut slots = self.slots.write();

        let slot = slots.entry(feed).or_insert_with(|| Slot {
            batch: match tick {
                StreamTick::Trade { .. } => FeedBatch::StockQuotes(HashMap::new()),
                StreamTick::Rate { .. } => FeedBatch::ForexRates(HashMap::new()),
            },
            refreshed_at: Instant::now(),
        });

        let inserted = match (tick, &mut slot.batch) {
            (
                StreamTick::Trade {
                    symbol,
                    price,
                    volume,
                    timestamp,
                },
                FeedBatch::StockQuotes(quotes),
            ) => {
                if let Some(quote) = quotes.get_mut(symbol) {
                    quote.price = *price;
                    quote.volume = *volume;
                    quote.timestamp = *timestamp;
                    true
                } else if self.has_capacity(quotes.len()) {
                    quotes.insert(
                        symbol.clone(),
                        StockQuote {
                            symbol: symbol.clone(),
                            name: None,
                            price: *price,
                            change_pct: None,
                            volume: *volume,
                            timestamp: *timestamp,
                        },
                    );
                    true
                } else {
                    false
                }
            }
            (
                StreamTick::Rate {
                    pair,
                    rate,
                    timestamp,
                },
                FeedBatch::ForexRates(rates),
            ) => {
                if let Some(entry) = rates.get_mut(pair) {
                    entry.rate = *rate;
                    entry.timestamp = *timestamp;
                    true
                } else if self.has_capacity(rates.len()) {
                    rates.insert(
                        pair.clone(),
                        ForexRate {
                            pair: pair.clone(),
                            rate: *rate,
                            change_pct: None,
                            timestamp: *timestamp,
                        },
                    );
                    true
                } else {
                    false
                }
            }
            _ => {
                tracing::warn!(topic = %feed, key = tick.key(), "tick does not match cached snapshot shape");
                false
            }
        };

        if inserted {
            slot.refreshed_at = Instant::now();
        } else {
            tracing::warn!(topic = %feed, key = tick.key(), "dropping tick for uncached key at capacity");
        }
    }

    fn has_capacity(&self, current: usize) -> bool {
        self.limits
            .entries_per_feed
            .is_none_or(|cap| current < cap)
    }

    /// Current snapshot for a feed, or `None` if never populated.
    #[must_use]
    pub fn get(&self, feed: FeedType) -> Option<FeedBatch> {
        self.slots.read().get(&feed).map(|slot| slot.batch.clone())
    }

    /// Elapsed time since the feed's last successful write, or `None` if
    /// never populated.
    #[must_use]
    pub fn age(&self, feed: FeedType) -> Option<Duration> {
        self.slots
            .read()
            .get(&feed)
            .map(|slot| slot.refreshed_at.elapsed())
    }

    /// Last cached price for a stock symbol.
    #[must_use]
    pub fn stock_price(&self, symbol: &str) -> Option<f64> {
        match self.slots.read().get(&FeedType::StockQuotes)?.batch {
            FeedBatch::StockQuotes(ref quotes) => quotes.get(symbol).map(|q| q.price),
            _ => None,
        }
    }

    /// Last cached rate for a currency pair.
    #[must_use]
    pub fn forex_rate(&self, pair: &str) -> Option<f64> {
        match self.slots.read().get(&FeedType::ForexRates)?.batch {
            FeedBatch::ForexRates(ref rates) => rates.get(pair).map(|r| r.rate),
            _ => None,
        }
    }

    /// Stock quotes, optionally filtered to the given symbols. `None` if
    /// the feed was never populated.
    #[must_use]
    pub fn stock_quotes(&self, symbols: Option<&[String]>) -> Option<HashMap<String, StockQuote>> {
        match self.slots.read().get(&FeedType::StockQuotes)?.batch {
            FeedBatch::StockQuotes(ref quotes) => Some(filtered(quotes, symbols)),
            _ => None,
        }
    }

    /// Economic indicators, optionally filtered to the given countries.
    /// `None` if the feed was never populated.
    #[must_use]
    pub fn economic_indicators(
        &self,
        countries: Option<&[String]>,
    ) -> Option<HashMap<String, CountryIndicators>> {
        match self.slots.read().get(&FeedType::EconomicIndicators)?.batch {
            FeedBatch::EconomicIndicators(ref map) => Some(filtered(map, countries)),
            _ => None,
        }
    }

    /// The most recent news items, newest first. `None` if the feed was
    /// never populated.
    #[must_use]
    pub fn latest_news(&self, limit: usize) -> Option<Vec<NewsItem>> {
        match self.slots.read().get(&FeedType::TariffNews)?.batch {
            FeedBatch::TariffNews(ref items) => Some(items.iter().take(limit).cloned().collect()),
            _ => None,
        }
    }
}

fn filtered<V: Clone>(map: &HashMap<String, V>, keys: Option<&[String]>) -> HashMap<String, V> {
    match keys {
        None => map.clone(),
        Some(wanted) => map
            .iter()
            .filter(|(key, _)| wanted.contains(*key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::Utc;
    use proptest::prelude::*;

    use super::*;
    use crate::domain::market::Sentiment;

    fn quote(symbol: &str, price: f64) -> StockQuote {
        StockQuote {
            symbol: symbol.to_string(),
            name: Some("Test Co".to_string()),
            price,
            change_pct: Some(0.4),
            volume: 10_000,
            timestamp: Utc::now(),
        }
    }

    fn quotes_batch(entries: &[(&str, f64)]) -> FeedBatch {
        FeedBatch::StockQuotes(
            entries
                .iter()
                .map(|(symbol, price)| ((*symbol).to_string(), quote(symbol, *price)))
                .collect(),
        )
    }

    fn news(id: &str, age_secs: i64) -> NewsItem {
        NewsItem {
            id: id.to_string(),
            headline: "Tariffs Move Markets".to_string(),
            source: "Reuters".to_string(),
            url: format!("https://example.com/news/{id}"),
            timestamp: Utc::now() - chrono::Duration::seconds(age_secs),
            sentiment: Sentiment::Neutral,
            summary: String::new(),
        }
    }

    #[test]
    fn get_returns_none_before_first_put() {
        let cache = FeedCache::new(CacheLimits::default());
        assert!(cache.get(FeedType::StockQuotes).is_none());
        assert!(cache.age(FeedType::StockQuotes).is_none());
        assert!(cache.stock_quotes(None).is_none());
    }

    #[test]
    fn put_then_get_returns_written_value() {
        let cache = FeedCache::new(CacheLimits::default());
        cache.put(quotes_batch(&[("BHP.AX", 44.2), ("RIO.AX", 118.0)]));

        let Some(FeedBatch::StockQuotes(quotes)) = cache.get(FeedType::StockQuotes) else {
            panic!("expected stock quotes snapshot");
        };
        assert_eq!(quotes.len(), 2);
        assert!((quotes["BHP.AX"].price - 44.2).abs() < f64::EPSILON);
    }

    #[test]
    fn put_replaces_prior_snapshot_entirely() {
        let cache = FeedCache::new(CacheLimits::default());
        cache.put(quotes_batch(&[("BHP.AX", 44.2), ("RIO.AX", 118.0)]));
        cache.put(quotes_batch(&[("CSL.AX", 261.0)]));

        let quotes = cache.stock_quotes(None).unwrap();
        assert_eq!(quotes.len(), 1);
        assert!(quotes.contains_key("CSL.AX"));
    }

    #[test]
    fn age_is_non_decreasing_until_next_put() {
        let cache = FeedCache::new(CacheLimits::default());
        cache.put(quotes_batch(&[("BHP.AX", 44.2)]));

        let first = cache.age(FeedType::StockQuotes).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        let second = cache.age(FeedType::StockQuotes).unwrap();
        assert!(second >= first);

        cache.put(quotes_batch(&[("BHP.AX", 44.3)]));
        let after_put = cache.age(FeedType::StockQuotes).unwrap();
        assert!(after_put < second);
    }

    #[test]
    fn news_merge_prepends_and_dedupes() {
        let cache = FeedCache::new(CacheLimits::default());
        cache.put(FeedBatch::TariffNews(vec![news("a", 30), news("b", 40)]));
        cache.put(FeedBatch::TariffNews(vec![news("c", 10), news("a", 30)]));

        let items = cache.latest_news(10).unwrap();
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn news_merge_truncates_to_cap() {
        let cache = FeedCache::new(CacheLimits {
            news_items: 3,
            entries_per_feed: None,
        });
        cache.put(FeedBatch::TariffNews(vec![news("a", 1), news("b", 2)]));
        cache.put(FeedBatch::TariffNews(vec![news("c", 3), news("d", 4)]));

        let items = cache.latest_news(10).unwrap();
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "d", "a"]);
    }

    #[test]
    fn trade_tick_updates_existing_entry_in_place() {
        let cache = FeedCache::new(CacheLimits::default());
        cache.put(quotes_batch(&[("BHP.AX", 44.2)]));

        cache.apply(&StreamTick::Trade {
            symbol: "BHP.AX".to_string(),
            price: 44.9,
            volume: 3_000,
            timestamp: Utc::now(),
        });

        let quotes = cache.stock_quotes(None).unwrap();
        let updated = &quotes["BHP.AX"];
        assert!((updated.price - 44.9).abs() < f64::EPSILON);
        assert_eq!(updated.volume, 3_000);
        // Fields the tick does not carry survive the update.
        assert_eq!(updated.name.as_deref(), Some("Test Co"));
        assert!(updated.change_pct.is_some());
    }

    #[test]
    fn trade_tick_seeds_feed_when_empty() {
        let cache = FeedCache::new(CacheLimits::default());
        cache.apply(&StreamTick::Trade {
            symbol: "QAN.AX".to_string(),
            price: 6.2,
            volume: 1_500,
            timestamp: Utc::now(),
        });

        let quotes = cache.stock_quotes(None).unwrap();
        assert_eq!(quotes.len(), 1);
        assert!(quotes["QAN.AX"].name.is_none());
        assert!(cache.age(FeedType::StockQuotes).is_some());
    }

    #[test]
    fn rate_tick_updates_pair() {
        let cache = FeedCache::new(CacheLimits::default());
        cache.apply(&StreamTick::Rate {
            pair: "AUD/USD".to_string(),
            rate: 0.6711,
            timestamp: Utc::now(),
        });
        assert!((cache.forex_rate("AUD/USD").unwrap() - 0.6711).abs() < f64::EPSILON);
    }

    #[test]
    fn entry_cap_drops_new_keys_but_not_updates() {
        let cache = FeedCache::new(CacheLimits {
            news_items: 20,
            entries_per_feed: Some(1),
        });
        cache.apply(&StreamTick::Trade {
            symbol: "BHP.AX".to_string(),
            price: 44.0,
            volume: 1_000,
            timestamp: Utc::now(),
        });
        cache.apply(&StreamTick::Trade {
            symbol: "RIO.AX".to_string(),
            price: 118.0,
            volume: 1_000,
            timestamp: Utc::now(),
        });
        cache.apply(&StreamTick::Trade {
            symbol: "BHP.AX".to_string(),
            price: 44.5,
            volume: 1_000,
            timestamp: Utc::now(),
        });

        let quotes = cache.stock_quotes(None).unwrap();
        assert_eq!(quotes.len(), 1);
        assert!((quotes["BHP.AX"].price - 44.5).abs() < f64::EPSILON);
    }

    #[test]
    fn filtered_reads() {
        let cache = FeedCache::new(CacheLimits::default());
        cache.put(quotes_batch(&[
            ("BHP.AX", 44.2),
            ("RIO.AX", 118.0),
            ("CSL.AX", 261.0),
        ]));

        let wanted = vec!["BHP.AX".to_string(), "CSL.AX".to_string()];
        let quotes = cache.stock_quotes(Some(&wanted)).unwrap();
        assert_eq!(quotes.len(), 2);
        assert!(!quotes.contains_key("RIO.AX"));

        let none_matching = vec!["WOW.AX".to_string()];
        assert!(cache.stock_quotes(Some(&none_matching)).unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn news_cache_never_exceeds_cap_and_ids_stay_unique(
            batches in proptest::collection::vec(
                proptest::collection::vec((0u32..40, 0i64..86_400), 0..8),
                1..6,
            )
        ) {
            let cache = FeedCache::new(CacheLimits::default());
            for batch in batches {
                let items = batch
                    .into_iter()
                    .map(|(id, age)| news(&format!("news-{id}"), age))
                    .collect();
                cache.put(FeedBatch::TariffNews(items));

                let cached = cache.latest_news(usize::MAX).unwrap();
                prop_assert!(cached.len() <= 20);
                let ids: HashSet<&str> = cached.iter().map(|i| i.id.as_str()).collect();
                prop_assert_eq!(ids.len(), cached.len());
            }
        }
    }
}
