//! Hub Configuration Settings
//!
//! Configuration types for the data hub, loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::domain::feed::FeedType;

/// Scheduled refresh cadence per feed, plus the optional fetch timeout.
#[derive(Debug, Clone)]
pub struct RefreshSettings {
    /// Market indices refresh interval.
    pub market_indices: Duration,
    /// Forex rates refresh interval.
    pub forex_rates: Duration,
    /// Stock quotes refresh interval.
    pub stock_quotes: Duration,
    /// Tariff news refresh interval.
    pub tariff_news: Duration,
    /// Economic indicators refresh interval.
    pub economic_indicators: Duration,
    /// Upper bound on a single fetch; `None` disables the guard and a hung
    /// fetch delays only its own feed's next cycle.
    pub fetch_timeout: Option<Duration>,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            market_indices: FeedType::MarketIndices.default_refresh_interval(),
            forex_rates: FeedType::ForexRates.default_refresh_interval(),
            stock_quotes: FeedType::StockQuotes.default_refresh_interval(),
            tariff_news: FeedType::TariffNews.default_refresh_interval(),
            economic_indicators: FeedType::EconomicIndicators.default_refresh_interval(),
            fetch_timeout: None,
        }
    }
}

impl RefreshSettings {
    /// Configured interval for one feed.
    #[must_use]
    pub const fn interval(&self, feed: FeedType) -> Duration {
        match feed {
            FeedType::MarketIndices => self.market_indices,
            FeedType::ForexRates => self.forex_rates,
            FeedType::StockQuotes => self.stock_quotes,
            FeedType::TariffNews => self.tariff_news,
            FeedType::EconomicIndicators => self.economic_indicators,
        }
    }
}

/// Cadence of the two synthetic streaming tasks.
#[derive(Debug, Clone)]
pub struct StreamSettings {
    /// Interval between synthetic stock trades.
    pub quote_interval: Duration,
    /// Interval between synthetic forex moves.
    pub rate_interval: Duration,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            quote_interval: Duration::from_secs(5),
            rate_interval: Duration::from_secs(10),
        }
    }
}

/// Capacity and retention limits.
#[derive(Debug, Clone)]
pub struct RetentionSettings {
    /// Most recent news items kept in the cache.
    pub news_items: usize,
    /// In-memory records kept per history series; `None` is unbounded.
    pub max_series_len: Option<usize>,
    /// Cache entries per feed map; `None` is unbounded.
    pub max_entries_per_feed: Option<usize>,
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self {
            news_items: 20,
            max_series_len: None,
            max_entries_per_feed: None,
        }
    }
}

/// On-disk storage locations.
#[derive(Debug, Clone, Default)]
pub struct StorageSettings {
    /// Root data directory; feed snapshots land here and per-series history
    /// files under `historical/`. `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,
}

impl StorageSettings {
    /// Directory for per-series history files, if persistence is on.
    #[must_use]
    pub fn history_dir(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join("historical"))
    }
}

/// Server port settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Health check HTTP port (also serves `/metrics`).
    pub health_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { health_port: 8082 }
    }
}

/// Complete hub configuration.
#[derive(Debug, Clone, Default)]
pub struct HubConfig {
    /// Scheduled refresh cadence.
    pub refresh: RefreshSettings,
    /// Streaming task cadence.
    pub stream: StreamSettings,
    /// Capacity and retention limits.
    pub retention: RetentionSettings,
    /// Storage locations.
    pub storage: StorageSettings,
    /// Server ports.
    pub server: ServerSettings,
}

impl HubConfig {
    /// Create configuration from environment variables.
    ///
    /// Unset or unparsable variables fall back to their defaults; values
    /// that parse but are invalid (zero intervals, zero news cap) are
    /// rejected.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for a parsed-but-invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = RefreshSettings::default();
        let refresh = RefreshSettings {
            market_indices: parse_env_duration_secs(
                "MARKET_HUB_INDICES_REFRESH_SECS",
                defaults.market_indices,
            ),
            forex_rates: parse_env_duration_secs(
                "MARKET_HUB_FOREX_REFRESH_SECS",
                defaults.forex_rates,
            ),
            stock_quotes: parse_env_duration_secs(
                "MARKET_HUB_QUOTES_REFRESH_SECS",
                defaults.stock_quotes,
            ),
            tariff_news: parse_env_duration_secs(
                "MARKET_HUB_NEWS_REFRESH_SECS",
                defaults.tariff_news,
            ),
            economic_indicators: parse_env_duration_secs(
                "MARKET_HUB_INDICATORS_REFRESH_SECS",
                defaults.economic_indicators,
            ),
            fetch_timeout: parse_env_opt_duration_secs("MARKET_HUB_FETCH_TIMEOUT_SECS"),
        };

        let stream_defaults = StreamSettings::default();
        let stream = StreamSettings {
            quote_interval: parse_env_duration_secs(
                "MARKET_HUB_QUOTE_STREAM_SECS",
                stream_defaults.quote_interval,
            ),
            rate_interval: parse_env_duration_secs(
                "MARKET_HUB_RATE_STREAM_SECS",
                stream_defaults.rate_interval,
            ),
        };

        let retention_defaults = RetentionSettings::default();
        let retention = RetentionSettings {
            news_items: parse_env_usize(
                "MARKET_HUB_NEWS_CACHE_LIMIT",
                retention_defaults.news_items,
            ),
            max_series_len: parse_env_opt_usize("MARKET_HUB_MAX_SERIES_LEN"),
            max_entries_per_feed: parse_env_opt_usize("MARKET_HUB_MAX_ENTRIES_PER_FEED"),
        };

        let storage = StorageSettings {
            data_dir: std::env::var("MARKET_HUB_DATA_DIR").ok().map(PathBuf::from),
        };

        let server = ServerSettings {
            health_port: parse_env_u16(
                "MARKET_HUB_HEALTH_PORT",
                ServerSettings::default().health_port,
            ),
        };

        let config = Self {
            refresh,
            stream,
            retention,
            storage,
            server,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check invariants the rest of the hub relies on.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for zero intervals or a zero
    /// news cap.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for feed in FeedType::ALL {
            if self.refresh.interval(feed).is_zero() {
                return Err(ConfigError::InvalidValue {
                    setting: "refresh interval",
                    reason: format!("{feed} interval must be greater than zero"),
                });
            }
        }
        if self.stream.quote_interval.is_zero() || self.stream.rate_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                setting: "stream interval",
                reason: "stream intervals must be greater than zero".to_string(),
            });
        }
        if self.retention.news_items == 0 {
            return Err(ConfigError::InvalidValue {
                setting: "news cache limit",
                reason: "news cache limit must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A value parsed but violates an invariant.
    #[error("invalid {setting}: {reason}")]
    InvalidValue {
        /// Which setting was rejected.
        setting: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

fn parse_env_u16(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Zero and unset both mean "no limit".
fn parse_env_opt_usize(key: &str) -> Option<usize> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|v| *v > 0)
}

fn parse_env_duration_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}

/// Zero and unset both mean "no timeout".
fn parse_env_opt_duration_secs(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_cadence() {
        let config = HubConfig::default();
        assert_eq!(
            config.refresh.interval(FeedType::MarketIndices),
            Duration::from_secs(60)
        );
        assert_eq!(
            config.refresh.interval(FeedType::TariffNews),
            Duration::from_secs(900)
        );
        assert_eq!(config.stream.quote_interval, Duration::from_secs(5));
        assert_eq!(config.stream.rate_interval, Duration::from_secs(10));
        assert_eq!(config.retention.news_items, 20);
        assert!(config.retention.max_series_len.is_none());
        assert!(config.storage.data_dir.is_none());
        assert!(config.refresh.fetch_timeout.is_none());
        assert_eq!(config.server.health_port, 8082);
    }

    #[test]
    fn default_config_validates() {
        HubConfig::default().validate().unwrap();
    }

    #[test]
    fn zero_interval_rejected() {
        let mut config = HubConfig::default();
        config.refresh.stock_quotes = Duration::ZERO;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn zero_news_cap_rejected() {
        let mut config = HubConfig::default();
        config.retention.news_items = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn history_dir_nests_under_data_dir() {
        let storage = StorageSettings {
            data_dir: Some(PathBuf::from("/var/lib/hub")),
        };
        assert_eq!(
            storage.history_dir(),
            Some(PathBuf::from("/var/lib/hub/historical"))
        );
        assert!(StorageSettings::default().history_dir().is_none());
    }
}
