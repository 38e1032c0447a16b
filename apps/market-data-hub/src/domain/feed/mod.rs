//! Feed Type Definitions
//!
//! The five categories of periodically refreshed data the hub tracks.
//! Each feed type doubles as the subscription topic (by its snake_case
//! name) and carries a reference refresh cadence.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Category of periodically refreshed market or economic data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedType {
    /// Global equity index levels.
    MarketIndices,
    /// Currency pair exchange rates.
    ForexRates,
    /// Individual stock quotes.
    StockQuotes,
    /// Tariff and trade-policy news articles.
    TariffNews,
    /// Macro indicators per country.
    EconomicIndicators,
}

impl FeedType {
    /// All feed types, in scheduling order.
    pub const ALL: [Self; 5] = [
        Self::MarketIndices,
        Self::ForexRates,
        Self::StockQuotes,
        Self::TariffNews,
        Self::EconomicIndicators,
    ];

    /// Topic name used for subscriptions and metric labels.
    #[must_use]
    pub const fn topic(self) -> &'static str {
        match self {
            Self::MarketIndices => "market_indices",
            Self::ForexRates => "forex_rates",
            Self::StockQuotes => "stock_quotes",
            Self::TariffNews => "tariff_news",
            Self::EconomicIndicators => "economic_indicators",
        }
    }

    /// Reference refresh cadence for the scheduled fetch of this feed.
    #[must_use]
    pub const fn default_refresh_interval(self) -> Duration {
        match self {
            Self::MarketIndices => Duration::from_secs(60),
            Self::ForexRates => Duration::from_secs(300),
            Self::StockQuotes => Duration::from_secs(30),
            Self::TariffNews => Duration::from_secs(900),
            Self::EconomicIndicators => Duration::from_secs(3600),
        }
    }
}

impl fmt::Display for FeedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.topic())
    }
}

/// Error for a topic name that does not match any feed type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown topic: {0}")]
pub struct UnknownTopic(pub String);

impl FromStr for FeedType {
    type Err = UnknownTopic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "market_indices" => Ok(Self::MarketIndices),
            "forex_rates" => Ok(Self::ForexRates),
            "stock_quotes" => Ok(Self::StockQuotes),
            "tariff_news" => Ok(Self::TariffNews),
            "economic_indicators" => Ok(Self::EconomicIndicators),
            other => Err(UnknownTopic(other.to_string())),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("market_indices", FeedType::MarketIndices)]
    #[test_case("forex_rates", FeedType::ForexRates)]
    #[test_case("stock_quotes", FeedType::StockQuotes)]
    #[test_case("tariff_news", FeedType::TariffNews)]
    #[test_case("economic_indicators", FeedType::EconomicIndicators)]
    fn parses_topic_names(input: &str, expected: FeedType) {
        assert_eq!(input.parse::<FeedType>().unwrap(), expected);
    }

    #[test_case(""; "empty")]
    #[test_case("stockquotes"; "missing underscore")]
    #[test_case("Market_Indices"; "wrong case")]
    #[test_case("weather"; "unrelated")]
    fn rejects_unknown_topics(input: &str) {
        let err = input.parse::<FeedType>().unwrap_err();
        assert_eq!(err, UnknownTopic(input.to_string()));
    }

    #[test]
    fn topic_round_trips_through_display() {
        for feed in FeedType::ALL {
            assert_eq!(feed.to_string().parse::<FeedType>().unwrap(), feed);
        }
    }

    #[test]
    fn serde_names_match_topics() {
        for feed in FeedType::ALL {
            let json = serde_json::to_string(&feed).unwrap();
            assert_eq!(json, format!("\"{}\"", feed.topic()));
        }
    }

    #[test]
    fn reference_cadence() {
        assert_eq!(
            FeedType::StockQuotes.default_refresh_interval(),
            Duration::from_secs(30)
        );
        assert_eq!(
            FeedType::EconomicIndicators.default_refresh_interval(),
            Duration::from_secs(3600)
        );
    }
}
