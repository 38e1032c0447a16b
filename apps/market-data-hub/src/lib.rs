#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Market Data Hub
//!
//! Ingests five independently refreshing data feeds (market indices,
//! forex rates, stock quotes, tariff news, economic indicators) plus two
//! simulated low-latency streams, keeps each feed's latest value in an
//! in-memory cache with a staleness timestamp, appends per-symbol
//! history, and fans updates out to registered subscribers.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Core data types with no runtime knowledge
//!   - `feed`: the five feed categories and topic names
//!   - `market`: quote/rate/news/indicator payloads and event envelopes
//!   - `history`: the per-series historical record
//!
//! - **Application**: Port definitions
//!   - `ports`: the pluggable `FeedFetcher` contract
//!
//! - **Infrastructure**: Adapters and shared state
//!   - `cache`, `history`, `broker`: the shared mutable state
//!   - `scheduler`, `stream`: the producer tasks
//!   - `feeds`, `export`: synthetic fetchers and snapshot files
//!   - `config`, `telemetry`, `metrics`, `health`: operational surface
//!
//! - **Hub**: the composition root tying it all together
//!
//! # Data Flow
//!
//! ```text
//! 5 scheduled fetchers ──┐
//!                        ├──► cache ──► history ──► subscribers
//! 2 synthetic streams  ──┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Core data types with no external dependencies.
pub mod domain;

/// Application layer - Port definitions.
pub mod application;

/// Infrastructure layer - Adapters and shared state.
pub mod infrastructure;

/// Composition root - the hub object itself.
pub mod hub;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::feed::{FeedType, UnknownTopic};
pub use domain::history::HistoryRecord;
pub use domain::market::{
    CountryIndicators, FeedBatch, FeedEvent, ForexRate, IndexQuote, IndicatorReading, NewsItem,
    Sentiment, StockQuote, StreamTick,
};

// Ports
pub use application::ports::{FeedFetcher, FetchError};

// The hub
pub use hub::{HubBuildError, MarketDataHub, MarketDataHubBuilder};

// Infrastructure config
pub use infrastructure::config::{
    ConfigError, HubConfig, RefreshSettings, RetentionSettings, ServerSettings, StorageSettings,
    StreamSettings,
};

// Shared state (for integration tests and embedders)
pub use infrastructure::broker::{
    BrokerError, SubscriberCallback, SubscriptionBroker, SubscriptionId,
};
pub use infrastructure::cache::{CacheLimits, FeedCache};
pub use infrastructure::history::{HistoryError, HistoryStore};
pub use infrastructure::scheduler::{FeedStates, FeedTaskState};

// Health server
pub use infrastructure::health::{HealthServer, HealthServerError, HealthServerState};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::init as init_telemetry;
