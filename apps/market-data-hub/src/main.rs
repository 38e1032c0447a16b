//! Market Data Hub Binary
//!
//! Starts the data hub and its health endpoint.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin market-data-hub
//! ```
//!
//! # Environment Variables (all optional)
//!
//! - `MARKET_HUB_INDICES_REFRESH_SECS`: market indices cadence (default: 60)
//! - `MARKET_HUB_FOREX_REFRESH_SECS`: forex rates cadence (default: 300)
//! - `MARKET_HUB_QUOTES_REFRESH_SECS`: stock quotes cadence (default: 30)
//! - `MARKET_HUB_NEWS_REFRESH_SECS`: tariff news cadence (default: 900)
//! - `MARKET_HUB_INDICATORS_REFRESH_SECS`: indicators cadence (default: 3600)
//! - `MARKET_HUB_FETCH_TIMEOUT_SECS`: per-fetch timeout, 0 disables (default: 0)
//! - `MARKET_HUB_QUOTE_STREAM_SECS`: synthetic trade cadence (default: 5)
//! - `MARKET_HUB_RATE_STREAM_SECS`: synthetic rate cadence (default: 10)
//! - `MARKET_HUB_NEWS_CACHE_LIMIT`: news items retained (default: 20)
//! - `MARKET_HUB_MAX_SERIES_LEN`: in-memory records per series, 0 unbounded
//! - `MARKET_HUB_MAX_ENTRIES_PER_FEED`: cache entries per feed, 0 unbounded
//! - `MARKET_HUB_DATA_DIR`: snapshot/history directory (default: memory only)
//! - `MARKET_HUB_HEALTH_PORT`: health HTTP port (default: 8082)
//! - `RUST_LOG`: log level (default: info)

use std::sync::Arc;
use std::time::Duration;

use market_data_hub::infrastructure::telemetry;
use market_data_hub::{
    HealthServer, HealthServerState, HubConfig, MarketDataHub, init_metrics,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_dotenv();

    telemetry::init();

    tracing::info!("Starting market data hub");

    // Initialize Prometheus metrics
    let _metrics_handle = init_metrics();

    let config = HubConfig::from_env()?;
    log_config(&config);

    let shutdown_token = CancellationToken::new();

    let hub = Arc::new(MarketDataHub::with_defaults(config.clone())?);
    hub.start();

    // Health server over the hub's shared state
    let health_state = Arc::new(HealthServerState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        Arc::clone(hub.cache()),
        Arc::clone(hub.broker()),
        Arc::clone(hub.states()),
    ));
    let health_server = HealthServer::new(
        config.server.health_port,
        health_state,
        shutdown_token.clone(),
    );
    tokio::spawn(async move {
        if let Err(e) = health_server.run().await {
            tracing::error!(error = %e, "Health server error");
        }
    });

    tracing::info!("Market data hub ready");

    await_shutdown(shutdown_token).await;

    hub.shutdown(SHUTDOWN_TIMEOUT).await;

    tracing::info!("Market data hub stopped");
    Ok(())
}

/// Log the parsed configuration.
fn log_config(config: &HubConfig) {
    tracing::info!(
        indices_secs = config.refresh.market_indices.as_secs(),
        forex_secs = config.refresh.forex_rates.as_secs(),
        quotes_secs = config.refresh.stock_quotes.as_secs(),
        news_secs = config.refresh.tariff_news.as_secs(),
        indicators_secs = config.refresh.economic_indicators.as_secs(),
        quote_stream_secs = config.stream.quote_interval.as_secs(),
        rate_stream_secs = config.stream.rate_interval.as_secs(),
        news_cache_limit = config.retention.news_items,
        health_port = config.server.health_port,
        data_dir = config
            .storage
            .data_dir
            .as_ref()
            .map_or_else(|| "<memory>".to_string(), |d| d.display().to_string()),
        "Configuration loaded"
    );
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();

    tracing::info!(
        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
        "Graceful shutdown started"
    );
}
