//! Tracing Initialization
//!
//! Configures the `tracing` subscriber with an env-filterable fmt layer.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: log level directives (default: `market_data_hub=info`)
//!
//! # Usage
//!
//! ```ignore
//! use market_data_hub::infrastructure::telemetry;
//!
//! // Initialize once at startup.
//! telemetry::init();
//! ```

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize the global tracing subscriber.
///
/// Subsequent calls are no-ops, so tests and embedding callers can call
/// this without coordinating.
#[allow(clippy::expect_used)]
pub fn init() {
    let env_filter = EnvFilter::from_default_env()
        .add_directive(
            "market_data_hub=info"
                .parse()
                .expect("static directive 'market_data_hub=info' is valid"),
        )
        .add_directive(
            "hyper=warn"
                .parse()
                .expect("static directive 'hyper=warn' is valid"),
        );

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init();
        init();
    }
}
