//! Configuration
//!
//! Typed hub settings, loaded from `MARKET_HUB_*` environment variables
//! with sensible defaults for every value.

mod settings;

pub use settings::{
    ConfigError, HubConfig, RefreshSettings, RetentionSettings, ServerSettings, StorageSettings,
    StreamSettings,
};
