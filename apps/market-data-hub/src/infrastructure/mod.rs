//! Infrastructure Layer
//!
//! Adapters around the domain: shared state (cache, history), the
//! subscription broker, the producer tasks (scheduler, stream simulator),
//! the bundled synthetic fetchers, and the operational surface
//! (config, telemetry, metrics, health).

pub mod broker;
pub mod cache;
pub mod config;
pub mod export;
pub mod feeds;
pub mod health;
pub mod history;
pub mod metrics;
pub mod pipeline;
pub mod scheduler;
pub mod stream;
pub mod telemetry;
