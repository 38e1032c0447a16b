//! Health Check and Metrics Endpoint
//!
//! HTTP endpoint for health checks, feed freshness reporting, and
//! Prometheus metrics. Used by container orchestrators, load balancers,
//! and monitoring systems.
//!
//! # Endpoints
//!
//! - `GET /health` - Returns JSON health status
//! - `GET /healthz` - Kubernetes liveness probe (simple OK)
//! - `GET /readyz` - Kubernetes readiness probe (checks feed data)
//! - `GET /metrics` - Prometheus metrics in text format

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::domain::feed::FeedType;
use crate::infrastructure::broker::SubscriptionBroker;
use crate::infrastructure::cache::FeedCache;
use crate::infrastructure::metrics::get_metrics_handle;
use crate::infrastructure::scheduler::{FeedStates, FeedTaskState};

// =============================================================================
// Health Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Overall status: "healthy", "degraded", or "unhealthy".
    pub status: HealthStatus,
    /// Hub version.
    pub version: String,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
    /// Current time.
    pub current_time: DateTime<Utc>,
    /// Per-feed status, in scheduling order.
    pub feeds: Vec<FeedHealth>,
    /// Subscription statistics.
    pub subscriptions: SubscriptionStatus,
}

/// Overall health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Every feed has data.
    Healthy,
    /// Some feeds have data.
    Degraded,
    /// No feed has data yet.
    Unhealthy,
}

/// Status of one feed.
#[derive(Debug, Clone, Serialize)]
pub struct FeedHealth {
    /// Topic name.
    pub topic: &'static str,
    /// Refresh task state.
    pub state: FeedTaskState,
    /// Whether the feed has ever been written.
    pub populated: bool,
    /// Seconds since the last write, if any.
    pub age_secs: Option<f64>,
    /// Registered subscriber callbacks.
    pub subscribers: usize,
}

/// Subscription statistics.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionStatus {
    /// Total registered subscriber callbacks.
    pub total: usize,
}

// =============================================================================
// Health Server State
// =============================================================================

/// Shared state for the health server.
pub struct HealthServerState {
    version: String,
    started_at: Instant,
    cache: Arc<FeedCache>,
    broker: Arc<SubscriptionBroker>,
    states: Arc<FeedStates>,
}

impl HealthServerState {
    /// Create new health server state.
    #[must_use]
    pub fn new(
        version: String,
        cache: Arc<FeedCache>,
        broker: Arc<SubscriptionBroker>,
        states: Arc<FeedStates>,
    ) -> Self {
        Self {
            version,
            started_at: Instant::now(),
            cache,
            broker,
            states,
        }
    }
}

// =============================================================================
// Health Server
// =============================================================================

/// Health check HTTP server.
pub struct HealthServer {
    port: u16,
    state: Arc<HealthServerState>,
    cancel: CancellationToken,
}

impl HealthServer {
    /// Create a new health server.
    #[must_use]
    pub const fn new(port: u16, state: Arc<HealthServerState>, cancel: CancellationToken) -> Self {
        Self {
            port,
            state,
            cancel,
        }
    }

    /// Run the health server until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `HealthServerError` if binding fails or the HTTP server
    /// encounters a fatal error while running.
    pub async fn run(self) -> Result<(), HealthServerError> {
        let app = Router::new()
            .route("/health", get(health_handler))
            .route("/healthz", get(liveness_handler))
            .route("/readyz", get(readiness_handler))
            .route("/metrics", get(metrics_handler))
            .with_state(self.state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| HealthServerError::BindFailed(self.port, e.to_string()))?;

        tracing::info!(port = self.port, "Health server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| HealthServerError::ServerFailed(e.to_string()))?;

        tracing::info!("Health server stopped");
        Ok(())
    }
}

// =============================================================================
// HTTP Handlers
// =============================================================================

async fn health_handler(State(state): State<Arc<HealthServerState>>) -> impl IntoResponse {
    let response = build_health_response(&state);
    let status_code = match response.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status_code, Json(response))
}

async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn readiness_handler(State(state): State<Arc<HealthServerState>>) -> impl IntoResponse {
    let response = build_health_response(&state);

    // Ready once at least one feed has produced data.
    if response.feeds.iter().any(|feed| feed.populated) {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}

async fn metrics_handler() -> impl IntoResponse {
    get_metrics_handle().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain")],
                "Metrics not initialized".to_string(),
            )
        },
        |handle| {
            let body = handle.render();
            (
                StatusCode::OK,
                [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
                body,
            )
        },
    )
}

fn build_health_response(state: &HealthServerState) -> HealthResponse {
    let feeds: Vec<FeedHealth> = FeedType::ALL
        .into_iter()
        .map(|feed| {
            let age = state.cache.age(feed);
            FeedHealth {
                topic: feed.topic(),
                state: state.states.get(feed),
                populated: age.is_some(),
                age_secs: age.map(|a| a.as_secs_f64()),
                subscribers: state.broker.subscriber_count(feed),
            }
        })
        .collect();

    HealthResponse {
        status: determine_health_status(&feeds),
        version: state.version.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        current_time: Utc::now(),
        subscriptions: SubscriptionStatus {
            total: state.broker.total_subscribers(),
        },
        feeds,
    }
}

fn determine_health_status(feeds: &[FeedHealth]) -> HealthStatus {
    let populated = feeds.iter().filter(|feed| feed.populated).count();
    if populated == feeds.len() {
        HealthStatus::Healthy
    } else if populated > 0 {
        HealthStatus::Degraded
    } else {
        HealthStatus::Unhealthy
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Health server errors.
#[derive(Debug, thiserror::Error)]
pub enum HealthServerError {
    /// Failed to bind to port.
    #[error("failed to bind to port {0}: {1}")]
    BindFailed(u16, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}

// =============================================================================
// Tests
// =============================================================================
