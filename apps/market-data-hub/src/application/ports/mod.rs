//! Port Interfaces
//!
//! Contracts that infrastructure adapters implement, following the
//! Hexagonal Architecture pattern.
//!
//! `FeedFetcher` is the pluggable unit of work behind every scheduled
//! feed: the hub does not know or care whether a batch comes from an HTTP
//! client, a file, or hand-authored simulation. The bundled synthetic
//! fetchers live in `infrastructure::feeds`; a deployment with real
//! upstream APIs swaps them at configuration time without touching the
//! scheduler, cache, or broker.

use async_trait::async_trait;

use crate::domain::feed::FeedType;
use crate::domain::market::FeedBatch;

/// Error from a fetch attempt.
///
/// Opaque to the scheduler: a failed fetch is logged, counted, and retried
/// on the feed's next interval. It never propagates further.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct FetchError(#[from] anyhow::Error);

impl FetchError {
    /// Build a fetch error from a plain message.
    #[must_use]
    pub fn msg(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self(anyhow::Error::msg(message))
    }
}

/// Source of data for one feed type.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Feed type this fetcher produces batches for.
    fn feed_type(&self) -> FeedType;

    /// Fetch one complete batch.
    ///
    /// # Errors
    ///
    /// Any failure to obtain data; the scheduler treats it as transient.
    async fn fetch(&self) -> Result<FeedBatch, FetchError>;
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_from_message() {
        let err = FetchError::msg("upstream returned 503");
        assert_eq!(err.to_string(), "upstream returned 503");
    }

    #[test]
    fn fetch_error_from_anyhow() {
        let err: FetchError = anyhow::anyhow!("boom").into();
        assert_eq!(err.to_string(), "boom");
    }
}
