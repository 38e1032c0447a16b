//! Subscription Broker
//!
//! Per-topic callback registry with synchronous fan-out.
//!
//! # Semantics
//!
//! - Topics are the five feed types, addressed by snake_case name.
//! - Subscribing to a topic with a cached snapshot delivers that snapshot
//!   synchronously before `subscribe` returns, so a new subscriber never
//!   waits a full refresh interval for its first value.
//! - Callbacks run on the publishing producer's task and are expected to
//!   be cheap (e.g. enqueue a frame). A panicking callback is caught,
//!   logged, and counted; it never affects the other callbacks for the
//!   same publish, nor the producer.
//! - Delivery order per topic follows registration order.

use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::domain::feed::FeedType;
use crate::domain::market::FeedEvent;
use crate::infrastructure::cache::FeedCache;
use crate::infrastructure::metrics;

/// Callback invoked with every event published to a subscribed topic.
pub type SubscriberCallback = Arc<dyn Fn(&FeedEvent) + Send + Sync>;

/// Handle identifying one registered callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Errors reported to callers of subscribe/unsubscribe.
///
/// These are caller-programming errors discoverable at the call site, so
/// they come back as results rather than panics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrokerError {
    /// Topic name does not match any feed type.
    #[error("unknown topic: {0}")]
    UnknownTopic(String),

    /// Topic currently has no subscribers at all.
    #[error("topic {0} has no subscribers")]
    NoSubscribers(FeedType),

    /// The id is not registered for this topic.
    #[error("subscription {id} is not registered for topic {topic}")]
    NotSubscribed {
        /// Topic the unsubscribe targeted.
        topic: FeedType,
        /// The unknown subscription id.
        id: SubscriptionId,
    },
}

#[derive(Clone)]
struct Registration {
    id: SubscriptionId,
    callback: SubscriberCallback,
}

/// Per-topic subscriber registry.
pub struct SubscriptionBroker {
    topics: RwLock<HashMap<FeedType, Vec<Registration>>>,
    cache: Arc<FeedCache>,
}

impl SubscriptionBroker {
    /// Create a broker reading initial snapshots from the given cache.
    #[must_use]
    pub fn new(cache: Arc<FeedCache>) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            cache,
        }
    }

    /// Register a callback under a topic name.
    ///
    /// The current cached snapshot for the topic, if any, is delivered to
    /// the callback before this returns.
    ///
    /// # Errors
    ///
    /// `BrokerError::UnknownTopic` for a name that is not one of the five
    /// feed topics; no state is altered in that case.
    pub fn subscribe(
        &self,
        topic: &str,
        callback: SubscriberCallback,
    ) -> Result<SubscriptionId, BrokerError> {
        let feed = topic
            .parse::<FeedType>()
            .map_err(|e| BrokerError::UnknownTopic(e.0))?;
        Ok(self.subscribe_feed(feed, callback))
    }

    /// Register a callback under a feed type.
    pub fn subscribe_feed(&self, feed: FeedType, callback: SubscriberCallback) -> SubscriptionId {
        let id = SubscriptionId(Uuid::new_v4());
        let count = {
            let mut topics = self.topics.write();
            let registrations = topics.entry(feed).or_default();
            registrations.push(Registration {
                id,
                callback: Arc::clone(&callback),
            });
            registrations.len()
        };
        metrics::set_subscribers(feed, count);
        tracing::info!(topic = %feed, subscription = %id, "subscribed");

        // Initial delivery, synchronous, before handing the id back.
        if let Some(batch) = self.cache.get(feed) {
            deliver(feed, id, &callback, &FeedEvent::Refresh { feed, batch });
        }

        id
    }

    /// Remove a callback from a topic name.
    ///
    /// # Errors
    ///
    /// `UnknownTopic` for an invalid name, `NoSubscribers` when the topic
    /// has no registrations, `NotSubscribed` when the id is not among them.
    pub fn unsubscribe(&self, topic: &str, id: SubscriptionId) -> Result<(), BrokerError> {
        let feed = topic
            .parse::<FeedType>()
            .map_err(|e| BrokerError::UnknownTopic(e.0))?;
        self.unsubscribe_feed(feed, id)
    }

    /// Remove a callback from a feed type.
    ///
    /// # Errors
    ///
    /// See [`Self::unsubscribe`].
    pub fn unsubscribe_feed(&self, feed: FeedType, id: SubscriptionId) -> Result<(), BrokerError> {
        let mut topics = self.topics.write();
        let registrations = topics
            .get_mut(&feed)
            .filter(|r| !r.is_empty())
            .ok_or(BrokerError::NoSubscribers(feed))?;

        let position = registrations
            .iter()
            .position(|r| r.id == id)
            .ok_or(BrokerError::NotSubscribed { topic: feed, id })?;
        registrations.remove(position);

        let count = registrations.len();
        if count == 0 {
            topics.remove(&feed);
        }
        drop(topics);

        metrics::set_subscribers(feed, count);
        tracing::info!(topic = %feed, subscription = %id, "unsubscribed");
        Ok(())
    }

    /// Deliver an event to every subscriber of its topic, in registration
    /// order. Panicking callbacks are isolated per delivery.
    pub fn publish(&self, event: &FeedEvent) {
        let feed = event.feed();
        let registrations: Vec<Registration> = self
            .topics
            .read()
            .get(&feed)
            .map(|r| r.clone())
            .unwrap_or_default();

        for registration in &registrations {
            deliver(feed, registration.id, &registration.callback, event);
        }
        metrics::record_publish(feed, registrations.len() as u64);
    }

    /// Number of callbacks registered for a feed.
    #[must_use]
    pub fn subscriber_count(&self, feed: FeedType) -> usize {
        self.topics.read().get(&feed).map_or(0, Vec::len)
    }

    /// Number of callbacks registered across all feeds.
    #[must_use]
    pub fn total_subscribers(&self) -> usize {
        self.topics.read().values().map(Vec::len).sum()
    }
}

/// Invoke one callback, containing any panic it raises.
fn deliver(feed: FeedType, id: SubscriptionId, callback: &SubscriberCallback, event: &FeedEvent) {
    if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
        metrics::record_callback_panic(feed);
        tracing::error!(topic = %feed, subscription = %id, "subscriber callback panicked");
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;

    use super::*;
    use crate::domain::market::{FeedBatch, IndexQuote};
    use crate::infrastructure::cache::CacheLimits;

    fn empty_cache() -> Arc<FeedCache> {
        Arc::new(FeedCache::new(CacheLimits::default()))
    }

    fn indices_batch() -> FeedBatch {
        let mut map = HashMap::new();
        map.insert(
            "^AXJO".to_string(),
            IndexQuote {
                symbol: "^AXJO".to_string(),
                name: "ASX 200".to_string(),
                value: 7450.0,
                change_pct: 0.2,
                timestamp: Utc::now(),
            },
        );
        FeedBatch::MarketIndices(map)
    }

    fn counting_callback(counter: &Arc<AtomicUsize>) -> SubscriberCallback {
        let counter = Arc::clone(counter);
        Arc::new(move |_event| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn subscribe_to_unknown_topic_fails_without_state_change() {
        let broker = SubscriptionBroker::new(empty_cache());
        let result = broker.subscribe("weather", Arc::new(|_| {}));
        assert_eq!(
            result.unwrap_err(),
            BrokerError::UnknownTopic("weather".to_string())
        );
        assert_eq!(broker.total_subscribers(), 0);
    }

    #[test]
    fn subscribe_with_cached_value_delivers_before_returning() {
        let cache = empty_cache();
        cache.put(indices_batch());
        let broker = SubscriptionBroker::new(Arc::clone(&cache));

        let delivered = Arc::new(AtomicUsize::new(0));
        broker
            .subscribe("market_indices", counting_callback(&delivered))
            .unwrap();

        assert_eq!(delivered.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn subscribe_without_cached_value_delivers_nothing_until_publish() {
        let broker = SubscriptionBroker::new(empty_cache());
        let delivered = Arc::new(AtomicUsize::new(0));
        broker
            .subscribe("market_indices", counting_callback(&delivered))
            .unwrap();
        assert_eq!(delivered.load(Ordering::SeqCst), 0);

        broker.publish(&FeedEvent::Refresh {
            feed: FeedType::MarketIndices,
            batch: indices_batch(),
        });
        assert_eq!(delivered.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_callback_does_not_block_later_subscribers() {
        let broker = SubscriptionBroker::new(empty_cache());

        broker
            .subscribe_feed(FeedType::MarketIndices, Arc::new(|_| panic!("bad callback")));
        let delivered = Arc::new(AtomicUsize::new(0));
        broker.subscribe_feed(FeedType::MarketIndices, counting_callback(&delivered));

        // Must not panic out of publish.
        broker.publish(&FeedEvent::Refresh {
            feed: FeedType::MarketIndices,
            batch: indices_batch(),
        });
        assert_eq!(delivered.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_twice_fails_the_second_time() {
        let broker = SubscriptionBroker::new(empty_cache());
        let id = broker.subscribe_feed(FeedType::ForexRates, Arc::new(|_| {}));

        broker.unsubscribe("forex_rates", id).unwrap();
        assert_eq!(
            broker.unsubscribe("forex_rates", id).unwrap_err(),
            BrokerError::NoSubscribers(FeedType::ForexRates)
        );
    }

    #[test]
    fn unsubscribe_unknown_id_fails() {
        let broker = SubscriptionBroker::new(empty_cache());
        broker.subscribe_feed(FeedType::ForexRates, Arc::new(|_| {}));
        let foreign = SubscriptionId(Uuid::new_v4());

        assert_eq!(
            broker.unsubscribe("forex_rates", foreign).unwrap_err(),
            BrokerError::NotSubscribed {
                topic: FeedType::ForexRates,
                id: foreign
            }
        );
        assert_eq!(broker.subscriber_count(FeedType::ForexRates), 1);
    }

    #[test]
    fn unsubscribe_unknown_topic_fails() {
        let broker = SubscriptionBroker::new(empty_cache());
        let id = broker.subscribe_feed(FeedType::ForexRates, Arc::new(|_| {}));
        assert!(matches!(
            broker.unsubscribe("fx", id),
            Err(BrokerError::UnknownTopic(_))
        ));
    }

    #[test]
    fn unsubscribed_callback_no_longer_receives() {
        let broker = SubscriptionBroker::new(empty_cache());
        let delivered = Arc::new(AtomicUsize::new(0));
        let id = broker.subscribe_feed(FeedType::MarketIndices, counting_callback(&delivered));

        let event = FeedEvent::Refresh {
            feed: FeedType::MarketIndices,
            batch: indices_batch(),
        };
        broker.publish(&event);
        broker.unsubscribe_feed(FeedType::MarketIndices, id).unwrap();
        broker.publish(&event);

        assert_eq!(delivered.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn delivery_follows_registration_order() {
        let broker = SubscriptionBroker::new(empty_cache());
        let order: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));

        for tag in 0..3u8 {
            let order = Arc::clone(&order);
            broker.subscribe_feed(
                FeedType::MarketIndices,
                Arc::new(move |_| order.lock().unwrap().push(tag)),
            );
        }

        broker.publish(&FeedEvent::Refresh {
            feed: FeedType::MarketIndices,
            batch: indices_batch(),
        });
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn publish_without_subscribers_is_a_no_op() {
        let broker = SubscriptionBroker::new(empty_cache());
        broker.publish(&FeedEvent::Refresh {
            feed: FeedType::MarketIndices,
            batch: indices_batch(),
        });
        assert_eq!(broker.total_subscribers(), 0);
    }
}
