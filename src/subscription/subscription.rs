//! # Router-side subscription: producer end of one subscriber queue.
//!
//! A [`Subscription`] is created together with its [`SubscriptionHandle`].
//! The router keeps the `Subscription` (the sender) inside the topic registry;
//! the consumer keeps the handle (the receiver).
//!
//! ## State machine
//! ```text
//! Open ──close(Unsubscribed | Overflow | BusClosed)──► Closed
//! ```
//! - `close` consumes the value, so the transition happens at most once.
//! - The terminal reason is stored **before** the sender is dropped: a consumer
//!   that observes end-of-stream always finds `error()` set.
//!
//! ## Rendezvous queues
//! A buffer size of 0 means nothing is ever buffered. The queue is backed by a
//! one-slot channel and an enqueue is only attempted while the consumer is
//! parked in `recv`; otherwise the publish overflows.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::sync::{Semaphore, mpsc};

use super::handle::SubscriptionHandle;
use crate::error::SubscriptionError;
use crate::events::EventRef;

/// Global counter for subscription identities.
static SUBSCRIPTION_SEQ: AtomicU64 = AtomicU64::new(0);

/// Stable identity of a subscription.
///
/// Removal is always by identity, never by topic or content, so two
/// subscriptions on the same topic with the same buffer size stay distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) fn next() -> Self {
        Self(SUBSCRIPTION_SEQ.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw numeric value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// State shared between the router side and the consumer handle.
#[derive(Debug, Default)]
pub(crate) struct Shared {
    /// Terminal reason; written once by the router.
    pub(crate) error: OnceLock<SubscriptionError>,
    /// Consumer is currently waiting in `recv` (only consulted for rendezvous queues).
    pub(crate) parked: AtomicBool,
}

/// Producer end of a subscriber queue. Owned exclusively by the router.
pub(crate) struct Subscription {
    id: SubscriptionId,
    topic: String,
    tx: Option<mpsc::Sender<EventRef>>,
    rendezvous: bool,
    shared: Arc<Shared>,
}

impl Subscription {
    /// Creates a subscription and the handle its consumer reads from.
    pub(crate) fn new(topic: impl Into<String>, buffer_size: usize) -> (Self, SubscriptionHandle) {
        let topic = topic.into();
        let id = SubscriptionId::next();
        let (tx, rx) = mpsc::channel(buffer_size.clamp(1, Semaphore::MAX_PERMITS));
        let shared = Arc::new(Shared::default());

        let handle =
            SubscriptionHandle::new(id, topic.clone(), buffer_size, rx, Arc::clone(&shared));
        let sub = Self {
            id,
            topic,
            tx: Some(tx),
            rendezvous: buffer_size == 0,
            shared,
        };
        (sub, handle)
    }

    pub(crate) fn id(&self) -> SubscriptionId {
        self.id
    }

    pub(crate) fn topic(&self) -> &str {
        &self.topic
    }

    /// Attempts a non-blocking enqueue.
    ///
    /// - `Err(Overflow)`: queue full, or rendezvous queue without a parked consumer
    /// - `Err(Unsubscribed)`: the consumer dropped its handle
    pub(crate) fn publish(&self, event: &EventRef) -> Result<(), SubscriptionError> {
        let Some(tx) = &self.tx else {
            return Err(SubscriptionError::Overflow);
        };
        if self.rendezvous && !self.shared.parked.load(Ordering::Acquire) {
            return Err(SubscriptionError::Overflow);
        }
        tx.try_send(Arc::clone(event)).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SubscriptionError::Overflow,
            mpsc::error::TrySendError::Closed(_) => SubscriptionError::Unsubscribed,
        })
    }

    /// Records the terminal reason and closes the queue.
    ///
    /// Events already buffered stay readable; the consumer sees end-of-stream
    /// after draining them.
    pub(crate) fn close(mut self, reason: SubscriptionError) {
        self.seal(reason);
    }

    fn seal(&mut self, reason: SubscriptionError) {
        if let Some(tx) = self.tx.take() {
            let _ = self.shared.error.set(reason);
            drop(tx);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // Only reached unclosed when the router itself is torn down.
        self.seal(SubscriptionError::BusClosed);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .field("open", &self.tx.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Envelope;

    fn event(topic: &'static str, data: &'static str) -> EventRef {
        Envelope::arc(topic, data)
    }

    #[test]
    fn test_new_subscription() {
        let (sub, handle) = Subscription::new("test_topic", 10);
        assert_eq!(sub.topic(), "test_topic");
        assert_eq!(handle.topic(), "test_topic");
        assert_eq!(sub.id(), handle.id());
        assert_eq!(handle.capacity(), 10);
        assert!(handle.error().is_none());
        assert!(!handle.is_closed());
    }

    #[test]
    fn test_ids_are_unique() {
        let (a, _ha) = Subscription::new("t", 1);
        let (b, _hb) = Subscription::new("t", 1);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_publish_until_full() {
        let (sub, mut handle) = Subscription::new("t", 2);
        assert_eq!(sub.publish(&event("t", "A")), Ok(()));
        assert_eq!(sub.publish(&event("t", "B")), Ok(()));
        assert_eq!(
            sub.publish(&event("t", "C")),
            Err(SubscriptionError::Overflow)
        );

        let first = handle.try_recv().expect("A buffered");
        assert_eq!(first.payload::<&str>(), Some(&"A"));
    }

    #[test]
    fn test_close_sets_error_and_keeps_buffered_events() {
        let (sub, mut handle) = Subscription::new("t", 4);
        sub.publish(&event("t", "A")).unwrap();
        sub.close(SubscriptionError::Unsubscribed);

        assert_eq!(handle.error(), Some(SubscriptionError::Unsubscribed));
        assert!(handle.try_recv().is_some());
        assert!(handle.try_recv().is_none());
        assert!(handle.is_closed());
    }

    #[test]
    fn test_drop_without_close_reports_bus_closed() {
        let (sub, handle) = Subscription::new("t", 1);
        drop(sub);
        assert_eq!(handle.error(), Some(SubscriptionError::BusClosed));
    }

    #[test]
    fn test_dropped_handle_reports_unsubscribed() {
        let (sub, handle) = Subscription::new("t", 1);
        drop(handle);
        assert_eq!(
            sub.publish(&event("t", "A")),
            Err(SubscriptionError::Unsubscribed)
        );
    }

    #[test]
    fn test_rendezvous_without_consumer_overflows() {
        let (sub, _handle) = Subscription::new("t", 0);
        assert_eq!(
            sub.publish(&event("t", "A")),
            Err(SubscriptionError::Overflow)
        );
    }

    #[test]
    fn test_rendezvous_with_parked_consumer() {
        let (sub, mut handle) = Subscription::new("t", 0);
        handle.shared().parked.store(true, Ordering::Release);

        assert_eq!(sub.publish(&event("t", "A")), Ok(()));
        // A second hand-off before the consumer took the first one overflows.
        assert_eq!(
            sub.publish(&event("t", "B")),
            Err(SubscriptionError::Overflow)
        );
        assert!(handle.try_recv().is_some());
    }
}
