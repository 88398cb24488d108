//! # Consumer end of a subscription.
//!
//! [`SubscriptionHandle`] is what [`EventBus::subscribe`](crate::EventBus::subscribe)
//! returns. It reads events in publish order and reports the terminal reason
//! once the router closed the queue.
//!
//! ## Rules
//! - **Per-subscription FIFO**: events arrive in the order the router delivered them.
//! - **End-of-stream**: `recv()` returns `None` once the queue is closed *and* drained.
//! - **Terminal reason**: `error()` is `None` while open, `Some(..)` after close.
//! - **Dropping** the handle abandons the subscription; the router prunes it on
//!   the next publish to its topic.
//!
//! ## Example
//! ```rust
//! use topicbus::{Envelope, EventBus};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), topicbus::BusError> {
//!     let bus = EventBus::new();
//!     let mut sub = bus.subscribe("orders", 8).await?;
//!
//!     bus.publish(Envelope::new("orders", 1u32)).await?;
//!     let ev = sub.recv().await.expect("open subscription");
//!     assert_eq!(ev.payload::<u32>(), Some(&1));
//!
//!     bus.close();
//!     assert!(sub.recv().await.is_none());
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use super::subscription::{Shared, SubscriptionId};
use crate::error::SubscriptionError;
use crate::events::EventRef;

/// Read side of one subscription.
pub struct SubscriptionHandle {
    id: SubscriptionId,
    topic: String,
    capacity: usize,
    rx: mpsc::Receiver<EventRef>,
    shared: Arc<Shared>,
}

impl SubscriptionHandle {
    pub(crate) fn new(
        id: SubscriptionId,
        topic: String,
        capacity: usize,
        rx: mpsc::Receiver<EventRef>,
        shared: Arc<Shared>,
    ) -> Self {
        Self {
            id,
            topic,
            capacity,
            rx,
            shared,
        }
    }

    /// Returns the identity used by the router for removal.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Returns the topic this subscription listens to.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Returns the requested buffer size (0 for rendezvous subscriptions).
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the terminal reason, or `None` while the subscription is open.
    pub fn error(&self) -> Option<SubscriptionError> {
        self.shared.error.get().copied()
    }

    /// Returns `true` once the router has closed the queue.
    ///
    /// Buffered events may still be readable.
    pub fn is_closed(&self) -> bool {
        self.shared.error.get().is_some()
    }

    /// Receives the next event.
    ///
    /// Suspends until an event arrives or the queue is closed. Returns `None`
    /// at end-of-stream; check [`error`](Self::error) for the reason.
    ///
    /// Cancel safe. Dropping the future (a `timeout` elapsing, a lost
    /// `select!` branch) unparks the consumer, so a rendezvous subscription
    /// overflows on the next publish instead of buffering it.
    pub async fn recv(&mut self) -> Option<EventRef> {
        let _unpark = UnparkGuard::new(Arc::clone(&self.shared));
        std::future::poll_fn(|cx| self.poll_recv(cx)).await
    }

    /// Takes a buffered event without waiting.
    ///
    /// Returns `None` when nothing is buffered, whether or not the queue is closed.
    pub fn try_recv(&mut self) -> Option<EventRef> {
        self.rx.try_recv().ok()
    }

    /// Polls for the next event.
    ///
    /// While pending, the consumer counts as parked: a rendezvous subscription
    /// accepts exactly one hand-off until the next poll. A caller that stops
    /// polling after `Pending` stays parked until it polls again or drops the
    /// handle; prefer [`recv`](Self::recv) when the wait may be abandoned.
    pub fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<EventRef>> {
        let polled = self.rx.poll_recv(cx);
        self.shared
            .parked
            .store(polled.is_pending(), Ordering::Release);
        polled
    }

    #[cfg(test)]
    pub(crate) fn shared(&self) -> &Shared {
        &self.shared
    }
}

/// Clears the parked flag when a `recv` future completes or is dropped.
struct UnparkGuard {
    shared: Arc<Shared>,
}

impl UnparkGuard {
    fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }
}

impl Drop for UnparkGuard {
    fn drop(&mut self) {
        self.shared.parked.store(false, Ordering::Release);
    }
}

impl Stream for SubscriptionHandle {
    type Item = EventRef;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().poll_recv(cx)
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.shared.parked.store(false, Ordering::Release);
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .field("capacity", &self.capacity)
            .field("error", &self.error())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use futures::StreamExt;

    use crate::error::SubscriptionError;
    use crate::events::{Envelope, EventRef};
    use crate::subscription::Subscription;

    #[tokio::test]
    async fn test_recv_wakes_on_publish() {
        let (sub, mut handle) = Subscription::new("t", 1);

        let producer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            let ev: EventRef = Envelope::arc("t", "late");
            sub.publish(&ev).unwrap();
            sub
        });

        let ev = handle.recv().await.expect("event delivered");
        assert_eq!(ev.payload::<&str>(), Some(&"late"));
        drop(producer.await.unwrap());
    }

    #[tokio::test]
    async fn test_stream_ends_after_close() {
        let (sub, handle) = Subscription::new("t", 4);
        for data in ["A", "B"] {
            let ev: EventRef = Envelope::arc("t", data);
            sub.publish(&ev).unwrap();
        }
        sub.close(SubscriptionError::Overflow);

        let seen: Vec<&str> = handle
            .map(|ev| *ev.payload::<&str>().unwrap())
            .collect()
            .await;
        assert_eq!(seen, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_parked_consumer_accepts_rendezvous() {
        let (sub, mut handle) = Subscription::new("t", 0);

        let consumer = tokio::spawn(async move {
            let ev = handle.recv().await;
            (ev, handle)
        });
        // Let the consumer park first.
        while !consumer.is_finished() {
            tokio::task::yield_now().await;
            let ev: EventRef = Envelope::arc("t", "hand-off");
            if sub.publish(&ev).is_ok() {
                break;
            }
        }

        let (ev, handle) = consumer.await.unwrap();
        assert_eq!(ev.unwrap().payload::<&str>(), Some(&"hand-off"));
        assert!(handle.error().is_none());
    }

    #[tokio::test]
    async fn test_abandoned_recv_unparks_rendezvous_consumer() {
        let (sub, mut handle) = Subscription::new("t", 0);

        let waited = tokio::time::timeout(Duration::from_millis(10), handle.recv()).await;
        assert!(waited.is_err());
        assert!(!handle.shared().parked.load(Ordering::Acquire));

        let ev: EventRef = Envelope::arc("t", "nobody waiting");
        assert_eq!(sub.publish(&ev), Err(SubscriptionError::Overflow));
        assert!(handle.try_recv().is_none());
    }
}
