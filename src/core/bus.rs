//! # EventBus: the public facade.
//!
//! Each call becomes a message for the router. The caller suspends while the
//! message is handed off, racing the hand-off against the bus's
//! [`CancellationToken`], so no call hangs once [`close`](EventBus::close) fired.
//!
//! ## Call semantics
//! ```text
//! publish(ev)      ─► token fired? ─► Err(Closed)
//!                  └► send to publish inbox ─► Ok(())            (delivery is async)
//!
//! subscribe(t, n)  ─► Subscription::new(t, n) ─► send (sub, ack) ─► await ack ─► Ok(handle)
//! unsubscribe(&h)  ─► send (Removal{t, id}, ack) ─► await ack ─► Ok(())  (idempotent)
//! close()          ─► token.cancel()                                       (idempotent)
//! ```
//!
//! ## Ordering
//! - Publishes from one caller are routed in call order.
//! - `subscribe`/`unsubscribe` return only after the router applied them, so a
//!   caller's own publish issued afterwards observes the change.
//! - Concurrent callers get no cross-inbox ordering.
//!
//! ## Lifecycle
//! `Open → Closed`. `close()` from any clone closes the bus for all clones.
//! Dropping the last clone has the same effect.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::BusConfig;
use crate::core::builder::EventBusBuilder;
use crate::core::router::{self, Ack, Outbox, Removal, Router};
use crate::core::stats::BusStats;
use crate::error::BusError;
use crate::events::{Event, EventRef};
use crate::subscription::{Subscription, SubscriptionHandle};

/// State shared by every clone of one bus.
struct Inner {
    cfg: BusConfig,
    outbox: Outbox,
    token: CancellationToken,
    done: CancellationToken,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// In-process publish/subscribe bus.
///
/// Cheap to clone; all clones talk to the same router task.
///
/// # Example
/// ```rust
/// use topicbus::{Envelope, EventBus, SubscriptionError};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), topicbus::BusError> {
///     let bus = EventBus::new();
///     let mut sub = bus.subscribe("orders", 2).await?;
///
///     bus.publish(Envelope::new("orders", "A")).await?;
///     bus.publish(Envelope::new("orders", "B")).await?;
///     bus.publish(Envelope::new("orders", "C")).await?; // overflows: evicted
///
///     // Delivery is asynchronous; wait until the router handled all three.
///     while bus.stats().await?.published < 3 {
///         tokio::task::yield_now().await;
///     }
///
///     assert_eq!(sub.recv().await.unwrap().payload::<&str>(), Some(&"A"));
///     assert_eq!(sub.recv().await.unwrap().payload::<&str>(), Some(&"B"));
///     assert!(sub.recv().await.is_none());
///     assert_eq!(sub.error(), Some(SubscriptionError::Overflow));
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Inner>,
}

impl EventBus {
    /// Creates a bus with [`BusConfig::default`] and spawns its router.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime.
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    /// Creates a bus with the given configuration and spawns its router.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime.
    pub fn with_config(cfg: BusConfig) -> Self {
        let (outbox, inbox) = router::mailbox(cfg.inbox_capacity_clamped());
        let token = CancellationToken::new();
        let done = CancellationToken::new();

        let span = tracing::info_span!("router", bus = %cfg.name);
        let router = Router::new(inbox, token.clone(), done.clone());
        tokio::spawn(router.run().instrument(span));

        Self {
            inner: Arc::new(Inner {
                cfg,
                outbox,
                token,
                done,
            }),
        }
    }

    /// Returns a builder for a customized bus.
    pub fn builder() -> EventBusBuilder {
        EventBusBuilder::new()
    }

    /// Returns the configuration this bus was built with.
    pub fn config(&self) -> &BusConfig {
        &self.inner.cfg
    }

    /// Publishes an event to every current subscriber of its topic.
    ///
    /// Returns once the router's inbox accepted the event. Publishing to a
    /// topic without subscribers succeeds and has no effect.
    ///
    /// # Errors
    /// [`BusError::Closed`] if the bus is closed or closes while waiting.
    pub async fn publish<E: Event>(&self, event: E) -> Result<(), BusError> {
        self.publish_arc(Arc::new(event)).await
    }

    /// Publishes an already shared event.
    ///
    /// Preferred over [`publish`](Self::publish) when the event is already an
    /// [`EventRef`] (no extra allocation).
    ///
    /// # Errors
    /// [`BusError::Closed`] if the bus is closed or closes while waiting.
    pub async fn publish_arc(&self, event: EventRef) -> Result<(), BusError> {
        self.hand_off(&self.inner.outbox.publish, event).await
    }

    /// Subscribes to `topic` with a queue of `buffer_size` events.
    ///
    /// `buffer_size = 0` creates a rendezvous subscription: an event is only
    /// delivered while the consumer is waiting in `recv`, otherwise the
    /// subscription overflows.
    ///
    /// # Errors
    /// [`BusError::Closed`] if the bus is closed or closes before the router
    /// registered the subscription.
    pub async fn subscribe(
        &self,
        topic: impl Into<String>,
        buffer_size: usize,
    ) -> Result<SubscriptionHandle, BusError> {
        self.ensure_open()?;
        let (sub, handle) = Subscription::new(topic, buffer_size);
        self.call(&self.inner.outbox.subscribe, sub).await?;
        Ok(handle)
    }

    /// Removes the subscription behind `handle`.
    ///
    /// The handle stays readable: buffered events drain, then `recv` returns
    /// `None` and `error()` reports `Unsubscribed`. Calling this again for the
    /// same handle succeeds and changes nothing.
    ///
    /// # Errors
    /// [`BusError::Closed`] if the bus is closed.
    pub async fn unsubscribe(&self, handle: &SubscriptionHandle) -> Result<(), BusError> {
        let removal = Removal {
            topic: handle.topic().to_owned(),
            id: handle.id(),
        };
        self.call(&self.inner.outbox.remove, removal).await
    }

    /// Returns a snapshot of topics and router counters.
    ///
    /// Stats travel on their own inbox: publishes still queued for the router
    /// may not be reflected yet.
    ///
    /// # Errors
    /// [`BusError::Closed`] if the bus is closed.
    pub async fn stats(&self) -> Result<BusStats, BusError> {
        let (reply, rx) = oneshot::channel();
        self.hand_off(&self.inner.outbox.stats, reply).await?;
        self.await_reply(rx).await
    }

    /// Closes the bus.
    ///
    /// Every open subscription ends with `BusClosed`; subsequent calls fail
    /// with [`BusError::Closed`]. Calling it again is a no-op.
    pub fn close(&self) {
        self.inner.token.cancel();
    }

    /// Returns `true` once [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Waits until the router finished closing every subscription.
    ///
    /// Does not close the bus by itself; see [`shutdown`](Self::shutdown).
    pub async fn closed(&self) {
        self.inner.done.cancelled().await;
    }

    /// Closes the bus and waits for the router to finish.
    pub async fn shutdown(&self) {
        self.close();
        self.closed().await;
    }

    // ---------------------------
    // Helpers
    // ---------------------------

    fn ensure_open(&self) -> Result<(), BusError> {
        if self.is_closed() {
            Err(BusError::Closed)
        } else {
            Ok(())
        }
    }

    /// Sends `msg`, giving up as soon as the bus closes.
    async fn hand_off<T>(&self, tx: &mpsc::Sender<T>, msg: T) -> Result<(), BusError> {
        self.ensure_open()?;
        tokio::select! {
            _ = self.inner.token.cancelled() => Err(BusError::Closed),
            sent = tx.send(msg) => sent.map_err(|_| BusError::Closed),
        }
    }

    /// Sends `payload` with an acknowledgement and waits for the router to apply it.
    async fn call<T>(&self, tx: &mpsc::Sender<(T, Ack)>, payload: T) -> Result<(), BusError> {
        let (ack, acked) = oneshot::channel();
        self.hand_off(tx, (payload, ack)).await?;
        self.await_reply(acked).await
    }

    async fn await_reply<T>(&self, rx: oneshot::Receiver<T>) -> Result<T, BusError> {
        tokio::select! {
            _ = self.inner.token.cancelled() => Err(BusError::Closed),
            reply = rx => reply.map_err(|_| BusError::Closed),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("name", &self.inner.cfg.name)
            .field("closed", &self.is_closed())
            .finish()
    }
}
