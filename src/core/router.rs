//! # Router: the single owner of the topic registry.
//!
//! The router is one tokio task. Every mutation of the registry is a message
//! in one of its inboxes, so no two mutations can interleave and the registry
//! needs no lock.
//!
//! ## Architecture
//! ```text
//! EventBus (many callers)                 Router task (one)
//!   subscribe()   ──(Subscription, ack)──►┐
//!   unsubscribe() ──(Removal, ack)───────►┤
//!   publish()     ──EventRef─────────────►├─► select! ─► TopicRegistry ─► Topic ─► Subscription
//!   stats()       ──oneshot reply────────►┤
//!   close()       ──CancellationToken────►┘
//! ```
//!
//! ## Rules
//! - `select!` is unbiased: when several inboxes are ready, any one may win.
//!   Order is only preserved within a single inbox.
//! - A request picked after the token fired is rejected, never applied.
//! - Shutdown closes every subscription with `BusClosed`, closes the inboxes,
//!   drains subscriptions still queued for registration, then signals `done`.

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::registry::TopicRegistry;
use crate::core::stats::BusStats;
use crate::error::SubscriptionError;
use crate::events::EventRef;
use crate::subscription::{Subscription, SubscriptionId};

/// Acknowledgement sent once the router applied a request.
pub(crate) type Ack = oneshot::Sender<()>;

/// Removal request, keyed by identity.
#[derive(Debug)]
pub(crate) struct Removal {
    pub topic: String,
    pub id: SubscriptionId,
}

/// Sending halves of the router inboxes, held by the facade.
#[derive(Debug, Clone)]
pub(crate) struct Outbox {
    pub subscribe: mpsc::Sender<(Subscription, Ack)>,
    pub remove: mpsc::Sender<(Removal, Ack)>,
    pub publish: mpsc::Sender<EventRef>,
    pub stats: mpsc::Sender<oneshot::Sender<BusStats>>,
}

/// Receiving halves of the router inboxes.
pub(crate) struct Inbox {
    subscribe: mpsc::Receiver<(Subscription, Ack)>,
    remove: mpsc::Receiver<(Removal, Ack)>,
    publish: mpsc::Receiver<EventRef>,
    stats: mpsc::Receiver<oneshot::Sender<BusStats>>,
}

impl Inbox {
    /// Refuses further sends on every inbox; buffered messages stay readable.
    fn close(&mut self) {
        self.subscribe.close();
        self.remove.close();
        self.publish.close();
        self.stats.close();
    }
}

/// Creates the router inboxes, each with `capacity` slots.
pub(crate) fn mailbox(capacity: usize) -> (Outbox, Inbox) {
    let (sub_tx, sub_rx) = mpsc::channel(capacity);
    let (rm_tx, rm_rx) = mpsc::channel(capacity);
    let (pub_tx, pub_rx) = mpsc::channel(capacity);
    let (stats_tx, stats_rx) = mpsc::channel(capacity);

    let outbox = Outbox {
        subscribe: sub_tx,
        remove: rm_tx,
        publish: pub_tx,
        stats: stats_tx,
    };
    let inbox = Inbox {
        subscribe: sub_rx,
        remove: rm_rx,
        publish: pub_rx,
        stats: stats_rx,
    };
    (outbox, inbox)
}

/// One message taken from an inbox.
enum Request {
    Subscribe(Subscription, Ack),
    Remove(Removal, Ack),
    Publish(EventRef),
    Stats(oneshot::Sender<BusStats>),
}

/// Event loop that exclusively owns the [`TopicRegistry`].
pub(crate) struct Router {
    registry: TopicRegistry,
    inbox: Inbox,
    token: CancellationToken,
    done: CancellationToken,
    published: u64,
    delivered: u64,
    evicted: u64,
}

impl Router {
    /// Creates a router; `done` is cancelled when [`run`](Self::run) returns.
    pub(crate) fn new(inbox: Inbox, token: CancellationToken, done: CancellationToken) -> Self {
        Self {
            registry: TopicRegistry::new(),
            inbox,
            token,
            done,
            published: 0,
            delivered: 0,
            evicted: 0,
        }
    }

    /// Runs until the cancellation token fires.
    pub(crate) async fn run(mut self) {
        // Fires `done` even if the loop unwinds.
        let _done = self.done.clone().drop_guard();
        debug!("router started");

        loop {
            let request = tokio::select! {
                _ = self.token.cancelled() => break,
                Some((sub, ack)) = self.inbox.subscribe.recv() => Request::Subscribe(sub, ack),
                Some((removal, ack)) = self.inbox.remove.recv() => Request::Remove(removal, ack),
                Some(event) = self.inbox.publish.recv() => Request::Publish(event),
                Some(reply) = self.inbox.stats.recv() => Request::Stats(reply),
            };

            if self.token.is_cancelled() {
                Self::reject(request);
                break;
            }
            self.handle(request);
        }

        self.shutdown();
    }

    fn handle(&mut self, request: Request) {
        match request {
            Request::Subscribe(sub, ack) => {
                debug!(id = %sub.id(), topic = sub.topic(), "subscription registered");
                self.registry.add(sub);
                let _ = ack.send(());
            }
            Request::Remove(Removal { topic, id }, ack) => {
                let removed = self
                    .registry
                    .remove(&topic, id, SubscriptionError::Unsubscribed);
                debug!(%id, topic = %topic, removed, "unsubscribe processed");
                let _ = ack.send(());
            }
            Request::Publish(event) => self.publish(&event),
            Request::Stats(reply) => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn publish(&mut self, event: &EventRef) {
        let delivery = self.registry.publish(event);

        self.published += 1;
        self.delivered += delivery.delivered as u64;
        self.evicted += delivery.evicted.len() as u64;

        let topic = event.topic();
        for (id, reason) in &delivery.evicted {
            let label = reason.as_label();
            if *reason == SubscriptionError::Overflow {
                warn!(%id, topic, reason = label, "subscriber evicted");
            } else {
                debug!(%id, topic, reason = label, "subscriber pruned");
            }
        }
    }

    /// Drops a request that lost the race against shutdown.
    fn reject(request: Request) {
        match request {
            Request::Subscribe(sub, _ack) => sub.close(SubscriptionError::BusClosed),
            Request::Remove(..) | Request::Publish(_) | Request::Stats(_) => {}
        }
    }

    fn snapshot(&self) -> BusStats {
        BusStats {
            topics: self.registry.subscriber_counts(),
            published: self.published,
            delivered: self.delivered,
            evicted: self.evicted,
        }
    }

    fn shutdown(&mut self) {
        let topics = self.registry.len();
        self.registry.close_all(SubscriptionError::BusClosed);

        self.inbox.close();
        while let Ok((sub, _ack)) = self.inbox.subscribe.try_recv() {
            sub.close(SubscriptionError::BusClosed);
        }

        info!(
            topics,
            published = self.published,
            evicted = self.evicted,
            "router stopped"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::events::Envelope;

    fn spawn_router() -> (Outbox, CancellationToken, CancellationToken) {
        let (outbox, inbox) = mailbox(8);
        let token = CancellationToken::new();
        let done = CancellationToken::new();
        tokio::spawn(Router::new(inbox, token.clone(), done.clone()).run());
        (outbox, token, done)
    }

    async fn register(outbox: &Outbox, sub: Subscription) {
        let (ack, acked) = oneshot::channel();
        outbox.subscribe.send((sub, ack)).await.unwrap();
        acked.await.unwrap();
    }

    async fn stats(outbox: &Outbox) -> BusStats {
        let (reply, rx) = oneshot::channel();
        outbox.stats.send(reply).await.unwrap();
        rx.await.unwrap()
    }

    #[tokio::test]
    async fn test_subscribe_then_publish() {
        let (outbox, _token, _done) = spawn_router();
        let (sub, mut handle) = Subscription::new("orders", 2);
        register(&outbox, sub).await;

        outbox
            .publish
            .send(Envelope::arc("orders", "A"))
            .await
            .unwrap();

        let ev = tokio::time::timeout(Duration::from_secs(1), handle.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ev.payload::<&str>(), Some(&"A"));
        assert_eq!(stats(&outbox).await.subscribers("orders"), 1);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let (outbox, _token, _done) = spawn_router();
        let (sub, handle) = Subscription::new("orders", 1);
        let removal = || Removal {
            topic: "orders".into(),
            id: handle.id(),
        };
        register(&outbox, sub).await;

        for _ in 0..2 {
            let (ack, acked) = oneshot::channel();
            outbox.remove.send((removal(), ack)).await.unwrap();
            acked.await.unwrap();
        }

        assert_eq!(handle.error(), Some(SubscriptionError::Unsubscribed));
        assert!(stats(&outbox).await.topics.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_closes_everything_and_signals_done() {
        let (outbox, token, done) = spawn_router();
        let (a, mut ha) = Subscription::new("a", 1);
        let (b, mut hb) = Subscription::new("b", 1);
        register(&outbox, a).await;
        register(&outbox, b).await;

        token.cancel();
        done.cancelled().await;

        assert!(ha.recv().await.is_none());
        assert!(hb.recv().await.is_none());
        assert_eq!(ha.error(), Some(SubscriptionError::BusClosed));
        assert_eq!(hb.error(), Some(SubscriptionError::BusClosed));
        assert!(outbox.publish.send(Envelope::arc("a", "late")).await.is_err());
    }

    #[tokio::test]
    async fn test_queued_subscription_is_closed_on_shutdown() {
        let (outbox, inbox) = mailbox(8);
        let token = CancellationToken::new();
        let done = CancellationToken::new();

        let (sub, handle) = Subscription::new("late", 1);
        let (ack, acked) = oneshot::channel();
        outbox.subscribe.send((sub, ack)).await.unwrap();

        // Cancel before the router ever polls its inboxes.
        token.cancel();
        Router::new(inbox, token, done.clone()).run().await;

        assert!(done.is_cancelled());
        assert!(acked.await.is_err());
        assert_eq!(handle.error(), Some(SubscriptionError::BusClosed));
    }

    #[tokio::test]
    async fn test_counters() {
        let (outbox, _token, _done) = spawn_router();
        let (sub, _handle) = Subscription::new("orders", 1);
        register(&outbox, sub).await;

        for data in ["A", "B", "C"] {
            outbox
                .publish
                .send(Envelope::arc("orders", data))
                .await
                .unwrap();
        }
        outbox
            .publish
            .send(Envelope::arc("ghost", "X"))
            .await
            .unwrap();

        // Publishes and stats travel on different inboxes; poll until settled.
        let settled = loop {
            let s = stats(&outbox).await;
            if s.published == 4 {
                break s;
            }
            tokio::task::yield_now().await;
        };
        assert_eq!(settled.delivered, 1);
        assert_eq!(settled.evicted, 1);
        assert!(settled.topics.is_empty());
    }
}
