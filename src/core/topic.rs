//! # Topic: ordered subscribers of one topic name.
//!
//! Delivery applies the backpressure policy:
//! ```text
//! deliver(event)
//!     │   (immutable pass over the subscriber list)
//!     ├──► sub 1: try_send ── Ok ──► delivered
//!     ├──► sub 2: try_send ── Full ─► eviction recorded (event dropped for sub 2)
//!     └──► sub N: try_send ── Ok ──► delivered
//!
//! evictions are applied afterwards by the registry through `remove`
//! ```
//!
//! ## Rules
//! - Subscribers are visited in registration order.
//! - The list is not mutated while it is being walked, so no subscriber is
//!   skipped or visited twice.

use crate::error::SubscriptionError;
use crate::events::EventRef;
use crate::subscription::{Subscription, SubscriptionId};

/// Outcome of delivering one event to one topic.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Delivery {
    /// Subscribers that accepted the event.
    pub delivered: usize,
    /// Subscribers to evict, with the reason.
    pub evicted: Vec<(SubscriptionId, SubscriptionError)>,
}

/// Subscribers registered under one topic name.
#[derive(Debug)]
pub(crate) struct Topic {
    name: String,
    subscribers: Vec<Subscription>,
}

impl Topic {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subscribers: Vec::with_capacity(1),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Appends a subscriber; delivery order follows insertion order.
    pub(crate) fn add(&mut self, sub: Subscription) {
        debug_assert_eq!(sub.topic(), self.name);
        self.subscribers.push(sub);
    }

    /// Removes the subscriber with `id` and closes it with `reason`.
    ///
    /// Returns `false` if no such subscriber exists.
    pub(crate) fn remove(&mut self, id: SubscriptionId, reason: SubscriptionError) -> bool {
        let Some(pos) = self.subscribers.iter().position(|s| s.id() == id) else {
            return false;
        };
        self.subscribers.remove(pos).close(reason);
        true
    }

    /// Closes every subscriber with `reason` and empties the list.
    pub(crate) fn close_all(&mut self, reason: SubscriptionError) {
        for sub in self.subscribers.drain(..) {
            sub.close(reason);
        }
    }

    /// Offers `event` to every subscriber without blocking.
    ///
    /// Does not evict; the returned [`Delivery`] lists who has to go.
    pub(crate) fn deliver(&self, event: &EventRef) -> Delivery {
        let mut out = Delivery::default();
        for sub in &self.subscribers {
            match sub.publish(event) {
                Ok(()) => out.delivered += 1,
                Err(reason) => out.evicted.push((sub.id(), reason)),
            }
        }
        out
    }
}
