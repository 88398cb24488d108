//! # Topic registry: topic name → subscribers.
//!
//! Owned by the router task and never shared, so it needs no locking.
//!
//! ## Rules
//! - A topic is created lazily by the first `add` to its name.
//! - A topic is dropped as soon as its last subscriber leaves (remove or eviction).
//! - `close_all` runs once, from the router's shutdown path.
//!
//! ```text
//! publish(event)
//!   └─► get(event.topic) ── None ──► no-op
//!              │
//!              └─ Some(topic) ─► topic.deliver(event) ─► Delivery
//!                                                          └─► remove(id, reason) per eviction
//! ```

use std::collections::{BTreeMap, HashMap};

use crate::core::topic::{Delivery, Topic};
use crate::error::SubscriptionError;
use crate::events::EventRef;
use crate::subscription::{Subscription, SubscriptionId};

/// Router-owned map of topics.
#[derive(Debug, Default)]
pub(crate) struct TopicRegistry {
    topics: HashMap<String, Topic>,
}

impl TopicRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live topics.
    pub(crate) fn len(&self) -> usize {
        self.topics.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Registers `sub` under its topic, creating the topic if needed.
    pub(crate) fn add(&mut self, sub: Subscription) {
        self.topics
            .entry(sub.topic().to_owned())
            .or_insert_with_key(|name| Topic::new(name.as_str()))
            .add(sub);
    }

    /// Removes subscription `id` from `topic`, closing it with `reason`.
    ///
    /// Prunes the topic when it becomes empty. Returns `false` when nothing
    /// was removed (already gone or never registered).
    pub(crate) fn remove(
        &mut self,
        topic: &str,
        id: SubscriptionId,
        reason: SubscriptionError,
    ) -> bool {
        let Some(entry) = self.topics.get_mut(topic) else {
            return false;
        };
        let removed = entry.remove(id, reason);
        if entry.is_empty() {
            self.topics.remove(topic);
        }
        removed
    }

    pub(crate) fn get(&self, topic: &str) -> Option<&Topic> {
        self.topics.get(topic)
    }

    /// Delivers `event` to its topic and evicts subscribers that could not take it.
    ///
    /// Publishing to an unknown topic is a no-op.
    pub(crate) fn publish(&mut self, event: &EventRef) -> Delivery {
        let topic = event.topic();
        let Some(entry) = self.get(topic) else {
            return Delivery::default();
        };

        let delivery = entry.deliver(event);
        for (id, reason) in &delivery.evicted {
            self.remove(topic, *id, *reason);
        }
        delivery
    }

    /// Closes every subscription with `reason` and empties the registry.
    pub(crate) fn close_all(&mut self, reason: SubscriptionError) {
        for (_, mut topic) in self.topics.drain() {
            topic.close_all(reason);
        }
    }

    /// Subscriber count per topic, sorted by name.
    pub(crate) fn subscriber_counts(&self) -> BTreeMap<String, usize> {
        self.topics
            .iter()
            .map(|(name, topic)| (name.clone(), topic.len()))
            .collect()
    }
}
