//! Point-in-time view of a bus, answered by the router.

use std::collections::BTreeMap;

/// Snapshot of the registry and the router's running counters.
///
/// Produced by [`EventBus::stats`](crate::EventBus::stats). Counters cover the
/// whole life of the bus; the subscriber map reflects the moment the router
/// handled the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusStats {
    /// Live subscriber count per topic (topics without subscribers are absent).
    pub topics: BTreeMap<String, usize>,
    /// Publish requests processed by the router.
    pub published: u64,
    /// Events successfully enqueued into subscriber queues.
    pub delivered: u64,
    /// Subscribers evicted on publish (overflow or abandoned handle).
    pub evicted: u64,
}

impl BusStats {
    /// Returns the subscriber count for `topic` (0 if unknown).
    pub fn subscribers(&self, topic: &str) -> usize {
        self.topics.get(topic).copied().unwrap_or(0)
    }

    /// Returns the subscriber count across all topics.
    pub fn total_subscribers(&self) -> usize {
        self.topics.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_helpers() {
        let stats = BusStats {
            topics: BTreeMap::from([("a".to_string(), 2), ("b".to_string(), 3)]),
            ..BusStats::default()
        };
        assert_eq!(stats.subscribers("a"), 2);
        assert_eq!(stats.subscribers("missing"), 0);
        assert_eq!(stats.total_subscribers(), 5);
    }
}
