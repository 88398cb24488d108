//! Error types used by the bus facade and by subscriptions.
//!
//! This module defines two enums:
//!
//! - [`BusError`]: returned synchronously by [`EventBus`](crate::EventBus) calls.
//! - [`SubscriptionError`]: the terminal reason recorded on a closed subscription.
//!
//! Both provide `as_label` for logs and metrics.

use thiserror::Error;

/// # Errors returned by the bus facade.
///
/// The only bus-level failure is that the bus has been closed. Calls racing
/// with [`EventBus::close`](crate::EventBus::close) may observe it as well.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// The bus was closed; the request never reached the router.
    #[error("event bus is closed")]
    Closed,
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use topicbus::BusError;
    ///
    /// assert_eq!(BusError::Closed.as_label(), "bus_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::Closed => "bus_closed",
        }
    }
}

/// # Terminal reason of a closed subscription.
///
/// Observed by the consumer through [`SubscriptionHandle::error`](crate::SubscriptionHandle::error)
/// once the queue reached end-of-stream. Never retried: an evicted subscriber
/// has to subscribe again to resume receiving.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionError {
    /// Removed by its owner via [`EventBus::unsubscribe`](crate::EventBus::unsubscribe),
    /// or pruned after the consumer dropped its handle.
    #[error("subscription was unsubscribed")]
    Unsubscribed,

    /// Evicted because its bounded queue was full when a publish targeted it.
    #[error("subscription buffer overflow")]
    Overflow,

    /// The bus shut down while the subscription was open.
    #[error("event bus is closed")]
    BusClosed,
}

impl SubscriptionError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use topicbus::SubscriptionError;
    ///
    /// assert_eq!(SubscriptionError::Overflow.as_label(), "subscription_overflow");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SubscriptionError::Unsubscribed => "subscription_unsubscribed",
            SubscriptionError::Overflow => "subscription_overflow",
            SubscriptionError::BusClosed => "subscription_bus_closed",
        }
    }
}

impl From<BusError> for SubscriptionError {
    fn from(err: BusError) -> Self {
        match err {
            BusError::Closed => SubscriptionError::BusClosed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_distinct() {
        let labels = [
            SubscriptionError::Unsubscribed.as_label(),
            SubscriptionError::Overflow.as_label(),
            SubscriptionError::BusClosed.as_label(),
            BusError::Closed.as_label(),
        ];
        for (i, a) in labels.iter().enumerate() {
            for b in &labels[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(BusError::Closed.to_string(), "event bus is closed");
        assert_eq!(
            SubscriptionError::Overflow.to_string(),
            "subscription buffer overflow"
        );
    }

    #[test]
    fn test_bus_error_maps_to_terminal_reason() {
        assert_eq!(
            SubscriptionError::from(BusError::Closed),
            SubscriptionError::BusClosed
        );
    }
}
