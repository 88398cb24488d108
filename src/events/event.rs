//! # Event capability published through the bus.
//!
//! The bus never inspects payloads. It only needs to know which topic an event
//! belongs to; the payload travels as an opaque `dyn Any` that consumers
//! downcast to the type they expect.
//!
//! The common handle type is [`EventRef`], an `Arc<dyn Event>`: one publish is
//! shared by every subscriber of the topic without cloning the payload.

use std::any::Any;
use std::sync::Arc;

/// # Publishable event.
///
/// An `Event` has a [`topic`](Event::topic) used for routing and opaque
/// [`data`](Event::data). Events are immutable once published.
///
/// # Example
/// ```
/// use std::any::Any;
/// use topicbus::Event;
///
/// struct OrderPlaced {
///     id: u64,
/// }
///
/// impl Event for OrderPlaced {
///     fn topic(&self) -> &str { "orders" }
///     fn data(&self) -> &(dyn Any + Send + Sync) { &self.id }
/// }
///
/// let ev = OrderPlaced { id: 7 };
/// assert_eq!(ev.topic(), "orders");
/// assert_eq!(ev.data().downcast_ref::<u64>(), Some(&7));
/// ```
pub trait Event: Send + Sync + 'static {
    /// Returns the topic this event is routed to.
    fn topic(&self) -> &str;

    /// Returns the opaque payload.
    fn data(&self) -> &(dyn Any + Send + Sync);
}

/// Shared handle to a published event.
pub type EventRef = Arc<dyn Event>;

impl dyn Event {
    /// Downcasts the payload to `T`.
    ///
    /// Returns `None` if the payload has a different type.
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.data().downcast_ref::<T>()
    }
}

impl std::fmt::Debug for dyn Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("topic", &self.topic())
            .finish_non_exhaustive()
    }
}
