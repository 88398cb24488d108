//! # Generic event carrier (`Envelope`)
//!
//! [`Envelope`] pairs a topic name with any `Send + Sync` payload, so callers
//! do not have to implement [`Event`] for every message type.
//!
//! ## Example
//! ```rust
//! use topicbus::{Envelope, EventRef};
//!
//! let ev: EventRef = Envelope::arc("orders", "A");
//!
//! assert_eq!(ev.topic(), "orders");
//! assert_eq!(ev.payload::<&str>(), Some(&"A"));
//! ```

use std::any::Any;
use std::borrow::Cow;
use std::sync::Arc;

use crate::events::event::Event;

/// Topic name plus payload.
#[derive(Debug, Clone)]
pub struct Envelope<T> {
    topic: Cow<'static, str>,
    data: T,
}

impl<T> Envelope<T> {
    /// Creates a new envelope.
    ///
    /// Prefer [`Envelope::arc`] when you immediately need an [`EventRef`](crate::EventRef).
    pub fn new(topic: impl Into<Cow<'static, str>>, data: T) -> Self {
        Self {
            topic: topic.into(),
            data,
        }
    }

    /// Creates the envelope and returns it as a shared handle.
    pub fn arc(topic: impl Into<Cow<'static, str>>, data: T) -> Arc<Self> {
        Arc::new(Self::new(topic, data))
    }

    /// Returns the typed payload.
    pub fn get(&self) -> &T {
        &self.data
    }

    /// Consumes the envelope and returns the payload.
    pub fn into_inner(self) -> T {
        self.data
    }
}

impl<T> Event for Envelope<T>
where
    T: Send + Sync + 'static,
{
    fn topic(&self) -> &str {
        &self.topic
    }

    fn data(&self) -> &(dyn Any + Send + Sync) {
        &self.data
    }
}
