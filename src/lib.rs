//! # topicbus
//!
//! **topicbus** is an in-process publish/subscribe event bus for Tokio.
//!
//! Producers publish events by topic name; consumers subscribe to a topic and
//! read events from a bounded per-subscriber queue. A single router task owns
//! the subscriber registry, so concurrent callers never contend on a lock.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   publisher        publisher        subscriber owner
//!       │                │                  │
//!       ▼                ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  EventBus (facade, cloneable)                                     │
//! │  - publish / subscribe / unsubscribe / stats  → router inboxes    │
//! │  - close                                      → CancellationToken │
//! └──────────────────────────────┬────────────────────────────────────┘
//!                                ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Router (one tokio task, sole owner of the registry)              │
//! │  select! { token, subscribe, remove, publish, stats }             │
//! └──────────────────────────────┬────────────────────────────────────┘
//!                                ▼
//!                     TopicRegistry (name → Topic)
//!                                │
//!                 ┌──────────────┼──────────────┐
//!                 ▼              ▼              ▼
//!              Topic A        Topic B        Topic C
//!             ┌───┴───┐          │              │
//!             ▼       ▼          ▼              ▼
//!          [queue] [queue]    [queue]        [queue]     (bounded, per subscriber)
//!             │       │          │              │
//!             ▼       ▼          ▼              ▼
//!       SubscriptionHandle::recv() / Stream
//! ```
//!
//! ### Backpressure
//! ```text
//! publish(ev) ─► Topic::deliver(ev)
//!                  ├─ queue has room ─► enqueued
//!                  └─ queue full     ─► evicted: error = Overflow, queue closed
//!                                       (buffered events stay readable)
//! ```
//! Publishers never wait on slow consumers. A consumer that falls behind is
//! cut off and has to subscribe again.
//!
//! ### Shutdown
//! `close()` fires the bus token. The router closes every subscription with
//! `BusClosed` and exits; every later call returns [`BusError::Closed`].
//!
//! ## Features
//! | Area              | Description                                             | Key types                                  |
//! |-------------------|---------------------------------------------------------|--------------------------------------------|
//! | **Bus**           | Publish, subscribe, unsubscribe, close.                 | [`EventBus`], [`EventBusBuilder`]          |
//! | **Events**        | Topic + opaque payload capability.                      | [`Event`], [`EventRef`], [`Envelope`]      |
//! | **Subscriptions** | Bounded queues with terminal reasons.                   | [`SubscriptionHandle`], [`SubscriptionId`] |
//! | **Errors**        | Bus-level and subscription-level failures.              | [`BusError`], [`SubscriptionError`]        |
//! | **Configuration** | Inbox sizing and naming.                                | [`BusConfig`]                              |
//! | **Introspection** | Topic sizes and delivery counters.                      | [`BusStats`]                               |
//!
//! ## Example
//! ```rust
//! use topicbus::{Envelope, EventBus, SubscriptionError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = EventBus::new();
//!     let mut orders = bus.subscribe("orders", 16).await?;
//!
//!     bus.publish(Envelope::new("orders", "A")).await?;
//!     bus.publish(Envelope::new("ghost", "X")).await?; // no subscribers: no-op
//!
//!     let ev = orders.recv().await.expect("subscription open");
//!     assert_eq!(ev.payload::<&str>(), Some(&"A"));
//!
//!     bus.shutdown().await;
//!     assert!(orders.recv().await.is_none());
//!     assert_eq!(orders.error(), Some(SubscriptionError::BusClosed));
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod subscription;

// ---- Public re-exports ----

pub use config::BusConfig;
pub use crate::core::{BusStats, EventBus, EventBusBuilder};
pub use error::{BusError, SubscriptionError};
pub use events::{Envelope, Event, EventRef};
pub use subscription::{SubscriptionHandle, SubscriptionId};
