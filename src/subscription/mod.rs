//! # Subscriptions: one bounded queue per subscriber.
//!
//! A subscription is split in two halves at creation:
//! - [`Subscription`]: producer end, owned by the router inside the topic registry;
//! - [`SubscriptionHandle`]: consumer end, returned to the caller.
//!
//! ```text
//! Router ──try_send──► [bounded queue] ──recv──► SubscriptionHandle
//!    │                                                 │
//!    └── close(reason): error.set(reason), drop sender └─► None + error()
//! ```
//!
//! The halves share only the terminal reason and the "consumer parked" flag,
//! never a reference back into router-owned structures.

mod handle;
#[allow(clippy::module_inception)]
mod subscription;

pub use handle::SubscriptionHandle;
pub use subscription::SubscriptionId;

pub(crate) use subscription::Subscription;
