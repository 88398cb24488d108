//! Bus core: facade, router and registry.
//!
//! The only public API from this module is [`EventBus`] (with its builder and
//! [`BusStats`]); everything it reaches is owned by the router task.
//!
//! Internal modules:
//! - [`bus`]: public facade turning calls into router messages;
//! - [`router`]: single task that owns the registry and serializes requests;
//! - [`registry`]: topic name → topic, lazily created and pruned;
//! - [`topic`]: ordered subscribers of one topic, backpressure on delivery;
//! - [`stats`]: snapshot answered by the router.

mod builder;
mod bus;
mod registry;
mod router;
mod stats;
mod topic;

pub use builder::EventBusBuilder;
pub use bus::EventBus;
pub use stats::BusStats;
