//! Events: the publishable capability and a generic carrier.
//!
//! ## Contents
//! - [`Event`], [`EventRef`] routing capability and its shared handle
//! - [`Envelope`] topic + payload implementation of [`Event`]

mod envelope;
mod event;

pub use envelope::Envelope;
pub use event::{Event, EventRef};
