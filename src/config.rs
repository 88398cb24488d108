//! # Bus configuration.
//!
//! Provides [`BusConfig`] construction-time settings for an [`EventBus`](crate::EventBus).
//!
//! Config is used in two ways:
//! 1. **Direct**: `EventBus::with_config(config)`
//! 2. **Builder**: `EventBus::builder().inbox_capacity(64).build()`
//!
//! ## Sentinel values
//! - `inbox_capacity = 0` → clamped to 1 (tokio channels cannot be zero-sized)

use std::borrow::Cow;

/// Settings for one bus instance.
///
/// ## Field semantics
/// - `name`: label attached to the router's tracing span (useful with several buses)
/// - `inbox_capacity`: slots in each router inbox; a full inbox suspends callers
///
/// ## Notes
/// The inbox capacity bounds how far publishers may run ahead of the router.
/// It does not affect subscriber queues, which are sized per subscription.
#[derive(Clone, Debug)]
pub struct BusConfig {
    /// Name reported in the router's tracing span.
    pub name: Cow<'static, str>,

    /// Capacity of each router inbox (subscribe, remove, publish, stats).
    ///
    /// - `0` is clamped to `1`
    /// - larger values let publishers enqueue without waiting for the router
    pub inbox_capacity: usize,
}

impl BusConfig {
    /// Returns the inbox capacity clamped to a minimum of 1.
    #[inline]
    pub fn inbox_capacity_clamped(&self) -> usize {
        self.inbox_capacity.max(1)
    }
}

impl Default for BusConfig {
    /// Default configuration:
    ///
    /// - `name = "topicbus"`
    /// - `inbox_capacity = 128`
    fn default() -> Self {
        Self {
            name: Cow::Borrowed("topicbus"),
            inbox_capacity: 128,
        }
    }
}
