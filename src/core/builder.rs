use std::borrow::Cow;

use crate::config::BusConfig;

use super::bus::EventBus;

/// Builder for constructing an [`EventBus`] with non-default settings.
///
/// ```rust
/// use topicbus::EventBus;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let bus = EventBus::builder().name("orders-bus").inbox_capacity(16).build();
///     assert_eq!(bus.config().inbox_capacity, 16);
///     bus.shutdown().await;
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventBusBuilder {
    cfg: BusConfig,
}

impl EventBusBuilder {
    /// Creates a builder starting from [`BusConfig::default`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing configuration.
    pub fn from_config(cfg: BusConfig) -> Self {
        Self { cfg }
    }

    /// Sets the name reported in the router's tracing span.
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.cfg.name = name.into();
        self
    }

    /// Sets the capacity of each router inbox (clamped to at least 1).
    pub fn inbox_capacity(mut self, capacity: usize) -> Self {
        self.cfg.inbox_capacity = capacity;
        self
    }

    /// Builds the bus and spawns its router.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime.
    pub fn build(self) -> EventBus {
        EventBus::with_config(self.cfg)
    }
}
