//! # Relay configuration.
//!
//! Provides [`RelayConfig`] centralized settings for a single [`Relay`](crate::Relay).
//!
//! Config is used in two ways:
//! 1. **Full control**: `Relay::with_config(config, &scope)`
//! 2. **Mode only**: `Relay::new(mode, &scope)` is `with_config(RelayConfig::default().with_mode(mode), ..)`
//!
//! ## Sentinel values
//! - `capacity = 0` → clamped to 1 (a hand-off buffer cannot be empty)
//! - `capacity` is ignored in [`DeliveryMode::Broadcast`]

use crate::policies::DeliveryMode;

/// Default retained buffer size (same as a "buffered" hand-off channel).
pub const DEFAULT_CAPACITY: usize = 64;

/// Configuration for one relay instance.
///
/// ## Field semantics
/// - `mode`: Delivery policy, fixed for the relay lifetime
/// - `capacity`: Retained buffer size (min 1; clamped by [`RelayConfig::capacity_clamped`])
/// - `name`: Label attached to every log record emitted by the relay
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayConfig {
    /// Delivery policy for events without subscribers.
    pub mode: DeliveryMode,

    /// Maximum number of undelivered events kept in [`DeliveryMode::Retaining`].
    ///
    /// Emitting into a full buffer fails with [`EmitError::Full`](crate::EmitError::Full)
    /// instead of blocking the producer.
    pub capacity: usize,

    /// Human-readable name (for logs).
    pub name: &'static str,
}

impl RelayConfig {
    /// Returns the retained buffer size clamped to a minimum of 1.
    #[inline]
    pub fn capacity_clamped(&self) -> usize {
        self.capacity.max(1)
    }

    /// Sets the delivery mode.
    #[must_use]
    pub fn with_mode(mut self, mode: DeliveryMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the retained buffer size.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the relay name used in logs.
    #[must_use]
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

impl Default for RelayConfig {
    /// Default configuration:
    ///
    /// - `mode = DeliveryMode::Retaining`
    /// - `capacity = 64`
    /// - `name = "relay"`
    fn default() -> Self {
        Self {
            mode: DeliveryMode::default(),
            capacity: DEFAULT_CAPACITY,
            name: "relay",
        }
    }
}
