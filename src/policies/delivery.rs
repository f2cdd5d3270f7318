//! # Delivery policies for a relay.
//!
//! [`DeliveryMode`] decides what happens to an event that nobody is listening for.
//!
//! - [`DeliveryMode::Retaining`] the event waits in a FIFO buffer until a subscriber pulls it (default).
//! - [`DeliveryMode::Broadcast`] the event reaches every live subscriber, or nobody if none is attached.
//!
//! ## Choosing the right policy
//!
//! **Startup notices** (fired before the consumer exists):
//! ```text
//! DeliveryMode::Retaining   → emit(e) ─► [buffer] ─► first subscriber pulls e
//! ```
//!
//! **Refresh signals** (only meaningful while someone watches):
//! ```text
//! DeliveryMode::Broadcast   → emit(e) with 0 subscribers ─► dropped
//!                             emit(e) with N subscribers ─► N copies
//! ```

use std::fmt;

/// Policy controlling what a relay does with events that have no active subscriber.
///
/// Fixed at construction; a relay never changes mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DeliveryMode {
    /// Hold events until a subscriber pulls them (default).
    ///
    /// Each event is handed to exactly one subscriber, in emission order.
    #[default]
    Retaining,
    /// Deliver events only to subscribers that are attached when the event is dispatched.
    ///
    /// Every attached subscriber receives its own clone.
    Broadcast,
}

impl DeliveryMode {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            DeliveryMode::Retaining => "retaining",
            DeliveryMode::Broadcast => "broadcast",
        }
    }

    /// Returns `true` if events emitted with no subscriber are kept.
    ///
    /// ```
    /// use eventrelay::DeliveryMode;
    ///
    /// assert!(DeliveryMode::default().retains_without_subscribers());
    /// assert!(!DeliveryMode::Broadcast.retains_without_subscribers());
    /// ```
    #[inline]
    pub fn retains_without_subscribers(&self) -> bool {
        matches!(self, DeliveryMode::Retaining)
    }
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}
