//! Delivery policies.
//!
//! This module groups the knob that controls **whether** an event survives the
//! absence of subscribers.
//!
//! ## Contents
//! - [`DeliveryMode`] retain until picked up / broadcast to whoever listens
//!
//! ## Quick wiring
//! ```text
//! RelayConfig { mode: DeliveryMode, capacity, name }
//!      └─► Relay::with_config picks the strategy:
//!           - Retaining → bounded hand-off queue + backlog reaper
//!           - Broadcast → member set + dispatch worker
//! ```
//!
//! ## Defaults
//! - `DeliveryMode::Retaining` (never loses an event because nobody subscribed yet).

mod delivery;

pub use delivery::DeliveryMode;
