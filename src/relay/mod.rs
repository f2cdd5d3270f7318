//! Relay core: façade, lifecycle and configuration.
//!
//! The public API from this module is [`Relay`] (the façade producers and consumers
//! share), [`Scope`] (the owning lifecycle), [`RelayConfig`] and [`RelayStats`].
//!
//! Internal modules:
//! - `handle`: the `Relay` façade, dispatching to the active strategy;
//! - `scope`: cancellation token + task tracker bound to the owner's lifetime;
//! - `config`: per-relay settings and defaults;
//! - `stats`: emission counters.

mod config;
mod handle;
mod scope;
mod stats;

pub use config::{RelayConfig, DEFAULT_CAPACITY};
pub use handle::Relay;
pub use scope::Scope;
pub use stats::RelayStats;
