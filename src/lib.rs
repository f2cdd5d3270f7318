//! # eventrelay
//!
//! **eventrelay** is a one-shot event relay for Tokio applications.
//!
//! A producer (often a short-lived or background task) emits discrete events; consumers
//! running concurrently subscribe and receive them as a [`Stream`](futures::Stream).
//! The caller picks, once per relay, what happens to events nobody is listening for.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐
//!     │  Producer A  │   │  Producer B  │        emit(e) / publish(e)  (never blocks)
//!     └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Relay<T> (façade, cheap Clone)                                   │
//! │  - DeliveryMode fixed at construction                             │
//! │  - exactly one Strategy                                           │
//! │  - counters (RelayStats)                                          │
//! └──────┬──────────────────────────────────────────────┬─────────────┘
//!        ▼                                              ▼
//! ┌──────────────────────────────┐        ┌──────────────────────────────────┐
//! │ Retaining                    │        │ Broadcast                        │
//! │ bounded FIFO hand-off        │        │ member set S                     │
//! │ - kept until pulled          │        │ - S empty   → Suppressed         │
//! │ - first pull wins            │        │ - S non-empty → dispatch worker  │
//! │ - backlog reaper (teardown)  │        │   fans out to per-member queues  │
//! └──────────────┬───────────────┘        └──────────────┬───────────────────┘
//!                ▼                                       ▼
//!        Subscription<T> (Stream)           Subscription<T> × N (Stream)
//!
//!  Scope (owning lifecycle): CancellationToken + TaskTracker
//!    └─► shutdown(grace): cancel → background tasks exit → every Subscription ends (None)
//! ```
//!
//! ### Delivery modes
//! ```text
//! Retaining:  emit(a) emit(b) ........ subscribe() ─► a, b
//!             subscribe() emit(a) emit(b)          ─► a, b
//! Broadcast:  emit(a) ........ subscribe()         ─► (nothing, a was dropped)
//!             S1, S2 subscribed, emit(a)           ─► S1: a   S2: a
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types                              |
//! |-------------------|---------------------------------------------------------------|----------------------------------------|
//! | **Relay**         | Uniform `emit` / `subscribe` over both delivery modes.        | [`Relay`], [`Delivery`]                |
//! | **Policies**      | Retain until picked up, or broadcast to live subscribers.     | [`DeliveryMode`]                       |
//! | **Subscribers**   | Cancelable, fused event streams.                              | [`Subscription`]                       |
//! | **Lifecycle**     | Explicit owning scope with graceful shutdown.                 | [`Scope`]                              |
//! | **Errors**        | Typed enqueue and shutdown failures.                          | [`EmitError`], [`ScopeError`]          |
//! | **Configuration** | Mode, retained capacity, log name.                            | [`RelayConfig`]                        |
//! | **Introspection** | Counters and gauges.                                          | [`RelayStats`]                         |
//!
//! ## Logging
//! The crate emits [`tracing`] records (targets under `eventrelay`) and never installs a subscriber.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use futures::StreamExt;
//! use eventrelay::{DeliveryMode, Relay, RelayConfig, Scope};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scope = Scope::new();
//!
//!     let cfg = RelayConfig::default()
//!         .with_mode(DeliveryMode::Broadcast)
//!         .with_name("feed-refresh");
//!     let relay: Relay<u64> = Relay::with_config(cfg, &scope);
//!
//!     let mut screen_a = relay.subscribe();
//!     let mut screen_b = relay.subscribe();
//!
//!     // Fire-and-forget from any task.
//!     relay.publish(42);
//!
//!     assert_eq!(screen_a.next().await, Some(42));
//!     assert_eq!(screen_b.next().await, Some(42));
//!
//!     // Tear everything down; both streams end without error.
//!     scope.shutdown(Duration::from_secs(1)).await?;
//!     assert_eq!(screen_a.next().await, None);
//!     Ok(())
//! }
//! ```
mod error;
mod policies;
mod relay;
mod strategies;
mod subscribers;

// ---- Public re-exports ----

pub use error::{EmitError, ScopeError};
pub use policies::DeliveryMode;
pub use relay::{Relay, RelayConfig, RelayStats, Scope, DEFAULT_CAPACITY};
pub use strategies::Delivery;
pub use subscribers::Subscription;
