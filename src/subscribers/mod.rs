//! # Consumer side of the relay.
//!
//! This module provides [`Subscription`], the stream handed out by
//! [`Relay::subscribe`](crate::Relay::subscribe).
//!
//! ## Architecture
//! ```text
//! Relay::subscribe()
//!     │
//!     ├─ Retaining ──► puller on the shared hand-off queue ─┐
//!     │                                                     ├──► Subscription<T>: Stream<Item = T>
//!     └─ Broadcast ──► member slot with its own queue ──────┘
//! ```
//!
//! ## Consuming
//! ```no_run
//! use futures::StreamExt;
//! use eventrelay::{DeliveryMode, Relay, Scope};
//!
//! # async fn run() {
//! let scope = Scope::new();
//! let relay: Relay<String> = Relay::new(DeliveryMode::Broadcast, &scope);
//! let mut sub = relay.subscribe();
//!
//! while let Some(msg) = sub.next().await {
//!     println!("got {msg}");
//! }
//! # }
//! ```

mod subscription;

pub use subscription::Subscription;
