//! # Relay: one-shot event hand-off between a producer and its consumers.
//!
//! The [`Relay`] owns exactly one delivery strategy, chosen once from
//! [`DeliveryMode`], and exposes the same `emit` / `subscribe` surface for both.
//!
//! ## Key responsibilities
//! - route `emit` to the active strategy without ever blocking the producer
//! - hand out [`Subscription`]s bound to the owning [`Scope`]
//! - keep emission counters for [`Relay::stats`]
//!
//! ## High-level architecture
//! ```text
//! Producer                         Relay<T>                               Consumers
//!   emit(e) ──► scope cancelled? ──► Err(Closed)
//!                     │ no
//!                     ▼
//!               Strategy::offer(e)
//!                 ├─ Retaining ─► [bounded queue] ─────────────────────► Subscription (first pull wins)
//!                 └─ Broadcast ─► S empty? ─► Suppressed
//!                                  └─► [dispatch queue] ─► worker ─────► Subscription × N
//!
//! Teardown:
//!   Scope::shutdown(grace) ─► token.cancel() ─► reaper / worker exit ─► every Subscription → None
//! ```
//!
//! ## Example
//! ```rust
//! use futures::StreamExt;
//! use eventrelay::{Delivery, DeliveryMode, Relay, Scope};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scope = Scope::new();
//!
//!     // Emitted before anyone listens, still delivered.
//!     let notices: Relay<&'static str> = Relay::new(DeliveryMode::Retaining, &scope);
//!     assert_eq!(notices.emit("permission denied")?, Delivery::Enqueued);
//!     let mut sub = notices.subscribe();
//!     assert_eq!(sub.next().await, Some("permission denied"));
//!
//!     // Emitted while nobody listens, dropped.
//!     let refresh: Relay<u32> = Relay::new(DeliveryMode::Broadcast, &scope);
//!     assert_eq!(refresh.emit(1)?, Delivery::Suppressed);
//!
//!     scope.shutdown_default().await?;
//!     Ok(())
//! }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::error::EmitError;
use crate::policies::DeliveryMode;
use crate::relay::{config::RelayConfig, scope::Scope, stats::Counters, stats::RelayStats};
use crate::strategies::{Delivery, Strategy};
use crate::subscribers::Subscription;

/// Event relay handle.
///
/// Cheap to clone: clones share the same strategy, counters and scope.
/// The strategy is torn down when the owning scope is, or when the last clone is dropped.
pub struct Relay<T> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    name: &'static str,
    scope: Scope,
    strategy: Strategy<T>,
    counters: Counters,
    next_subscription: AtomicU64,
}

impl<T: Clone + Send + 'static> Relay<T> {
    /// Creates a relay with the given mode and default settings.
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime: the strategy's background task is
    /// spawned immediately.
    pub fn new(mode: DeliveryMode, scope: &Scope) -> Self {
        Self::with_config(RelayConfig::default().with_mode(mode), scope)
    }

    /// Creates a relay from a full [`RelayConfig`].
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime.
    pub fn with_config(cfg: RelayConfig, scope: &Scope) -> Self {
        let strategy = Strategy::new(&cfg, scope);
        debug!(
            relay = cfg.name,
            mode = cfg.mode.as_label(),
            capacity = cfg.capacity_clamped(),
            "relay created"
        );
        Self {
            inner: Arc::new(Inner {
                name: cfg.name,
                scope: scope.clone(),
                strategy,
                counters: Counters::default(),
                next_subscription: AtomicU64::new(0),
            }),
        }
    }

    /// Emits an event without blocking.
    ///
    /// ### Outcomes
    /// - `Ok(Delivery::Enqueued)` retained until a subscriber pulls it
    /// - `Ok(Delivery::Dispatched)` queued for every current subscriber
    /// - `Ok(Delivery::Suppressed)` broadcast with no subscriber; dropped on purpose
    /// - `Err(EmitError::Full)` retained buffer full; nothing was stored
    /// - `Err(EmitError::Closed)` the owning scope was torn down
    pub fn emit(&self, event: T) -> Result<Delivery, EmitError> {
        let res = if self.inner.scope.is_cancelled() {
            Err(EmitError::Closed)
        } else {
            self.inner.strategy.offer(event)
        };

        self.inner.counters.record(res.as_ref().copied().map_err(|_| ()));
        if matches!(res, Ok(d) if !d.is_accepted()) {
            trace!(relay = self.inner.name, "no subscribers; event dropped");
        }
        res
    }

    /// Emits an event, logging instead of returning a failure.
    ///
    /// For producers that have nothing useful to do with an [`EmitError`].
    pub fn publish(&self, event: T) {
        if let Err(err) = self.emit(event) {
            warn!(
                relay = self.inner.name,
                label = err.as_label(),
                error = %err,
                "event not delivered"
            );
        }
    }

    /// Attaches a new subscriber.
    ///
    /// - Retaining: the stream starts with the backlog, oldest first.
    /// - Broadcast: the stream sees only events dispatched after this call.
    ///
    /// On a torn-down scope the returned stream is already finished.
    pub fn subscribe(&self) -> Subscription<T> {
        let id = self.inner.next_subscription.fetch_add(1, Ordering::Relaxed);
        let token = self.inner.scope.token().child_token();
        let stream = self.inner.strategy.attach(token.clone());
        debug!(
            relay = self.inner.name,
            subscription = id,
            subscribers = self.inner.strategy.subscribers(),
            "subscribed"
        );
        Subscription::new(id, self.mode(), token, stream)
    }

    /// Delivery mode chosen at construction.
    pub fn mode(&self) -> DeliveryMode {
        self.inner.strategy.mode()
    }

    /// Name used in log records.
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.strategy.subscribers()
    }

    /// Events waiting in the retained buffer (always 0 in broadcast mode).
    pub fn pending(&self) -> usize {
        self.inner.strategy.pending()
    }

    /// Returns `true` once the owning scope has been torn down.
    pub fn is_closed(&self) -> bool {
        self.inner.scope.is_cancelled()
    }

    /// Point-in-time counters.
    pub fn stats(&self) -> RelayStats {
        self.inner
            .counters
            .snapshot(self.subscriber_count(), self.pending())
    }
}

impl<T> Clone for Relay<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for Relay<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay")
            .field("name", &self.inner.name)
            .field("closed", &self.inner.scope.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream::FusedStream;
    use futures::StreamExt;
    use std::time::Duration;

    const QUIET: Duration = Duration::from_millis(100);

    async fn nothing_within<T: Send + 'static>(sub: &mut Subscription<T>) -> bool {
        tokio::time::timeout(QUIET, sub.next()).await.is_err()
    }

    #[tokio::test]
    async fn test_retaining_delivers_backlog_to_late_subscriber() {
        let scope = Scope::new();
        let relay = Relay::new(DeliveryMode::Retaining, &scope);

        assert_eq!(relay.emit("a"), Ok(Delivery::Enqueued));
        assert_eq!(relay.emit("b"), Ok(Delivery::Enqueued));

        let mut sub = relay.subscribe();
        assert_eq!(sub.next().await, Some("a"));
        assert_eq!(sub.next().await, Some("b"));
    }

    #[tokio::test]
    async fn test_retaining_delivers_to_early_subscriber() {
        let scope = Scope::new();
        let relay = Relay::new(DeliveryMode::Retaining, &scope);
        let mut sub = relay.subscribe();

        relay.emit("a").unwrap();
        relay.emit("b").unwrap();

        assert_eq!(sub.next().await, Some("a"));
        assert_eq!(sub.next().await, Some("b"));
        assert!(nothing_within(&mut sub).await);
    }

    #[tokio::test]
    async fn test_retaining_no_replay_to_late_subscriber() {
        let scope = Scope::new();
        let relay = Relay::new(DeliveryMode::Retaining, &scope);
        let mut first = relay.subscribe();
        relay.emit(1).unwrap();
        assert_eq!(first.next().await, Some(1));

        let mut late = relay.subscribe();
        assert!(nothing_within(&mut late).await);
    }

    #[tokio::test]
    async fn test_broadcast_drops_without_subscribers() {
        let scope = Scope::new();
        let relay = Relay::new(DeliveryMode::Broadcast, &scope);

        assert_eq!(relay.emit("a"), Ok(Delivery::Suppressed));

        let mut sub = relay.subscribe();
        assert!(nothing_within(&mut sub).await);
        assert_eq!(relay.stats().suppressed, 1);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_subscriber_once() {
        let scope = Scope::new();
        let relay = Relay::new(DeliveryMode::Broadcast, &scope);
        let mut s1 = relay.subscribe();
        let mut s2 = relay.subscribe();

        assert_eq!(relay.emit("a"), Ok(Delivery::Dispatched));

        assert_eq!(s1.next().await, Some("a"));
        assert_eq!(s2.next().await, Some("a"));
        assert!(nothing_within(&mut s1).await);
        assert!(nothing_within(&mut s2).await);
    }

    #[tokio::test]
    async fn test_cancel_isolates_subscribers() {
        let scope = Scope::new();
        let relay = Relay::new(DeliveryMode::Broadcast, &scope);
        let mut s1 = relay.subscribe();
        let mut s2 = relay.subscribe();

        s1.cancel();
        assert_eq!(relay.subscriber_count(), 1);
        assert_eq!(relay.emit("b"), Ok(Delivery::Dispatched));

        assert_eq!(s2.next().await, Some("b"));
        assert_eq!(s1.next().await, None);
        assert!(s1.is_terminated());
    }

    #[tokio::test]
    async fn test_remote_cancel_ends_pending_poll() {
        let scope = Scope::new();
        let relay: Relay<u32> = Relay::new(DeliveryMode::Broadcast, &scope);
        let mut sub = relay.subscribe();
        let token = sub.token();

        let consumer = tokio::spawn(async move { sub.next().await });
        tokio::task::yield_now().await;
        token.cancel();

        let got = tokio::time::timeout(Duration::from_secs(1), consumer)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got, None);
        assert_eq!(relay.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_token_cancel_releases_slot_without_polling() {
        let scope = Scope::new();

        let refresh: Relay<u32> = Relay::new(DeliveryMode::Broadcast, &scope);
        let feed = refresh.subscribe();
        feed.token().cancel();
        assert_eq!(refresh.subscriber_count(), 0);
        assert_eq!(refresh.emit(1), Ok(Delivery::Suppressed));

        let notices: Relay<u32> = Relay::new(DeliveryMode::Retaining, &scope);
        let screen = notices.subscribe();
        screen.token().cancel();
        assert_eq!(notices.subscriber_count(), 0);
        assert_eq!(notices.emit(1), Ok(Delivery::Enqueued));
        assert_eq!(notices.pending(), 1);

        drop((feed, screen));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_cancel_races_with_emit() {
        const EVENTS: u32 = 1000;

        for mode in [DeliveryMode::Broadcast, DeliveryMode::Retaining] {
            let scope = Scope::new();
            let cfg = RelayConfig::default()
                .with_mode(mode)
                .with_capacity(EVENTS as usize);
            let relay: Relay<u32> = Relay::with_config(cfg, &scope);
            let mut survivor = relay.subscribe();

            let churn = {
                let relay = relay.clone();
                tokio::spawn(async move {
                    for i in 0..500 {
                        let mut sub = relay.subscribe();
                        if i % 2 == 0 {
                            sub.cancel();
                        } else {
                            sub.token().cancel();
                        }
                        tokio::task::yield_now().await;
                    }
                })
            };
            let producer = {
                let relay = relay.clone();
                tokio::spawn(async move {
                    for i in 0..EVENTS {
                        let res = relay.emit(i);
                        assert!(res.is_ok(), "{mode}: emit({i}) returned {res:?}");
                        if i % 16 == 0 {
                            tokio::task::yield_now().await;
                        }
                    }
                })
            };
            producer.await.unwrap();
            churn.await.unwrap();

            for i in 0..EVENTS {
                let got = tokio::time::timeout(Duration::from_secs(5), survivor.next())
                    .await
                    .unwrap();
                assert_eq!(got, Some(i), "{mode}");
            }
            assert_eq!(relay.subscriber_count(), 1);
            scope.shutdown_default().await.unwrap();
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_retaining_never_drops_under_interleaving() {
        let scope = Scope::new();
        let relay = Relay::with_config(
            RelayConfig::default()
                .with_mode(DeliveryMode::Retaining)
                .with_capacity(1024),
            &scope,
        );

        let producer = {
            let relay = relay.clone();
            tokio::spawn(async move {
                for i in 0..500u32 {
                    relay.emit(i).unwrap();
                    if i % 50 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            })
        };

        let mut sub = relay.subscribe();
        let mut got = Vec::with_capacity(500);
        while got.len() < 500 {
            let ev = tokio::time::timeout(Duration::from_secs(5), sub.next())
                .await
                .unwrap()
                .unwrap();
            got.push(ev);
        }
        producer.await.unwrap();

        assert_eq!(got, (0..500).collect::<Vec<_>>());
        assert_eq!(relay.stats().failed, 0);
    }

    #[tokio::test]
    async fn test_retaining_full_buffer_reports_failure() {
        let scope = Scope::new();
        let relay = Relay::with_config(RelayConfig::default().with_capacity(1), &scope);

        relay.emit(1).unwrap();
        assert_eq!(relay.emit(2), Err(EmitError::Full { capacity: 1 }));
        relay.publish(3);

        let stats = relay.stats();
        assert_eq!(stats.enqueued, 1);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.pending, 1);

        let mut sub = relay.subscribe();
        assert_eq!(sub.next().await, Some(1));
    }

    #[tokio::test]
    async fn test_teardown_with_retained_backlog() {
        let scope = Scope::new();
        let relay = Relay::new(DeliveryMode::Retaining, &scope);
        let mut sub = relay.subscribe();
        let mut idle = relay.subscribe();
        relay.emit(1).unwrap();
        relay.emit(2).unwrap();

        scope.shutdown(Duration::from_secs(1)).await.unwrap();

        assert_eq!(scope.active_tasks(), 0);
        assert_eq!(relay.pending(), 0);
        assert_eq!(sub.next().await, None);
        assert_eq!(idle.next().await, None);
        assert!(relay.is_closed());
        assert_eq!(relay.emit(3), Err(EmitError::Closed));
    }

    #[tokio::test]
    async fn test_teardown_mid_dispatch() {
        let scope = Scope::new();
        let relay = Relay::new(DeliveryMode::Broadcast, &scope);
        let mut s1 = relay.subscribe();
        let mut s2 = relay.subscribe();
        for i in 0..100u32 {
            relay.emit(i).unwrap();
        }

        scope.shutdown(Duration::from_secs(1)).await.unwrap();
        assert_eq!(scope.active_tasks(), 0);

        let rest: Vec<u32> = s1.by_ref().collect().await;
        assert!(rest.is_empty());
        assert_eq!(s2.next().await, None);
        assert_eq!(relay.subscriber_count(), 0);
        assert_eq!(relay.emit(100), Err(EmitError::Closed));
    }

    #[tokio::test]
    async fn test_subscribe_after_teardown_is_finished() {
        let scope = Scope::new();
        let relay: Relay<u32> = Relay::new(DeliveryMode::Retaining, &scope);
        scope.shutdown(Duration::from_secs(1)).await.unwrap();

        let mut sub = relay.subscribe();
        assert_eq!(sub.next().await, None);
    }

    #[tokio::test]
    async fn test_mode_is_fixed_and_ids_increase() {
        let scope = Scope::new();
        let relay: Relay<u32> = Relay::new(DeliveryMode::Broadcast, &scope);
        let a = relay.subscribe();
        let b = relay.clone().subscribe();

        assert_eq!(relay.mode(), DeliveryMode::Broadcast);
        assert_eq!(a.mode(), DeliveryMode::Broadcast);
        assert!(b.id() > a.id());
        assert_eq!(relay.subscriber_count(), 2);
    }
}
