//! # Owning scope: explicit lifecycle for relay background work.
//!
//! A [`Scope`] is the start/stop handle a relay registers its background work against.
//! It pairs a [`CancellationToken`] (the stop signal) with a [`TaskTracker`] (the
//! record of what is still running).
//!
//! ## Architecture
//! ```text
//! Scope::new()  ──► token + tracker
//!     │
//!     ├──► Relay::new(mode, &scope) ──► scope.spawn(dispatch worker | backlog reaper)
//!     ├──► Relay::subscribe()       ──► token.child_token() per subscription
//!     │
//!     └──► Scope::shutdown(grace)
//!              ├─► token.cancel()      → workers exit, subscriptions end (None)
//!              ├─► tracker.close()
//!              └─► tracker.wait() ≤ grace
//!                     ├─ Ok            → every background task joined
//!                     └─ Timeout       → ScopeError::GraceExceeded
//! ```
//!
//! ## Rules
//! - Cloning a scope yields another handle to the **same** lifecycle.
//! - Cancellation is one-way; a cancelled scope cannot be restarted.
//! - Relays created on an already-cancelled scope reject every emit with `Closed`.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::debug;

use crate::error::ScopeError;

/// Lifecycle handle owning the background work of one or more relays.
#[derive(Clone, Debug, Default)]
pub struct Scope {
    token: CancellationToken,
    tracker: TaskTracker,
}

impl Scope {
    /// Grace period used by [`Scope::shutdown_default`].
    pub const DEFAULT_GRACE: Duration = Duration::from_secs(5);

    /// Starts a new, live scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a scope that is cancelled whenever `token` is.
    ///
    /// Use this to nest relay lifetimes under an existing cancellation tree.
    #[must_use]
    pub fn with_parent(token: &CancellationToken) -> Self {
        Self {
            token: token.child_token(),
            tracker: TaskTracker::new(),
        }
    }

    /// Returns a clone of the scope's cancellation token.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Returns `true` once teardown has started.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes when teardown starts.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// Number of background tasks still running on this scope.
    pub fn active_tasks(&self) -> usize {
        self.tracker.len()
    }

    /// Signals teardown without waiting for background tasks.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Spawns background work bound to this scope.
    pub(crate) fn spawn<F>(&self, fut: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.tracker.spawn(fut)
    }

    /// Tears the scope down and waits up to `grace` for its background tasks.
    ///
    /// ### Notes
    /// - Idempotent: calling it again re-waits on the (already cancelled) tracker.
    /// - Subscriptions bound to this scope terminate with `None`, not an error.
    pub async fn shutdown(&self, grace: Duration) -> Result<(), ScopeError> {
        self.token.cancel();
        self.tracker.close();

        match tokio::time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => {
                debug!(grace = ?grace, "scope stopped");
                Ok(())
            }
            Err(_) => Err(ScopeError::GraceExceeded {
                grace,
                pending: self.tracker.len(),
            }),
        }
    }

    /// Shorthand for `shutdown(Scope::DEFAULT_GRACE)`.
    pub async fn shutdown_default(&self) -> Result<(), ScopeError> {
        self.shutdown(Self::DEFAULT_GRACE).await
    }
}
