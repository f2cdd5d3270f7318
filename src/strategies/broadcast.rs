//! # Broadcast strategy: live multicast with background dispatch.
//!
//! Events reach every subscriber attached when the dispatch worker delivers them.
//! With nobody attached, `emit` drops the event on the spot.
//!
//! ## Architecture
//! ```text
//! emit(e)
//!   ├─ members empty ──► Delivery::Suppressed (dropped, no-op)
//!   └─ members > 0   ──► [dispatch queue] ──► dispatch worker (scope task)
//!                                                  │ snapshot at dispatch time
//!                           ┌──────────────────────┼──────────────────────┐
//!                           ▼                      ▼                      ▼
//!                     [member queue 1]       [member queue 2]  ...  [member queue N]
//!                           │                      │                      │
//!                     Subscription 1         Subscription 2         Subscription N
//! ```
//!
//! ## Rules
//! - **Non-blocking emit**: the producer only checks the member set and enqueues.
//! - **Per-member FIFO**: each member sees events in emission order.
//! - **Isolation**: member queues are unbounded, so a slow member never stalls the
//!   worker, the producer, or other members.
//! - **Weak consistency**: a member attached between the empty-check and dispatch may
//!   still receive the event; a member gone by dispatch time does not.
//! - **Cancellation**: a member whose token is cancelled leaves the set at once, even if
//!   its stream is never polled again.
//! - **Teardown**: the worker exits on scope cancellation and detaches every member.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::EmitError;
use crate::relay::Scope;
use crate::strategies::Delivery;

/// One registered listener: its queue and the subscription token that owns it.
struct Member<T> {
    tx: mpsc::UnboundedSender<T>,
    token: CancellationToken,
}

impl<T> Member<T> {
    fn is_live(&self) -> bool {
        !self.token.is_cancelled() && !self.tx.is_closed()
    }
}

/// Registered listeners, keyed by attach order.
///
/// Members whose token is cancelled count as gone even before their stream is polled
/// or dropped; every read of the set prunes them.
struct Members<T> {
    next_id: AtomicU64,
    slots: Mutex<BTreeMap<u64, Member<T>>>,
}

impl<T> Members<T> {
    fn lock(&self) -> MutexGuard<'_, BTreeMap<u64, Member<T>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks the set with cancelled and closed members already removed.
    fn live(&self) -> MutexGuard<'_, BTreeMap<u64, Member<T>>> {
        let mut slots = self.lock();
        slots.retain(|_, m| m.is_live());
        slots
    }

    fn insert(&self, token: CancellationToken) -> (u64, mpsc::UnboundedReceiver<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(id, Member { tx, token });
        (id, rx)
    }

    fn remove(&self, id: u64) {
        self.lock().remove(&id);
    }

    fn len(&self) -> usize {
        self.live().len()
    }

    fn is_empty(&self) -> bool {
        self.live().is_empty()
    }

    fn clear(&self) -> usize {
        let mut slots = self.lock();
        let detached = slots.len();
        slots.clear();
        detached
    }
}

impl<T: Clone> Members<T> {
    /// Pushes `ev` to every live member, pruning cancelled ones and those whose receiver is gone.
    fn deliver(&self, ev: T) -> usize {
        let mut slots = self.lock();
        slots.retain(|_, m| !m.token.is_cancelled() && m.tx.send(ev.clone()).is_ok());
        slots.len()
    }
}

/// Member set plus the handle to its dispatch worker.
pub(crate) struct Broadcast<T> {
    members: Arc<Members<T>>,
    dispatch: mpsc::UnboundedSender<T>,
}

impl<T: Clone + Send + 'static> Broadcast<T> {
    /// Creates an empty member set and spawns the dispatch worker on `scope`.
    pub(crate) fn new(scope: &Scope, name: &'static str) -> Self {
        let members = Arc::new(Members {
            next_id: AtomicU64::new(0),
            slots: Mutex::new(BTreeMap::new()),
        });
        let (dispatch, rx) = mpsc::unbounded_channel();

        scope.spawn(dispatch_loop(rx, Arc::clone(&members), scope.token(), name));

        Self { members, dispatch }
    }

    /// Drops `ev` if nobody listens, otherwise hands it to the dispatch worker.
    pub(crate) fn offer(&self, ev: T) -> Result<Delivery, EmitError> {
        if self.members.is_empty() {
            return Ok(Delivery::Suppressed);
        }
        self.dispatch
            .send(ev)
            .map(|()| Delivery::Dispatched)
            .map_err(|_| EmitError::Closed)
    }

    /// Registers a new member and returns its event stream.
    pub(crate) fn attach(&self, token: CancellationToken) -> BoxStream<'static, T> {
        let (id, rx) = self.members.insert(token.clone());
        let listener = Listener {
            id,
            rx,
            members: Arc::downgrade(&self.members),
            token,
        };
        stream::unfold(listener, |mut listener| async move {
            let ev = listener.next().await;
            ev.map(|ev| (ev, listener))
        })
        .boxed()
    }

    /// Members currently registered.
    pub(crate) fn members(&self) -> usize {
        self.members.len()
    }
}

/// Worker loop: drains the dispatch queue until the scope is cancelled or the relay is dropped.
async fn dispatch_loop<T: Clone>(
    mut rx: mpsc::UnboundedReceiver<T>,
    members: Arc<Members<T>>,
    token: CancellationToken,
    name: &'static str,
) {
    debug!(relay = name, "dispatch worker started");
    loop {
        let ev = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            ev = rx.recv() => match ev {
                Some(ev) => ev,
                None => break,
            },
        };
        let reached = members.deliver(ev);
        trace!(relay = name, reached, "event dispatched");
    }
    let detached = members.clear();
    debug!(relay = name, detached, "dispatch worker stopped");
}

/// One subscription's member slot; deregisters itself on drop.
struct Listener<T> {
    id: u64,
    rx: mpsc::UnboundedReceiver<T>,
    members: Weak<Members<T>>,
    token: CancellationToken,
}

impl<T> Listener<T> {
    async fn next(&mut self) -> Option<T> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            ev = self.rx.recv() => ev,
        }
    }
}

impl<T> Drop for Listener<T> {
    fn drop(&mut self) {
        if let Some(members) = self.members.upgrade() {
            members.remove(self.id);
        }
    }
}
