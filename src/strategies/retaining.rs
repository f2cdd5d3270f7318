//! # Retaining strategy: bounded FIFO hand-off.
//!
//! Events wait in a bounded queue until some subscriber pulls them. Each event is
//! handed to exactly one pull (first-pull-wins); there is no replay.
//!
//! ## Architecture
//! ```text
//! emit(e) ──► try_send ──► [mpsc buffer, capacity N] ──► ready.notify_waiters()
//!                                   │
//!                 ┌─────────────────┼─────────────────┐
//!                 ▼                 ▼                 ▼
//!              puller 1          puller 2   ...    puller N      (one per Subscription)
//!           (try_recv race)   (try_recv race)   (try_recv race)
//!
//! Teardown (scope cancelled):
//!   reaper ──► close receiver ──► discard backlog ──► wake pullers (they observe None)
//!
//! Relay dropped:
//!   seal receiver ──► wake pullers ──► they drain the backlog, then observe None
//!   reaper exits without discarding
//! ```
//!
//! ## Rules
//! - **Non-blocking emit**: `try_send`; a full buffer fails with `EmitError::Full`.
//! - **FIFO**: pulls observe events in emission order.
//! - **Exactly once**: the receive-end is shared behind a mutex that is only held for a
//!   `try_recv`, never across `.await`.
//! - **Teardown discards**: once the scope is cancelled nothing queued is delivered.
//! - **Drop drains**: dropping the relay closes the queue but lets pullers drain it first.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};
use tokio::sync::Notify;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::debug;

use crate::error::EmitError;
use crate::relay::Scope;

/// Shared receive side of the hand-off buffer.
struct Queue<T> {
    rx: Mutex<mpsc::Receiver<T>>,
    ready: Notify,
    closed: AtomicBool,
    next_puller: AtomicU64,
    pullers: Mutex<BTreeMap<u64, CancellationToken>>,
}

impl<T> Queue<T> {
    fn lock(&self) -> MutexGuard<'_, mpsc::Receiver<T>> {
        self.rx.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take(&self) -> Result<T, TryRecvError> {
        self.lock().try_recv()
    }

    /// Waits for the next event; `None` once the queue is closed and empty.
    async fn pull(&self) -> Option<T> {
        loop {
            let notified = self.ready.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.take() {
                Ok(ev) => return Some(ev),
                Err(TryRecvError::Disconnected) => return None,
                Err(TryRecvError::Empty) if self.closed.load(Ordering::Acquire) => return None,
                Err(TryRecvError::Empty) => {}
            }
            notified.await;
        }
    }

    /// Stops accepting events; the backlog stays readable.
    fn seal(&self) {
        self.lock().close();
        self.closed.store(true, Ordering::Release);
        self.ready.notify_waiters();
    }

    /// Stops accepting events and drops the backlog. Returns the number discarded.
    fn discard(&self) -> usize {
        let mut discarded = 0;
        {
            let mut rx = self.lock();
            rx.close();
            self.closed.store(true, Ordering::Release);
            while rx.try_recv().is_ok() {
                discarded += 1;
            }
        }
        self.ready.notify_waiters();
        discarded
    }

    fn len(&self) -> usize {
        self.lock().len()
    }

    fn register(&self, token: CancellationToken) -> u64 {
        let id = self.next_puller.fetch_add(1, Ordering::Relaxed);
        self.pullers().insert(id, token);
        id
    }

    fn unregister(&self, id: u64) {
        self.pullers().remove(&id);
    }

    /// Pullers whose subscription is still live; cancelled ones are pruned.
    fn consumers(&self) -> usize {
        let mut pullers = self.pullers();
        pullers.retain(|_, token| !token.is_cancelled());
        pullers.len()
    }

    fn pullers(&self) -> MutexGuard<'_, BTreeMap<u64, CancellationToken>> {
        self.pullers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Bounded hand-off buffer plus its teardown reaper.
pub(crate) struct Retaining<T> {
    tx: mpsc::Sender<T>,
    queue: Arc<Queue<T>>,
    capacity: usize,
    _reaper: DropGuard,
}

impl<T: Send + 'static> Retaining<T> {
    /// Creates the buffer and registers the backlog reaper on `scope`.
    pub(crate) fn new(capacity: usize, scope: &Scope, name: &'static str) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        let queue = Arc::new(Queue {
            rx: Mutex::new(rx),
            ready: Notify::new(),
            closed: AtomicBool::new(false),
            next_puller: AtomicU64::new(0),
            pullers: Mutex::new(BTreeMap::new()),
        });

        let scope_token = scope.token();
        let reaper_token = scope_token.child_token();
        let reaper_queue = Arc::clone(&queue);
        let reaper = reaper_token.clone();
        scope.spawn(async move {
            reaper.cancelled().await;
            // Relay dropped while the scope lives on: pullers drain what is left.
            if !scope_token.is_cancelled() {
                return;
            }
            let discarded = reaper_queue.discard();
            debug!(relay = name, discarded, "retained backlog released");
        });

        Self {
            tx,
            queue,
            capacity,
            _reaper: reaper_token.drop_guard(),
        }
    }

    /// Enqueues without waiting.
    pub(crate) fn offer(&self, ev: T) -> Result<(), EmitError> {
        match self.tx.try_send(ev) {
            Ok(()) => {
                self.queue.ready.notify_waiters();
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(EmitError::Full {
                capacity: self.capacity,
            }),
            Err(TrySendError::Closed(_)) => Err(EmitError::Closed),
        }
    }

    /// Attaches one more puller to the shared receive-end.
    pub(crate) fn attach(&self, token: CancellationToken) -> BoxStream<'static, T> {
        let puller = Puller::new(Arc::clone(&self.queue), token);
        stream::unfold(puller, |puller| async move {
            let ev = puller.next().await;
            ev.map(|ev| (ev, puller))
        })
        .boxed()
    }

    /// Undelivered events currently buffered.
    pub(crate) fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Live pullers.
    pub(crate) fn consumers(&self) -> usize {
        self.queue.consumers()
    }
}

impl<T> Drop for Retaining<T> {
    fn drop(&mut self) {
        self.queue.seal();
    }
}

/// One subscription's view of the queue; counted as a consumer until dropped or cancelled.
struct Puller<T> {
    id: u64,
    queue: Arc<Queue<T>>,
    token: CancellationToken,
}

impl<T> Puller<T> {
    fn new(queue: Arc<Queue<T>>, token: CancellationToken) -> Self {
        let id = queue.register(token.clone());
        Self { id, queue, token }
    }

    async fn next(&self) -> Option<T> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            ev = self.queue.pull() => ev,
        }
    }
}

impl<T> Drop for Puller<T> {
    fn drop(&mut self) {
        self.queue.unregister(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn retaining(capacity: usize) -> (Scope, Retaining<u32>) {
        let scope = Scope::new();
        let strategy = Retaining::new(capacity, &scope, "test");
        (scope, strategy)
    }

    #[tokio::test]
    async fn test_backlog_is_kept_until_pulled() {
        let (_scope, r) = retaining(8);
        r.offer(1).unwrap();
        r.offer(2).unwrap();
        assert_eq!(r.pending(), 2);

        let mut s = r.attach(CancellationToken::new());
        assert_eq!(s.next().await, Some(1));
        assert_eq!(s.next().await, Some(2));
        assert_eq!(r.pending(), 0);
    }

    #[tokio::test]
    async fn test_full_buffer_rejects_without_blocking() {
        let (_scope, r) = retaining(2);
        r.offer(1).unwrap();
        r.offer(2).unwrap();
        assert_eq!(r.offer(3), Err(EmitError::Full { capacity: 2 }));

        let mut s = r.attach(CancellationToken::new());
        assert_eq!(s.next().await, Some(1));
        r.offer(3).unwrap();
        assert_eq!(s.next().await, Some(2));
        assert_eq!(s.next().await, Some(3));
    }

    #[tokio::test]
    async fn test_concurrent_pullers_split_events() {
        let (_scope, r) = retaining(16);
        let mut a = r.attach(CancellationToken::new());
        let mut b = r.attach(CancellationToken::new());
        assert_eq!(r.consumers(), 2);

        for i in 0..4 {
            r.offer(i).unwrap();
        }

        let mut seen = Vec::new();
        seen.push(a.next().await.unwrap());
        seen.push(b.next().await.unwrap());
        seen.push(a.next().await.unwrap());
        seen.push(b.next().await.unwrap());
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_waiting_puller_is_woken_by_offer() {
        let (_scope, r) = retaining(4);
        let mut s = r.attach(CancellationToken::new());

        let waiter = tokio::spawn(async move { s.next().await });
        tokio::task::yield_now().await;
        r.offer(7).unwrap();

        let got = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got, Some(7));
    }

    #[tokio::test]
    async fn test_teardown_discards_backlog_and_ends_pullers() {
        let (scope, r) = retaining(8);
        r.offer(1).unwrap();
        r.offer(2).unwrap();

        let mut s = r.attach(scope.token().child_token());
        scope.shutdown(Duration::from_secs(1)).await.unwrap();

        assert_eq!(r.pending(), 0);
        assert_eq!(s.next().await, None);
        assert_eq!(r.offer(3), Err(EmitError::Closed));
    }

    #[tokio::test]
    async fn test_drop_lets_pullers_drain() {
        let (_scope, r) = retaining(8);
        r.offer(1).unwrap();
        let mut s = r.attach(CancellationToken::new());
        drop(r);

        assert_eq!(s.next().await, Some(1));
        assert_eq!(s.next().await, None);
    }

    #[tokio::test]
    async fn test_drop_stops_reaper() {
        let (scope, r) = retaining(8);
        assert_eq!(scope.active_tasks(), 1);
        drop(r);

        tokio::time::timeout(Duration::from_secs(1), async {
            while scope.active_tasks() > 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_dropped_puller_is_uncounted() {
        let (_scope, r) = retaining(8);
        let s = r.attach(CancellationToken::new());
        assert_eq!(r.consumers(), 1);
        drop(s);
        assert_eq!(r.consumers(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_puller_is_uncounted_before_polling() {
        let (_scope, r) = retaining(8);
        let token = CancellationToken::new();
        let _s = r.attach(token.clone());
        let mut other = r.attach(CancellationToken::new());
        assert_eq!(r.consumers(), 2);

        token.cancel();
        assert_eq!(r.consumers(), 1);

        r.offer(9).unwrap();
        assert_eq!(other.next().await, Some(9));
    }
}
