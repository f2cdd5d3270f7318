//! # Subscription: a consumer's cancelable event stream.
//!
//! [`Subscription`] is what [`Relay::subscribe`](crate::Relay::subscribe) returns. It
//! implements [`Stream`] and ends with `None` when:
//! - the consumer calls [`Subscription::cancel`] (or cancels its [`token`](Subscription::token));
//! - the owning [`Scope`](crate::Scope) is torn down;
//! - the relay is dropped and everything addressed to this subscription was yielded.
//!
//! ## Cancellation
//! ```text
//! cancel()  ──► token.cancel()          (wakes a pending poll)
//!           └─► drop strategy handle    (deregister member / release puller)
//!           └─► terminated = true       (every later poll → None)
//! ```
//! Dropping a `Subscription` has the same effect on the strategy as `cancel()`.
//! Cancelling never reports an error, neither to the consumer nor to the producer.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{self, BoxStream, FusedStream, Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::policies::DeliveryMode;

/// A consumer's attachment to a relay, consumed as a [`Stream`] of events.
pub struct Subscription<T> {
    id: u64,
    mode: DeliveryMode,
    token: CancellationToken,
    inner: BoxStream<'static, T>,
    terminated: bool,
}

impl<T: Send + 'static> Subscription<T> {
    pub(crate) fn new(
        id: u64,
        mode: DeliveryMode,
        token: CancellationToken,
        inner: BoxStream<'static, T>,
    ) -> Self {
        Self {
            id,
            mode,
            token,
            inner,
            terminated: false,
        }
    }

    /// Relay-local identifier, unique per relay, assigned in subscribe order.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Delivery mode of the relay this subscription belongs to.
    #[must_use]
    pub fn mode(&self) -> DeliveryMode {
        self.mode
    }

    /// Token that cancels this subscription only.
    ///
    /// Lets another task end the stream. Once cancelled the subscription no longer counts
    /// as a subscriber and receives nothing new; its queue is freed on the next poll or drop.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Ends the stream and releases the strategy-side slot right away.
    ///
    /// Safe to call at any time and more than once.
    pub fn cancel(&mut self) {
        self.token.cancel();
        if !self.terminated {
            self.terminated = true;
            self.inner = stream::empty().boxed();
        }
    }

    /// Returns the next event, or `None` once the subscription is over.
    ///
    /// Shorthand for [`StreamExt::next`] that does not require importing the trait.
    pub async fn recv(&mut self) -> Option<T> {
        self.next().await
    }
}

impl<T> Stream for Subscription<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        if self.terminated {
            return Poll::Ready(None);
        }
        match self.inner.poll_next_unpin(cx) {
            Poll::Ready(None) => {
                self.terminated = true;
                Poll::Ready(None)
            }
            other => other,
        }
    }
}

impl<T> FusedStream for Subscription<T> {
    fn is_terminated(&self) -> bool {
        self.terminated
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .field("terminated", &self.terminated)
            .finish_non_exhaustive()
    }
}
