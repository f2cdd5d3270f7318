//! # Delivery strategies behind the relay façade.
//!
//! Each [`DeliveryMode`] maps to one concrete strategy with its own state machine:
//!
//! | Mode        | Strategy      | State                                  | Background task   |
//! |-------------|---------------|----------------------------------------|-------------------|
//! | `Retaining` | `Retaining`   | `Empty` / `Pending(queue)`             | backlog reaper    |
//! | `Broadcast` | `Broadcast`   | member set `S` (possibly empty)        | dispatch worker   |
//!
//! The set of modes is closed, so `Strategy` is a plain enum the relay matches on.

mod broadcast;
mod retaining;

use futures::stream::BoxStream;
use tokio_util::sync::CancellationToken;

use crate::error::EmitError;
use crate::policies::DeliveryMode;
use crate::relay::{RelayConfig, Scope};

pub(crate) use broadcast::Broadcast;
pub(crate) use retaining::Retaining;

/// Successful outcome of [`Relay::emit`](crate::Relay::emit).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Delivery {
    /// Accepted into the retained buffer; some subscriber will pull it.
    Enqueued,
    /// Handed to the broadcast dispatch worker for the current subscribers.
    Dispatched,
    /// Broadcast with no subscriber attached: dropped on purpose, not a failure.
    Suppressed,
}

impl Delivery {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            Delivery::Enqueued => "enqueued",
            Delivery::Dispatched => "dispatched",
            Delivery::Suppressed => "dispatch_suppressed",
        }
    }

    /// Returns `true` if the event may still reach a subscriber.
    ///
    /// ```
    /// use eventrelay::Delivery;
    ///
    /// assert!(Delivery::Enqueued.is_accepted());
    /// assert!(Delivery::Dispatched.is_accepted());
    /// assert!(!Delivery::Suppressed.is_accepted());
    /// ```
    #[inline]
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Delivery::Suppressed)
    }
}

/// The single live strategy of a relay.
pub(crate) enum Strategy<T> {
    Retaining(Retaining<T>),
    Broadcast(Broadcast<T>),
}

impl<T: Clone + Send + 'static> Strategy<T> {
    pub(crate) fn new(cfg: &RelayConfig, scope: &Scope) -> Self {
        match cfg.mode {
            DeliveryMode::Retaining => {
                Strategy::Retaining(Retaining::new(cfg.capacity_clamped(), scope, cfg.name))
            }
            DeliveryMode::Broadcast => Strategy::Broadcast(Broadcast::new(scope, cfg.name)),
        }
    }

    pub(crate) fn mode(&self) -> DeliveryMode {
        match self {
            Strategy::Retaining(_) => DeliveryMode::Retaining,
            Strategy::Broadcast(_) => DeliveryMode::Broadcast,
        }
    }

    pub(crate) fn offer(&self, ev: T) -> Result<Delivery, EmitError> {
        match self {
            Strategy::Retaining(r) => r.offer(ev).map(|()| Delivery::Enqueued),
            Strategy::Broadcast(b) => b.offer(ev),
        }
    }

    pub(crate) fn attach(&self, token: CancellationToken) -> BoxStream<'static, T> {
        match self {
            Strategy::Retaining(r) => r.attach(token),
            Strategy::Broadcast(b) => b.attach(token),
        }
    }

    pub(crate) fn subscribers(&self) -> usize {
        match self {
            Strategy::Retaining(r) => r.consumers(),
            Strategy::Broadcast(b) => b.members(),
        }
    }

    pub(crate) fn pending(&self) -> usize {
        match self {
            Strategy::Retaining(r) => r.pending(),
            Strategy::Broadcast(_) => 0,
        }
    }
}
