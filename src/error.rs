//! Error types used by the relay and its owning scope.
//!
//! This module defines two error enums:
//!
//! - [`EmitError`] — an event could not be enqueued (the "enqueue failed" class).
//! - [`ScopeError`] — the owning scope could not stop its background work in time.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.
//!
//! Dropping a broadcast event because nobody listens is **not** an error; it is reported
//! as [`Delivery::Suppressed`](crate::Delivery::Suppressed) in the `Ok` branch of
//! [`Relay::emit`](crate::Relay::emit).

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by [`Relay::emit`](crate::Relay::emit).
///
/// Local to the failing call: the relay state stays consistent for every other
/// producer and subscriber, and the relay never retries on its own.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmitError {
    /// The retained buffer already holds `capacity` undelivered events.
    #[error("enqueue failed: retained buffer is full (capacity {capacity})")]
    Full {
        /// Configured capacity of the retained buffer.
        capacity: usize,
    },

    /// The owning scope has been torn down; nothing is accepted any more.
    #[error("enqueue failed: relay is closed")]
    Closed,
}

impl EmitError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use eventrelay::EmitError;
    ///
    /// let err = EmitError::Full { capacity: 64 };
    /// assert_eq!(err.as_label(), "enqueue_full");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            EmitError::Full { .. } => "enqueue_full",
            EmitError::Closed => "enqueue_closed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            EmitError::Full { capacity } => format!("buffer full: {capacity} events pending"),
            EmitError::Closed => "relay closed".to_string(),
        }
    }

    /// Indicates whether the producer may succeed by emitting again later.
    ///
    /// Returns `true` for [`EmitError::Full`] (a consumer may drain the backlog),
    /// `false` for [`EmitError::Closed`].
    ///
    /// # Example
    /// ```
    /// use eventrelay::EmitError;
    ///
    /// assert!(EmitError::Full { capacity: 1 }.is_retryable());
    /// assert!(!EmitError::Closed.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(self, EmitError::Full { .. })
    }
}

/// # Errors produced while tearing down a [`Scope`](crate::Scope).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// Background tasks were still running when the grace period ran out.
    #[error("scope shutdown exceeded {grace:?}; {pending} background task(s) still running")]
    GraceExceeded {
        /// The grace duration that was given to `shutdown`.
        grace: Duration,
        /// Number of tracked tasks that had not finished.
        pending: usize,
    },
}

impl ScopeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ScopeError::GraceExceeded { .. } => "scope_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ScopeError::GraceExceeded { grace, pending } => {
                format!("grace exceeded after {grace:?}; pending tasks={pending}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        assert_eq!(EmitError::Closed.as_label(), "enqueue_closed");
        assert_eq!(EmitError::Full { capacity: 8 }.as_label(), "enqueue_full");

        let err = ScopeError::GraceExceeded {
            grace: Duration::from_millis(10),
            pending: 2,
        };
        assert_eq!(err.as_label(), "scope_grace_exceeded");
    }

    #[test]
    fn test_display_includes_details() {
        let err = EmitError::Full { capacity: 8 };
        assert_eq!(
            err.to_string(),
            "enqueue failed: retained buffer is full (capacity 8)"
        );
        assert_eq!(err.as_message(), "buffer full: 8 events pending");

        let err = ScopeError::GraceExceeded {
            grace: Duration::from_secs(1),
            pending: 3,
        };
        assert!(err.to_string().contains("3 background task(s)"));
        assert_eq!(err.as_message(), "grace exceeded after 1s; pending tasks=3");
    }
}
