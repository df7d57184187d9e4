// Copyright (c) The Interlock Project Authors.
// Licensed under the MIT License.

//! Lock lifecycle events.

use std::time::Duration;

use interlock_store::Ttl;

/// Identity of the handle that published an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockSnapshot {
    /// The decorated key.
    pub key: String,
    /// The handle's owner id.
    pub owner: String,
    /// The handle's lease configuration.
    pub ttl: Ttl,
}

/// Events published by lock handles.
///
/// Within a single operation, a failed-decision event (e.g.
/// [`Unavailable`][Self::Unavailable]) or the outcome event is published
/// after the store call completes, in call order. `run` scopes guarantee
/// that [`Acquired`][Self::Acquired] precedes [`Released`][Self::Released].
#[derive(Debug, Clone)]
pub enum LockEvent {
    /// The owner acquired the lock.
    Acquired {
        /// The publishing handle.
        lock: LockSnapshot,
    },
    /// Acquisition failed: a rival owner holds the lock. Published once per
    /// failed attempt, including each attempt of a blocking acquisition.
    Unavailable {
        /// The publishing handle.
        lock: LockSnapshot,
    },
    /// The owner released the lock.
    Released {
        /// The publishing handle.
        lock: LockSnapshot,
    },
    /// A release returned `false`: the caller is not the recorded owner or
    /// the record is gone.
    ReleaseFailed {
        /// The publishing handle.
        lock: LockSnapshot,
    },
    /// The record was force-released. Published even when no record existed;
    /// `has_released` distinguishes the two cases.
    ForceReleased {
        /// The publishing handle.
        lock: LockSnapshot,
        /// Whether a live record existed before the call.
        has_released: bool,
    },
    /// The owner extended the lease.
    Refreshed {
        /// The publishing handle.
        lock: LockSnapshot,
        /// The new lease duration.
        ttl: Duration,
    },
    /// A refresh returned `false`: the caller does not own a refreshable
    /// lease.
    RefreshFailed {
        /// The publishing handle.
        lock: LockSnapshot,
    },
}

/// Discriminant of [`LockEvent`], used for kind-filtered subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockEventKind {
    /// See [`LockEvent::Acquired`].
    Acquired,
    /// See [`LockEvent::Unavailable`].
    Unavailable,
    /// See [`LockEvent::Released`].
    Released,
    /// See [`LockEvent::ReleaseFailed`].
    ReleaseFailed,
    /// See [`LockEvent::ForceReleased`].
    ForceReleased,
    /// See [`LockEvent::Refreshed`].
    Refreshed,
    /// See [`LockEvent::RefreshFailed`].
    RefreshFailed,
}

impl LockEvent {
    /// Returns the event's discriminant.
    #[must_use]
    pub fn kind(&self) -> LockEventKind {
        match self {
            Self::Acquired { .. } => LockEventKind::Acquired,
            Self::Unavailable { .. } => LockEventKind::Unavailable,
            Self::Released { .. } => LockEventKind::Released,
            Self::ReleaseFailed { .. } => LockEventKind::ReleaseFailed,
            Self::ForceReleased { .. } => LockEventKind::ForceReleased,
            Self::Refreshed { .. } => LockEventKind::Refreshed,
            Self::RefreshFailed { .. } => LockEventKind::RefreshFailed,
        }
    }

    /// Returns the identity of the handle that published the event.
    #[must_use]
    pub fn lock(&self) -> &LockSnapshot {
        match self {
            Self::Acquired { lock }
            | Self::Unavailable { lock }
            | Self::Released { lock }
            | Self::ReleaseFailed { lock }
            | Self::ForceReleased { lock, .. }
            | Self::Refreshed { lock, .. }
            | Self::RefreshFailed { lock } => lock,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> LockSnapshot {
        LockSnapshot {
            key: "app:k".to_string(),
            owner: "me".to_string(),
            ttl: Ttl::Unexpireable,
        }
    }

    #[test]
    fn kind_matches_variant() {
        let event = LockEvent::ForceReleased {
            lock: snapshot(),
            has_released: false,
        };
        assert_eq!(event.kind(), LockEventKind::ForceReleased);
        assert_eq!(event.lock().key, "app:k");
    }
}
