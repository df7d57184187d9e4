// Copyright (c) The Interlock Project Authors.
// Licensed under the MIT License.

//! Circuit breaker lifecycle events.

use std::time::Duration;

use interlock_store::BreakerState;

use crate::breaker::Trigger;

/// Identity of the handle that published an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakerSnapshot {
    /// The decorated key.
    pub key: String,
    /// The handle's trigger configuration.
    pub trigger: Trigger,
    /// The handle's slow-call threshold, if any.
    pub slow_call_time: Option<Duration>,
}

/// Events published by circuit breaker handles.
#[derive(Debug, Clone)]
pub enum BreakerEvent {
    /// A state evaluation moved the circuit to a new state. Published
    /// exactly once per transitioning evaluation.
    StateTransitioned {
        /// The publishing handle.
        breaker: BreakerSnapshot,
        /// State before the evaluation.
        from: BreakerState,
        /// State after the evaluation.
        to: BreakerState,
    },
    /// An operator forced the circuit open.
    Isolated {
        /// The publishing handle.
        breaker: BreakerSnapshot,
    },
    /// The circuit was reset to closed with zeroed counts.
    Reset {
        /// The publishing handle.
        breaker: BreakerSnapshot,
    },
    /// A call failed with an error that does not match the error policy. The
    /// failure was propagated to the caller but not recorded in the metrics.
    UntrackedError {
        /// The publishing handle.
        breaker: BreakerSnapshot,
        /// Rendered message of the untracked error.
        error: String,
    },
    /// Asynchronous bookkeeping hit a store failure that could not be raised
    /// to any caller.
    TrackingFailed {
        /// The publishing handle.
        breaker: BreakerSnapshot,
        /// Rendered message of the store error.
        error: String,
    },
}

/// Discriminant of [`BreakerEvent`], used for kind-filtered subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BreakerEventKind {
    /// See [`BreakerEvent::StateTransitioned`].
    StateTransitioned,
    /// See [`BreakerEvent::Isolated`].
    Isolated,
    /// See [`BreakerEvent::Reset`].
    Reset,
    /// See [`BreakerEvent::UntrackedError`].
    UntrackedError,
    /// See [`BreakerEvent::TrackingFailed`].
    TrackingFailed,
}

impl BreakerEvent {
    /// Returns the event's discriminant.
    #[must_use]
    pub fn kind(&self) -> BreakerEventKind {
        match self {
            Self::StateTransitioned { .. } => BreakerEventKind::StateTransitioned,
            Self::Isolated { .. } => BreakerEventKind::Isolated,
            Self::Reset { .. } => BreakerEventKind::Reset,
            Self::UntrackedError { .. } => BreakerEventKind::UntrackedError,
            Self::TrackingFailed { .. } => BreakerEventKind::TrackingFailed,
        }
    }

    /// Returns the identity of the handle that published the event.
    #[must_use]
    pub fn breaker(&self) -> &BreakerSnapshot {
        match self {
            Self::StateTransitioned { breaker, .. }
            | Self::Isolated { breaker }
            | Self::Reset { breaker }
            | Self::UntrackedError { breaker, .. }
            | Self::TrackingFailed { breaker, .. } => breaker,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        let event = BreakerEvent::StateTransitioned {
            breaker: BreakerSnapshot {
                key: "app:svc".to_string(),
                trigger: Trigger::Both,
                slow_call_time: None,
            },
            from: BreakerState::Closed,
            to: BreakerState::Open,
        };

        assert_eq!(event.kind(), BreakerEventKind::StateTransitioned);
        assert_eq!(event.breaker().key, "app:svc");
    }
}
