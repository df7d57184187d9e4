// Copyright (c) The Interlock Project Authors.
// Licensed under the MIT License.

//! Circuit breaker store port.

use crate::Result;

/// The state of a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BreakerState {
    /// Calls pass through; failures and slow calls are tracked.
    Closed,
    /// Calls are short-circuited until a cool-down elapses.
    Open,
    /// A limited probe window; success closes the circuit, failure re-opens it.
    HalfOpen,
    /// Operator-forced open. Never auto-recovers; cleared only by `reset`.
    Isolated,
}

impl std::fmt::Display for BreakerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half-open",
            Self::Isolated => "isolated",
        };
        f.write_str(name)
    }
}

/// The outcome of a single [`BreakerStore::update_state`] evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    /// State before the evaluation.
    pub from: BreakerState,
    /// State after the evaluation.
    pub to: BreakerState,
}

impl StateChange {
    /// Returns `true` when the evaluation moved the circuit to a new state.
    #[must_use]
    pub fn transitioned(self) -> bool {
        self.from != self.to
    }
}

/// Trait for circuit breaker store implementations.
///
/// The store owns the rolling-window metrics and the transition rules;
/// [`update_state`][Self::update_state] is the single choke point through
/// which every transition happens, so that callers can observe `{from, to}`
/// atomically.
///
/// # Transition rules
///
/// - `Closed`: when the failure metric over the rolling window crosses the
///   configured threshold, transition to `Open` and record the opening time.
/// - `Open`: once the configured cool-down has elapsed, the next
///   `update_state` call transitions to `HalfOpen`.
/// - `HalfOpen`: a configured number of probe outcomes are evaluated; if the
///   success ratio meets the recovery threshold, transition to `Closed` with
///   zeroed counts, otherwise back to `Open`.
/// - `Isolated` is a sink until [`reset`][Self::reset].
#[cfg_attr(
    any(test, feature = "dynamic-store"),
    dynosaur::dynosaur(pub(crate) DynBreakerStore = dyn(box) BreakerStore, bridge(none))
)]
pub trait BreakerStore: Send + Sync {
    /// Reads the current state of the circuit.
    ///
    /// A key with no recorded state is `Closed`.
    fn state(&self, key: &str) -> impl Future<Output = Result<BreakerState>> + Send;

    /// Evaluates the metrics and transitions the circuit if warranted.
    fn update_state(&self, key: &str) -> impl Future<Output = Result<StateChange>> + Send;

    /// Records a tracked success for the circuit's rolling window.
    fn track_success(&self, key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Records a tracked failure for the circuit's rolling window.
    fn track_failure(&self, key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Forces the circuit into [`BreakerState::Isolated`] regardless of counts.
    fn isolate(&self, key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Returns the circuit to [`BreakerState::Closed`] with zeroed counts.
    fn reset(&self, key: &str) -> impl Future<Output = Result<()>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_change_transitioned() {
        let unchanged = StateChange {
            from: BreakerState::Closed,
            to: BreakerState::Closed,
        };
        let opened = StateChange {
            from: BreakerState::Closed,
            to: BreakerState::Open,
        };

        assert!(!unchanged.transitioned());
        assert!(opened.transitioned());
    }

    #[test]
    fn state_display_names() {
        assert_eq!(BreakerState::Closed.to_string(), "closed");
        assert_eq!(BreakerState::Open.to_string(), "open");
        assert_eq!(BreakerState::HalfOpen.to_string(), "half-open");
        assert_eq!(BreakerState::Isolated.to_string(), "isolated");
    }
}
