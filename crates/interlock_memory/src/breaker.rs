// Copyright (c) The Interlock Project Authors.
// Licensed under the MIT License.

//! In-memory circuit state machine.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use interlock_store::{BreakerState, BreakerStore, Result, StateChange};
use parking_lot::Mutex;
use tick::Clock;

use crate::window::RollingWindow;

/// Default failure ratio over the sampling window that opens the circuit.
const DEFAULT_FAILURE_THRESHOLD: f32 = 0.5;

/// Default minimum number of outcomes in the sampling window before the
/// circuit can open.
const DEFAULT_MIN_THROUGHPUT: u32 = 10;

/// Default duration of the sampling window.
const DEFAULT_SAMPLING_DURATION: Duration = Duration::from_secs(30);

/// Default duration the circuit stays open before probing.
const DEFAULT_OPEN_DURATION: Duration = Duration::from_secs(5);

/// Default number of probe outcomes evaluated in half-open state.
const DEFAULT_PROBE_COUNT: u32 = 5;

/// Default probe success ratio required to close the circuit.
const DEFAULT_PROBE_SUCCESS_THRESHOLD: f32 = 0.6;

/// Transition policy for [`MemoryBreakerStore`].
///
/// The policy is shared by every key in the store; create separate stores for
/// dependencies that need different thresholds.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use interlock_memory::BreakerPolicy;
///
/// let policy = BreakerPolicy::new()
///     .failure_threshold(0.2)
///     .min_throughput(50)
///     .open_duration(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct BreakerPolicy {
    failure_threshold: f32,
    min_throughput: u32,
    sampling_duration: Duration,
    open_duration: Duration,
    probe_count: u32,
    probe_success_threshold: f32,
}

impl Default for BreakerPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl BreakerPolicy {
    /// Creates a policy with the default thresholds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            min_throughput: DEFAULT_MIN_THROUGHPUT,
            sampling_duration: DEFAULT_SAMPLING_DURATION,
            open_duration: DEFAULT_OPEN_DURATION,
            probe_count: DEFAULT_PROBE_COUNT,
            probe_success_threshold: DEFAULT_PROBE_SUCCESS_THRESHOLD,
        }
    }

    /// Failure ratio over the sampling window that opens the circuit.
    #[must_use]
    pub fn failure_threshold(mut self, ratio: f32) -> Self {
        self.failure_threshold = ratio;
        self
    }

    /// Minimum number of outcomes in the window before the circuit can open.
    #[must_use]
    pub fn min_throughput(mut self, count: u32) -> Self {
        self.min_throughput = count;
        self
    }

    /// Duration of the sliding sampling window.
    #[must_use]
    pub fn sampling_duration(mut self, duration: Duration) -> Self {
        self.sampling_duration = duration;
        self
    }

    /// How long the circuit stays open before probing.
    #[must_use]
    pub fn open_duration(mut self, duration: Duration) -> Self {
        self.open_duration = duration;
        self
    }

    /// Number of probe outcomes evaluated in half-open state.
    #[must_use]
    pub fn probe_count(mut self, count: u32) -> Self {
        self.probe_count = count.max(1);
        self
    }

    /// Probe success ratio required to close the circuit.
    #[must_use]
    pub fn probe_success_threshold(mut self, ratio: f32) -> Self {
        self.probe_success_threshold = ratio;
        self
    }
}

/// An in-memory [`BreakerStore`] with a per-key state machine.
///
/// Tracked outcomes feed a sliding window in closed state and a probe tally
/// in half-open state; outcomes arriving while the circuit is open or
/// isolated are discarded. All transitions happen inside
/// [`update_state`][BreakerStore::update_state], which returns the observed
/// `{from, to}` pair atomically.
///
/// # Examples
///
/// ```
/// use interlock_memory::{BreakerPolicy, MemoryBreakerStore};
/// use interlock_store::{BreakerState, BreakerStore};
/// use tick::Clock;
/// # futures::executor::block_on(async {
///
/// let clock = Clock::new_frozen();
/// let store = MemoryBreakerStore::new(&clock, BreakerPolicy::new());
///
/// assert_eq!(store.state("billing").await?, BreakerState::Closed);
/// # Ok::<(), interlock_store::Error>(())
/// # });
/// ```
#[derive(Debug)]
pub struct MemoryBreakerStore {
    clock: Clock,
    policy: BreakerPolicy,
    circuits: Mutex<HashMap<String, Circuit>>,
}

impl MemoryBreakerStore {
    /// Creates an empty store driven by the given clock and policy.
    #[must_use]
    pub fn new(clock: &Clock, policy: BreakerPolicy) -> Self {
        Self {
            clock: clock.clone(),
            policy,
            circuits: Mutex::new(HashMap::new()),
        }
    }
}

impl BreakerStore for MemoryBreakerStore {
    async fn state(&self, key: &str) -> Result<BreakerState> {
        let circuits = self.circuits.lock();
        Ok(circuits.get(key).map_or(BreakerState::Closed, Circuit::state))
    }

    async fn update_state(&self, key: &str) -> Result<StateChange> {
        let now = self.clock.system_time();
        let mut circuits = self.circuits.lock();
        let circuit = circuits
            .entry(key.to_string())
            .or_insert_with(|| Circuit::closed(&self.policy));
        Ok(circuit.evaluate(now, &self.policy))
    }

    async fn track_success(&self, key: &str) -> Result<()> {
        self.track(key, true);
        Ok(())
    }

    async fn track_failure(&self, key: &str) -> Result<()> {
        self.track(key, false);
        Ok(())
    }

    async fn isolate(&self, key: &str) -> Result<()> {
        self.circuits.lock().insert(key.to_string(), Circuit::Isolated);
        Ok(())
    }

    async fn reset(&self, key: &str) -> Result<()> {
        self.circuits.lock().remove(key);
        Ok(())
    }
}

impl MemoryBreakerStore {
    fn track(&self, key: &str, success: bool) {
        let now = self.clock.system_time();
        let mut circuits = self.circuits.lock();
        let circuit = circuits
            .entry(key.to_string())
            .or_insert_with(|| Circuit::closed(&self.policy));
        circuit.record(success, now);
    }
}

#[derive(Debug)]
enum Circuit {
    Closed { window: RollingWindow },
    Open { since: SystemTime },
    HalfOpen { successes: u32, failures: u32 },
    Isolated,
}

impl Circuit {
    fn closed(policy: &BreakerPolicy) -> Self {
        Self::Closed {
            window: RollingWindow::new(policy.sampling_duration),
        }
    }

    fn state(&self) -> BreakerState {
        match self {
            Self::Closed { .. } => BreakerState::Closed,
            Self::Open { .. } => BreakerState::Open,
            Self::HalfOpen { .. } => BreakerState::HalfOpen,
            Self::Isolated => BreakerState::Isolated,
        }
    }

    fn record(&mut self, success: bool, now: SystemTime) {
        match self {
            Self::Closed { window } => window.record(success, now),
            Self::HalfOpen { successes, failures } => {
                if success {
                    *successes = successes.saturating_add(1);
                } else {
                    *failures = failures.saturating_add(1);
                }
            }
            // Outcomes straggling in while the circuit is open or isolated
            // are discarded; the enter/exit calls are not a transaction, so
            // this can happen under concurrency.
            Self::Open { .. } | Self::Isolated => {}
        }
    }

    fn evaluate(&mut self, now: SystemTime, policy: &BreakerPolicy) -> StateChange {
        let from = self.state();

        match self {
            Self::Closed { window } => {
                let (successes, failures) = window.counts(now);
                if unhealthy(successes, failures, policy) {
                    *self = Self::Open { since: now };
                }
            }
            Self::Open { since } => {
                let open_for = now.duration_since(*since).unwrap_or(Duration::ZERO);
                if open_for >= policy.open_duration {
                    *self = Self::HalfOpen {
                        successes: 0,
                        failures: 0,
                    };
                }
            }
            Self::HalfOpen { successes, failures } => {
                let outcomes = successes.saturating_add(*failures);
                if outcomes >= policy.probe_count {
                    if ratio(*successes, outcomes) >= policy.probe_success_threshold {
                        *self = Self::closed(policy);
                    } else {
                        *self = Self::Open { since: now };
                    }
                }
            }
            Self::Isolated => {}
        }

        StateChange {
            from,
            to: self.state(),
        }
    }
}

fn unhealthy(successes: u32, failures: u32, policy: &BreakerPolicy) -> bool {
    let throughput = successes.saturating_add(failures);
    if throughput == 0 || throughput < policy.min_throughput {
        return false;
    }
    ratio(failures, throughput) >= policy.failure_threshold
}

#[expect(clippy::cast_possible_truncation, reason = "Acceptable")]
fn ratio(part: u32, whole: u32) -> f32 {
    if whole == 0 {
        return 0.0;
    }
    (f64::from(part) / f64::from(whole)) as f32
}
