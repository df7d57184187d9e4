// Copyright (c) The Interlock Project Authors.
// Licensed under the MIT License.

use std::sync::Arc;
use std::time::Duration;

use anyspawn::Spawner;
use interlock_store::{BreakerState, BreakerStore, DynamicBreakerStore, StateChange};
use serde::{Deserialize, Serialize};
use tick::{Clock, Stopwatch};

use crate::StoreError;
use crate::breaker::{
    BreakerError, BreakerEvent, BreakerSnapshot, ErrorPolicy, IsolatedCircuitError, OpenCircuitError, Trigger,
};
use crate::events::EventBus;
use crate::transport::{TransportError, Transportable};

/// Collaborators shared by every handle of one provider family.
pub(crate) struct BreakerRuntime {
    pub(crate) store: DynamicBreakerStore,
    pub(crate) bus: Arc<dyn EventBus<BreakerEvent>>,
    pub(crate) clock: Clock,
    pub(crate) spawner: Option<Spawner>,
    pub(crate) transport_tag: Arc<str>,
}

impl std::fmt::Debug for BreakerRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BreakerRuntime")
            .field("store", &self.store)
            .field("transport_tag", &self.transport_tag)
            .finish_non_exhaustive()
    }
}

/// Identity payload recorded when a handle is transported.
///
/// The error policy is a closure and cannot travel; the deserializing
/// provider supplies its own.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct BreakerTransport {
    pub(crate) key: String,
    pub(crate) trigger: Trigger,
    pub(crate) slow_call_time: Option<Duration>,
    pub(crate) async_tracking: bool,
}

/// How a call outcome feeds back into the circuit's metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Verdict {
    TrackSuccess,
    TrackFailure,
    /// Nothing is recorded; `error` carries the message of an untracked
    /// failure worth publishing.
    Untracked { error: Option<String> },
}

/// A per-key circuit breaker handle.
///
/// Created through [`BreakerProvider`][crate::BreakerProvider]. The handle is
/// an immutable value; the circuit's state and metrics live behind the
/// [`BreakerStore`] port, so handles in separate processes sharing a store
/// observe one circuit. Cloning is cheap.
///
/// # Examples
///
/// ```
/// use interlock::BreakerProvider;
/// use interlock_memory::BreakerPolicy;
/// use tick::Clock;
/// # futures::executor::block_on(async {
///
/// let clock = Clock::new_frozen();
/// let provider = BreakerProvider::builder(clock).memory(BreakerPolicy::new()).build();
///
/// let breaker = provider.breaker("billing").build();
/// let reply = breaker.run(|| async { Ok::<_, std::io::Error>(42) }).await;
/// assert!(matches!(reply, Ok(42)));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    runtime: Arc<BreakerRuntime>,
    key: String,
    trigger: Trigger,
    slow_call_time: Option<Duration>,
    error_policy: ErrorPolicy,
    async_tracking: bool,
}

impl CircuitBreaker {
    pub(crate) fn new(
        runtime: Arc<BreakerRuntime>,
        key: String,
        trigger: Trigger,
        slow_call_time: Option<Duration>,
        error_policy: ErrorPolicy,
        async_tracking: bool,
    ) -> Self {
        Self {
            runtime,
            key,
            trigger,
            slow_call_time,
            error_policy,
            async_tracking,
        }
    }

    pub(crate) fn rehydrate(runtime: &Arc<BreakerRuntime>, data: BreakerTransport, error_policy: ErrorPolicy) -> Self {
        Self::new(
            Arc::clone(runtime),
            data.key,
            data.trigger,
            data.slow_call_time,
            error_policy,
            data.async_tracking,
        )
    }

    /// The decorated key identifying the shared circuit.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The handle's trigger configuration.
    #[must_use]
    pub fn trigger(&self) -> Trigger {
        self.trigger
    }

    /// The handle's slow-call threshold, if any.
    #[must_use]
    pub fn slow_call_time(&self) -> Option<Duration> {
        self.slow_call_time
    }

    /// Runs `f` guarded by the circuit.
    ///
    /// The state is sampled once at call entry (through
    /// [`BreakerStore::update_state`], so an elapsed cool-down is honored):
    ///
    /// - `Open` rejects with [`BreakerError::Open`] without invoking `f`.
    /// - `Isolated` rejects with [`BreakerError::Isolated`] without invoking
    ///   `f`.
    /// - `Closed` and `HalfOpen` invoke `f`, measure its wall-clock
    ///   duration, classify the outcome per the handle's [`Trigger`], error
    ///   policy, and slow-call threshold, and record it exactly once.
    ///
    /// With async tracking enabled (and a spawner configured on the
    /// provider) the bookkeeping runs without blocking the caller; store
    /// failures are then surfaced as [`BreakerEvent::TrackingFailed`] events
    /// instead of errors.
    ///
    /// # Errors
    ///
    /// [`BreakerError::Inner`] propagates `f`'s own error unchanged after
    /// bookkeeping; [`BreakerError::Store`] surfaces backing-store failures.
    pub async fn run<T, E, F, Fut>(&self, f: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let change = self.runtime.store.update_state(&self.key).await.map_err(BreakerError::Store)?;
        self.publish_transition(change);

        match change.to {
            BreakerState::Open => {
                return Err(BreakerError::Open(OpenCircuitError::new(self.key.clone())));
            }
            BreakerState::Isolated => {
                return Err(BreakerError::Isolated(IsolatedCircuitError::new(self.key.clone())));
            }
            BreakerState::Closed | BreakerState::HalfOpen => {}
        }

        let stopwatch = Stopwatch::new(&self.runtime.clock);
        let outcome = f().await;
        let verdict = self.classify(&outcome, stopwatch.elapsed());

        if self.async_tracking
            && let Some(spawner) = &self.runtime.spawner
        {
            let this = self.clone();
            let _detached = spawner.spawn(async move {
                if let Err(error) = this.track(verdict).await {
                    this.dispatch(BreakerEvent::TrackingFailed {
                        breaker: this.snapshot(),
                        error: error.to_string(),
                    });
                }
            });
        } else {
            self.track(verdict).await.map_err(BreakerError::Store)?;
        }

        outcome.map_err(BreakerError::Inner)
    }

    /// Forces the circuit into [`BreakerState::Isolated`].
    ///
    /// Publishes [`BreakerEvent::Isolated`].
    ///
    /// # Errors
    ///
    /// Returns the store error when the backing store fails.
    pub async fn isolate(&self) -> Result<(), StoreError> {
        self.runtime.store.isolate(&self.key).await?;
        self.dispatch(BreakerEvent::Isolated { breaker: self.snapshot() });
        Ok(())
    }

    /// Returns the circuit to [`BreakerState::Closed`] with zeroed counts.
    ///
    /// Publishes [`BreakerEvent::Reset`].
    ///
    /// # Errors
    ///
    /// Returns the store error when the backing store fails.
    pub async fn reset(&self) -> Result<(), StoreError> {
        self.runtime.store.reset(&self.key).await?;
        self.dispatch(BreakerEvent::Reset { breaker: self.snapshot() });
        Ok(())
    }

    /// Reads the current state of the circuit.
    ///
    /// # Errors
    ///
    /// Returns the store error when the backing store fails.
    pub async fn state(&self) -> Result<BreakerState, StoreError> {
        self.runtime.store.state(&self.key).await
    }

    fn classify<T, E>(&self, outcome: &Result<T, E>, elapsed: Duration) -> Verdict
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        match outcome {
            Ok(_) => {
                let slow = self.slow_call_time.is_some_and(|threshold| elapsed > threshold);
                if slow && matches!(self.trigger, Trigger::Both | Trigger::OnlySlowCall) {
                    Verdict::TrackFailure
                } else {
                    Verdict::TrackSuccess
                }
            }
            Err(error) => {
                if self.trigger == Trigger::OnlySlowCall {
                    // Errors are invisible to a slow-call-only circuit.
                    return Verdict::Untracked { error: None };
                }
                if self.error_policy.matches(error) {
                    Verdict::TrackFailure
                } else {
                    Verdict::Untracked {
                        error: Some(error.to_string()),
                    }
                }
            }
        }
    }

    /// Issues the per-call bookkeeping exactly once.
    async fn track(&self, verdict: Verdict) -> Result<(), StoreError> {
        match verdict {
            Verdict::TrackSuccess => self.runtime.store.track_success(&self.key).await?,
            Verdict::TrackFailure => self.runtime.store.track_failure(&self.key).await?,
            Verdict::Untracked { error } => {
                if let Some(error) = error {
                    self.dispatch(BreakerEvent::UntrackedError {
                        breaker: self.snapshot(),
                        error,
                    });
                }
                return Ok(());
            }
        }

        let change = self.runtime.store.update_state(&self.key).await?;
        self.publish_transition(change);
        Ok(())
    }

    fn publish_transition(&self, change: StateChange) {
        if change.transitioned() {
            #[cfg(feature = "logs")]
            tracing::debug!(key = %self.key, from = %change.from, to = %change.to, "circuit transitioned");

            self.dispatch(BreakerEvent::StateTransitioned {
                breaker: self.snapshot(),
                from: change.from,
                to: change.to,
            });
        }
    }

    fn snapshot(&self) -> BreakerSnapshot {
        BreakerSnapshot {
            key: self.key.clone(),
            trigger: self.trigger,
            slow_call_time: self.slow_call_time,
        }
    }

    fn dispatch(&self, event: BreakerEvent) {
        self.runtime.bus.dispatch(&event);
    }
}

impl Transportable for CircuitBreaker {
    fn transport_tag(&self) -> &str {
        &self.runtime.transport_tag
    }

    fn transport_body(&self) -> Result<serde_json::Value, TransportError> {
        let data = BreakerTransport {
            key: self.key.clone(),
            trigger: self.trigger,
            slow_call_time: self.slow_call_time,
            async_tracking: self.async_tracking,
        };
        serde_json::to_value(&data).map_err(TransportError::from_message)
    }
}
