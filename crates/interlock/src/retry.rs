// Copyright (c) The Interlock Project Authors.
// Licensed under the MIT License.

//! Cooperative retry loop used for blocking acquisition.

use std::time::Duration;

use tick::{Clock, Delay, Stopwatch};

use crate::constants::{DEFAULT_RETRY_INTERVAL, DEFAULT_RETRY_TOTAL_TIME};

/// Budget and pacing for a blocking acquisition.
///
/// The loop always makes at least one attempt, sleeps `interval` between
/// attempts, and gives up once the cumulative elapsed time reaches
/// `total_time`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use interlock::RetryPolicy;
///
/// let policy = RetryPolicy::new(Duration::from_secs(5), Duration::from_millis(100));
/// assert_eq!(policy.total_time(), Duration::from_secs(5));
/// assert_eq!(policy.interval(), Duration::from_millis(100));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    total_time: Duration,
    interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_TOTAL_TIME, DEFAULT_RETRY_INTERVAL)
    }
}

impl RetryPolicy {
    /// Creates a policy with the given budget and pacing.
    #[must_use]
    pub fn new(total_time: Duration, interval: Duration) -> Self {
        Self { total_time, interval }
    }

    /// The total time budget for the loop.
    #[must_use]
    pub fn total_time(self) -> Duration {
        self.total_time
    }

    /// The sleep between attempts.
    #[must_use]
    pub fn interval(self) -> Duration {
        self.interval
    }
}

/// Repeats `attempt` until it succeeds or the budget is exhausted.
///
/// The sleep between attempts suspends on the injected clock, so dropping the
/// returned future cancels the loop at the next sleep boundary. Errors from
/// an attempt abort the loop immediately.
pub(crate) async fn retry_until<E, F, Fut>(clock: &Clock, policy: RetryPolicy, mut attempt: F) -> Result<bool, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, E>>,
{
    let stopwatch = Stopwatch::new(clock);
    loop {
        if attempt().await? {
            return Ok(true);
        }
        if stopwatch.elapsed() >= policy.total_time {
            return Ok(false);
        }
        Delay::new(clock, policy.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use std::pin::pin;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::{Context, Poll};

    use futures::task::noop_waker;
    use tick::ClockControl;

    use super::*;

    #[derive(Debug)]
    struct Unreachable;

    #[tokio::test]
    async fn first_success_needs_no_sleep() {
        let clock = tick::Clock::new_frozen();
        let result = retry_until(&clock, RetryPolicy::default(), || async { Ok::<_, Unreachable>(true) }).await;
        assert!(result.unwrap());
    }

    #[tokio::test]
    async fn zero_budget_still_makes_one_attempt() {
        let clock = tick::Clock::new_frozen();
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);

        let policy = RetryPolicy::new(Duration::ZERO, Duration::from_millis(10));
        let result = retry_until(&clock, policy, || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Unreachable>(false)
            }
        })
        .await;

        assert!(!result.unwrap());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn attempt_error_aborts_the_loop() {
        let clock = tick::Clock::new_frozen();
        let result = retry_until(&clock, RetryPolicy::default(), || async { Err::<bool, _>("store down") }).await;
        assert_eq!(result.unwrap_err(), "store down");
    }

    #[test]
    fn retries_on_the_configured_interval() {
        let control = ClockControl::new();
        let clock = control.to_clock();
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);

        let policy = RetryPolicy::new(Duration::from_millis(100), Duration::from_millis(40));
        let mut future = pin!(retry_until(&clock, policy, || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Unreachable>(false)
            }
        }));

        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);

        // First attempt happens synchronously, then the loop parks on the delay.
        assert!(future.as_mut().poll(&mut cx).is_pending());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);

        control.advance(Duration::from_millis(40));
        assert!(future.as_mut().poll(&mut cx).is_pending());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);

        control.advance(Duration::from_millis(40));
        assert!(future.as_mut().poll(&mut cx).is_pending());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);

        // Budget exhausted after this attempt: 120ms elapsed >= 100ms.
        control.advance(Duration::from_millis(40));
        match future.as_mut().poll(&mut cx) {
            Poll::Ready(result) => assert!(!result.unwrap()),
            Poll::Pending => panic!("loop must stop once the budget is exhausted"),
        }
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn succeeds_once_the_resource_frees_up() {
        let control = ClockControl::new();
        let clock = control.to_clock();
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);

        let policy = RetryPolicy::new(Duration::from_secs(10), Duration::from_millis(40));
        let mut future = pin!(retry_until(&clock, policy, || {
            let counter = Arc::clone(&counter);
            async move {
                // Becomes available on the third attempt.
                Ok::<_, Unreachable>(counter.fetch_add(1, Ordering::SeqCst) >= 2)
            }
        }));

        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);

        assert!(future.as_mut().poll(&mut cx).is_pending());
        control.advance(Duration::from_millis(40));
        assert!(future.as_mut().poll(&mut cx).is_pending());
        control.advance(Duration::from_millis(40));

        match future.as_mut().poll(&mut cx) {
            Poll::Ready(result) => assert!(result.unwrap()),
            Poll::Pending => panic!("third attempt must succeed"),
        }
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
