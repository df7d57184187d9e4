// Copyright (c) The Interlock Project Authors.
// Licensed under the MIT License.

use std::collections::VecDeque;
use std::time::{Duration, SystemTime};

const BUCKET_COUNT: u32 = 10;

/// Minimum allowed duration for the breaker's sampling window.
pub(crate) const MIN_SAMPLING_DURATION: Duration = Duration::from_secs(1);

/// Tracks call outcomes over a sliding time window.
///
/// The window is divided into `BUCKET_COUNT` buckets; buckets older than the
/// sampling duration are discarded as new outcomes arrive or counts are read.
#[derive(Debug)]
pub(crate) struct RollingWindow {
    sampling_duration: Duration,
    bucket_duration: Duration,
    buckets: VecDeque<Bucket>,
}

impl RollingWindow {
    pub fn new(sampling_duration: Duration) -> Self {
        let sampling_duration = sampling_duration.max(MIN_SAMPLING_DURATION);
        Self {
            sampling_duration,
            bucket_duration: sampling_duration / BUCKET_COUNT,
            buckets: VecDeque::with_capacity(BUCKET_COUNT as usize),
        }
    }

    pub fn record(&mut self, success: bool, now: SystemTime) {
        self.prune(now);

        if let Some(back) = self.buckets.back_mut()
            && age(back.started_at, now) < self.bucket_duration
        {
            back.update(success);
        } else {
            let mut bucket = Bucket::new(now);
            bucket.update(success);
            self.buckets.push_back(bucket);
        }
    }

    /// Returns `(successes, failures)` over the live window.
    pub fn counts(&mut self, now: SystemTime) -> (u32, u32) {
        self.prune(now);

        let mut successes = 0_u32;
        let mut failures = 0_u32;
        for bucket in &self.buckets {
            successes = successes.saturating_add(bucket.successes);
            failures = failures.saturating_add(bucket.failures);
        }
        (successes, failures)
    }

    fn prune(&mut self, now: SystemTime) {
        while let Some(front) = self.buckets.front()
            && age(front.started_at, now) > self.sampling_duration
        {
            self.buckets.pop_front();
        }
    }
}

fn age(started_at: SystemTime, now: SystemTime) -> Duration {
    now.duration_since(started_at).unwrap_or(Duration::ZERO)
}

#[derive(Debug)]
struct Bucket {
    started_at: SystemTime,
    successes: u32,
    failures: u32,
}

impl Bucket {
    fn new(started_at: SystemTime) -> Self {
        Self {
            started_at,
            successes: 0,
            failures: 0,
        }
    }

    fn update(&mut self, success: bool) {
        if success {
            self.successes = self.successes.saturating_add(1);
        } else {
            self.failures = self.failures.saturating_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: SystemTime = SystemTime::UNIX_EPOCH;

    #[test]
    fn records_and_counts() {
        let mut window = RollingWindow::new(Duration::from_secs(10));

        window.record(true, START);
        window.record(false, START);
        window.record(false, START);

        assert_eq!(window.counts(START), (1, 2));
    }

    #[test]
    fn sampling_duration_is_clamped() {
        let window = RollingWindow::new(Duration::from_millis(100));
        assert_eq!(window.sampling_duration, MIN_SAMPLING_DURATION);
    }

    #[test]
    fn old_buckets_are_discarded() {
        let mut window = RollingWindow::new(Duration::from_secs(10));

        window.record(false, START);
        // Still within the window.
        assert_eq!(window.counts(START + Duration::from_secs(5)), (0, 1));
        // Past the window.
        assert_eq!(window.counts(START + Duration::from_secs(11)), (0, 0));
    }

    #[test]
    fn outcomes_spread_across_buckets() {
        let mut window = RollingWindow::new(Duration::from_secs(10));

        window.record(false, START);
        window.record(true, START + Duration::from_secs(3));
        window.record(true, START + Duration::from_secs(6));

        assert_eq!(window.counts(START + Duration::from_secs(6)), (2, 1));
        // The first bucket ages out, the later ones remain.
        assert_eq!(window.counts(START + Duration::from_secs(12)), (2, 0));
    }
}
