// Copyright (c) The Interlock Project Authors.
// Licensed under the MIT License.

//! Call-outcome classification: triggers and error policies.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Which call outcomes feed the circuit's failure metric.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trigger {
    /// Policy-matched errors and slow calls both count as failures.
    #[default]
    Both,
    /// Only policy-matched errors count; slow calls count as successes.
    OnlyError,
    /// Only slow calls count; errors are neither tracked nor published.
    OnlySlowCall,
}

type Predicate = Arc<dyn Fn(&(dyn std::error::Error + 'static)) -> bool + Send + Sync>;

/// Decides whether a raised error counts as a tracked failure.
///
/// Errors that do not match are *untracked*: they are propagated to the
/// caller but never recorded in the circuit's metrics. The default policy
/// tracks every error.
///
/// # Examples
///
/// ```
/// use interlock::ErrorPolicy;
///
/// // Track every error (the default):
/// let all = ErrorPolicy::all();
///
/// // Track only a specific error type:
/// let io_only = ErrorPolicy::of_type::<std::io::Error>();
///
/// // Track by predicate:
/// let transient = ErrorPolicy::matching(|error| error.to_string().contains("timeout"));
/// ```
#[derive(Clone)]
pub struct ErrorPolicy(Predicate);

impl std::fmt::Debug for ErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorPolicy").finish_non_exhaustive()
    }
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        Self::all()
    }
}

impl ErrorPolicy {
    /// Tracks every error.
    #[must_use]
    pub fn all() -> Self {
        Self(Arc::new(|_error| true))
    }

    /// Tracks errors for which the predicate returns `true`.
    #[must_use]
    pub fn matching<F>(predicate: F) -> Self
    where
        F: Fn(&(dyn std::error::Error + 'static)) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    /// Tracks only errors of the concrete type `E`.
    #[must_use]
    pub fn of_type<E>() -> Self
    where
        E: std::error::Error + 'static,
    {
        Self::matching(|error| error.is::<E>())
    }

    pub(crate) fn matches(&self, error: &(dyn std::error::Error + 'static)) -> bool {
        (self.0)(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Transient;

    impl std::fmt::Display for Transient {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("transient failure")
        }
    }

    impl std::error::Error for Transient {}

    #[test]
    fn all_matches_everything() {
        let policy = ErrorPolicy::all();
        assert!(policy.matches(&Transient));
    }

    #[test]
    fn of_type_downcasts() {
        let policy = ErrorPolicy::of_type::<Transient>();
        assert!(policy.matches(&Transient));
        assert!(!policy.matches(&std::io::Error::other("boom")));
    }

    #[test]
    fn matching_uses_the_predicate() {
        let policy = ErrorPolicy::matching(|error| error.to_string().contains("transient"));
        assert!(policy.matches(&Transient));
        assert!(!policy.matches(&std::io::Error::other("permanent")));
    }

    #[test]
    fn trigger_default_is_both() {
        assert_eq!(Trigger::default(), Trigger::Both);
    }
}
