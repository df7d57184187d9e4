// Copyright (c) The Interlock Project Authors.
// Licensed under the MIT License.

//! Circuit breaker domain errors.

use crate::StoreError;

/// The call was rejected because the circuit is open.
#[ohno::error]
#[display("circuit {key} is open and rejecting calls")]
pub struct OpenCircuitError {
    /// The decorated key of the circuit.
    pub key: String,
}

/// The call was rejected because the circuit was isolated by an operator.
#[ohno::error]
#[display("circuit {key} is isolated and rejecting calls")]
pub struct IsolatedCircuitError {
    /// The decorated key of the circuit.
    pub key: String,
}

/// The error surface of [`CircuitBreaker::run`][crate::CircuitBreaker::run].
///
/// Rejections ([`Open`][Self::Open], [`Isolated`][Self::Isolated]) mean the
/// guarded function was never invoked. [`Inner`][Self::Inner] carries the
/// function's own error unchanged, after bookkeeping. [`Store`][Self::Store]
/// surfaces a backing-store failure; it is never silently converted into a
/// circuit decision.
#[derive(Debug)]
pub enum BreakerError<E> {
    /// The circuit is open; the call was rejected.
    Open(OpenCircuitError),
    /// The circuit is isolated; the call was rejected.
    Isolated(IsolatedCircuitError),
    /// The backing store failed.
    Store(StoreError),
    /// The guarded function failed; its error is propagated unchanged.
    Inner(E),
}

impl<E> BreakerError<E> {
    /// Returns `true` for an open-circuit rejection.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open(_))
    }

    /// Returns `true` for an isolated-circuit rejection.
    #[must_use]
    pub fn is_isolated(&self) -> bool {
        matches!(self, Self::Isolated(_))
    }

    /// Returns the guarded function's error, if that is what this is.
    #[must_use]
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Inner(error) => Some(error),
            _ => None,
        }
    }
}

impl<E: std::fmt::Display> std::fmt::Display for BreakerError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open(error) => std::fmt::Display::fmt(error, f),
            Self::Isolated(error) => std::fmt::Display::fmt(error, f),
            Self::Store(error) => std::fmt::Display::fmt(error, f),
            Self::Inner(error) => std::fmt::Display::fmt(error, f),
        }
    }
}

impl<E> std::error::Error for BreakerError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open(error) => Some(error),
            Self::Isolated(error) => Some(error),
            Self::Store(error) => Some(error),
            Self::Inner(error) => Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicates_match_variants() {
        let open: BreakerError<std::io::Error> = BreakerError::Open(OpenCircuitError::new("k".to_string()));
        assert!(open.is_open());
        assert!(!open.is_isolated());
        assert!(open.into_inner().is_none());

        let isolated: BreakerError<std::io::Error> = BreakerError::Isolated(IsolatedCircuitError::new("k".to_string()));
        assert!(isolated.is_isolated());
    }

    #[test]
    fn inner_error_is_recoverable() {
        let inner = std::io::Error::other("downstream refused");
        let error: BreakerError<std::io::Error> = BreakerError::Inner(inner);

        assert!(format!("{error}").contains("downstream refused"));
        let recovered = error.into_inner().expect("must carry the inner error");
        assert_eq!(recovered.to_string(), "downstream refused");
    }
}
