// Copyright (c) The Interlock Project Authors.
// Licensed under the MIT License.

//! Error type for store operations.

/// An error from a lock or breaker store operation.
///
/// This is an opaque error type that can wrap any underlying error from a
/// store implementation. Use [`std::error::Error::source()`] to access the
/// underlying cause if needed.
///
/// Store errors are fatal to the operation that triggered them: handles
/// surface them to the caller unchanged and never convert them into domain
/// outcomes such as "lock unavailable".
///
/// # Example
///
/// ```
/// use interlock_store::Error;
///
/// let error = Error::from_message("connection refused");
/// ```
#[ohno::error]
pub struct Error {}

impl Error {
    /// Creates a new error from any type that can be converted to an error.
    ///
    /// This is the public API for creating store errors from external crates.
    ///
    /// # Examples
    ///
    /// ```
    /// use interlock_store::Error;
    ///
    /// let error = Error::from_message("operation failed");
    /// ```
    pub fn from_message(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(cause)
    }
}

/// A specialized [`Result`] type for store operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_message_preserves_cause_text() {
        let error = Error::from_message("connection refused");
        let display = format!("{error}");
        assert!(display.contains("connection refused"));
    }

    #[test]
    fn result_type_alias_works() {
        fn returns_ok() -> Result<u32> {
            Ok(7)
        }

        fn returns_err() -> Result<u32> {
            Err(Error::from_message("boom"))
        }

        assert_eq!(returns_ok().unwrap(), 7);
        assert!(returns_err().is_err());
    }
}
