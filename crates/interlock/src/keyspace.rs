// Copyright (c) The Interlock Project Authors.
// Licensed under the MIT License.

//! Deterministic key prefixing.

/// A deterministic key decorator isolating independent use cases on a shared
/// backing store.
///
/// A keyspace is a chain of prefix segments. Two handles refer to the same
/// shared record iff their decorated keys are byte-equal, so distinct groups
/// on the same store can never collide.
///
/// # Examples
///
/// ```
/// use interlock::Keyspace;
///
/// let keyspace = Keyspace::new("app");
/// assert_eq!(keyspace.decorate("jobs"), "app:jobs");
///
/// let tenant = keyspace.group("tenant-1");
/// assert_eq!(tenant.decorate("jobs"), "app:tenant-1:jobs");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Keyspace {
    prefix: String,
}

impl Keyspace {
    /// Creates a keyspace rooted at the given prefix.
    #[must_use]
    pub fn new(root: impl Into<String>) -> Self {
        Self { prefix: root.into() }
    }

    /// Returns a child keyspace with an additional prefix segment.
    #[must_use]
    pub fn group(&self, segment: &str) -> Self {
        Self {
            prefix: format!("{}:{segment}", self.prefix),
        }
    }

    /// Decorates a user key into the stored key.
    ///
    /// The decoration is deterministic: the same keyspace instance always
    /// produces the same stored key for a given user key.
    #[must_use]
    pub fn decorate(&self, key: &str) -> String {
        format!("{}:{key}", self.prefix)
    }

    /// Returns the accumulated prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoration_is_deterministic() {
        let keyspace = Keyspace::new("app");
        assert_eq!(keyspace.decorate("k"), keyspace.decorate("k"));
        assert_eq!(keyspace.decorate("k"), "app:k");
    }

    #[test]
    fn groups_do_not_collide() {
        let root = Keyspace::new("app");
        let a = root.group("a");
        let b = root.group("b");

        assert_ne!(a.decorate("k"), b.decorate("k"));
        assert_ne!(root.decorate("k"), a.decorate("k"));
    }

    #[test]
    fn nested_groups_accumulate() {
        let keyspace = Keyspace::new("app").group("x").group("y");
        assert_eq!(keyspace.prefix(), "app:x:y");
        assert_eq!(keyspace.decorate("k"), "app:x:y:k");
    }
}
