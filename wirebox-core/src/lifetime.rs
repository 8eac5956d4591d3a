//! Dependency lifetime policy.
//!
//! A [`Lifetime`] governs how many instances of a registered service exist
//! and how long each one is cached:
//! - [`Lifetime::Singleton`] — one instance for the whole container
//! - [`Lifetime::Scoped`] — one instance per scope (e.g. per HTTP request)
//! - [`Lifetime::PerThread`] — one instance per OS thread per descriptor
//! - [`Lifetime::Transient`] — a fresh instance on every resolve

use std::fmt;

/// Defines the caching policy for a registered service.
///
/// # Examples
/// ```
/// use wirebox_core::lifetime::Lifetime;
///
/// assert!(Lifetime::Singleton.is_cached());
/// assert!(!Lifetime::Transient.is_cached());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// One instance shared across the entire container.
    ///
    /// Created on first resolve, lives until the owning [`Provider`](crate::provider::Provider)
    /// is disposed.
    ///
    /// # When to use
    /// - Database connection pools
    /// - Configuration objects
    /// - Shared caches
    Singleton,

    /// One instance per [`Scope`](crate::scope::Scope).
    ///
    /// Created on first resolve within a scope, disposed when the scope ends.
    ///
    /// # When to use
    /// - Per-request database transactions
    /// - User session state
    /// - Request-specific loggers
    Scoped,

    /// One instance per OS thread, for the lifetime of the owning descriptor.
    ///
    /// # When to use
    /// - Thread-affine resources that should not be shared across threads
    PerThread,

    /// A fresh instance created on every resolve call, never cached.
    ///
    /// # When to use
    /// - Lightweight stateless services
    /// - Command/query handlers
    /// - Objects with mutable state that shouldn't be shared
    Transient,
}

impl Lifetime {
    /// Returns `true` if this lifetime caches at least one instance, as
    /// opposed to [`Lifetime::Transient`] which never caches.
    #[inline]
    pub fn is_cached(&self) -> bool {
        !matches!(self, Lifetime::Transient)
    }

    /// Returns `true` if this lifetime caches exactly one instance for the
    /// whole container.
    #[inline]
    pub fn is_singleton(&self) -> bool {
        matches!(self, Lifetime::Singleton)
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::Singleton => write!(f, "Singleton"),
            Lifetime::Scoped => write!(f, "Scoped"),
            Lifetime::PerThread => write!(f, "PerThread"),
            Lifetime::Transient => write!(f, "Transient"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifetime_equality() {
        assert_eq!(Lifetime::Singleton, Lifetime::Singleton);
        assert_ne!(Lifetime::Singleton, Lifetime::Transient);
    }

    #[test]
    fn lifetime_is_cached() {
        assert!(Lifetime::Singleton.is_cached());
        assert!(Lifetime::Scoped.is_cached());
        assert!(Lifetime::PerThread.is_cached());
        assert!(!Lifetime::Transient.is_cached());
    }

    #[test]
    fn lifetime_display() {
        assert_eq!(format!("{}", Lifetime::Singleton), "Singleton");
        assert_eq!(format!("{}", Lifetime::Scoped), "Scoped");
        assert_eq!(format!("{}", Lifetime::PerThread), "PerThread");
        assert_eq!(format!("{}", Lifetime::Transient), "Transient");
    }
}
