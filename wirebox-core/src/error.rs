//! Error types for WireBox container operations.
//!
//! One enum covers every failure mode the resolver engine can produce;
//! variants carry enough context (a rendered dependency chain, "did you
//! mean?" suggestions) to point at the fix without a debugger.

use crate::key::DependencyKey;
use std::fmt;

/// Main error type for all WireBox operations.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Requested dependency was never registered.
    #[error("{}", .0)]
    NotRegistered(NotRegisteredError),

    /// Circular dependency detected, either at factory-build time (the graph
    /// already contains a path back to the type being registered) or at
    /// resolve time (a factory re-entered its own construction).
    #[error("{}", .0)]
    CircularDependency(CircularDependencyError),

    /// No public constructor could be discovered for an implementation type.
    #[error("No constructor available for {0}")]
    NoConstructor(DependencyKey),

    /// A descriptor was registered with kind `ImplementationType` but carries
    /// no implementation.
    #[error("Descriptor for {0} is missing its implementation")]
    MissingImplementation(DependencyKey),

    /// `resolve` was called on a scope or provider that has already been
    /// disposed.
    #[error("{0} has already been disposed")]
    AlreadyDisposed(DisposedTarget),

    /// A user-supplied factory raised an error during construction. Nothing
    /// is cached for the failing descriptor.
    #[error("Failed to construct {key}: {source}")]
    FactoryFailure {
        key: DependencyKey,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// One or more disposals failed. Every disposer is still attempted; the
    /// failures are collected here rather than aborting the pass.
    #[error("{} disposal(s) failed during teardown", .errors.len())]
    DisposalAggregate { errors: Vec<DisposalError> },

    /// A `Scoped` dependency was resolved with no active scope, and the
    /// container was built with `strict_scoping(true)`.
    #[error("{0} is Scoped but no scope is active, and strict_scoping is enabled\n  Hint: resolve through a Scope, or drop strict_scoping")]
    ScopeRequired(DependencyKey),
}

/// What kind of owner was found already disposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisposedTarget {
    Scope,
    Provider,
}

impl fmt::Display for DisposedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisposedTarget::Scope => write!(f, "Scope"),
            DisposedTarget::Provider => write!(f, "Provider"),
        }
    }
}

/// A single disposer's failure, collected into [`WireError::DisposalAggregate`].
#[derive(Debug, thiserror::Error)]
#[error("disposing {key}: {source}")]
pub struct DisposalError {
    pub key: DependencyKey,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

/// Error when a dependency was not registered.
#[derive(Debug)]
pub struct NotRegisteredError {
    /// The dependency that was requested.
    pub requested: DependencyKey,
    /// What required this dependency, if resolution was nested.
    pub required_by: Option<DependencyKey>,
    /// Similar types that ARE registered, for "did you mean?" suggestions.
    pub suggestions: Vec<DependencyKey>,
}

impl fmt::Display for NotRegisteredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dependency not registered: {}", self.requested)?;

        if let Some(ref parent) = self.required_by {
            write!(f, "\n  Required by: {parent}")?;
        }

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        write!(
            f,
            "\n  Hint: did you forget to register {}?",
            self.requested.type_name()
        )
    }
}

/// Error when a circular dependency is detected.
#[derive(Debug)]
pub struct CircularDependencyError {
    /// The chain of dependencies that forms the cycle, oldest first, ending
    /// with the repeated node. Example: `[A, B, C, A]`.
    pub chain: Vec<DependencyKey>,
}

impl fmt::Display for CircularDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Circular dependency detected:\n  ")?;

        let chain_str: Vec<String> = self.chain.iter().map(|k| k.type_name().to_string()).collect();
        write!(f, "{}", chain_str.join(" → "))?;

        write!(
            f,
            "\n  Hint: break the cycle with a user factory that defers resolution"
        )
    }
}

/// Convenient Result type for WireBox operations.
pub type Result<T> = std::result::Result<T, WireError>;
