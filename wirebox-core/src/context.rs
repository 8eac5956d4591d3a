//! Per-resolution re-entry detection.
//!
//! [`ResolutionContext`] lives on the call chain of a single top-level
//! `resolve` and is never shared across threads: each call to
//! [`Provider::resolve`](crate::provider::Provider::resolve) /
//! [`Scope::resolve`](crate::scope::Scope::resolve) creates a fresh one and
//! threads it through every nested `resolver.resolve(Param)` call a factory
//! makes, so that a factory which re-enters its own construction is caught
//! as a cycle rather than recursing forever.

use crate::key::DependencyKey;
use std::collections::HashSet;

/// Tracks which service types are currently under construction on this
/// resolution chain.
#[derive(Debug, Default)]
pub struct ResolutionContext {
    stack: Vec<DependencyKey>,
    active: HashSet<DependencyKey>,
}

impl ResolutionContext {
    /// Creates an empty context for a new top-level resolve.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to enter construction of `key`. Returns `Ok(())` and pushes
    /// `key` onto the stack if it is not already active; returns the
    /// rendered cycle path otherwise.
    pub fn try_enter(&mut self, key: DependencyKey) -> Result<(), Vec<DependencyKey>> {
        if self.active.contains(&key) {
            let mut path = self.stack.clone();
            path.push(key);
            return Err(path);
        }

        self.active.insert(key.clone());
        self.stack.push(key);
        Ok(())
    }

    /// Exits construction of the most recently entered type.
    pub fn exit(&mut self) {
        if let Some(key) = self.stack.pop() {
            self.active.remove(&key);
        }
    }

    /// Current construction depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// The service type currently under construction, if any — the top of
    /// the stack. Used to decide which owner a `register_disposable` call
    /// made from inside a factory should be attributed to.
    pub fn current(&self) -> Option<&DependencyKey> {
        self.stack.last()
    }
}
