//! Dependency graph and cycle detection.
//!
//! Each [`Container`](crate::container::Container) owns one [`DependencyGraph`],
//! accumulating `service -> [dependency, ...]` edges as the factory builder
//! walks each `ImplementationType` registration's constructor. Cycle
//! detection runs at factory-build time (registration), not at resolve time:
//! the registration that would create a cycle is the failure site.
//!
//! The teacher this crate is grounded on keeps one such graph per process and
//! validates the whole graph up front; scoping the graph per-container avoids
//! false positives across independently-built containers (the multi-container
//! re-architecture the specification itself calls out).

use std::collections::{HashMap, HashSet};

use dashmap::DashMap;
use tracing::trace;

use crate::key::DependencyKey;

/// Process-local (per-[`Container`](crate::container::Container)) directed
/// graph of service-type dependencies, used to detect cycles before a
/// factory is ever invoked.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    adjacency: DashMap<DependencyKey, Vec<DependencyKey>>,
}

impl DependencyGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Unions `deps` into `service`'s adjacency list. Existing edges are
    /// preserved; duplicates are not re-added.
    pub fn add_dependency(&self, service: DependencyKey, deps: Vec<DependencyKey>) {
        trace!(service = %service, count = deps.len(), "recording dependency edges");
        let mut entry = self.adjacency.entry(service).or_default();
        for dep in deps {
            if !entry.contains(&dep) {
                entry.push(dep);
            }
        }
    }

    /// Takes an atomic snapshot of the adjacency map, then DFS's from
    /// `start` looking for a back-edge. Returns `(true, path)` if `start`
    /// can reach itself, where `path` is the cycle in discovery order with
    /// the repeated node appended. Purely functional over the snapshot —
    /// safe to call from many threads concurrently.
    pub fn has_cycle(&self, start: &DependencyKey) -> (bool, Vec<DependencyKey>) {
        let snapshot: HashMap<DependencyKey, Vec<DependencyKey>> = self
            .adjacency
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        let mut visited = HashSet::new();
        let mut on_stack = HashSet::new();
        let mut path = Vec::new();

        if Self::dfs(&snapshot, start, &mut visited, &mut on_stack, &mut path) {
            (true, path)
        } else {
            (false, Vec::new())
        }
    }

    fn dfs(
        snapshot: &HashMap<DependencyKey, Vec<DependencyKey>>,
        node: &DependencyKey,
        visited: &mut HashSet<DependencyKey>,
        on_stack: &mut HashSet<DependencyKey>,
        path: &mut Vec<DependencyKey>,
    ) -> bool {
        if on_stack.contains(node) {
            path.push(node.clone());
            return true;
        }
        if visited.contains(node) {
            return false;
        }

        visited.insert(node.clone());
        on_stack.insert(node.clone());
        path.push(node.clone());

        if let Some(neighbours) = snapshot.get(node) {
            for next in neighbours {
                if Self::dfs(snapshot, next, visited, on_stack, path) {
                    return true;
                }
            }
        }

        path.pop();
        on_stack.remove(node);
        false
    }
}
