//! Implicit dependency inference between registry resources.
//!
//! Every key or value depends on the nearest declared ancestor key. For a
//! value the search starts at its containing key; for a key it starts at the
//! parent. The first level with any declared key wins, and every declared key
//! at that level gets its own edge. Resolution is a pure function of the
//! resource set.

use crate::path::KeyPath;
use crate::resource::{Resource, ResourceId, ResourceKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// `dependent` must be applied after `dependency`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub dependent: ResourceId,
    pub dependency: ResourceId,
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.dependent, self.dependency)
    }
}

/// Receives diagnostics while edges are resolved.
///
/// All methods default to doing nothing.
pub trait ResolveObserver {
    /// Called for every ancestor level scanned, with the keys found there.
    fn on_level(&mut self, _resource: &ResourceId, _ancestor: &KeyPath, _matches: &[&ResourceId]) {
    }

    /// Called when no ancestor of a resource is declared.
    fn on_unresolved(&mut self, _resource: &ResourceId) {}
}

/// Observer that ignores everything.
pub struct NoObserver;

impl ResolveObserver for NoObserver {}

/// Resolve implicit edges for a complete resource set.
pub fn resolve(resources: &[Resource]) -> Vec<Edge> {
    resolve_with(resources, &mut NoObserver)
}

/// Resolve implicit edges, reporting each step to `observer`.
pub fn resolve_with<O>(resources: &[Resource], observer: &mut O) -> Vec<Edge>
where
    O: ResolveObserver + ?Sized,
{
    // Declaration order is kept within each bucket so edge order is stable.
    let mut keys: HashMap<&KeyPath, Vec<&ResourceId>> = HashMap::new();
    for resource in resources.iter().filter(|r| r.kind() == ResourceKind::Key) {
        keys.entry(resource.key_path()).or_default().push(resource.id());
    }

    let mut edges = Vec::new();
    for resource in resources {
        let mut resolved = false;
        for ancestor in search_levels(resource) {
            let matches = keys.get(&ancestor).map(Vec::as_slice).unwrap_or_default();
            observer.on_level(resource.id(), &ancestor, matches);
            if !matches.is_empty() {
                edges.extend(matches.iter().map(|dependency| Edge {
                    dependent: resource.id().clone(),
                    dependency: (*dependency).clone(),
                }));
                resolved = true;
                break;
            }
        }
        if !resolved {
            observer.on_unresolved(resource.id());
        }
    }
    edges
}

/// Key paths to search, nearest first.
fn search_levels(resource: &Resource) -> impl Iterator<Item = KeyPath> + '_ {
    let key = resource.key_path();
    let own = (resource.kind() == ResourceKind::Value).then(|| key.clone());
    own.into_iter().chain(key.ascend())
}
