use std::collections::{HashMap, HashSet};

use crate::{
    any::Instance,
    dependency::Dependency,
    provided::{Flags, Provided},
};

#[derive(Clone)]
pub(crate) struct CacheEntry {
    pub(crate) value: Instance,
    pub(crate) flags: Flags,
    /// Container clock at the moment the value was cached
    pub(crate) clock: u64,
}

impl CacheEntry {
    #[inline]
    #[must_use]
    pub(crate) fn provided(&self) -> Provided {
        Provided::new(self.value.clone(), self.flags)
    }
}

/// Resolved values plus the graph of which dependency was requested while building which.
///
/// The graph outlives evictions, so a value rebuilt later is still known to depend on the same keys.
#[derive(Clone, Default)]
pub(crate) struct Cache {
    map: HashMap<Dependency, CacheEntry>,
    /// Dependency to the dependencies that requested it while being built
    dependents: HashMap<Dependency, HashSet<Dependency>>,
}

impl Cache {
    #[inline]
    #[must_use]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub(crate) fn get(&self, dependency: &Dependency) -> Option<&CacheEntry> {
        self.map.get(dependency)
    }

    /// Stores a cacheable result, anything else is ignored.
    #[inline]
    pub(crate) fn insert(&mut self, dependency: Dependency, provided: &Provided, clock: u64) -> bool {
        if !provided.flags.is_cacheable() {
            return false;
        }
        self.map.insert(
            dependency,
            CacheEntry {
                value: provided.value.clone(),
                flags: provided.flags,
                clock,
            },
        );
        true
    }

    #[inline]
    pub(crate) fn restore(&mut self, dependency: Dependency, entry: CacheEntry) {
        self.map.insert(dependency, entry);
    }

    #[inline]
    #[must_use]
    pub(crate) fn is_dependent(&self, dependency: &Dependency, dependent: &Dependency) -> bool {
        self.dependents
            .get(dependency)
            .is_some_and(|dependents| dependents.contains(dependent))
    }

    /// Records that `dependent` requested `dependency` while being built.
    #[inline]
    pub(crate) fn add_dependent(&mut self, dependency: Dependency, dependent: Dependency) {
        self.dependents.entry(dependency).or_default().insert(dependent);
    }

    /// `root` and everything built from it, directly or not.
    #[must_use]
    pub(crate) fn dependents_of(&self, root: &Dependency) -> HashSet<Dependency> {
        let mut reached = HashSet::from([root.clone()]);
        let mut pending = vec![root];
        while let Some(dependency) = pending.pop() {
            for dependent in self.dependents.get(dependency).into_iter().flatten() {
                if reached.insert(dependent.clone()) {
                    pending.push(dependent);
                }
            }
        }
        reached
    }

    /// Removes the entries of `dependencies`, returning them.
    pub(crate) fn evict(&mut self, dependencies: &HashSet<Dependency>) -> Vec<(Dependency, CacheEntry)> {
        dependencies
            .iter()
            .filter_map(|dependency| self.map.remove_entry(dependency))
            .collect()
    }

    /// Copy without the entries of `excluded`. The dependents graph is copied whole.
    #[must_use]
    pub(crate) fn snapshot_without(&self, excluded: &HashSet<Dependency>) -> Self {
        Self {
            map: self
                .map
                .iter()
                .filter(|(dependency, _)| !excluded.contains(*dependency))
                .map(|(dependency, entry)| (dependency.clone(), entry.clone()))
                .collect(),
            dependents: self.dependents.clone(),
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }
}
