use std::collections::HashSet;

use crate::dependency::Dependency;

/// In-flight dependencies of the current lock holder.
///
/// A dependency appears at most once: a second push of the same key is rejected,
/// which is how the container detects cycles.
#[derive(Debug, Default)]
pub struct ResolutionStack {
    stack: Vec<Dependency>,
    seen: HashSet<Dependency>,
}

impl ResolutionStack {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `dependency`, returning `false` and leaving the stack untouched if it's already in flight.
    pub fn push(&mut self, dependency: &Dependency) -> bool {
        if !self.seen.insert(dependency.clone()) {
            return false;
        }
        self.stack.push(dependency.clone());
        true
    }

    pub fn pop(&mut self) -> Option<Dependency> {
        let dependency = self.stack.pop()?;
        self.seen.remove(&dependency);
        Some(dependency)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, dependency: &Dependency) -> bool {
        self.seen.contains(dependency)
    }

    /// Innermost dependency in flight
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&Dependency> {
        self.stack.last()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Full offending path: everything in flight followed by the repeated dependency.
    #[must_use]
    pub fn path_with(&self, dependency: &Dependency) -> Vec<Dependency> {
        let mut path = Vec::with_capacity(self.stack.len() + 1);
        path.extend(self.stack.iter().cloned());
        path.push(dependency.clone());
        path
    }
}
