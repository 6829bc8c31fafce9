use core::fmt::{self, Display, Formatter};

use crate::{container::Container, dependency::Dependency};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyDebugKind {
    Provided {
        singleton: bool,
        dependencies: Vec<DependencyDebug>,
    },
    /// Dependency already present higher in the same branch
    Cycle,
    NotFound,
}

/// Dependency tree as the providers describe it, built without instantiating anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyDebug {
    pub dependency: Dependency,
    pub label: String,
    pub kind: DependencyDebugKind,
}

impl DependencyDebug {
    fn write_indented(&self, f: &mut Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "{:indent$}", "", indent = depth * 2)?;
        match &self.kind {
            DependencyDebugKind::Provided { singleton, dependencies } => {
                writeln!(f, "{} [{}]", self.label, if *singleton { "singleton" } else { "transient" })?;
                for dependency in dependencies {
                    dependency.write_indented(f, depth + 1)?;
                }
                Ok(())
            }
            DependencyDebugKind::Cycle => writeln!(f, "{} <cycle>", self.dependency),
            DependencyDebugKind::NotFound => writeln!(f, "{} <not found>", self.dependency),
        }
    }
}

impl Display for DependencyDebug {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

impl Container {
    /// Describes how `dependency` would be resolved.
    #[must_use]
    pub fn debug(&self, dependency: &Dependency) -> DependencyDebug {
        debug_tree(self, dependency, &mut Vec::new())
    }
}

fn debug_tree(container: &Container, dependency: &Dependency, path: &mut Vec<Dependency>) -> DependencyDebug {
    if path.contains(dependency) {
        return DependencyDebug {
            dependency: dependency.clone(),
            label: dependency.to_string(),
            kind: DependencyDebugKind::Cycle,
        };
    }
    let Some(info) = container.debug_info(dependency) else {
        return DependencyDebug {
            dependency: dependency.clone(),
            label: dependency.to_string(),
            kind: DependencyDebugKind::NotFound,
        };
    };

    path.push(dependency.clone());
    let dependencies = info
        .dependencies
        .iter()
        .map(|child| debug_tree(container, child, path))
        .collect::<Vec<_>>();
    path.pop();

    let singleton = match &info.follows {
        Some(target) => dependencies.iter().any(|child| {
            child.dependency == *target && matches!(child.kind, DependencyDebugKind::Provided { singleton: true, .. })
        }),
        None => info.singleton,
    };

    DependencyDebug {
        dependency: dependency.clone(),
        label: info.label,
        kind: DependencyDebugKind::Provided { singleton, dependencies },
    }
}
