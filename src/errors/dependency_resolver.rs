use std::fmt::{self, Display, Formatter};

use super::ProvideErrorKind;
use crate::dependency::Dependency;

#[derive(thiserror::Error, Debug)]
pub enum ResolveErrorKind {
    #[error("Dependency {dependency} not found")]
    NotFound { dependency: Dependency },
    #[error("Cyclic dependency detected: {}", DisplayPath(path))]
    Cycle { path: Box<[Dependency]> },
    #[error("Failed to instantiate {dependency}")]
    Instantiation {
        dependency: Dependency,
        source: Box<ProvideErrorKind>,
    },
    #[error("Incorrect type provided for {dependency}, expected: {expected}")]
    IncorrectType { dependency: Dependency, expected: &'static str },
}

impl ResolveErrorKind {
    /// Cycles and already wrapped failures travel up the resolution chain unchanged.
    #[inline]
    #[must_use]
    pub fn is_definitive(&self) -> bool {
        matches!(self, Self::Cycle { .. } | Self::Instantiation { .. })
    }

    #[must_use]
    pub fn dependency(&self) -> Option<&Dependency> {
        match self {
            Self::NotFound { dependency } | Self::Instantiation { dependency, .. } | Self::IncorrectType { dependency, .. } => {
                Some(dependency)
            }
            Self::Cycle { .. } => None,
        }
    }
}

struct DisplayPath<'a>(&'a [Dependency]);

impl Display for DisplayPath<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (index, dependency) in self.0.iter().enumerate() {
            if index != 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{dependency}")?;
        }
        Ok(())
    }
}
