use super::{InstantiateErrorKind, InstantiatorErrorKind, ResolveErrorKind};
use crate::dependency::Dependency;

/// Failure of a provider that claimed a dependency.
///
/// A provider that claims a dependency but can't produce it never hands it over to the next provider.
#[derive(thiserror::Error, Debug)]
pub enum ProvideErrorKind {
    #[error(transparent)]
    Instantiator(#[from] InstantiatorErrorKind<ResolveErrorKind, InstantiateErrorKind>),
    #[error(transparent)]
    Instantiate(#[from] InstantiateErrorKind),
    #[error(transparent)]
    Resolve(Box<ResolveErrorKind>),
    #[error("Required dependency {dependency} is missing")]
    Missing { dependency: Dependency },
    #[error("Factory dependency {dependency} must be a singleton")]
    NonSingletonFactory { dependency: Dependency },
    #[error("Factory dependency {dependency} doesn't provide a factory")]
    NotFactory { dependency: Dependency },
}

impl From<ResolveErrorKind> for ProvideErrorKind {
    fn from(err: ResolveErrorKind) -> Self {
        Self::Resolve(Box::new(err))
    }
}

impl ProvideErrorKind {
    /// Wraps the failure once, keyed by the dependency whose provider failed.
    pub(crate) fn into_resolve_error(self, dependency: &Dependency) -> ResolveErrorKind {
        let err = match self {
            Self::Resolve(err) if err.is_definitive() => return *err,
            Self::Instantiator(InstantiatorErrorKind::Deps(err)) if err.is_definitive() => return err,
            Self::Instantiator(InstantiatorErrorKind::Factory(err)) => match err.into_definitive() {
                Ok(err) => return err,
                Err(err) => Self::Instantiator(InstantiatorErrorKind::Factory(err)),
            },
            Self::Instantiate(err) => match err.into_definitive() {
                Ok(err) => return err,
                Err(err) => Self::Instantiate(err),
            },
            err => err,
        };
        ResolveErrorKind::Instantiation {
            dependency: dependency.clone(),
            source: Box::new(err),
        }
    }
}
