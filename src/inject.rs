use std::sync::Arc;

use crate::{
    dependency::{Dependency, Parameters},
    dependency_resolver::{DependencyResolver, Request},
    ResolveErrorKind,
};

/// Extracts the dependency keyed by the type `Dep`.
pub struct Inject<Dep>(pub Arc<Dep>);

impl<Dep: Send + Sync + 'static> DependencyResolver for Inject<Dep> {
    type Error = ResolveErrorKind;

    fn resolve(request: &Request<'_>) -> Result<Self, Self::Error> {
        request.container.get_type().map(Self)
    }

    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::of::<Dep>()]
    }
}

/// Extracts the parameters of the dependency being built, empty for a plain key.
pub struct Params(pub Parameters);

impl DependencyResolver for Params {
    type Error = ResolveErrorKind;

    fn resolve(request: &Request<'_>) -> Result<Self, Self::Error> {
        Ok(Self(request.dependency.parameters().cloned().unwrap_or_default()))
    }
}
