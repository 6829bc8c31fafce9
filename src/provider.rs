mod factory;
mod indirect;
mod lazy;
mod service;

pub use factory::FactoryProvider;
pub use indirect::IndirectProvider;
pub use lazy::{Lazy, LazyCall, LazyConstant, LazyProvider};
pub use service::ServiceProvider;

pub(crate) use factory::FactoryRecipe;
pub(crate) use indirect::Link;
pub(crate) use service::Service;

use std::{
    any::{type_name, Any},
    collections::HashMap,
};

use crate::{container::Container, dependency::Dependency, errors::ProvideErrorKind, provided::Provided};

/// Description of a registration, produced without instantiating anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugInfo {
    pub label: String,
    pub singleton: bool,
    pub dependencies: Vec<Dependency>,
    /// Set by aliases: the registration is a singleton exactly when this dependency is
    pub follows: Option<Dependency>,
}

/// A resolution strategy owning a part of the key space.
///
/// The container asks providers in registration order, the first one returning `Ok(Some(_))` wins.
/// `Ok(None)` means the provider doesn't claim the dependency, while an error means it claims it but failed,
/// so the error is never turned into "try the next provider".
///
/// Providers are expected not to claim overlapping key spaces. Nothing enforces it besides registration
/// through [`Container`], which refuses a dependency any provider already claims.
///
/// Implementations must not hold their own locks while calling back into the container:
/// a producer may request other dependencies, which re-enters resolution on the same thread.
pub trait Provider: Any + Send + Sync {
    fn exists(&self, dependency: &Dependency) -> bool;

    /// Whether some parameterized variant of `base` is claimed.
    /// Asked before registering a key that would also answer its variants.
    #[inline]
    fn exists_variant(&self, _base: &Dependency) -> bool {
        false
    }

    fn provide(&self, dependency: &Dependency, container: &Container) -> Result<Option<Provided>, ProvideErrorKind>;

    /// Copy for an isolated container.
    /// Without `keep_cache`, any memoized producer state is dropped so the copy re-derives it.
    fn clone_provider(&self, keep_cache: bool) -> Box<dyn Provider>;

    #[inline]
    fn debug(&self, _dependency: &Dependency) -> Option<DebugInfo> {
        None
    }

    #[inline]
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }

    fn as_any(&self) -> &dyn Any;
}

pub(crate) fn has_variant<V>(registrations: &HashMap<Dependency, V>, base: &Dependency) -> bool {
    registrations
        .keys()
        .any(|dependency| dependency.parameters().is_some() && dependency.base() == base)
}
