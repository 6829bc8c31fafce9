use parking_lot::RwLock;
use std::{
    any::{type_name, Any},
    borrow::Cow,
    collections::HashMap,
    marker::PhantomData,
    sync::Arc,
};

use super::{has_variant, DebugInfo, Provider};
use crate::{
    container::Container,
    dependency::Dependency,
    errors::ProvideErrorKind,
    provided::{Flags, Provided},
};

/// Anything that knows how to produce its own value and scope.
pub trait Lazy: Send + Sync + 'static {
    fn provide(&self, container: &Container) -> Result<Provided, ProvideErrorKind>;

    fn debug_info(&self) -> DebugInfo {
        DebugInfo {
            label: format!("Lazy {}", type_name::<Self>()),
            singleton: false,
            dependencies: Vec::new(),
            follows: None,
        }
    }
}

/// Lazy computation calling a closure with the container.
pub struct LazyCall<F, T> {
    call: F,
    singleton: bool,
    label: Option<Cow<'static, str>>,
    _provides: PhantomData<fn() -> T>,
}

impl<F, T> LazyCall<F, T>
where
    F: Fn(&Container) -> Result<T, ProvideErrorKind> + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    #[inline]
    #[must_use]
    pub fn new(call: F) -> Self {
        Self {
            call,
            singleton: true,
            label: None,
            _provides: PhantomData,
        }
    }

    #[inline]
    #[must_use]
    pub fn singleton(self, singleton: bool) -> Self {
        Self { singleton, ..self }
    }

    #[inline]
    #[must_use]
    pub fn label(self, label: impl Into<Cow<'static, str>>) -> Self {
        Self {
            label: Some(label.into()),
            ..self
        }
    }
}

impl<F, T> Lazy for LazyCall<F, T>
where
    F: Fn(&Container) -> Result<T, ProvideErrorKind> + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    fn provide(&self, container: &Container) -> Result<Provided, ProvideErrorKind> {
        let value = (self.call)(container)?;
        Ok(Provided::new(Arc::new(value), Flags::from_singleton(self.singleton)))
    }

    fn debug_info(&self) -> DebugInfo {
        DebugInfo {
            label: match &self.label {
                Some(label) => label.to_string(),
                None => format!("Lazy {}", type_name::<T>()),
            },
            singleton: self.singleton,
            dependencies: Vec::new(),
            follows: None,
        }
    }
}

/// Pure value computed on first use. It's cached without being a singleton.
pub struct LazyConstant<F, T> {
    compute: F,
    _provides: PhantomData<fn() -> T>,
}

impl<F, T> LazyConstant<F, T>
where
    F: Fn() -> T + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    #[inline]
    #[must_use]
    pub fn new(compute: F) -> Self {
        Self {
            compute,
            _provides: PhantomData,
        }
    }
}

impl<F, T> Lazy for LazyConstant<F, T>
where
    F: Fn() -> T + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    fn provide(&self, _container: &Container) -> Result<Provided, ProvideErrorKind> {
        Ok(Provided::new(Arc::new((self.compute)()), Flags::cacheable()))
    }

    fn debug_info(&self) -> DebugInfo {
        DebugInfo {
            label: format!("Constant {}", type_name::<T>()),
            singleton: false,
            dependencies: Vec::new(),
            follows: None,
        }
    }
}

/// Thin front dispatching to registered [`Lazy`] computations.
#[derive(Default)]
pub struct LazyProvider {
    lazies: RwLock<HashMap<Dependency, Arc<dyn Lazy>>>,
}

impl LazyProvider {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn add(&self, dependency: Dependency, lazy: Arc<dyn Lazy>) {
        self.lazies.write().insert(dependency, lazy);
    }

    fn get(&self, dependency: &Dependency) -> Option<Arc<dyn Lazy>> {
        self.lazies.read().get(dependency).cloned()
    }
}

impl Provider for LazyProvider {
    fn exists(&self, dependency: &Dependency) -> bool {
        self.lazies.read().contains_key(dependency)
    }

    fn exists_variant(&self, base: &Dependency) -> bool {
        has_variant(&self.lazies.read(), base)
    }

    fn provide(&self, dependency: &Dependency, container: &Container) -> Result<Option<Provided>, ProvideErrorKind> {
        match self.get(dependency) {
            Some(lazy) => lazy.provide(container).map(Some),
            None => Ok(None),
        }
    }

    fn clone_provider(&self, _keep_cache: bool) -> Box<dyn Provider> {
        Box::new(Self {
            lazies: RwLock::new(self.lazies.read().clone()),
        })
    }

    fn debug(&self, dependency: &Dependency) -> Option<DebugInfo> {
        self.get(dependency).map(|lazy| lazy.debug_info())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
