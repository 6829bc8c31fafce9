use parking_lot::{Mutex, RwLock};
use std::{any::Any, collections::HashMap, sync::Arc};
use tracing::debug;

use super::{has_variant, DebugInfo, Provider};
use crate::{
    container::Container,
    dependency::Dependency,
    dependency_resolver::Request,
    errors::ProvideErrorKind,
    instantiator::{BoxedInstantiator, Factory},
    provided::{Flags, Provided},
};

pub(crate) enum FactoryRecipe {
    Instantiator {
        instantiator: BoxedInstantiator,
        dependencies: Vec<Dependency>,
    },
    /// The producer is the value of another dependency, resolved once and then memoized
    Dependency {
        factory: Dependency,
        memo: Mutex<Option<Arc<Factory>>>,
    },
}

struct Entry {
    recipe: FactoryRecipe,
    flags: Flags,
}

/// Builds an output dependency by calling a producer.
///
/// The producer is either an instantiator given at registration,
/// or the [`Factory`] value of another dependency which must be a singleton.
#[derive(Default)]
pub struct FactoryProvider {
    factories: RwLock<HashMap<Dependency, Arc<Entry>>>,
}

impl FactoryProvider {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn add(&self, dependency: Dependency, recipe: FactoryRecipe, flags: Flags) {
        self.factories.write().insert(dependency, Arc::new(Entry { recipe, flags }));
    }

    fn get(&self, dependency: &Dependency) -> Option<Arc<Entry>> {
        self.factories.read().get(dependency).cloned()
    }

    fn resolve_factory(factory: &Dependency, memo: &Mutex<Option<Arc<Factory>>>, container: &Container) -> Result<Arc<Factory>, ProvideErrorKind> {
        let memoized = memo.lock().clone();
        if let Some(resolved) = memoized {
            return Ok(resolved);
        }

        let Some(provided) = container.provide(factory)? else {
            return Err(ProvideErrorKind::Missing {
                dependency: factory.clone(),
            });
        };
        if !provided.flags.is_singleton() {
            return Err(ProvideErrorKind::NonSingletonFactory {
                dependency: factory.clone(),
            });
        }
        let Ok(resolved) = provided.value.downcast::<Factory>() else {
            return Err(ProvideErrorKind::NotFactory {
                dependency: factory.clone(),
            });
        };

        *memo.lock() = Some(resolved.clone());
        debug!(%factory, "Factory memoized");

        Ok(resolved)
    }
}

impl Provider for FactoryProvider {
    fn exists(&self, dependency: &Dependency) -> bool {
        self.factories.read().contains_key(dependency)
    }

    fn exists_variant(&self, base: &Dependency) -> bool {
        has_variant(&self.factories.read(), base)
    }

    fn provide(&self, dependency: &Dependency, container: &Container) -> Result<Option<Provided>, ProvideErrorKind> {
        let Some(entry) = self.get(dependency) else {
            return Ok(None);
        };

        let value = match &entry.recipe {
            FactoryRecipe::Instantiator { instantiator, .. } => instantiator(&Request { container, dependency })?,
            FactoryRecipe::Dependency { factory, memo } => Self::resolve_factory(factory, memo, container)?.call()?,
        };
        Ok(Some(Provided::new(value, entry.flags)))
    }

    fn clone_provider(&self, keep_cache: bool) -> Box<dyn Provider> {
        let factories = self
            .factories
            .read()
            .iter()
            .map(|(dependency, entry)| {
                let entry = match &entry.recipe {
                    FactoryRecipe::Instantiator { .. } => entry.clone(),
                    FactoryRecipe::Dependency { factory, memo } => Arc::new(Entry {
                        recipe: FactoryRecipe::Dependency {
                            factory: factory.clone(),
                            memo: Mutex::new(if keep_cache { memo.lock().clone() } else { None }),
                        },
                        flags: entry.flags,
                    }),
                };
                (dependency.clone(), entry)
            })
            .collect();

        Box::new(Self {
            factories: RwLock::new(factories),
        })
    }

    fn debug(&self, dependency: &Dependency) -> Option<DebugInfo> {
        let entry = self.get(dependency)?;
        let (label, dependencies) = match &entry.recipe {
            FactoryRecipe::Instantiator { dependencies, .. } => (format!("Factory {dependency}"), dependencies.clone()),
            FactoryRecipe::Dependency { factory, .. } => (format!("Factory {dependency} from {factory}"), vec![factory.clone()]),
        };
        Some(DebugInfo {
            label,
            singleton: entry.flags.is_singleton(),
            dependencies,
            follows: None,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
