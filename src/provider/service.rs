use parking_lot::RwLock;
use std::{
    any::{type_name, Any},
    collections::HashMap,
    sync::Arc,
};

use super::{DebugInfo, Provider};
use crate::{
    config::Config,
    container::Container,
    dependency::Dependency,
    dependency_resolver::{DependencyResolver, Request},
    errors::ProvideErrorKind,
    instantiator::{boxed_instantiator, BoxedInstantiator, Instantiator},
    provided::{Flags, Provided},
};

pub(crate) struct Service {
    pub(crate) instantiator: BoxedInstantiator,
    pub(crate) flags: Flags,
    pub(crate) dependencies: Vec<Dependency>,
    pub(crate) provides: &'static str,
}

impl Service {
    #[must_use]
    pub(crate) fn new<Inst, Deps>(instantiator: Inst, config: Config) -> Self
    where
        Inst: Instantiator<Deps> + Send + Sync,
        Deps: DependencyResolver,
    {
        Self {
            dependencies: Inst::dependencies(),
            provides: type_name::<Inst::Provides>(),
            instantiator: boxed_instantiator(instantiator),
            flags: config.flags(),
        }
    }
}

/// Builds a service by calling its constructor.
///
/// A registered key also claims every parameterized variant of itself,
/// the constructor reads the parameters through [`crate::Params`].
/// Each parameter set is cached separately.
#[derive(Default)]
pub struct ServiceProvider {
    services: RwLock<HashMap<Dependency, Arc<Service>>>,
}

impl ServiceProvider {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn add(&self, dependency: Dependency, service: Service) {
        self.services.write().insert(dependency, Arc::new(service));
    }

    fn get(&self, dependency: &Dependency) -> Option<Arc<Service>> {
        let services = self.services.read();
        services.get(dependency).or_else(|| services.get(dependency.base())).cloned()
    }
}

impl Provider for ServiceProvider {
    fn exists(&self, dependency: &Dependency) -> bool {
        let services = self.services.read();
        services.contains_key(dependency) || services.contains_key(dependency.base())
    }

    fn provide(&self, dependency: &Dependency, container: &Container) -> Result<Option<Provided>, ProvideErrorKind> {
        let Some(service) = self.get(dependency) else {
            return Ok(None);
        };

        let value = (service.instantiator)(&Request { container, dependency })?;
        Ok(Some(Provided::new(value, service.flags)))
    }

    fn clone_provider(&self, _keep_cache: bool) -> Box<dyn Provider> {
        Box::new(Self {
            services: RwLock::new(self.services.read().clone()),
        })
    }

    fn debug(&self, dependency: &Dependency) -> Option<DebugInfo> {
        let service = self.get(dependency)?;
        Some(DebugInfo {
            label: format!("Service {}", service.provides),
            singleton: service.flags.is_singleton(),
            dependencies: service.dependencies.clone(),
            follows: None,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{Service, ServiceProvider};
    use crate::{inject::Params, Config, Container, Dependency, InstantiateErrorKind, Parameters, Provider as _};

    use std::sync::Arc;

    struct Database(String);

    fn database_service(config: Config) -> Service {
        Service::new(
            |Params(parameters): Params| {
                let url = parameters.get("url").and_then(|val| val.as_str()).unwrap_or("memory://").to_owned();
                Ok::<_, InstantiateErrorKind>(Database(url))
            },
            config,
        )
    }

    #[test]
    fn test_claims_parameterized_variants() {
        let provider = ServiceProvider::new();
        provider.add(Dependency::of::<Database>(), database_service(Config::singleton()));

        let parameterized = Dependency::of::<Database>().with_parameters(Parameters::new().with("url", "sqlite://"));
        assert!(provider.exists(&Dependency::of::<Database>()));
        assert!(provider.exists(&parameterized));
        assert!(!provider.exists(&Dependency::of::<String>()));

        let container = Container::new();
        let provided = provider.provide(&parameterized, &container).unwrap().unwrap();
        assert!(provided.flags.is_singleton());
        assert_eq!(provided.value.downcast::<Database>().unwrap().0, "sqlite://");

        let provided = provider.provide(&Dependency::of::<Database>(), &container).unwrap().unwrap();
        assert_eq!(provided.value.downcast::<Database>().unwrap().0, "memory://");

        assert!(provider.provide(&Dependency::of::<String>(), &container).unwrap().is_none());
    }

    #[test]
    fn test_debug_and_clone() {
        let provider = ServiceProvider::new();
        provider.add(Dependency::of::<Database>(), database_service(Config::transient()));

        let clone = provider.clone_provider(false);
        let info = clone.debug(&Dependency::of::<Database>()).unwrap();
        assert!(info.label.starts_with("Service ") && info.label.ends_with("Database"));
        assert!(!info.singleton);
        assert!(info.dependencies.is_empty());

        let value = clone
            .provide(&Dependency::of::<Database>(), &Container::new())
            .unwrap()
            .map(|provided| provided.value);
        assert!(value.is_some_and(|value| Arc::downcast::<Database>(value).is_ok()));
    }
}
