use parking_lot::{Mutex, RwLock};
use std::{
    any::{type_name, TypeId},
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
};
use tracing::{debug, error, info_span};

use crate::{
    any::Instance,
    cache::{Cache, CacheEntry},
    config::Config,
    dependency::Dependency,
    dependency_resolver::DependencyResolver,
    errors::{ProvideErrorKind, RegisterErrorKind, ResolveErrorKind},
    instantiator::{boxed_instantiator, Factory, Instantiator},
    lock::ReentrantLock,
    provided::{Flags, Provided},
    provider::{
        DebugInfo, FactoryProvider, FactoryRecipe, IndirectProvider, Lazy, LazyProvider, Link, Provider, Service, ServiceProvider,
    },
    stack::ResolutionStack,
};

/// Thread-safe resolution container.
///
/// Cloning is cheap and yields a handle to the same container. Use [`Container::snapshot`] for an isolated copy.
#[derive(Clone)]
pub struct Container {
    pub(crate) inner: Arc<ContainerInner>,
}

impl Container {
    /// Creates container with the built-in providers, in the order they are asked:
    /// [`ServiceProvider`], [`FactoryProvider`], [`IndirectProvider`], [`LazyProvider`].
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_providers(vec![
            Box::new(ServiceProvider::new()),
            Box::new(FactoryProvider::new()),
            Box::new(IndirectProvider::new()),
            Box::new(LazyProvider::new()),
        ])
    }

    /// Creates container without any provider
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::with_providers(Vec::new())
    }

    #[must_use]
    pub fn with_providers(providers: Vec<Box<dyn Provider>>) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                lock: ReentrantLock::new(),
                providers: RwLock::new(providers.into_iter().map(Arc::from).collect()),
                overrides: RwLock::new(HashMap::new()),
                cache: RwLock::new(Cache::new()),
                stack: Mutex::new(ResolutionStack::new()),
                frozen: AtomicBool::new(false),
                clock: AtomicU64::new(0),
            }),
        }
    }

    /// Appends a provider, asked after every provider already registered.
    ///
    /// # Errors
    /// - Returns [`RegisterErrorKind::Frozen`] if the container is frozen
    /// - Returns [`RegisterErrorKind::DuplicateProvider`] if a provider of the same type is already registered
    pub fn register_provider(&self, provider: impl Provider) -> Result<(), RegisterErrorKind> {
        let span = info_span!("register_provider", provider = provider.name());
        let _guard = span.enter();

        let _lock = self.inner.lock.lock();
        self.ensure_not_frozen()?;

        let mut providers = self.inner.providers.write();
        if providers
            .iter()
            .any(|registered| registered.as_any().type_id() == provider.as_any().type_id())
        {
            let err = RegisterErrorKind::DuplicateProvider { provider: provider.name() };
            error!("{}", err);
            return Err(err);
        }
        providers.push(Arc::new(provider));
        drop(providers);

        self.tick();
        debug!("Provider registered");
        Ok(())
    }

    /// Registers a service keyed by the type it provides.
    ///
    /// # Errors
    /// See [`Container::register_service_as`]
    pub fn register_service<T, Inst, Deps>(&self, instantiator: Inst, config: Config) -> Result<(), RegisterErrorKind>
    where
        T: Send + Sync + 'static,
        Inst: Instantiator<Deps, Provides = T> + Send + Sync,
        Deps: DependencyResolver,
    {
        self.register_service_as(Dependency::of::<T>(), instantiator, config)
    }

    /// Registers a service under `dependency`.
    /// The service also answers parameterized variants of `dependency`.
    ///
    /// # Errors
    /// - Returns [`RegisterErrorKind::Frozen`] if the container is frozen
    /// - Returns [`RegisterErrorKind::AlreadyRegistered`] if some provider already claims `dependency`
    /// - Returns [`RegisterErrorKind::NoProvider`] if the container has no [`ServiceProvider`]
    pub fn register_service_as<Inst, Deps>(&self, dependency: Dependency, instantiator: Inst, config: Config) -> Result<(), RegisterErrorKind>
    where
        Inst: Instantiator<Deps> + Send + Sync,
        Deps: DependencyResolver,
    {
        self.register_with(dependency, |provider: &ServiceProvider, dependency| {
            provider.add(dependency, Service::new(instantiator, config));
        })
    }

    /// Registers a factory calling `instantiator` to build `dependency`.
    ///
    /// # Errors
    /// Same as [`Container::register_service_as`], with [`FactoryProvider`] as the required provider
    pub fn register_factory<Inst, Deps>(&self, dependency: Dependency, instantiator: Inst, config: Config) -> Result<(), RegisterErrorKind>
    where
        Inst: Instantiator<Deps> + Send + Sync,
        Deps: DependencyResolver,
    {
        self.register_with(dependency, |provider: &FactoryProvider, dependency| {
            let recipe = FactoryRecipe::Instantiator {
                dependencies: Inst::dependencies(),
                instantiator: boxed_instantiator(instantiator),
            };
            provider.add(dependency, recipe, config.flags());
        })
    }

    /// Registers a factory whose producer is the [`Factory`] provided by `factory`.
    /// The factory dependency must be a singleton, it's resolved once and then reused.
    ///
    /// # Errors
    /// Same as [`Container::register_factory`]
    pub fn register_factory_from(&self, dependency: Dependency, factory: Dependency, config: Config) -> Result<(), RegisterErrorKind> {
        self.register_with(dependency, |provider: &FactoryProvider, dependency| {
            let recipe = FactoryRecipe::Dependency {
                factory,
                memo: Mutex::new(None),
            };
            provider.add(dependency, recipe, config.flags());
        })
    }

    /// Registers `dependency` as an alias of `target`.
    ///
    /// # Errors
    /// Same as [`Container::register_service_as`], with [`IndirectProvider`] as the required provider
    pub fn register_indirect(&self, dependency: Dependency, target: Dependency) -> Result<(), RegisterErrorKind> {
        self.register_with(dependency, |provider: &IndirectProvider, dependency| {
            provider.add(dependency, Link::Static(target));
        })
    }

    /// Registers `dependency` as an alias of the dependency returned by `linker`.
    ///
    /// A `permanent` link calls `linker` only until the first successful resolution.
    /// Otherwise `linker` is called on every resolution and the result is never cached.
    ///
    /// # Errors
    /// Same as [`Container::register_indirect`]
    pub fn register_linker<L>(&self, dependency: Dependency, linker: L, permanent: bool) -> Result<(), RegisterErrorKind>
    where
        L: Fn() -> Dependency + Send + Sync + 'static,
    {
        self.register_with(dependency, |provider: &IndirectProvider, dependency| {
            provider.add(dependency, Link::dynamic(Arc::new(linker), permanent));
        })
    }

    /// # Errors
    /// Same as [`Container::register_service_as`], with [`LazyProvider`] as the required provider
    pub fn register_lazy(&self, dependency: Dependency, lazy: impl Lazy) -> Result<(), RegisterErrorKind> {
        self.register_with(dependency, |provider: &LazyProvider, dependency| {
            provider.add(dependency, Arc::new(lazy));
        })
    }

    /// Rejects any further registration. Registered dependencies are still resolved.
    pub fn freeze(&self) {
        let _lock = self.inner.lock.lock();
        self.inner.frozen.store(true, Ordering::SeqCst);
        self.tick();
        debug!("Container frozen");
    }

    #[inline]
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.inner.frozen.load(Ordering::SeqCst)
    }

    /// Checks whether some provider claims the dependency, without instantiating anything.
    #[must_use]
    pub fn contains(&self, dependency: &Dependency) -> bool {
        self.inner.overrides.read().contains_key(dependency)
            || self.inner.providers.read().iter().any(|provider| provider.exists(dependency))
    }

    /// Resolves a dependency, `None` if no provider claims it.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::Cycle`] if the dependency is already being resolved in the current resolution chain
    /// - Returns [`ResolveErrorKind::Instantiation`] if the provider claiming the dependency failed
    #[inline]
    pub fn resolve(&self, dependency: &Dependency) -> Result<Option<Instance>, ResolveErrorKind> {
        self.provide(dependency).map(|provided| provided.map(|Provided { value, .. }| value))
    }

    /// Resolves a required dependency.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::NotFound`] if no provider claims the dependency
    /// - See [`Container::resolve`] for the other errors
    pub fn get(&self, dependency: &Dependency) -> Result<Instance, ResolveErrorKind> {
        match self.resolve(dependency)? {
            Some(value) => Ok(value),
            None => {
                let err = ResolveErrorKind::NotFound {
                    dependency: dependency.clone(),
                };
                error!("{}", err);
                Err(err)
            }
        }
    }

    /// Resolves a required dependency and downcasts it.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::IncorrectType`] if the resolved value isn't a `T`
    /// - See [`Container::get`] for the other errors
    pub fn get_as<T: Send + Sync + 'static>(&self, dependency: &Dependency) -> Result<Arc<T>, ResolveErrorKind> {
        self.get(dependency)?.downcast::<T>().map_err(|_| {
            let err = ResolveErrorKind::IncorrectType {
                dependency: dependency.clone(),
                expected: type_name::<T>(),
            };
            error!("{}", err);
            err
        })
    }

    /// Resolves the dependency keyed by the type `T`.
    ///
    /// # Errors
    /// See [`Container::get_as`]
    #[inline]
    pub fn get_type<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveErrorKind> {
        self.get_as(&Dependency::of::<T>())
    }

    /// Isolated copy of the container, frozen from the start.
    ///
    /// Every provider is cloned with `keep_cache`.
    /// With `keep_cache` the cached instances stay visible in the copy,
    /// except the overridden ones and those built from them. Otherwise the copy rebuilds everything.
    /// Active overrides aren't carried over.
    #[must_use]
    pub fn snapshot(&self, keep_cache: bool) -> Container {
        let _lock = self.inner.lock.lock();

        let providers = self
            .inner
            .providers
            .read()
            .iter()
            .map(|provider| Arc::from(provider.clone_provider(keep_cache)))
            .collect();
        let cache = if keep_cache {
            let cache = self.inner.cache.read();
            let overridden = self
                .inner
                .overrides
                .read()
                .keys()
                .flat_map(|dependency| cache.dependents_of(dependency))
                .collect::<HashSet<_>>();
            cache.snapshot_without(&overridden)
        } else {
            Cache::new()
        };

        debug!(keep_cache, cached = cache.len(), "Snapshot created");

        Container {
            inner: Arc::new(ContainerInner {
                lock: ReentrantLock::new(),
                providers: RwLock::new(providers),
                overrides: RwLock::new(HashMap::new()),
                cache: RwLock::new(cache),
                stack: Mutex::new(ResolutionStack::new()),
                frozen: AtomicBool::new(true),
                clock: AtomicU64::new(self.clock() + 1),
            }),
        }
    }

    /// Makes `dependency` resolve to `value` until the returned guard is dropped.
    /// Overrides are accepted by frozen containers.
    pub fn override_singleton<T: Send + Sync + 'static>(&self, dependency: Dependency, value: T) -> OverrideGuard {
        self.start_override(dependency, OverrideRecipe::Singleton(Arc::new(value)))
    }

    /// Makes `dependency` resolve through `factory` until the returned guard is dropped.
    pub fn override_factory(&self, dependency: Dependency, factory: Factory, singleton: bool) -> OverrideGuard {
        self.start_override(
            dependency,
            OverrideRecipe::Factory {
                factory: Arc::new(factory),
                flags: Flags::from_singleton(singleton),
            },
        )
    }

    /// Runs `f` with `dependency` overridden by `value`. The override is reverted even if `f` panics.
    pub fn with_override<T, R>(&self, dependency: Dependency, value: T, f: impl FnOnce() -> R) -> R
    where
        T: Send + Sync + 'static,
    {
        let _guard = self.override_singleton(dependency, value);
        f()
    }
}

impl Container {
    #[inline]
    fn clock(&self) -> u64 {
        self.inner.clock.load(Ordering::SeqCst)
    }

    #[inline]
    fn tick(&self) -> u64 {
        self.inner.clock.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn ensure_not_frozen(&self) -> Result<(), RegisterErrorKind> {
        if self.is_frozen() {
            let err = RegisterErrorKind::Frozen;
            error!("{}", err);
            return Err(err);
        }
        Ok(())
    }

    fn register_with<P: Provider>(&self, dependency: Dependency, add: impl FnOnce(&P, Dependency)) -> Result<(), RegisterErrorKind> {
        let span = info_span!("register", %dependency, provider = type_name::<P>());
        let _guard = span.enter();

        let _lock = self.inner.lock.lock();
        self.ensure_not_frozen()?;

        let providers = self.inner.providers.read().clone();
        // A service key also answers its parameterized variants, which must not be taken from another provider
        let claims_variants = TypeId::of::<P>() == TypeId::of::<ServiceProvider>();
        if providers
            .iter()
            .any(|provider| provider.exists(&dependency) || (claims_variants && provider.exists_variant(&dependency)))
        {
            let err = RegisterErrorKind::AlreadyRegistered { dependency };
            error!("{}", err);
            return Err(err);
        }
        let Some(provider) = providers.iter().find_map(|provider| provider.as_any().downcast_ref::<P>()) else {
            let err = RegisterErrorKind::NoProvider { provider: type_name::<P>() };
            error!("{}", err);
            return Err(err);
        };

        add(provider, dependency);
        self.tick();
        debug!("Registered");
        Ok(())
    }

    #[inline]
    fn cached(&self, dependency: &Dependency) -> Option<Provided> {
        self.inner.cache.read().get(dependency).map(CacheEntry::provided)
    }

    /// Resolves a dependency keeping its metadata, used by providers re-entering the container.
    pub(crate) fn provide(&self, dependency: &Dependency) -> Result<Option<Provided>, ResolveErrorKind> {
        if let Some(provided) = self.cached(dependency) {
            // Requested by a value being built on this thread
            if self.inner.lock.is_held_by_current_thread() {
                self.record_dependent(dependency);
            }
            return Ok(Some(provided));
        }

        let span = info_span!("resolve", %dependency);
        let _guard = span.enter();

        let _lock = self.inner.lock.lock();
        self.record_dependent(dependency);
        if let Some(provided) = self.cached(dependency) {
            debug!("Found in cache");
            return Ok(Some(provided));
        }
        debug!("Not found in cache");

        // Dropped before the lock, so the stack is popped inside the critical section
        let _frame = self.enter_frame(dependency)?;

        match self.provide_uncached(dependency) {
            Ok(Some(provided)) => {
                if self.inner.cache.write().insert(dependency.clone(), &provided, self.clock()) {
                    debug!("Cached");
                }
                Ok(Some(provided))
            }
            Ok(None) => {
                debug!("Not claimed by any provider");
                Ok(None)
            }
            Err(err) => {
                let err = err.into_resolve_error(dependency);
                error!("{}", err);
                Err(err)
            }
        }
    }

    fn provide_uncached(&self, dependency: &Dependency) -> Result<Option<Provided>, ProvideErrorKind> {
        let recipe = self.inner.overrides.read().get(dependency).cloned();
        if let Some(recipe) = recipe {
            debug!("Overridden");
            return recipe.provide().map(Some);
        }

        let providers = self.inner.providers.read().clone();
        for provider in &providers {
            if let Some(provided) = provider.provide(dependency, self)? {
                return Ok(Some(provided));
            }
        }
        Ok(None)
    }

    /// Links `dependency` to the value in flight that requested it, if any.
    fn record_dependent(&self, dependency: &Dependency) {
        debug_assert!(self.inner.lock.is_held_by_current_thread());

        let Some(dependent) = self.inner.stack.lock().last().cloned() else {
            return;
        };
        if !self.inner.cache.read().is_dependent(dependency, &dependent) {
            self.inner.cache.write().add_dependent(dependency.clone(), dependent);
        }
    }

    fn enter_frame(&self, dependency: &Dependency) -> Result<StackFrame<'_>, ResolveErrorKind> {
        debug_assert!(self.inner.lock.is_held_by_current_thread());

        let mut stack = self.inner.stack.lock();
        if !stack.push(dependency) {
            let err = ResolveErrorKind::Cycle {
                path: stack.path_with(dependency).into_boxed_slice(),
            };
            error!("{}", err);
            return Err(err);
        }
        Ok(StackFrame {
            stack: &self.inner.stack,
        })
    }

    pub(crate) fn debug_info(&self, dependency: &Dependency) -> Option<DebugInfo> {
        if let Some(recipe) = self.inner.overrides.read().get(dependency) {
            return Some(DebugInfo {
                label: format!("Override {dependency}"),
                singleton: recipe.flags().is_singleton(),
                dependencies: Vec::new(),
                follows: None,
            });
        }

        let providers = self.inner.providers.read().clone();
        providers.iter().find_map(|provider| provider.debug(dependency))
    }

    /// Evicts `dependency` and every cached value built from it.
    fn evict_dependents(&self, dependency: &Dependency) -> Vec<(Dependency, CacheEntry)> {
        let mut cache = self.inner.cache.write();
        let stale = cache.dependents_of(dependency);
        cache.evict(&stale)
    }

    fn start_override(&self, dependency: Dependency, recipe: OverrideRecipe) -> OverrideGuard {
        let _lock = self.inner.lock.lock();

        let clock = self.tick();
        let saved = self.evict_dependents(&dependency);
        let previous = self.inner.overrides.write().insert(dependency.clone(), recipe);

        debug!(%dependency, clock, saved = saved.len(), "Override started");

        OverrideGuard {
            container: self.clone(),
            dependency,
            previous,
            saved,
        }
    }

    fn revert_override(&self, guard: &mut OverrideGuard) {
        let _lock = self.inner.lock.lock();

        {
            let mut overrides = self.inner.overrides.write();
            match guard.previous.take() {
                Some(previous) => overrides.insert(guard.dependency.clone(), previous),
                None => overrides.remove(&guard.dependency),
            };
        }
        let evicted = self.evict_dependents(&guard.dependency).len();
        let mut cache = self.inner.cache.write();
        for (dependency, entry) in guard.saved.drain(..) {
            debug!(%dependency, cached_at = entry.clock, "Cached value restored");
            cache.restore(dependency, entry);
        }
        drop(cache);

        self.tick();
        debug!(dependency = %guard.dependency, evicted, "Override reverted");
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) struct ContainerInner {
    lock: ReentrantLock,
    /// Registration order is the order providers are asked in
    providers: RwLock<Vec<Arc<dyn Provider>>>,
    overrides: RwLock<HashMap<Dependency, OverrideRecipe>>,
    cache: RwLock<Cache>,
    /// Only mutated while `lock` is held
    stack: Mutex<ResolutionStack>,
    frozen: AtomicBool,
    /// Bumped on every mutation of the provider set
    clock: AtomicU64,
}

struct StackFrame<'a> {
    stack: &'a Mutex<ResolutionStack>,
}

impl Drop for StackFrame<'_> {
    fn drop(&mut self) {
        self.stack.lock().pop();
    }
}

#[derive(Clone)]
enum OverrideRecipe {
    Singleton(Instance),
    Factory { factory: Arc<Factory>, flags: Flags },
}

impl OverrideRecipe {
    fn flags(&self) -> Flags {
        match self {
            Self::Singleton(_) => Flags::singleton(),
            Self::Factory { flags, .. } => *flags,
        }
    }

    fn provide(&self) -> Result<Provided, ProvideErrorKind> {
        match self {
            Self::Singleton(value) => Ok(Provided::new(value.clone(), Flags::singleton())),
            Self::Factory { factory, flags } => Ok(Provided::new(factory.call()?, *flags)),
        }
    }
}

/// Reverts an override exactly once, when dropped.
///
/// The overridden value and everything built from it are evicted,
/// then the values they replaced in the cache are restored.
#[must_use = "the override is reverted as soon as the guard is dropped"]
pub struct OverrideGuard {
    container: Container,
    dependency: Dependency,
    previous: Option<OverrideRecipe>,
    saved: Vec<(Dependency, CacheEntry)>,
}

impl Drop for OverrideGuard {
    fn drop(&mut self) {
        let container = self.container.clone();
        container.revert_override(self);
    }
}
