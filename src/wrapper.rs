use std::{borrow::Cow, collections::HashMap, sync::Arc};
use tracing::{debug, error};

use crate::{any::Instance, blueprint::Blueprint, container::Container, errors::ResolveErrorKind, world};

/// Argument value, `None` for an optional dependency that couldn't be resolved.
pub type Argument = Option<Instance>;
pub type Keywords = HashMap<&'static str, Argument>;

/// Arguments handed to a wrapped callable.
pub struct Arguments<'a> {
    receiver: Option<&'a Instance>,
    positional: &'a [Argument],
    /// Borrowed from the caller until the first injected argument
    keywords: Cow<'a, Keywords>,
}

impl<'a> Arguments<'a> {
    #[inline]
    #[must_use]
    pub fn receiver(&self) -> Option<&'a Instance> {
        self.receiver
    }

    #[inline]
    #[must_use]
    pub fn positional(&self) -> &'a [Argument] {
        self.positional
    }

    #[inline]
    #[must_use]
    pub fn keywords(&self) -> &Keywords {
        &self.keywords
    }

    #[inline]
    #[must_use]
    pub fn keyword(&self, name: &str) -> Option<&Argument> {
        self.keywords.get(name)
    }

    #[must_use]
    pub fn receiver_as<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        downcast(self.receiver?)
    }

    #[must_use]
    pub fn positional_as<T: Send + Sync + 'static>(&self, index: usize) -> Option<Arc<T>> {
        downcast(self.positional.get(index)?.as_ref()?)
    }

    /// Keyword argument downcast to `T`, `None` if absent, passed as `None` or of another type.
    #[must_use]
    pub fn keyword_as<T: Send + Sync + 'static>(&self, name: &str) -> Option<Arc<T>> {
        downcast(self.keyword(name)?.as_ref()?)
    }

    #[must_use]
    pub fn into_keywords(self) -> Keywords {
        self.keywords.into_owned()
    }
}

fn downcast<T: Send + Sync + 'static>(value: &Instance) -> Option<Arc<T>> {
    value.clone().downcast::<T>().ok()
}

type Callable<R> = dyn Fn(Arguments<'_>) -> R + Send + Sync;

struct InjectedFnInner<R> {
    blueprint: Blueprint,
    callable: Box<Callable<R>>,
}

/// Callable whose missing arguments are resolved from a container on every call.
///
/// Cloning and binding share the same blueprint and callable.
pub struct InjectedFn<R> {
    inner: Arc<InjectedFnInner<R>>,
}

impl<R> Clone for InjectedFn<R> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<R: 'static> InjectedFn<R> {
    pub fn new<F>(blueprint: Blueprint, callable: F) -> Self
    where
        F: Fn(Arguments<'_>) -> R + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(InjectedFnInner {
                blueprint,
                callable: Box::new(callable),
            }),
        }
    }

    #[inline]
    #[must_use]
    pub fn blueprint(&self) -> &Blueprint {
        &self.inner.blueprint
    }

    /// Calls with missing arguments resolved from the world's active container.
    ///
    /// # Errors
    /// See [`InjectedFn::call_in`]
    #[inline]
    pub fn call(&self, positional: &[Argument], keywords: &Keywords) -> Result<R, ResolveErrorKind> {
        self.call_in(&world::get(), positional, keywords)
    }

    /// Calls with missing arguments resolved from `container`.
    ///
    /// Parameters covered by `positional` or named in `keywords` are never resolved.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::NotFound`] if a required dependency isn't registered
    /// - Returns any other error of [`Container::resolve`]
    #[inline]
    pub fn call_in(&self, container: &Container, positional: &[Argument], keywords: &Keywords) -> Result<R, ResolveErrorKind> {
        self.invoke(container, None, positional, keywords)
    }

    /// Binds a receiver, which takes the first parameter of the blueprint.
    #[must_use]
    pub fn bind(&self, receiver: Instance) -> BoundInjectedFn<R> {
        BoundInjectedFn {
            function: self.clone(),
            receiver,
        }
    }

    fn invoke(&self, container: &Container, receiver: Option<&Instance>, positional: &[Argument], keywords: &Keywords) -> Result<R, ResolveErrorKind> {
        let supplied = positional.len() + usize::from(receiver.is_some());
        let keywords = fill_keywords(&self.inner.blueprint, container, supplied, keywords)?;

        Ok((self.inner.callable)(Arguments {
            receiver,
            positional,
            keywords,
        }))
    }
}

/// [`InjectedFn`] with its receiver already supplied.
pub struct BoundInjectedFn<R> {
    function: InjectedFn<R>,
    receiver: Instance,
}

impl<R> Clone for BoundInjectedFn<R> {
    fn clone(&self) -> Self {
        Self {
            function: self.function.clone(),
            receiver: self.receiver.clone(),
        }
    }
}

impl<R: 'static> BoundInjectedFn<R> {
    #[inline]
    #[must_use]
    pub fn receiver(&self) -> &Instance {
        &self.receiver
    }

    #[inline]
    #[must_use]
    pub fn function(&self) -> &InjectedFn<R> {
        &self.function
    }

    /// # Errors
    /// See [`InjectedFn::call_in`]
    #[inline]
    pub fn call(&self, positional: &[Argument], keywords: &Keywords) -> Result<R, ResolveErrorKind> {
        self.call_in(&world::get(), positional, keywords)
    }

    /// # Errors
    /// See [`InjectedFn::call_in`]
    #[inline]
    pub fn call_in(&self, container: &Container, positional: &[Argument], keywords: &Keywords) -> Result<R, ResolveErrorKind> {
        self.function.invoke(container, Some(&self.receiver), positional, keywords)
    }
}

fn fill_keywords<'a>(
    blueprint: &Blueprint,
    container: &Container,
    supplied: usize,
    keywords: &'a Keywords,
) -> Result<Cow<'a, Keywords>, ResolveErrorKind> {
    let mut filled = Cow::Borrowed(keywords);

    for parameter in blueprint.parameters().iter().skip(supplied) {
        let Some(dependency) = &parameter.dependency else {
            continue;
        };
        if keywords.contains_key(parameter.name) {
            continue;
        }

        match container.resolve(dependency)? {
            Some(value) => {
                filled.to_mut().insert(parameter.name, Some(value));
            }
            None if parameter.optional => {
                debug!(parameter = parameter.name, %dependency, "Optional dependency not found");
                filled.to_mut().insert(parameter.name, None);
            }
            None if parameter.required => {
                let err = ResolveErrorKind::NotFound {
                    dependency: dependency.clone(),
                };
                error!(parameter = parameter.name, "{}", err);
                return Err(err);
            }
            None => {}
        }
    }

    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::{Arguments, InjectedFn, Keywords};
    use crate::{world, Blueprint, Config, Container, Dependency, Instance, InstantiateErrorKind, ResolveErrorKind};

    use std::{
        borrow::Cow,
        sync::{
            atomic::{AtomicU8, Ordering},
            Arc,
        },
        thread,
    };
    use tracing_test::traced_test;

    struct Database(&'static str);
    struct Cache;
    struct Handler(u8);

    fn container() -> Container {
        let container = Container::new();
        container
            .register_service::<Database, _, _>(|| Ok::<_, InstantiateErrorKind>(Database("main")), Config::singleton())
            .unwrap();
        container
    }

    fn describe(arguments: Arguments<'_>) -> (usize, Option<&'static str>, bool) {
        (
            arguments.positional().len(),
            arguments.keyword_as::<Database>("database").map(|database| database.0),
            arguments.keywords().contains_key("cache"),
        )
    }

    #[test]
    #[traced_test]
    fn test_missing_argument_injected() {
        let container = container();
        let function = InjectedFn::new(
            Blueprint::builder().param("id").inject("database", Dependency::of::<Database>()).build(),
            describe,
        );

        let id: Instance = Arc::new(1u8);
        assert_eq!(
            function.call_in(&container, &[Some(id)], &Keywords::new()).unwrap(),
            (1, Some("main"), false)
        );
    }

    #[test]
    #[traced_test]
    fn test_supplied_keyword_not_resolved() {
        let call_count = Arc::new(AtomicU8::new(0));
        let container = Container::new();
        container
            .register_service::<Database, _, _>(
                {
                    let call_count = call_count.clone();
                    move || {
                        call_count.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, InstantiateErrorKind>(Database("main"))
                    }
                },
                Config::singleton(),
            )
            .unwrap();
        let function = InjectedFn::new(
            Blueprint::builder().param("id").inject("database", Dependency::of::<Database>()).build(),
            describe,
        );

        let mut keywords = Keywords::new();
        keywords.insert("database", Some(Arc::new(Database("explicit")) as Instance));

        assert_eq!(function.call_in(&container, &[None], &keywords).unwrap(), (1, Some("explicit"), false));
        assert_eq!(call_count.load(Ordering::SeqCst), 0);
    }

    #[test]
    #[traced_test]
    fn test_positional_covers_parameters() {
        let function = InjectedFn::new(Blueprint::builder().inject("database", Dependency::of::<Database>()).build(), describe);

        let database: Instance = Arc::new(Database("positional"));
        // Nothing is registered, but the only injected parameter is supplied positionally
        assert_eq!(
            function.call_in(&Container::new(), &[Some(database)], &Keywords::new()).unwrap(),
            (1, None, false)
        );
    }

    #[test]
    #[traced_test]
    fn test_required_optional_and_if_found() {
        let container = container();

        let required = InjectedFn::new(Blueprint::builder().inject("cache", Dependency::of::<Cache>()).build(), describe);
        assert!(matches!(
            required.call_in(&container, &[], &Keywords::new()),
            Err(ResolveErrorKind::NotFound { dependency }) if dependency == Dependency::of::<Cache>()
        ));

        let optional = InjectedFn::new(
            Blueprint::builder().inject_optional("cache", Dependency::of::<Cache>()).build(),
            |arguments: Arguments<'_>| arguments.keyword("cache").cloned(),
        );
        assert!(matches!(optional.call_in(&container, &[], &Keywords::new()).unwrap(), Some(None)));

        let if_found = InjectedFn::new(
            Blueprint::builder()
                .inject_if_found("cache", Dependency::of::<Cache>())
                .inject_if_found("database", Dependency::of::<Database>())
                .build(),
            describe,
        );
        assert_eq!(if_found.call_in(&container, &[], &Keywords::new()).unwrap(), (0, Some("main"), false));
    }

    #[test]
    fn test_keywords_borrowed_when_nothing_injected() {
        let container = container();
        let function = InjectedFn::new(
            Blueprint::builder().param("id").inject("database", Dependency::of::<Database>()).build(),
            |arguments: Arguments<'_>| matches!(arguments.keywords, Cow::Borrowed(_)),
        );

        let mut keywords = Keywords::new();
        keywords.insert("database", None);
        assert!(function.call_in(&container, &[], &keywords).unwrap());
        assert!(!function.call_in(&container, &[], &Keywords::new()).unwrap());
    }

    #[test]
    #[traced_test]
    fn test_bound() {
        let container = container();
        let function = InjectedFn::new(
            Blueprint::builder()
                .param("self")
                .inject("database", Dependency::of::<Database>())
                .build(),
            |arguments: Arguments<'_>| {
                let handler = arguments.receiver_as::<Handler>().map(|handler| handler.0);
                let database = arguments.keyword_as::<Database>("database").map(|database| database.0);
                (handler, database)
            },
        );

        let bound = function.bind(Arc::new(Handler(7)));
        assert_eq!(bound.call_in(&container, &[], &Keywords::new()).unwrap(), (Some(7), Some("main")));

        // The receiver takes the `self` slot, so one positional argument covers `database`
        let shared = bound.clone();
        let database: Instance = Arc::new(Database("positional"));
        let result = thread::spawn(move || shared.call_in(&Container::new(), &[Some(database)], &Keywords::new()))
            .join()
            .unwrap()
            .unwrap();
        assert_eq!(result, (Some(7), None));
        assert!(Arc::ptr_eq(&bound.function().inner, &function.inner));
    }

    #[test]
    #[traced_test]
    fn test_call_uses_world() {
        let _lock = world::TEST_LOCK.lock();

        let function = InjectedFn::new(Blueprint::builder().inject("database", Dependency::of::<Database>()).build(), describe);
        {
            let _guard = world::override_with(|_| container());
            assert_eq!(function.call(&[], &Keywords::new()).unwrap(), (0, Some("main"), false));
        }
        {
            let _guard = world::override_with(|_| Container::new());
            assert!(matches!(function.call(&[], &Keywords::new()), Err(ResolveErrorKind::NotFound { .. })));
        }
    }
}
