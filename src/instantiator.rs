use std::sync::Arc;
use tracing::debug;

use super::{
    dependency_resolver::{DependencyResolver, Request},
    errors::{InstantiateErrorKind, InstantiatorErrorKind, ResolveErrorKind},
};
use crate::{any::Instance, dependency::Dependency};

pub trait Instantiator<Deps>: Clone + 'static
where
    Deps: DependencyResolver,
{
    type Provides: Send + Sync + 'static;
    type Error: Into<InstantiateErrorKind>;

    fn instantiate(&mut self, dependencies: Deps) -> Result<Self::Provides, Self::Error>;

    #[inline]
    #[must_use]
    fn dependencies() -> Vec<Dependency> {
        Deps::dependencies()
    }
}

pub(crate) type BoxedInstantiator =
    Arc<dyn Fn(&Request<'_>) -> Result<Instance, InstantiatorErrorKind<ResolveErrorKind, InstantiateErrorKind>> + Send + Sync>;

#[must_use]
pub(crate) fn boxed_instantiator<Inst, Deps>(instantiator: Inst) -> BoxedInstantiator
where
    Inst: Instantiator<Deps> + Send + Sync,
    Deps: DependencyResolver,
{
    Arc::new(move |request: &Request<'_>| {
        let dependencies = match Deps::resolve(request) {
            Ok(dependencies) => dependencies,
            Err(err) => return Err(InstantiatorErrorKind::Deps(err.into())),
        };
        let dependency = match instantiator.clone().instantiate(dependencies) {
            Ok(dependency) => dependency,
            Err(err) => return Err(InstantiatorErrorKind::Factory(err.into())),
        };

        debug!("Instantiated");

        Ok(Arc::new(dependency) as Instance)
    })
}

/// Instantiator that hands out clones of an existing value.
#[inline]
#[must_use]
pub fn instance<T: Clone + Send + Sync + 'static>(val: T) -> impl Instantiator<(), Provides = T, Error = InstantiateErrorKind> {
    move || Ok::<_, InstantiateErrorKind>(val.clone())
}

/// Producer callable resolved from another dependency by [`crate::FactoryProvider`].
pub struct Factory {
    call: Box<dyn Fn() -> Result<Instance, InstantiateErrorKind> + Send + Sync>,
}

impl Factory {
    #[must_use]
    pub fn new<F, T, E>(f: F) -> Self
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        T: Send + Sync + 'static,
        E: Into<InstantiateErrorKind>,
    {
        Self {
            call: Box::new(move || f().map(|val| Arc::new(val) as Instance).map_err(Into::into)),
        }
    }

    #[inline]
    pub(crate) fn call(&self) -> Result<Instance, InstantiateErrorKind> {
        (self.call)()
    }
}

macro_rules! impl_instantiator {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case)]
        impl<F, Response, Err, $($ty,)*> Instantiator<($($ty,)*)> for F
        where
            F: FnMut($($ty,)*) -> Result<Response, Err> + Clone + 'static,
            Response: Send + Sync + 'static,
            Err: Into<InstantiateErrorKind>,
            $( $ty: DependencyResolver, )*
        {
            type Provides = Response;
            type Error = Err;

            #[inline]
            fn instantiate(&mut self, ($($ty,)*): ($($ty,)*)) -> Result<Self::Provides, Self::Error> {
                self($($ty,)*)
            }
        }
    };
}

all_the_tuples!(impl_instantiator);
