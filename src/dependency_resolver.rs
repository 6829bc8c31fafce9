use crate::{container::Container, dependency::Dependency, errors::ResolveErrorKind};

/// What an extractor sees while the container builds a dependency.
#[derive(Clone, Copy)]
pub struct Request<'a> {
    pub container: &'a Container,
    /// Dependency being built, including its parameters if the key is parameterized
    pub dependency: &'a Dependency,
}

/// Extracts one argument of an instantiator from the container.
pub trait DependencyResolver: Sized {
    type Error: Into<ResolveErrorKind>;

    fn resolve(request: &Request<'_>) -> Result<Self, Self::Error>;

    /// Dependencies requested by this extractor, reported by introspection without resolving them.
    #[inline]
    #[must_use]
    fn dependencies() -> Vec<Dependency> {
        Vec::new()
    }
}

impl DependencyResolver for Container {
    type Error = ResolveErrorKind;

    #[inline]
    fn resolve(request: &Request<'_>) -> Result<Self, Self::Error> {
        Ok(request.container.clone())
    }
}

macro_rules! impl_dependency_resolver {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case, unused_mut)]
        impl<$($ty,)*> DependencyResolver for ($($ty,)*)
        where
            $( $ty: DependencyResolver, )*
        {
            type Error = ResolveErrorKind;

            #[inline]
            #[allow(unused_variables)]
            fn resolve(request: &Request<'_>) -> Result<Self, Self::Error> {
                Ok(($($ty::resolve(request).map_err(Into::into)?,)*))
            }

            #[inline]
            fn dependencies() -> Vec<Dependency> {
                let mut dependencies = Vec::new();
                $( dependencies.extend($ty::dependencies()); )*
                dependencies
            }
        }
    };
}

all_the_tuples!(impl_dependency_resolver);
