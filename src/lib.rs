#[macro_use]
pub(crate) mod macros;

pub(crate) mod any;
pub(crate) mod blueprint;
pub(crate) mod cache;
pub(crate) mod config;
pub(crate) mod container;
pub(crate) mod debug;
pub(crate) mod dependency;
pub(crate) mod dependency_resolver;
pub(crate) mod errors;
pub(crate) mod inject;
pub(crate) mod instantiator;
pub(crate) mod lock;
pub(crate) mod provided;
pub(crate) mod provider;
pub(crate) mod stack;
pub(crate) mod wrapper;

pub mod world;

pub use any::{Instance, TypeInfo};
pub use blueprint::{Blueprint, BlueprintBuilder, Parameter};
pub use config::Config;
pub use container::{Container, OverrideGuard};
pub use debug::{DependencyDebug, DependencyDebugKind};
pub use dependency::{Dependency, ParamValue, Parameterized, Parameters};
pub use dependency_resolver::{DependencyResolver, Request};
pub use errors::{InstantiateErrorKind, InstantiatorErrorKind, ProvideErrorKind, RegisterErrorKind, ResolveErrorKind};
pub use inject::{Inject, Params};
pub use instantiator::{instance, Factory, Instantiator};
pub use provided::{Flags, Provided};
pub use provider::{DebugInfo, FactoryProvider, IndirectProvider, Lazy, LazyCall, LazyConstant, LazyProvider, Provider, ServiceProvider};
pub use stack::ResolutionStack;
pub use wrapper::{Argument, Arguments, BoundInjectedFn, InjectedFn, Keywords};
