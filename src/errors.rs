mod container;
mod dependency_resolver;
mod instantiate;
mod instantiator;
mod provider;

pub use container::RegisterErrorKind;
pub use dependency_resolver::ResolveErrorKind;
pub use instantiate::InstantiateErrorKind;
pub use instantiator::InstantiatorErrorKind;
pub use provider::ProvideErrorKind;
