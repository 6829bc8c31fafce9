use crate::dependency::Dependency;

#[derive(thiserror::Error, Debug)]
pub enum RegisterErrorKind {
    #[error("Container is frozen, registrations aren't accepted anymore")]
    Frozen,
    #[error("Dependency {dependency} is already registered")]
    AlreadyRegistered { dependency: Dependency },
    #[error("Provider {provider} isn't registered in the container")]
    NoProvider { provider: &'static str },
    #[error("Provider {provider} is already registered in the container")]
    DuplicateProvider { provider: &'static str },
}
