use crate::provided::Flags;

/// Config for a registration
/// ## Fields
/// - `singleton`:
///   If `true`, the instance provided for the dependency will be cached by the container and reused.
///
///   This does **not** affect the dependencies of the instance.
///   Only the final result is cached if caching is applicable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub singleton: bool,
}

impl Config {
    #[inline]
    #[must_use]
    pub const fn singleton() -> Self {
        Self { singleton: true }
    }

    #[inline]
    #[must_use]
    pub const fn transient() -> Self {
        Self { singleton: false }
    }

    #[inline]
    #[must_use]
    pub(crate) const fn flags(self) -> Flags {
        Flags::from_singleton(self.singleton)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::singleton()
    }
}
