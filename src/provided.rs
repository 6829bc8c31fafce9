use std::{
    any::Any,
    fmt::{self, Debug, Formatter},
    ops::BitOr,
    sync::Arc,
};

use crate::any::Instance;

/// Resolution metadata packed into a single byte,
/// so the hot path decides whether to cache with one mask test.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Flags(u8);

impl Flags {
    pub const DEFINED: Self = Self(0b001);
    pub const SINGLETON: Self = Self(0b010);
    /// Cacheable without being "the" singleton, for values that are pure facts.
    pub const CACHEABLE: Self = Self(0b100);

    const CACHE_MASK: u8 = Self::SINGLETON.0 | Self::CACHEABLE.0;

    #[inline]
    #[must_use]
    pub const fn singleton() -> Self {
        Self(Self::DEFINED.0 | Self::SINGLETON.0)
    }

    #[inline]
    #[must_use]
    pub const fn transient() -> Self {
        Self::DEFINED
    }

    #[inline]
    #[must_use]
    pub const fn cacheable() -> Self {
        Self(Self::DEFINED.0 | Self::CACHEABLE.0)
    }

    #[inline]
    #[must_use]
    pub const fn from_singleton(singleton: bool) -> Self {
        if singleton {
            Self::singleton()
        } else {
            Self::transient()
        }
    }

    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    #[must_use]
    pub const fn is_cacheable(self) -> bool {
        self.0 & Self::CACHE_MASK != 0
    }

    #[inline]
    #[must_use]
    pub const fn is_singleton(self) -> bool {
        self.contains(Self::SINGLETON)
    }
}

impl BitOr for Flags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl Debug for Flags {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        if self.contains(Self::DEFINED) {
            set.entry(&"DEFINED");
        }
        if self.contains(Self::SINGLETON) {
            set.entry(&"SINGLETON");
        }
        if self.contains(Self::CACHEABLE) {
            set.entry(&"CACHEABLE");
        }
        set.finish()
    }
}

/// A value produced by a provider together with its metadata.
///
/// "Not provided" is expressed as `None` wherever an `Option<Provided>` is returned.
#[derive(Clone)]
pub struct Provided {
    pub value: Instance,
    pub flags: Flags,
}

impl Provided {
    #[inline]
    #[must_use]
    pub fn new(value: Instance, flags: Flags) -> Self {
        Self { value, flags }
    }

    #[inline]
    #[must_use]
    pub fn singleton<T: Any + Send + Sync>(value: T) -> Self {
        Self::new(Arc::new(value), Flags::singleton())
    }

    #[inline]
    #[must_use]
    pub fn transient<T: Any + Send + Sync>(value: T) -> Self {
        Self::new(Arc::new(value), Flags::transient())
    }
}

impl Debug for Provided {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provided").field("flags", &self.flags).finish_non_exhaustive()
    }
}
