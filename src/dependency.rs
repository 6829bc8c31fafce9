use std::{
    borrow::Cow,
    collections::BTreeMap,
    fmt::{self, Display, Formatter},
    sync::Arc,
};

use crate::any::TypeInfo;

/// Opaque identity of something the container can resolve.
///
/// Keys are immutable after construction and compare by value:
/// two [`Dependency::Parameterized`] keys are equal iff their bases and parameters are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dependency {
    Type(TypeInfo),
    Named(Cow<'static, str>),
    Parameterized(Arc<Parameterized>),
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Parameterized {
    pub base: Dependency,
    pub parameters: Parameters,
}

impl Dependency {
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::Type(TypeInfo::of::<T>())
    }

    #[inline]
    #[must_use]
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self::Named(name.into())
    }

    /// Returns the same service keyed with construction parameters.
    ///
    /// Parameters applied to an already parameterized key are merged into it, later values win.
    #[must_use]
    pub fn with_parameters(self, parameters: Parameters) -> Self {
        match self {
            Self::Parameterized(parameterized) => {
                let Parameterized { base, parameters: current } = Arc::unwrap_or_clone(parameterized);
                Self::Parameterized(Arc::new(Parameterized {
                    base,
                    parameters: current.merge(parameters),
                }))
            }
            base => Self::Parameterized(Arc::new(Parameterized { base, parameters })),
        }
    }

    /// Key with the parameters stripped, the key itself otherwise.
    #[inline]
    #[must_use]
    pub fn base(&self) -> &Dependency {
        match self {
            Self::Parameterized(parameterized) => &parameterized.base,
            dependency => dependency,
        }
    }

    #[inline]
    #[must_use]
    pub fn parameters(&self) -> Option<&Parameters> {
        match self {
            Self::Parameterized(parameterized) => Some(&parameterized.parameters),
            _ => None,
        }
    }
}

impl From<TypeInfo> for Dependency {
    fn from(type_info: TypeInfo) -> Self {
        Self::Type(type_info)
    }
}

impl From<&'static str> for Dependency {
    fn from(name: &'static str) -> Self {
        Self::Named(Cow::Borrowed(name))
    }
}

impl From<String> for Dependency {
    fn from(name: String) -> Self {
        Self::Named(Cow::Owned(name))
    }
}

impl Display for Dependency {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(type_info) => f.write_str(type_info.name),
            Self::Named(name) => write!(f, "{name:?}"),
            Self::Parameterized(parameterized) => write!(f, "{}({})", parameterized.base, parameterized.parameters),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Str(Cow<'static, str>),
}

impl ParamValue {
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(val) => Some(*val),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(val) => Some(*val),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(val) => Some(val),
            _ => None,
        }
    }
}

impl From<bool> for ParamValue {
    fn from(val: bool) -> Self {
        Self::Bool(val)
    }
}

impl From<i64> for ParamValue {
    fn from(val: i64) -> Self {
        Self::Int(val)
    }
}

impl From<i32> for ParamValue {
    fn from(val: i32) -> Self {
        Self::Int(val.into())
    }
}

impl From<&'static str> for ParamValue {
    fn from(val: &'static str) -> Self {
        Self::Str(Cow::Borrowed(val))
    }
}

impl From<String> for ParamValue {
    fn from(val: String) -> Self {
        Self::Str(Cow::Owned(val))
    }
}

impl Display for ParamValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(val) => write!(f, "{val}"),
            Self::Int(val) => write!(f, "{val}"),
            Self::Str(val) => write!(f, "{val:?}"),
        }
    }
}

/// Immutable construction arguments of a parameterized key.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Parameters(Arc<BTreeMap<Cow<'static, str>, ParamValue>>);

impl Parameters {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(self, name: impl Into<Cow<'static, str>>, value: impl Into<ParamValue>) -> Self {
        let mut map = Arc::unwrap_or_clone(self.0);
        map.insert(name.into(), value.into());
        Self(Arc::new(map))
    }

    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(name, value)| (name.as_ref(), value))
    }

    fn merge(self, other: Parameters) -> Self {
        let mut map = Arc::unwrap_or_clone(self.0);
        map.extend(other.0.iter().map(|(name, value)| (name.clone(), value.clone())));
        Self(Arc::new(map))
    }
}

impl<N, V> FromIterator<(N, V)> for Parameters
where
    N: Into<Cow<'static, str>>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self(Arc::new(iter.into_iter().map(|(name, value)| (name.into(), value.into())).collect()))
    }
}

impl Display for Parameters {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (index, (name, value)) in self.0.iter().enumerate() {
            if index != 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}
