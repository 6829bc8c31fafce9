use std::sync::Arc;

use crate::dependency::Dependency;

/// Injection descriptor of one parameter of a wrapped callable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: &'static str,
    /// Parameters without a dependency are never filled
    pub dependency: Option<Dependency>,
    /// Missing dependency fails the call
    pub required: bool,
    /// Missing dependency is passed as `None`
    pub optional: bool,
}

/// Ordered parameters of a callable, built once when the callable is wrapped.
#[derive(Debug, Clone)]
pub struct Blueprint {
    parameters: Arc<[Parameter]>,
}

impl Blueprint {
    #[inline]
    #[must_use]
    pub fn builder() -> BlueprintBuilder {
        BlueprintBuilder::default()
    }

    #[inline]
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Dependencies the wrapper may resolve, in parameter order.
    pub fn dependencies(&self) -> impl Iterator<Item = &Dependency> {
        self.parameters.iter().filter_map(|parameter| parameter.dependency.as_ref())
    }
}

#[derive(Debug, Default)]
pub struct BlueprintBuilder {
    parameters: Vec<Parameter>,
}

impl BlueprintBuilder {
    /// Parameter the caller always supplies.
    #[must_use]
    pub fn param(self, name: &'static str) -> Self {
        self.push(name, None, false, false)
    }

    /// Parameter filled with `dependency` unless supplied, the call fails if it can't be resolved.
    #[must_use]
    pub fn inject(self, name: &'static str, dependency: impl Into<Dependency>) -> Self {
        self.push(name, Some(dependency.into()), true, false)
    }

    /// Parameter filled with `dependency` unless supplied, `None` if it can't be resolved.
    #[must_use]
    pub fn inject_optional(self, name: &'static str, dependency: impl Into<Dependency>) -> Self {
        self.push(name, Some(dependency.into()), false, true)
    }

    /// Parameter filled with `dependency` only if it's registered, left absent otherwise.
    #[must_use]
    pub fn inject_if_found(self, name: &'static str, dependency: impl Into<Dependency>) -> Self {
        self.push(name, Some(dependency.into()), false, false)
    }

    #[must_use]
    pub fn build(self) -> Blueprint {
        Blueprint {
            parameters: self.parameters.into(),
        }
    }

    fn push(mut self, name: &'static str, dependency: Option<Dependency>, required: bool, optional: bool) -> Self {
        debug_assert!(
            self.parameters.iter().all(|parameter| parameter.name != name),
            "parameter `{name}` declared twice"
        );

        self.parameters.push(Parameter {
            name,
            dependency,
            required,
            optional,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::Blueprint;
    use crate::Dependency;

    struct Database;

    #[test]
    fn test_builder() {
        let blueprint = Blueprint::builder()
            .param("id")
            .inject("database", Dependency::of::<Database>())
            .inject_optional("cache", "cache")
            .inject_if_found("metrics", "metrics")
            .build();

        assert_eq!(blueprint.len(), 4);
        let flags = blueprint
            .parameters()
            .iter()
            .map(|parameter| (parameter.name, parameter.required, parameter.optional))
            .collect::<Vec<_>>();
        assert_eq!(
            flags,
            [("id", false, false), ("database", true, false), ("cache", false, true), ("metrics", false, false)]
        );
        assert!(blueprint.parameters()[0].dependency.is_none());
        assert_eq!(
            blueprint.dependencies().cloned().collect::<Vec<_>>(),
            [Dependency::of::<Database>(), Dependency::named("cache"), Dependency::named("metrics")]
        );
    }

    #[test]
    fn test_empty() {
        let blueprint = Blueprint::builder().build();
        assert!(blueprint.is_empty());
        assert_eq!(blueprint.dependencies().count(), 0);
    }
}
