use parking_lot::{Mutex, RwLock};
use std::{any::Any, collections::HashMap, sync::Arc};
use tracing::debug;

use super::{has_variant, DebugInfo, Provider};
use crate::{
    container::Container,
    dependency::Dependency,
    errors::ProvideErrorKind,
    provided::{Flags, Provided},
};

pub(crate) type Linker = Arc<dyn Fn() -> Dependency + Send + Sync>;

pub(crate) enum Link {
    Static(Dependency),
    Dynamic {
        linker: Linker,
        permanent: bool,
        /// First target of a permanent link, the linker isn't called once it's set
        promoted: Mutex<Option<Dependency>>,
    },
}

impl Link {
    #[inline]
    #[must_use]
    pub(crate) fn dynamic(linker: Linker, permanent: bool) -> Self {
        Self::Dynamic {
            linker,
            permanent,
            promoted: Mutex::new(None),
        }
    }

    fn clone_link(&self, keep_cache: bool) -> Self {
        match self {
            Self::Static(target) => Self::Static(target.clone()),
            Self::Dynamic {
                linker,
                permanent,
                promoted,
            } => Self::Dynamic {
                linker: linker.clone(),
                permanent: *permanent,
                promoted: Mutex::new(if keep_cache { promoted.lock().clone() } else { None }),
            },
        }
    }
}

/// Aliases a dependency to another one.
///
/// The result keeps the aliasee's cacheability, except for a non-permanent dynamic link
/// whose result is never cached since the linker is evaluated on every resolution.
#[derive(Default)]
pub struct IndirectProvider {
    links: RwLock<HashMap<Dependency, Arc<Link>>>,
}

impl IndirectProvider {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn add(&self, dependency: Dependency, link: Link) {
        self.links.write().insert(dependency, Arc::new(link));
    }

    fn get(&self, dependency: &Dependency) -> Option<Arc<Link>> {
        self.links.read().get(dependency).cloned()
    }
}

impl Provider for IndirectProvider {
    fn exists(&self, dependency: &Dependency) -> bool {
        self.links.read().contains_key(dependency)
    }

    fn exists_variant(&self, base: &Dependency) -> bool {
        has_variant(&self.links.read(), base)
    }

    fn provide(&self, dependency: &Dependency, container: &Container) -> Result<Option<Provided>, ProvideErrorKind> {
        let Some(link) = self.get(dependency) else {
            return Ok(None);
        };

        let (target, permanent) = match &*link {
            Link::Static(target) => (target.clone(), true),
            Link::Dynamic {
                linker,
                permanent,
                promoted,
            } => {
                let promoted = promoted.lock().clone();
                match promoted {
                    Some(target) => (target, true),
                    None => (linker(), *permanent),
                }
            }
        };

        let Some(provided) = container.provide(&target)? else {
            return Err(ProvideErrorKind::Missing { dependency: target });
        };

        if let Link::Dynamic {
            permanent: true, promoted, ..
        } = &*link
        {
            let mut promoted = promoted.lock();
            if promoted.is_none() {
                debug!(%target, "Link promoted to static");
                *promoted = Some(target);
            }
        }

        let flags = if permanent { provided.flags } else { Flags::transient() };
        Ok(Some(Provided::new(provided.value, flags)))
    }

    fn clone_provider(&self, keep_cache: bool) -> Box<dyn Provider> {
        let links = self
            .links
            .read()
            .iter()
            .map(|(dependency, link)| (dependency.clone(), Arc::new(link.clone_link(keep_cache))))
            .collect();

        Box::new(Self { links: RwLock::new(links) })
    }

    fn debug(&self, dependency: &Dependency) -> Option<DebugInfo> {
        let link = self.get(dependency)?;
        let target = match &*link {
            Link::Static(target) => Some(target.clone()),
            Link::Dynamic { promoted, .. } => promoted.lock().clone(),
        };
        // A resolved link is cached along with its target, an unpromoted dynamic one never is
        Some(match target {
            Some(target) => DebugInfo {
                label: format!("Link {dependency} to {target}"),
                singleton: false,
                dependencies: vec![target.clone()],
                follows: Some(target),
            },
            None => DebugInfo {
                label: format!("Dynamic link {dependency}"),
                singleton: false,
                dependencies: Vec::new(),
                follows: None,
            },
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
