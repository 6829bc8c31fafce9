//! Process-wide active container.
//!
//! Call sites that don't carry a [`Container`] (see [`crate::InjectedFn::call`]) resolve through the world.
//! Tests replace it wholesale with [`override_with`] or [`isolated`] instead of mutating it.

use parking_lot::{const_rwlock, RwLock};
use tracing::debug;

use crate::container::Container;

static WORLD: RwLock<Option<Container>> = const_rwlock(None);

/// Returns the active container, creating a default one first if there is none.
pub fn init() -> Container {
    if let Some(container) = active() {
        return container;
    }

    let mut world = WORLD.write();
    // Another thread may have initialized it between the two locks
    if let Some(container) = world.as_ref() {
        return container.clone();
    }
    let container = Container::new();
    *world = Some(container.clone());
    debug!("World initialized");
    container
}

#[inline]
#[must_use]
pub fn active() -> Option<Container> {
    WORLD.read().clone()
}

/// Same as [`init`]
#[inline]
#[must_use]
pub fn get() -> Container {
    init()
}

/// Drops the reference to the active container. The next [`init`] creates a new one.
pub fn reset() {
    if WORLD.write().take().is_some() {
        debug!("World reset");
    }
}

/// Replaces the active container by the one built by `f` from the current one,
/// until the returned guard is dropped.
///
/// `f` runs without the world lock, so it may use the world itself.
/// The guard restores whatever was active right before the swap.
pub fn override_with<F>(f: F) -> WorldOverride
where
    F: FnOnce(Option<&Container>) -> Container,
{
    let current = active();
    let container = f(current.as_ref());
    let previous = WORLD.write().replace(container);

    debug!(had_previous = previous.is_some(), "World overridden");
    WorldOverride { previous }
}

/// Replaces the active container by its frozen snapshot, until the returned guard is dropped.
/// See [`Container::snapshot`] for `keep_cache`.
pub fn isolated(keep_cache: bool) -> WorldOverride {
    let current = init();
    override_with(|_| current.snapshot(keep_cache))
}

/// Restores the previously active container when dropped.
#[must_use = "the previous container is restored as soon as the guard is dropped"]
pub struct WorldOverride {
    previous: Option<Container>,
}

impl Drop for WorldOverride {
    fn drop(&mut self) {
        *WORLD.write() = self.previous.take();
        debug!("World override reverted");
    }
}

/// Serializes the tests touching the world, since it's shared by the whole test binary
#[cfg(test)]
pub(crate) static TEST_LOCK: parking_lot::Mutex<()> = parking_lot::const_mutex(());
