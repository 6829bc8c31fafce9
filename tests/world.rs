use parking_lot::{const_mutex, Mutex};
use std::sync::{
    atomic::{AtomicU8, Ordering},
    Arc,
};
use wirebox::{world, Arguments, Blueprint, Config, Dependency, InjectedFn, InstantiateErrorKind, Keywords, RegisterErrorKind};

static WORLD_LOCK: Mutex<()> = const_mutex(());

struct Clock(u64);

fn bootstrap(count: &Arc<AtomicU8>) {
    world::reset();
    let container = world::init();
    container
        .register_service::<Clock, _, _>(
            {
                let count = count.clone();
                move || {
                    count.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, InstantiateErrorKind>(Clock(100))
                }
            },
            Config::singleton(),
        )
        .unwrap();
    container.freeze();
}

fn now() -> InjectedFn<u64> {
    InjectedFn::new(
        Blueprint::builder().inject("clock", Dependency::of::<Clock>()).build(),
        |arguments: Arguments<'_>| arguments.keyword_as::<Clock>("clock").map_or(0, |clock| clock.0),
    )
}

#[test]
fn test_isolated_worlds() {
    let _lock = WORLD_LOCK.lock();
    let count = Arc::new(AtomicU8::new(0));
    bootstrap(&count);

    let now = now();
    assert_eq!(now.call(&[], &Keywords::new()).unwrap(), 100);
    assert_eq!(count.load(Ordering::SeqCst), 1);

    {
        let _world = world::isolated(true);
        assert_eq!(now.call(&[], &Keywords::new()).unwrap(), 100);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        let _clock = world::get().override_singleton(Dependency::of::<Clock>(), Clock(5));
        assert_eq!(now.call(&[], &Keywords::new()).unwrap(), 5);
    }
    {
        let _world = world::isolated(false);
        assert_eq!(now.call(&[], &Keywords::new()).unwrap(), 100);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    assert_eq!(now.call(&[], &Keywords::new()).unwrap(), 100);
    assert_eq!(count.load(Ordering::SeqCst), 2);
    world::reset();
}

#[test]
fn test_bootstrap_frozen() {
    let _lock = WORLD_LOCK.lock();
    let count = Arc::new(AtomicU8::new(0));
    bootstrap(&count);

    assert!(matches!(
        world::get().register_indirect(Dependency::named("clock"), Dependency::of::<Clock>()),
        Err(RegisterErrorKind::Frozen)
    ));

    world::reset();
    assert!(world::active().is_none());
    assert!(world::init().register_indirect(Dependency::named("clock"), Dependency::of::<Clock>()).is_ok());
    world::reset();
}
