use parking_lot::{Condvar, Mutex};
use std::thread::{self, ThreadId};

#[derive(Default)]
struct Owner {
    thread: Option<ThreadId>,
    depth: usize,
}

/// Lock that the owning thread may acquire again without deadlocking.
///
/// Nested resolutions (a constructor requesting its own dependencies) re-enter on the same thread,
/// other threads wait until the depth drops back to zero.
#[derive(Default)]
pub(crate) struct ReentrantLock {
    owner: Mutex<Owner>,
    released: Condvar,
}

impl ReentrantLock {
    #[inline]
    #[must_use]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn lock(&self) -> ReentrantLockGuard<'_> {
        let current = thread::current().id();
        let mut owner = self.owner.lock();
        loop {
            match owner.thread {
                None => {
                    owner.thread = Some(current);
                    owner.depth = 1;
                    break;
                }
                Some(thread) if thread == current => {
                    owner.depth += 1;
                    break;
                }
                Some(_) => self.released.wait(&mut owner),
            }
        }
        ReentrantLockGuard { lock: self }
    }

    #[must_use]
    pub(crate) fn is_held_by_current_thread(&self) -> bool {
        self.owner.lock().thread == Some(thread::current().id())
    }

    #[cfg(test)]
    fn depth(&self) -> usize {
        self.owner.lock().depth
    }

    fn unlock(&self) {
        let mut owner = self.owner.lock();
        owner.depth -= 1;
        if owner.depth == 0 {
            owner.thread = None;
            drop(owner);
            self.released.notify_one();
        }
    }
}

#[must_use]
pub(crate) struct ReentrantLockGuard<'a> {
    lock: &'a ReentrantLock,
}

impl Drop for ReentrantLockGuard<'_> {
    fn drop(&mut self) {
        self.lock.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::ReentrantLock;

    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        thread,
    };

    #[test]
    fn test_reentrant() {
        let lock = ReentrantLock::new();

        let outer = lock.lock();
        let inner = lock.lock();
        assert_eq!(lock.depth(), 2);
        assert!(lock.is_held_by_current_thread());

        drop(inner);
        assert_eq!(lock.depth(), 1);
        assert!(lock.is_held_by_current_thread());

        drop(outer);
        assert_eq!(lock.depth(), 0);
        assert!(!lock.is_held_by_current_thread());
    }

    #[test]
    fn test_exclusive_between_threads() {
        let lock = Arc::new(ReentrantLock::new());
        let in_critical = Arc::new(AtomicUsize::new(0));
        let max_in_critical = Arc::new(AtomicUsize::new(0));

        let handles = (0..8)
            .map(|_| {
                let lock = lock.clone();
                let in_critical = in_critical.clone();
                let max_in_critical = max_in_critical.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        let _outer = lock.lock();
                        let _inner = lock.lock();
                        let now = in_critical.fetch_add(1, Ordering::SeqCst) + 1;
                        max_in_critical.fetch_max(now, Ordering::SeqCst);
                        in_critical.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(max_in_critical.load(Ordering::SeqCst), 1);
        assert_eq!(lock.depth(), 0);
    }
}
