//! Adaptive per-object locking
//!
//! Every container carries an [`AdaptiveMutex`]. While nobody has to wait,
//! locking is a compare-and-swap on an inline state byte and re-entry from
//! the owning thread bumps a counter. The first time a thread has to wait
//! for the lock, the object is marked contended; the next acquisition
//! allocates a recursive `parking_lot` mutex and installs it, and from then
//! on all lockers go through that mutex. A promoted lock is never demoted.
//!
//! [`ObjectLock`] is the scoped guard: it locks on construction and unlocks
//! on drop.

use std::hint;
use std::marker::PhantomData;
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::thread;

use parking_lot::lock_api::{self, GetThreadId};
use parking_lot::{RawMutex, RawThreadId};
use tracing::trace;

type RawReentrantMutex = lock_api::RawReentrantMutex<RawMutex, RawThreadId>;

const UNLOCKED: u8 = 0;
const LOCKED: u8 = 1;
const PROMOTED: u8 = 2;

/// Iterations of plain busy-waiting before pausing the CPU
const SPIN_LIMIT: u32 = 8;
/// Iterations of CPU pausing before yielding to the scheduler
const PAUSE_LIMIT: u32 = 32;

fn current_thread_id() -> usize {
    RawThreadId::INIT.nonzero_thread_id().get()
}

fn backoff(step: &mut u32) {
    if *step < SPIN_LIMIT {
        hint::spin_loop();
    } else if *step < PAUSE_LIMIT {
        for _ in 0..(1 << (*step - SPIN_LIMIT).min(6)) {
            hint::spin_loop();
        }
    } else {
        thread::yield_now();
    }
    *step = step.saturating_add(1);
}

/// How a particular acquisition was satisfied; decides how it is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Acquired {
    Inline,
    Promoted,
}

/// Lock word embedded in every lockable object.
pub struct AdaptiveMutex {
    state: AtomicU8,
    owner: AtomicUsize,
    recursion: AtomicUsize,
    contended: AtomicBool,
    promoted: OnceLock<Box<RawReentrantMutex>>,
}

impl AdaptiveMutex {
    /// A fresh, unlocked, unpromoted lock.
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(UNLOCKED),
            owner: AtomicUsize::new(0),
            recursion: AtomicUsize::new(0),
            contended: AtomicBool::new(false),
            promoted: OnceLock::new(),
        }
    }

    fn acquire(&self) -> Acquired {
        let me = current_thread_id();
        let mut step = 0;

        loop {
            match self.state.load(Ordering::Acquire) {
                UNLOCKED => {
                    if self.contended.load(Ordering::Relaxed) {
                        if self.try_promote() {
                            return Acquired::Promoted;
                        }
                        continue;
                    }

                    if self
                        .state
                        .compare_exchange_weak(UNLOCKED, LOCKED, Ordering::Acquire, Ordering::Relaxed)
                        .is_ok()
                    {
                        self.owner.store(me, Ordering::Relaxed);
                        self.recursion.store(1, Ordering::Relaxed);
                        return Acquired::Inline;
                    }
                }
                LOCKED => {
                    if self.owner.load(Ordering::Relaxed) == me {
                        self.recursion.fetch_add(1, Ordering::Relaxed);
                        return Acquired::Inline;
                    }

                    self.contended.store(true, Ordering::Relaxed);
                    backoff(&mut step);
                }
                _ => match self.promoted.get() {
                    Some(mutex) => {
                        mutex.lock();
                        return Acquired::Promoted;
                    }
                    // PROMOTED is only published after the mutex is installed
                    None => hint::spin_loop(),
                },
            }
        }
    }

    /// Install the heap mutex. Only possible while the inline word is free,
    /// so no inline holder can still be inside its critical section.
    fn try_promote(&self) -> bool {
        let mutex = self
            .promoted
            .get_or_init(|| Box::new(RawReentrantMutex::INIT));
        mutex.lock();

        if self
            .state
            .compare_exchange(UNLOCKED, PROMOTED, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
        {
            trace!("object lock promoted to a recursive mutex");
            return true;
        }

        // SAFETY: locked on this thread a few lines above.
        unsafe { mutex.unlock() };
        false
    }

    fn release(&self, acquired: Acquired) {
        match acquired {
            Acquired::Inline => {
                debug_assert_eq!(
                    self.owner.load(Ordering::Relaxed),
                    current_thread_id(),
                    "object lock released by a thread that does not own it"
                );

                if self.recursion.fetch_sub(1, Ordering::Relaxed) == 1 {
                    self.owner.store(0, Ordering::Relaxed);
                    self.state.store(UNLOCKED, Ordering::Release);
                }
            }
            Acquired::Promoted => {
                if let Some(mutex) = self.promoted.get() {
                    // SAFETY: `Acquired::Promoted` is only handed out after
                    // this thread locked the promoted mutex.
                    unsafe { mutex.unlock() };
                }
            }
        }
    }

    /// True if some thread currently holds the lock.
    pub fn is_locked(&self) -> bool {
        match self.state.load(Ordering::Acquire) {
            UNLOCKED => false,
            LOCKED => true,
            _ => self.promoted.get().is_some_and(|mutex| mutex.is_locked()),
        }
    }

    /// True if the calling thread holds the lock.
    pub fn is_owned_by_current_thread(&self) -> bool {
        match self.state.load(Ordering::Acquire) {
            UNLOCKED => false,
            LOCKED => self.owner.load(Ordering::Relaxed) == current_thread_id(),
            _ => self
                .promoted
                .get()
                .is_some_and(|mutex| mutex.is_owned_by_current_thread()),
        }
    }

    /// True once contention has promoted this lock to a heap mutex.
    pub fn is_promoted(&self) -> bool {
        self.state.load(Ordering::Acquire) == PROMOTED
    }
}

impl Default for AdaptiveMutex {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AdaptiveMutex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdaptiveMutex")
            .field("locked", &self.is_locked())
            .field("promoted", &self.is_promoted())
            .finish()
    }
}

/// Anything that embeds an [`AdaptiveMutex`].
pub trait Lockable {
    /// The object's lock word.
    fn object_mutex(&self) -> &AdaptiveMutex;
}

/// Scoped lock on a [`Lockable`] object.
///
/// Locking is recursive: a thread may create several guards for the same
/// object. The guard cannot be sent to another thread.
pub struct ObjectLock<'a> {
    mutex: &'a AdaptiveMutex,
    held: Option<Acquired>,
    _not_send: PhantomData<*const ()>,
}

impl<'a> ObjectLock<'a> {
    /// Lock `object` until the guard is dropped.
    pub fn new<T: Lockable + ?Sized>(object: &'a T) -> Self {
        let mutex = object.object_mutex();
        let held = Some(mutex.acquire());
        Self {
            mutex,
            held,
            _not_send: PhantomData,
        }
    }

    /// Re-acquire after an explicit [`unlock`](Self::unlock).
    pub fn lock(&mut self) {
        if self.held.is_none() {
            self.held = Some(self.mutex.acquire());
        }
    }

    /// Release early. Dropping an unlocked guard is a no-op.
    pub fn unlock(&mut self) {
        if let Some(acquired) = self.held.take() {
            self.mutex.release(acquired);
        }
    }

    /// True while this guard holds the lock.
    pub fn is_held(&self) -> bool {
        self.held.is_some()
    }

    /// True if this guard currently holds the lock of `object`.
    pub fn guards<T: Lockable + ?Sized>(&self, object: &T) -> bool {
        self.is_held() && ptr::eq(self.mutex, object.object_mutex())
    }
}

impl Drop for ObjectLock<'_> {
    fn drop(&mut self) {
        self.unlock();
    }
}

impl std::fmt::Debug for ObjectLock<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectLock")
            .field("held", &self.is_held())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::UnsafeCell;
    use std::sync::Arc;

    struct Counter {
        mutex: AdaptiveMutex,
        value: UnsafeCell<u64>,
    }

    // SAFETY: `value` is only touched while `mutex` is held.
    unsafe impl Sync for Counter {}

    impl Lockable for Counter {
        fn object_mutex(&self) -> &AdaptiveMutex {
            &self.mutex
        }
    }

    impl Counter {
        fn new() -> Self {
            Self {
                mutex: AdaptiveMutex::new(),
                value: UnsafeCell::new(0),
            }
        }

        fn bump(&self) {
            let _olock = ObjectLock::new(self);
            // SAFETY: guarded by the object lock
            unsafe { *self.value.get() += 1 };
        }

        fn get(&self) -> u64 {
            let _olock = ObjectLock::new(self);
            // SAFETY: guarded by the object lock
            unsafe { *self.value.get() }
        }
    }

    #[test]
    fn test_uncontended_lock_stays_inline() {
        let counter = Counter::new();
        counter.bump();
        counter.bump();
        assert_eq!(counter.get(), 2);
        assert!(!counter.mutex.is_promoted());
        assert!(!counter.mutex.is_locked());
    }

    #[test]
    fn test_recursive_lock() {
        let counter = Counter::new();
        let outer = ObjectLock::new(&counter);
        {
            let inner = ObjectLock::new(&counter);
            assert!(inner.is_held());
            assert!(counter.mutex.is_owned_by_current_thread());
        }
        assert!(counter.mutex.is_locked());
        drop(outer);
        assert!(!counter.mutex.is_locked());
    }

    #[test]
    fn test_explicit_unlock_and_relock() {
        let counter = Counter::new();
        let mut guard = ObjectLock::new(&counter);
        guard.unlock();
        assert!(!guard.is_held());
        assert!(!counter.mutex.is_locked());
        guard.lock();
        assert!(guard.guards(&counter));
    }

    #[test]
    fn test_guard_identity() {
        let a = Counter::new();
        let b = Counter::new();
        let guard = ObjectLock::new(&a);
        assert!(guard.guards(&a));
        assert!(!guard.guards(&b));
    }

    #[test]
    fn test_contended_counter_is_exact() {
        let counter = Arc::new(Counter::new());
        let threads = 8;
        let per_thread = 2_000;

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    for _ in 0..per_thread {
                        counter.bump();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counter.get(), threads * per_thread);
        assert!(!counter.mutex.is_locked());
    }

    #[test]
    fn test_recursion_after_promotion() {
        let counter = Arc::new(Counter::new());
        let holder = ObjectLock::new(&*counter);

        let waiter = {
            let counter = Arc::clone(&counter);
            thread::spawn(move || counter.bump())
        };

        // Give the waiter time to observe contention, then let it through.
        while !counter.mutex.contended.load(Ordering::Relaxed) {
            thread::yield_now();
        }
        drop(holder);
        waiter.join().unwrap();

        assert!(counter.mutex.is_promoted());

        let outer = ObjectLock::new(&*counter);
        let inner = ObjectLock::new(&*counter);
        assert!(counter.mutex.is_owned_by_current_thread());
        drop(inner);
        drop(outer);
        assert!(!counter.mutex.is_locked());
        assert_eq!(counter.get(), 1);
    }
}
