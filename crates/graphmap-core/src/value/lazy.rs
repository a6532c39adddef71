//! Deferred initialization for lazily materialized objects and collections
//!
//! A [`LazySlot`] holds an initializer closure behind a re-entrant lock and an
//! atomic flag. The closure runs at most once. A thread that re-enters the
//! slot while its own initializer is running sees the partially built state
//! instead of recursing; other threads block until initialization completes.

use crate::Result;
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Initializer closure receiving the owner of the slot
pub type Initializer<T> = Box<dyn FnOnce(&T) -> Result<()> + Send>;

/// Once-guarded initializer storage
pub struct LazySlot<T> {
    initializer: ReentrantMutex<RefCell<Option<Initializer<T>>>>,
    initialized: AtomicBool,
}

impl<T> LazySlot<T> {
    /// A slot that is already initialized
    pub fn ready() -> Self {
        Self {
            initializer: ReentrantMutex::new(RefCell::new(None)),
            initialized: AtomicBool::new(true),
        }
    }

    /// A slot that runs `initializer` on first access
    pub fn deferred(initializer: Initializer<T>) -> Self {
        Self {
            initializer: ReentrantMutex::new(RefCell::new(Some(initializer))),
            initialized: AtomicBool::new(false),
        }
    }

    /// Whether the initializer has completed (or there never was one)
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Run the initializer if it has not run yet
    ///
    /// An error from the initializer is returned to the caller that triggered
    /// it; the slot is still marked initialized afterwards.
    pub fn initialize(&self, owner: &T) -> Result<()> {
        if self.is_initialized() {
            return Ok(());
        }

        let guard = self.initializer.lock();
        // Taking the closure out releases the RefCell borrow before it runs,
        // so a re-entrant call on this thread finds `None` and returns.
        let initializer = guard.borrow_mut().take();

        match initializer {
            Some(initializer) => {
                let result = initializer(owner);
                self.initialized.store(true, Ordering::Release);
                result
            }
            None => Ok(()),
        }
    }
}

impl<T> fmt::Debug for LazySlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazySlot")
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn test_ready_slot_is_initialized() {
        let slot: LazySlot<()> = LazySlot::ready();
        assert!(slot.is_initialized());
        assert!(slot.initialize(&()).is_ok());
    }

    #[test]
    fn test_initializer_runs_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        let slot: LazySlot<()> = LazySlot::deferred(Box::new(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));

        assert!(!slot.is_initialized());
        slot.initialize(&()).unwrap();
        slot.initialize(&()).unwrap();
        assert!(slot.is_initialized());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_initializer_error_is_reported_once() {
        let slot: LazySlot<()> = LazySlot::deferred(Box::new(|_| {
            Err(crate::Error::invalid_argument("boom", ""))
        }));

        assert!(slot.initialize(&()).is_err());
        assert!(slot.is_initialized());
        assert!(slot.initialize(&()).is_ok());
    }

    #[test]
    fn test_concurrent_initialization_runs_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        let slot: Arc<LazySlot<()>> = Arc::new(LazySlot::deferred(Box::new(move |_| {
            std::thread::sleep(std::time::Duration::from_millis(20));
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let slot = slot.clone();
                std::thread::spawn(move || {
                    slot.initialize(&()).unwrap();
                    assert!(slot.is_initialized());
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
