//! Registry shareable between a tick source and the rest of the application
//!
//! A [`SharedRegistry`] can be placed in a `static` and ticked from a timer interrupt or task,
//! while other code enables and disables keys through [`SharedRegistry::lock`].

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::detect::Detect;
use crate::registry::{Handler, Registry};
use crate::{Error, Result};

/// [`Registry`] behind a critical section
pub struct SharedRegistry<D, H, const N: usize> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Registry<D, H, N>>>,
}

impl<D, H, const N: usize> Default for SharedRegistry<D, H, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D, H, const N: usize> SharedRegistry<D, H, N> {
    /// construct an empty shared registry, usable in a `static`
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Registry::new())),
        }
    }

    /// Runs `f` on the registry.
    ///
    /// Fails with [`Error::Busy`] when called from within a poll pass or another `lock`.
    pub fn lock<R>(&self, f: impl FnOnce(&mut Registry<D, H, N>) -> R) -> Result<R> {
        self.inner.lock(|registry| match registry.try_borrow_mut() {
            Ok(mut registry) => Ok(f(&mut *registry)),
            Err(_) => {
                warn!("key registry is busy");
                Err(Error::Busy)
            }
        })
    }
}

impl<D: Detect, H: Handler, const N: usize> SharedRegistry<D, H, N> {
    /// Ticks every enabled key once. Returns false if the pass was skipped because the registry was
    /// already in use.
    pub fn poll_all(&self) -> bool {
        self.inner.lock(|registry| match registry.try_borrow_mut() {
            Ok(mut registry) => {
                registry.poll_all();
                true
            }
            Err(_) => {
                trace!("key registry is busy, pass skipped");
                false
            }
        })
    }
}

#[cfg(test)]
mod test {
    use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use super::*;
    use crate::config::{ActiveState, KeyConfig};
    use crate::event::Event;
    use crate::registry::{Control, KeyId};

    type Callback = fn(&mut dyn Control, KeyId, Event, u8);

    fn high() -> bool {
        true
    }

    #[test]
    fn test_lock_and_poll() {
        static EVENTS: AtomicUsize = AtomicUsize::new(0);
        static SHARED: SharedRegistry<fn() -> bool, Callback, 2> = SharedRegistry::new();

        fn count(_control: &mut dyn Control, _key: KeyId, event: Event, _count: u8) {
            if event == Event::Press {
                EVENTS.fetch_add(1, Ordering::Relaxed);
            }
        }

        let config = KeyConfig::new(5, 1, 3, ActiveState::ActiveHigh);
        let key = SHARED
            .lock(|registry| {
                let key = registry.create(config, high, count)?;
                registry.enable(key).map(|_| key)
            })
            .unwrap()
            .unwrap();

        assert!(SHARED.poll_all());
        assert_eq!(EVENTS.load(Ordering::Relaxed), 1);
        assert_eq!(SHARED.lock(|registry| registry.pressed_ticks(key)), Ok(Ok(0)));
    }

    #[test]
    fn test_busy_from_handler() {
        static NESTED_POLL: AtomicBool = AtomicBool::new(true);
        static NESTED_LOCK: AtomicBool = AtomicBool::new(true);
        static SHARED: SharedRegistry<fn() -> bool, Callback, 2> = SharedRegistry::new();

        fn reenter(_control: &mut dyn Control, _key: KeyId, _event: Event, _count: u8) {
            NESTED_POLL.store(SHARED.poll_all(), Ordering::Relaxed);
            NESTED_LOCK.store(SHARED.lock(|_| ()).is_ok(), Ordering::Relaxed);
        }

        let config = KeyConfig::new(5, 1, 3, ActiveState::ActiveHigh);
        SHARED
            .lock(|registry| {
                let key = registry.create(config, high, reenter)?;
                registry.enable(key)
            })
            .unwrap()
            .unwrap();

        assert!(SHARED.poll_all());
        assert!(!NESTED_POLL.load(Ordering::Relaxed));
        assert!(!NESTED_LOCK.load(Ordering::Relaxed));

        // usable again once the pass is over
        assert!(SHARED.lock(|registry| registry.len()).is_ok());
    }
}
