//! Counting semaphore with cancellable blocking waits.
//!
//! Each device owns one [`Semaphore`] created with a single permit. It
//! serializes `open` and `close` against each other; command dispatch
//! never takes it.

use super::loom_compat::{AtomicU32, Ordering, spin_hint};
use crate::error::PowerError;
use crate::services::PlatformServices;

/// A counting semaphore.
///
/// Acquiring a permit decrements the count; dropping the returned
/// [`SemaphorePermit`] increments it again.
pub struct Semaphore {
    permits: AtomicU32,
}

impl Semaphore {
    /// Creates a semaphore with `permits` available permits.
    pub fn new(permits: u32) -> Self {
        Self {
            permits: AtomicU32::new(permits),
        }
    }

    /// Acquires a permit, blocking until one is available.
    ///
    /// A permit that is free on entry is taken without consulting the
    /// platform. While blocked, [`PlatformServices::check_wait`] is polled
    /// before each retry and its error is returned as-is; the wait is not
    /// retried internally.
    pub fn wait(&self, services: &dyn PlatformServices) -> Result<SemaphorePermit<'_>, PowerError> {
        loop {
            if let Some(permit) = self.try_wait() {
                return Ok(permit);
            }
            services.check_wait()?;
            services.relax();
            spin_hint();
        }
    }

    /// Tries to acquire a permit without blocking.
    pub fn try_wait(&self) -> Option<SemaphorePermit<'_>> {
        let mut current = self.permits.load(Ordering::Relaxed);
        while current != 0 {
            match self.permits.compare_exchange_weak(
                current,
                current - 1,
                Ordering::Acquire,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Some(SemaphorePermit { sem: self }),
                Err(actual) => current = actual,
            }
        }
        None
    }

    /// Returns the number of currently available permits.
    pub fn available_permits(&self) -> u32 {
        self.permits.load(Ordering::Relaxed)
    }

    fn post(&self) {
        self.permits.fetch_add(1, Ordering::Release);
    }
}

/// RAII permit that posts back to the [`Semaphore`] on drop.
pub struct SemaphorePermit<'a> {
    sem: &'a Semaphore,
}

impl Drop for SemaphorePermit<'_> {
    fn drop(&mut self) {
        self.sem.post();
    }
}
