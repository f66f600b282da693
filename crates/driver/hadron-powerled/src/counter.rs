//! Bounded open reference counter.

use crate::error::PowerError;
use crate::sync::loom_compat::{AtomicU8, Ordering};

/// Number of open references to a device, bounded by a configured maximum.
///
/// Mutations are only made while holding the device's open/close permit;
/// the atomic lets [`PowerLed::open_count`](crate::PowerLed::open_count)
/// read it from any thread without taking that permit.
pub struct OpenCount {
    count: AtomicU8,
    max: u8,
}

impl OpenCount {
    /// Creates a zeroed counter that admits at most `max` references.
    pub fn new(max: u8) -> Self {
        Self {
            count: AtomicU8::new(0),
            max,
        }
    }

    /// Returns the current count.
    pub fn get(&self) -> u8 {
        self.count.load(Ordering::Acquire)
    }

    /// Returns the configured maximum.
    pub fn max(&self) -> u8 {
        self.max
    }

    /// Computes the count one more open would produce, without storing it.
    ///
    /// Fails with [`PowerError::TooManyOpens`] instead of wrapping.
    pub fn next(&self) -> Result<u8, PowerError> {
        self.get()
            .checked_add(1)
            .filter(|&next| next <= self.max)
            .ok_or(PowerError::TooManyOpens)
    }

    /// Stores a count previously obtained from [`next`](Self::next).
    pub fn commit(&self, value: u8) {
        debug_assert!(value <= self.max);
        self.count.store(value, Ordering::Release);
    }

    /// Drops one reference, saturating at zero. Returns the new count.
    pub fn decrement(&self) -> u8 {
        let next = self.get().saturating_sub(1);
        self.count.store(next, Ordering::Release);
        next
    }
}
