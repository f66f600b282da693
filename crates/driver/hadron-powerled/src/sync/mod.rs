//! Synchronization primitives used by the driver.
//!
//! - [`SpinLock`] protects the control block and the device table.
//! - [`Semaphore`] is the per-device open/close guard; waiting on it
//!   blocks through [`PlatformServices`](crate::PlatformServices) and can
//!   be cancelled by the platform.
//! - [`CriticalSection`] masks interrupts around hardware setup and
//!   teardown.

mod critical;
mod semaphore;
mod spinlock;

pub(crate) mod loom_compat;

pub use critical::CriticalSection;
pub use semaphore::{Semaphore, SemaphorePermit};
pub use spinlock::{SpinLock, SpinLockGuard};
