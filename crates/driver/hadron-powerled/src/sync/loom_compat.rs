//! Loom compatibility shim.
//!
//! Under `cfg(loom)` or `cfg(shuttle)` the driver's atomics come from the
//! model checker so the open/close protocol can be explored; otherwise
//! they are the `core` types.

#[cfg(loom)]
pub(crate) use loom::sync::atomic::{AtomicU8, AtomicU32, Ordering};

#[cfg(all(shuttle, not(loom)))]
pub(crate) use shuttle::sync::atomic::{AtomicU8, AtomicU32, Ordering};

#[cfg(not(any(loom, shuttle)))]
pub(crate) use core::sync::atomic::{AtomicU8, AtomicU32, Ordering};

/// Hint issued inside spin loops. The model checkers only switch threads
/// at their own operations, so a spinning thread must yield explicitly.
#[inline]
pub(crate) fn spin_hint() {
    #[cfg(loom)]
    loom::thread::yield_now();
    #[cfg(all(shuttle, not(loom)))]
    shuttle::thread::yield_now();
    #[cfg(not(any(loom, shuttle)))]
    core::hint::spin_loop();
}
