//! Kernel service contract for the driver.
//!
//! The driver does not depend on the kernel crate. Interrupt masking and
//! blocking are provided by the kernel through [`PlatformServices`],
//! passed in at registration.

use crate::error::PowerError;

/// Saved interrupt state returned by
/// [`PlatformServices::enter_critical_section`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct IrqState(u64);

impl IrqState {
    /// Wraps a raw saved-flags value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw saved-flags value.
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

/// Services the kernel provides to the power LED driver.
pub trait PlatformServices: Send + Sync {
    /// Disables interrupts on the current CPU and returns the previous state.
    fn enter_critical_section(&self) -> IrqState;

    /// Restores the interrupt state saved by
    /// [`enter_critical_section`](Self::enter_critical_section).
    fn leave_critical_section(&self, state: IrqState);

    /// Called by a blocked waiter before each retry.
    ///
    /// Returns an error (typically [`PowerError::Interrupted`]) if the
    /// wait must be abandoned, e.g. because a signal is pending for the
    /// calling task.
    fn check_wait(&self) -> Result<(), PowerError>;

    /// Gives up the CPU while a waiter is blocked.
    fn relax(&self) {
        core::hint::spin_loop();
    }
}
