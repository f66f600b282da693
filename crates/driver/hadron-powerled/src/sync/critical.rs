//! Scoped hardware critical section.

use crate::services::{IrqState, PlatformServices};

/// RAII guard that keeps interrupts masked while alive.
///
/// Entered only around lower-half `setup` and `shutdown`, always while the
/// device's open/close [`Semaphore`](super::Semaphore) permit is held.
pub struct CriticalSection<'a> {
    services: &'a dyn PlatformServices,
    saved: IrqState,
}

impl<'a> CriticalSection<'a> {
    /// Masks interrupts, saving the previous state for restore on drop.
    pub fn enter(services: &'a dyn PlatformServices) -> Self {
        let saved = services.enter_critical_section();
        Self { services, saved }
    }
}

impl Drop for CriticalSection<'_> {
    fn drop(&mut self) {
        self.services.leave_critical_section(self.saved);
    }
}
