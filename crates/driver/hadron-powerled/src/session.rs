//! Per-device session state.

use alloc::boxed::Box;
use alloc::sync::Arc;

use crate::config::PowerLedConfig;
use crate::control::Control;
use crate::counter::OpenCount;
use crate::ops::PowerLedOps;
use crate::services::PlatformServices;
use crate::sync::Semaphore;

/// A registered power LED device.
///
/// Owns the lower half, the shared control block and the open/close
/// bookkeeping. Created by [`register`](crate::register); the open and
/// close paths live in [`lifecycle`](crate::lifecycle) and command
/// dispatch in [`dispatch`](crate::dispatch).
pub struct PowerLed {
    pub(crate) ocount: OpenCount,
    pub(crate) guard: Semaphore,
    ops: Box<dyn PowerLedOps>,
    control: Control,
    pub(crate) services: Arc<dyn PlatformServices>,
    pub(crate) config: PowerLedConfig,
}

impl PowerLed {
    pub(crate) fn new(
        ops: Box<dyn PowerLedOps>,
        services: Arc<dyn PlatformServices>,
        config: PowerLedConfig,
    ) -> Self {
        Self {
            ocount: OpenCount::new(config.max_opens),
            guard: Semaphore::new(1),
            ops,
            control: Control::new(),
            services,
            config,
        }
    }

    /// Returns the shared control block.
    pub fn control(&self) -> &Control {
        &self.control
    }

    /// Returns the lower half.
    pub fn ops(&self) -> &dyn PowerLedOps {
        self.ops.as_ref()
    }

    /// Returns the configuration the device was registered with.
    pub fn config(&self) -> PowerLedConfig {
        self.config
    }

    /// Returns the number of open references.
    pub fn open_count(&self) -> u8 {
        self.ocount.get()
    }

    /// Returns `true` while at least one reference is open, i.e. the
    /// hardware has been set up and not yet shut down.
    pub fn is_live(&self) -> bool {
        self.open_count() > 0
    }
}

impl core::fmt::Debug for PowerLed {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PowerLed")
            .field("open_count", &self.open_count())
            .field("control", &self.control.snapshot())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
