//! Shared control block handle.
//!
//! The upper half reads the control block to enforce policy before each
//! command; the lower half writes it when it accepts new limits,
//! parameters, modes or faults. [`Control`] mediates both sides and keeps
//! the lock latches monotonic: nothing written through it can turn a
//! `true` lock back into `false`.

use crate::error::PowerError;
use crate::sync::SpinLock;
use crate::types::{ControlBlock, FaultFlags, LedState, Limits, OpMode, Params, State};

/// Interior-mutable control block shared by the upper and lower halves.
pub struct Control {
    inner: SpinLock<ControlBlock>,
}

impl Control {
    /// Creates a zeroed, unlocked control block.
    pub const fn new() -> Self {
        Self {
            inner: SpinLock::new(ControlBlock {
                mode: OpMode::INIT,
                limits: Limits {
                    current: 0.0,
                    lock: false,
                },
                params: Params {
                    brightness: 0.0,
                    frequency: 0.0,
                    duty: 0.0,
                    lock: false,
                },
                state: LedState::Init,
                fault: FaultFlags::empty(),
            }),
        }
    }

    /// Returns a copy of the current control block.
    pub fn snapshot(&self) -> ControlBlock {
        *self.inner.lock()
    }

    /// Returns the current operating mode.
    pub fn mode(&self) -> OpMode {
        self.inner.lock().mode
    }

    /// Records a new operating mode.
    pub fn set_mode(&self, mode: OpMode) {
        self.inner.lock().mode = mode;
    }

    /// Returns the current limits.
    pub fn limits(&self) -> Limits {
        self.inner.lock().limits
    }

    /// Stores new limits.
    ///
    /// Fails with [`PowerError::PermissionDenied`] once the limits are
    /// locked. Passing `lock: true` latches them.
    pub fn store_limits(&self, limits: &Limits) -> Result<(), PowerError> {
        let mut cb = self.inner.lock();
        if cb.limits.lock {
            return Err(PowerError::PermissionDenied);
        }
        cb.limits = *limits;
        Ok(())
    }

    /// Returns the current parameters.
    pub fn params(&self) -> Params {
        self.inner.lock().params
    }

    /// Stores new parameters.
    ///
    /// Fails with [`PowerError::PermissionDenied`] once the parameters are
    /// locked. Passing `lock: true` latches them.
    pub fn store_params(&self, params: &Params) -> Result<(), PowerError> {
        let mut cb = self.inner.lock();
        if cb.params.lock {
            return Err(PowerError::PermissionDenied);
        }
        cb.params = *params;
        Ok(())
    }

    /// Returns the controller state and active faults.
    pub fn state(&self) -> State {
        let cb = self.inner.lock();
        State {
            state: cb.state,
            fault: cb.fault,
        }
    }

    /// Records a new controller state.
    pub fn set_state(&self, state: LedState) {
        self.inner.lock().state = state;
    }

    /// Returns the active faults.
    pub fn faults(&self) -> FaultFlags {
        self.inner.lock().fault
    }

    /// Adds `fault` to the active faults.
    pub fn raise_fault(&self, fault: FaultFlags) {
        self.inner.lock().fault.insert(fault);
    }

    /// Removes `fault` from the active faults.
    pub fn clear_fault(&self, fault: FaultFlags) {
        self.inner.lock().fault.remove(fault);
    }
}

impl Default for Control {
    fn default() -> Self {
        Self::new()
    }
}
