//! Lower-half operations contract.
//!
//! A lower half implements [`PowerLedOps`] directly, or fills in a static
//! [`OpsTable`] of function pointers and wraps it with its private state in
//! a [`TableDriver`]. Either way, registration checks once that all twelve
//! operations are present; the dispatcher never re-checks per call.

use alloc::sync::Arc;

use crate::control::Control;
use crate::dispatch::IoctlArg;
use crate::error::PowerError;
use crate::types::{FaultFlags, Limits, OpMode, Params, State};

bitflags::bitflags! {
    /// The set of operations a lower half provides.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpSet: u16 {
        /// One-time hardware initialization on first open.
        const SETUP = 1 << 0;
        /// Hardware teardown on last close.
        const SHUTDOWN = 1 << 1;
        /// Enable output.
        const START = 1 << 2;
        /// Disable output.
        const STOP = 1 << 3;
        /// Change operating mode.
        const MODE_SET = 1 << 4;
        /// Apply current limits.
        const LIMITS_SET = 1 << 5;
        /// Apply output parameters.
        const PARAMS_SET = 1 << 6;
        /// Raise a fault.
        const FAULT_SET = 1 << 7;
        /// Read active faults.
        const FAULT_GET = 1 << 8;
        /// Clear a fault.
        const FAULT_CLEAN = 1 << 9;
        /// Read controller state.
        const STATE_GET = 1 << 10;
        /// Driver-specific command passthrough.
        const IOCTL = 1 << 11;
    }
}

/// Operations every power LED lower half must provide.
///
/// Each method receives the device's shared [`Control`] block, which the
/// lower half updates to reflect what it actually applied (for example,
/// [`limits_set`](Self::limits_set) is responsible for storing and locking
/// the limits).
///
/// Methods may be called concurrently from different openers; the upper
/// half only serializes `setup` and `shutdown`.
pub trait PowerLedOps: Send + Sync {
    /// Initializes the hardware. Runs with interrupts masked.
    fn setup(&self, ctl: &Control) -> Result<(), PowerError>;

    /// Shuts the hardware down. Runs with interrupts masked.
    fn shutdown(&self, ctl: &Control) -> Result<(), PowerError>;

    /// Enables output using the locked limits and current parameters.
    fn start(&self, ctl: &Control) -> Result<(), PowerError>;

    /// Disables output.
    fn stop(&self, ctl: &Control) -> Result<(), PowerError>;

    /// Switches the operating mode.
    fn mode_set(&self, ctl: &Control, mode: OpMode) -> Result<(), PowerError>;

    /// Applies and records new current limits.
    fn limits_set(&self, ctl: &Control, limits: &Limits) -> Result<(), PowerError>;

    /// Applies and records new output parameters.
    fn params_set(&self, ctl: &Control, params: &Params) -> Result<(), PowerError>;

    /// Raises a fault.
    fn fault_set(&self, ctl: &Control, fault: FaultFlags) -> Result<(), PowerError>;

    /// Reports the active faults.
    fn fault_get(&self, ctl: &Control, fault: &mut FaultFlags) -> Result<(), PowerError>;

    /// Clears a fault.
    fn fault_clean(&self, ctl: &Control, fault: FaultFlags) -> Result<(), PowerError>;

    /// Reports controller state.
    fn state_get(&self, ctl: &Control, state: &mut State) -> Result<(), PowerError>;

    /// Handles a command the upper half does not recognize.
    fn ioctl(&self, ctl: &Control, cmd: u32, arg: IoctlArg<'_>) -> Result<usize, PowerError>;

    /// Returns the operations this lower half actually implements.
    ///
    /// Trait implementations provide everything by construction; table
    /// drivers report which function pointers are filled in.
    fn provided(&self) -> OpSet {
        OpSet::all()
    }
}

/// Signature of a table operation taking no argument.
pub type BasicOp<L> = fn(&L, &Control) -> Result<(), PowerError>;
/// Signature of a table operation taking a value argument.
pub type ValueOp<L, T> = fn(&L, &Control, T) -> Result<(), PowerError>;
/// Signature of a table operation taking a shared reference.
pub type RefOp<L, T> = fn(&L, &Control, &T) -> Result<(), PowerError>;
/// Signature of a table operation filling in a caller-owned value.
pub type OutOp<L, T> = fn(&L, &Control, &mut T) -> Result<(), PowerError>;
/// Signature of the table passthrough operation.
pub type IoctlOp<L> = fn(&L, &Control, u32, IoctlArg<'_>) -> Result<usize, PowerError>;

/// Function-pointer operations table for a lower half with private state `L`.
///
/// Usually a `static`, built from [`OpsTable::EMPTY`]:
///
/// ```ignore
/// static OPS: OpsTable<MyLed> = OpsTable {
///     setup: Some(MyLed::setup),
///     shutdown: Some(MyLed::shutdown),
///     ..OpsTable::EMPTY
/// };
/// ```
pub struct OpsTable<L> {
    /// See [`PowerLedOps::setup`].
    pub setup: Option<BasicOp<L>>,
    /// See [`PowerLedOps::shutdown`].
    pub shutdown: Option<BasicOp<L>>,
    /// See [`PowerLedOps::start`].
    pub start: Option<BasicOp<L>>,
    /// See [`PowerLedOps::stop`].
    pub stop: Option<BasicOp<L>>,
    /// See [`PowerLedOps::mode_set`].
    pub mode_set: Option<ValueOp<L, OpMode>>,
    /// See [`PowerLedOps::limits_set`].
    pub limits_set: Option<RefOp<L, Limits>>,
    /// See [`PowerLedOps::params_set`].
    pub params_set: Option<RefOp<L, Params>>,
    /// See [`PowerLedOps::fault_set`].
    pub fault_set: Option<ValueOp<L, FaultFlags>>,
    /// See [`PowerLedOps::fault_get`].
    pub fault_get: Option<OutOp<L, FaultFlags>>,
    /// See [`PowerLedOps::fault_clean`].
    pub fault_clean: Option<ValueOp<L, FaultFlags>>,
    /// See [`PowerLedOps::state_get`].
    pub state_get: Option<OutOp<L, State>>,
    /// See [`PowerLedOps::ioctl`].
    pub ioctl: Option<IoctlOp<L>>,
}

impl<L> OpsTable<L> {
    /// A table with no operations filled in.
    pub const EMPTY: Self = Self {
        setup: None,
        shutdown: None,
        start: None,
        stop: None,
        mode_set: None,
        limits_set: None,
        params_set: None,
        fault_set: None,
        fault_get: None,
        fault_clean: None,
        state_get: None,
        ioctl: None,
    };

    /// Returns the set of operations filled in.
    pub fn provided(&self) -> OpSet {
        let present = [
            (OpSet::SETUP, self.setup.is_some()),
            (OpSet::SHUTDOWN, self.shutdown.is_some()),
            (OpSet::START, self.start.is_some()),
            (OpSet::STOP, self.stop.is_some()),
            (OpSet::MODE_SET, self.mode_set.is_some()),
            (OpSet::LIMITS_SET, self.limits_set.is_some()),
            (OpSet::PARAMS_SET, self.params_set.is_some()),
            (OpSet::FAULT_SET, self.fault_set.is_some()),
            (OpSet::FAULT_GET, self.fault_get.is_some()),
            (OpSet::FAULT_CLEAN, self.fault_clean.is_some()),
            (OpSet::STATE_GET, self.state_get.is_some()),
            (OpSet::IOCTL, self.ioctl.is_some()),
        ];
        present
            .into_iter()
            .filter(|&(_, some)| some)
            .fold(OpSet::empty(), |set, (op, _)| set | op)
    }
}

/// A lower half made of a static [`OpsTable`] and its private state.
pub struct TableDriver<L: 'static> {
    table: &'static OpsTable<L>,
    lower: L,
}

impl<L: 'static> TableDriver<L> {
    /// Pairs `table` with the lower-half state it operates on.
    pub const fn new(table: &'static OpsTable<L>, lower: L) -> Self {
        Self { table, lower }
    }

    /// Returns the lower-half private state.
    pub fn lower(&self) -> &L {
        &self.lower
    }
}

// Missing entries are rejected at registration, so `Unsupported` is only
// reachable for tables used outside `register`.
impl<L: Send + Sync + 'static> PowerLedOps for TableDriver<L> {
    fn setup(&self, ctl: &Control) -> Result<(), PowerError> {
        self.table
            .setup
            .map_or(Err(PowerError::Unsupported), |op| op(&self.lower, ctl))
    }

    fn shutdown(&self, ctl: &Control) -> Result<(), PowerError> {
        self.table
            .shutdown
            .map_or(Err(PowerError::Unsupported), |op| op(&self.lower, ctl))
    }

    fn start(&self, ctl: &Control) -> Result<(), PowerError> {
        self.table
            .start
            .map_or(Err(PowerError::Unsupported), |op| op(&self.lower, ctl))
    }

    fn stop(&self, ctl: &Control) -> Result<(), PowerError> {
        self.table
            .stop
            .map_or(Err(PowerError::Unsupported), |op| op(&self.lower, ctl))
    }

    fn mode_set(&self, ctl: &Control, mode: OpMode) -> Result<(), PowerError> {
        self.table
            .mode_set
            .map_or(Err(PowerError::Unsupported), |op| op(&self.lower, ctl, mode))
    }

    fn limits_set(&self, ctl: &Control, limits: &Limits) -> Result<(), PowerError> {
        self.table
            .limits_set
            .map_or(Err(PowerError::Unsupported), |op| {
                op(&self.lower, ctl, limits)
            })
    }

    fn params_set(&self, ctl: &Control, params: &Params) -> Result<(), PowerError> {
        self.table
            .params_set
            .map_or(Err(PowerError::Unsupported), |op| {
                op(&self.lower, ctl, params)
            })
    }

    fn fault_set(&self, ctl: &Control, fault: FaultFlags) -> Result<(), PowerError> {
        self.table
            .fault_set
            .map_or(Err(PowerError::Unsupported), |op| op(&self.lower, ctl, fault))
    }

    fn fault_get(&self, ctl: &Control, fault: &mut FaultFlags) -> Result<(), PowerError> {
        self.table
            .fault_get
            .map_or(Err(PowerError::Unsupported), |op| op(&self.lower, ctl, fault))
    }

    fn fault_clean(&self, ctl: &Control, fault: FaultFlags) -> Result<(), PowerError> {
        self.table
            .fault_clean
            .map_or(Err(PowerError::Unsupported), |op| op(&self.lower, ctl, fault))
    }

    fn state_get(&self, ctl: &Control, state: &mut State) -> Result<(), PowerError> {
        self.table
            .state_get
            .map_or(Err(PowerError::Unsupported), |op| op(&self.lower, ctl, state))
    }

    fn ioctl(&self, ctl: &Control, cmd: u32, arg: IoctlArg<'_>) -> Result<usize, PowerError> {
        self.table
            .ioctl
            .map_or(Err(PowerError::Unsupported), |op| {
                op(&self.lower, ctl, cmd, arg)
            })
    }

    fn provided(&self) -> OpSet {
        self.table.provided()
    }
}

/// Shared lower halves, so the owner can keep a handle after registration.
impl<T: PowerLedOps + ?Sized> PowerLedOps for Arc<T> {
    fn setup(&self, ctl: &Control) -> Result<(), PowerError> {
        (**self).setup(ctl)
    }

    fn shutdown(&self, ctl: &Control) -> Result<(), PowerError> {
        (**self).shutdown(ctl)
    }

    fn start(&self, ctl: &Control) -> Result<(), PowerError> {
        (**self).start(ctl)
    }

    fn stop(&self, ctl: &Control) -> Result<(), PowerError> {
        (**self).stop(ctl)
    }

    fn mode_set(&self, ctl: &Control, mode: OpMode) -> Result<(), PowerError> {
        (**self).mode_set(ctl, mode)
    }

    fn limits_set(&self, ctl: &Control, limits: &Limits) -> Result<(), PowerError> {
        (**self).limits_set(ctl, limits)
    }

    fn params_set(&self, ctl: &Control, params: &Params) -> Result<(), PowerError> {
        (**self).params_set(ctl, params)
    }

    fn fault_set(&self, ctl: &Control, fault: FaultFlags) -> Result<(), PowerError> {
        (**self).fault_set(ctl, fault)
    }

    fn fault_get(&self, ctl: &Control, fault: &mut FaultFlags) -> Result<(), PowerError> {
        (**self).fault_get(ctl, fault)
    }

    fn fault_clean(&self, ctl: &Control, fault: FaultFlags) -> Result<(), PowerError> {
        (**self).fault_clean(ctl, fault)
    }

    fn state_get(&self, ctl: &Control, state: &mut State) -> Result<(), PowerError> {
        (**self).state_get(ctl, state)
    }

    fn ioctl(&self, ctl: &Control, cmd: u32, arg: IoctlArg<'_>) -> Result<usize, PowerError> {
        (**self).ioctl(ctl, cmd, arg)
    }

    fn provided(&self) -> OpSet {
        (**self).provided()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        starts: std::sync::atomic::AtomicU32,
    }

    fn ok(_: &Counter, _: &Control) -> Result<(), PowerError> {
        Ok(())
    }

    fn count_start(lower: &Counter, _: &Control) -> Result<(), PowerError> {
        lower
            .starts
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        Ok(())
    }

    static PARTIAL: OpsTable<Counter> = OpsTable {
        setup: Some(ok),
        start: Some(count_start),
        ..OpsTable::EMPTY
    };

    #[test]
    fn empty_table_provides_nothing() {
        let table: OpsTable<Counter> = OpsTable::EMPTY;
        assert!(table.provided().is_empty());
    }

    #[test]
    fn partial_table_reports_filled_entries() {
        assert_eq!(PARTIAL.provided(), OpSet::SETUP | OpSet::START);
    }

    #[test]
    fn table_driver_calls_through_with_lower_state() {
        let driver = TableDriver::new(
            &PARTIAL,
            Counter {
                starts: std::sync::atomic::AtomicU32::new(0),
            },
        );
        let ctl = Control::new();
        assert_eq!(driver.start(&ctl), Ok(()));
        assert_eq!(driver.start(&ctl), Ok(()));
        assert_eq!(
            driver
                .lower()
                .starts
                .load(std::sync::atomic::Ordering::Relaxed),
            2
        );
    }

    #[test]
    fn missing_table_entry_is_unsupported() {
        let driver = TableDriver::new(
            &PARTIAL,
            Counter {
                starts: std::sync::atomic::AtomicU32::new(0),
            },
        );
        assert_eq!(driver.stop(&Control::new()), Err(PowerError::Unsupported));
        assert_eq!(
            driver.ioctl(&Control::new(), 0x99, IoctlArg::Value(1)),
            Err(PowerError::Unsupported)
        );
    }
}
