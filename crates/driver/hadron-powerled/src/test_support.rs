//! Host doubles for the platform and a recording lower half.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use crate::config::PowerLedConfig;
use crate::control::Control;
use crate::dispatch::IoctlArg;
use crate::error::PowerError;
use crate::ops::{OpSet, PowerLedOps};
use crate::services::{IrqState, PlatformServices};
use crate::session::PowerLed;
use crate::sync::SpinLock;
use crate::types::{FaultFlags, LedState, Limits, OpMode, Params, State};

/// Platform double that tracks critical-section nesting and can fail
/// blocked waits on demand.
pub(crate) struct TestServices {
    depth: AtomicUsize,
    entries: AtomicUsize,
    wait_error: SpinLock<Option<PowerError>>,
}

impl TestServices {
    pub(crate) fn new() -> Self {
        Self {
            depth: AtomicUsize::new(0),
            entries: AtomicUsize::new(0),
            wait_error: SpinLock::new(None),
        }
    }

    /// Makes every blocked wait fail with `err` until cleared.
    pub(crate) fn interrupt_waits(&self, err: PowerError) {
        *self.wait_error.lock() = Some(err);
    }

    pub(crate) fn clear_interrupt(&self) {
        *self.wait_error.lock() = None;
    }

    pub(crate) fn critical_depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    pub(crate) fn critical_entries(&self) -> usize {
        self.entries.load(Ordering::SeqCst)
    }
}

impl PlatformServices for TestServices {
    fn enter_critical_section(&self) -> IrqState {
        self.entries.fetch_add(1, Ordering::SeqCst);
        let prev = self.depth.fetch_add(1, Ordering::SeqCst);
        IrqState::new(prev as u64)
    }

    fn leave_critical_section(&self, saved: IrqState) {
        let prev = self.depth.fetch_sub(1, Ordering::SeqCst);
        assert_eq!(saved.as_u64(), (prev - 1) as u64, "unbalanced critical section");
    }

    fn check_wait(&self) -> Result<(), PowerError> {
        match *self.wait_error.lock() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn relax(&self) {
        std::thread::yield_now();
    }
}

/// Lower half that records every call and mirrors accepted values into
/// the control block.
pub(crate) struct MockLed {
    services: Arc<TestServices>,
    calls: [AtomicU32; 12],
    failures: SpinLock<Vec<(OpSet, PowerError)>>,
    ioctl_reply: SpinLock<Result<usize, PowerError>>,
    last_ioctl: SpinLock<Option<(u32, Option<usize>)>>,
    ignore_limits_lock: AtomicBool,
    setup_depth: AtomicUsize,
    shutdown_depth: AtomicUsize,
}

impl MockLed {
    pub(crate) fn new(services: Arc<TestServices>) -> Self {
        Self {
            services,
            calls: [const { AtomicU32::new(0) }; 12],
            failures: SpinLock::new(Vec::new()),
            ioctl_reply: SpinLock::new(Ok(0)),
            last_ioctl: SpinLock::new(None),
            ignore_limits_lock: AtomicBool::new(false),
            setup_depth: AtomicUsize::new(0),
            shutdown_depth: AtomicUsize::new(0),
        }
    }

    /// Number of times `op` was called.
    pub(crate) fn calls(&self, op: OpSet) -> u32 {
        self.calls[Self::slot(op)].load(Ordering::SeqCst)
    }

    /// Makes the next call to `op` fail with `err`.
    pub(crate) fn fail_next(&self, op: OpSet, err: PowerError) {
        self.failures.lock().push((op, err));
    }

    pub(crate) fn set_ioctl_reply(&self, reply: Result<usize, PowerError>) {
        *self.ioctl_reply.lock() = reply;
    }

    pub(crate) fn last_ioctl(&self) -> Option<(u32, Option<usize>)> {
        *self.last_ioctl.lock()
    }

    /// Stores limits without ever latching the lock.
    pub(crate) fn ignore_limits_lock(&self) {
        self.ignore_limits_lock.store(true, Ordering::SeqCst);
    }

    /// Critical-section depth observed by the last `setup`.
    pub(crate) fn setup_depth(&self) -> usize {
        self.setup_depth.load(Ordering::SeqCst)
    }

    /// Critical-section depth observed by the last `shutdown`.
    pub(crate) fn shutdown_depth(&self) -> usize {
        self.shutdown_depth.load(Ordering::SeqCst)
    }

    fn slot(op: OpSet) -> usize {
        op.bits().trailing_zeros() as usize
    }

    fn record(&self, op: OpSet) -> Result<(), PowerError> {
        self.calls[Self::slot(op)].fetch_add(1, Ordering::SeqCst);
        let mut failures = self.failures.lock();
        match failures.iter().position(|&(failing, _)| failing == op) {
            Some(idx) => Err(failures.remove(idx).1),
            None => Ok(()),
        }
    }
}

impl PowerLedOps for MockLed {
    fn setup(&self, ctl: &Control) -> Result<(), PowerError> {
        self.setup_depth
            .store(self.services.critical_depth(), Ordering::SeqCst);
        self.record(OpSet::SETUP)?;
        ctl.set_state(LedState::Idle);
        Ok(())
    }

    fn shutdown(&self, ctl: &Control) -> Result<(), PowerError> {
        self.shutdown_depth
            .store(self.services.critical_depth(), Ordering::SeqCst);
        self.record(OpSet::SHUTDOWN)?;
        ctl.set_state(LedState::Init);
        Ok(())
    }

    fn start(&self, ctl: &Control) -> Result<(), PowerError> {
        self.record(OpSet::START)?;
        ctl.set_state(LedState::Run);
        Ok(())
    }

    fn stop(&self, ctl: &Control) -> Result<(), PowerError> {
        self.record(OpSet::STOP)?;
        ctl.set_state(LedState::Idle);
        Ok(())
    }

    fn mode_set(&self, ctl: &Control, mode: OpMode) -> Result<(), PowerError> {
        self.record(OpSet::MODE_SET)?;
        ctl.set_mode(mode);
        Ok(())
    }

    fn limits_set(&self, ctl: &Control, limits: &Limits) -> Result<(), PowerError> {
        self.record(OpSet::LIMITS_SET)?;
        if self.ignore_limits_lock.load(Ordering::SeqCst) {
            ctl.store_limits(&Limits {
                lock: false,
                ..*limits
            })
        } else {
            ctl.store_limits(limits)
        }
    }

    fn params_set(&self, ctl: &Control, params: &Params) -> Result<(), PowerError> {
        self.record(OpSet::PARAMS_SET)?;
        ctl.store_params(params)
    }

    fn fault_set(&self, ctl: &Control, fault: FaultFlags) -> Result<(), PowerError> {
        self.record(OpSet::FAULT_SET)?;
        ctl.raise_fault(fault);
        Ok(())
    }

    fn fault_get(&self, ctl: &Control, fault: &mut FaultFlags) -> Result<(), PowerError> {
        self.record(OpSet::FAULT_GET)?;
        *fault = ctl.faults();
        Ok(())
    }

    fn fault_clean(&self, ctl: &Control, fault: FaultFlags) -> Result<(), PowerError> {
        self.record(OpSet::FAULT_CLEAN)?;
        ctl.clear_fault(fault);
        Ok(())
    }

    fn state_get(&self, ctl: &Control, state: &mut State) -> Result<(), PowerError> {
        self.record(OpSet::STATE_GET)?;
        *state = ctl.state();
        Ok(())
    }

    fn ioctl(&self, _ctl: &Control, cmd: u32, arg: IoctlArg<'_>) -> Result<usize, PowerError> {
        self.record(OpSet::IOCTL)?;
        let value = match arg {
            IoctlArg::Value(v) => Some(v),
            IoctlArg::BytesMut(buf) => {
                buf.fill(0xa5);
                None
            }
            IoctlArg::None | IoctlArg::Bytes(_) => None,
        };
        *self.last_ioctl.lock() = Some((cmd, value));
        *self.ioctl_reply.lock()
    }
}

/// A device with the default configuration over a fresh [`MockLed`].
pub(crate) fn powerled() -> (PowerLed, Arc<MockLed>) {
    let (dev, led, _) = powerled_with(PowerLedConfig::default());
    (dev, led)
}

/// A device with `config`, returning the lower half and platform handles.
pub(crate) fn powerled_with(config: PowerLedConfig) -> (PowerLed, Arc<MockLed>, Arc<TestServices>) {
    let services = Arc::new(TestServices::new());
    let led = Arc::new(MockLed::new(services.clone()));
    let dev = PowerLed::new(Box::new(led.clone()), services.clone(), config);
    (dev, led, services)
}
