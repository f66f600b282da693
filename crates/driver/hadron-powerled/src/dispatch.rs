//! Command vocabulary and dispatcher.
//!
//! [`PowerLed::ioctl`] checks the upper-half policy for each [`Command`]
//! and then forwards it to the lower half. Policy violations never reach
//! the lower half; lower-half results are logged on failure and returned
//! unchanged. No lock is held across the forwarded call.

use crate::error::PowerError;
use crate::session::PowerLed;
use crate::types::{FaultFlags, Limits, OpMode, Params, State};
use crate::{powerled_debug, powerled_err};

const IOC_POWER_BASE: u32 = 0x2a00;

const fn pwrioc(nr: u32) -> u32 {
    IOC_POWER_BASE | nr
}

/// Command number of [`Command::Start`].
pub const PWRIOC_START: u32 = pwrioc(1);
/// Command number of [`Command::Stop`].
pub const PWRIOC_STOP: u32 = pwrioc(2);
/// Command number of [`Command::SetMode`].
pub const PWRIOC_SET_MODE: u32 = pwrioc(3);
/// Command number of [`Command::SetLimits`].
pub const PWRIOC_SET_LIMITS: u32 = pwrioc(4);
/// Command number of [`Command::GetState`].
pub const PWRIOC_GET_STATE: u32 = pwrioc(5);
/// Command number of [`Command::SetFault`].
pub const PWRIOC_SET_FAULT: u32 = pwrioc(6);
/// Command number of [`Command::GetFault`].
pub const PWRIOC_GET_FAULT: u32 = pwrioc(7);
/// Command number of [`Command::CleanFault`].
pub const PWRIOC_CLEAN_FAULT: u32 = pwrioc(8);
/// Command number of [`Command::SetParams`].
pub const PWRIOC_SET_PARAMS: u32 = pwrioc(9);

/// Returns `true` if `cmd` names one of the typed commands.
pub const fn is_reserved(cmd: u32) -> bool {
    cmd >= PWRIOC_START && cmd <= PWRIOC_SET_PARAMS
}

/// Argument of a passthrough command, forwarded to the lower half as-is.
#[derive(Debug, PartialEq, Eq)]
pub enum IoctlArg<'a> {
    /// No argument.
    None,
    /// A scalar argument.
    Value(usize),
    /// A caller-owned input buffer.
    Bytes(&'a [u8]),
    /// A caller-owned output buffer.
    BytesMut(&'a mut [u8]),
}

/// A control request with its typed payload.
#[derive(Debug)]
pub enum Command<'a> {
    /// Enable output. Requires locked, positive limits and a runnable mode.
    Start,
    /// Disable output.
    Stop,
    /// Switch the operating mode.
    SetMode(OpMode),
    /// Apply current limits. Denied once the limits are locked.
    SetLimits(&'a Limits),
    /// Read controller state into the caller's buffer.
    GetState(&'a mut State),
    /// Raise a fault.
    SetFault(FaultFlags),
    /// Read active faults into the caller's buffer.
    GetFault(&'a mut FaultFlags),
    /// Clear a fault.
    CleanFault(FaultFlags),
    /// Apply output parameters. Denied when locked or out of range.
    SetParams(&'a Params),
    /// Any other command number, forwarded to the lower half.
    Passthrough {
        /// Raw command number.
        cmd: u32,
        /// Raw argument.
        arg: IoctlArg<'a>,
    },
}

impl Command<'_> {
    /// Returns the stable command number.
    pub fn number(&self) -> u32 {
        match self {
            Self::Start => PWRIOC_START,
            Self::Stop => PWRIOC_STOP,
            Self::SetMode(_) => PWRIOC_SET_MODE,
            Self::SetLimits(_) => PWRIOC_SET_LIMITS,
            Self::GetState(_) => PWRIOC_GET_STATE,
            Self::SetFault(_) => PWRIOC_SET_FAULT,
            Self::GetFault(_) => PWRIOC_GET_FAULT,
            Self::CleanFault(_) => PWRIOC_CLEAN_FAULT,
            Self::SetParams(_) => PWRIOC_SET_PARAMS,
            Self::Passthrough { cmd, .. } => *cmd,
        }
    }

    /// Returns the command name used in log messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::Stop => "STOP",
            Self::SetMode(_) => "SET_MODE",
            Self::SetLimits(_) => "SET_LIMITS",
            Self::GetState(_) => "GET_STATE",
            Self::SetFault(_) => "SET_FAULT",
            Self::GetFault(_) => "GET_FAULT",
            Self::CleanFault(_) => "CLEAN_FAULT",
            Self::SetParams(_) => "SET_PARAMS",
            Self::Passthrough { .. } => "PASSTHROUGH",
        }
    }
}

impl PowerLed {
    /// Checks policy for `cmd` and forwards it to the lower half.
    ///
    /// Returns `Ok(0)` for the typed commands and the lower half's value
    /// for passthrough commands. Policy violations return
    /// [`PowerError::PermissionDenied`] without touching the lower half.
    /// A [`Command::Passthrough`] carrying a typed command's number is
    /// rejected with [`PowerError::InvalidArgument`] so it cannot bypass
    /// that command's checks.
    pub fn ioctl(&self, cmd: Command<'_>) -> Result<usize, PowerError> {
        let name = cmd.name();
        let ctl = self.control();
        let ops = self.ops();

        let result = match cmd {
            Command::Start => {
                let cb = ctl.snapshot();
                let current_positive = cb.limits.current > 0.0;
                if !cb.limits.lock || !current_positive {
                    powerled_err!("limits must be set and locked before start");
                    return Err(PowerError::PermissionDenied);
                }
                if !cb.mode.is_runnable() {
                    powerled_err!("unsupported mode {}", cb.mode);
                    return Err(PowerError::PermissionDenied);
                }
                ops.start(ctl)
            }
            Command::Stop => ops.stop(ctl),
            Command::SetMode(mode) => ops.mode_set(ctl, mode),
            Command::SetLimits(limits) => {
                if ctl.limits().lock {
                    powerled_err!("limits locked");
                    return Err(PowerError::PermissionDenied);
                }
                ops.limits_set(ctl, limits)
            }
            Command::GetState(state) => ops.state_get(ctl, state),
            Command::SetFault(fault) => ops.fault_set(ctl, fault),
            Command::GetFault(fault) => ops.fault_get(ctl, fault),
            Command::CleanFault(fault) => ops.fault_clean(ctl, fault),
            Command::SetParams(params) => {
                if ctl.params().lock {
                    powerled_err!("params locked");
                    return Err(PowerError::PermissionDenied);
                }
                if params.validate().is_err() {
                    powerled_err!(
                        "invalid params brightness={} frequency={} duty={}",
                        params.brightness,
                        params.frequency,
                        params.duty
                    );
                    return Err(PowerError::PermissionDenied);
                }
                ops.params_set(ctl, params)
            }
            Command::Passthrough { cmd, arg } => {
                if is_reserved(cmd) {
                    powerled_err!("passthrough of reserved cmd {:#x}", cmd);
                    return Err(PowerError::InvalidArgument);
                }
                powerled_debug!("forwarding unrecognized cmd {:#x} arg {:?}", cmd, arg);
                return ops.ioctl(ctl, cmd, arg).inspect_err(|err| {
                    powerled_debug!("cmd {:#x} returned {}", cmd, err);
                });
            }
        };

        result.map(|()| 0).inspect_err(|err| {
            powerled_err!("{} failed: {}", name, err);
        })
    }
}
