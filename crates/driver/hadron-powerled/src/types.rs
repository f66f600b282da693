//! Control block data model shared by the upper and lower halves.

use core::fmt;

use crate::error::PowerError;

/// LED operating mode.
///
/// Carried as a raw byte: `SET_MODE` passes any value through to the
/// lower half, and only [`OpMode::CONTINUOUS`] and [`OpMode::FLASH`] are
/// accepted by `START`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct OpMode(u8);

impl OpMode {
    /// Mode before the lower half has been configured.
    pub const INIT: Self = Self(0);
    /// Constant output at the configured brightness.
    pub const CONTINUOUS: Self = Self(1);
    /// Flashing at the configured frequency and duty cycle.
    pub const FLASH: Self = Self(2);

    /// Creates a mode from its raw byte.
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    /// Returns the raw byte.
    pub const fn as_u8(self) -> u8 {
        self.0
    }

    /// Returns `true` if the LED may be started in this mode.
    pub const fn is_runnable(self) -> bool {
        self.0 == Self::CONTINUOUS.0 || self.0 == Self::FLASH.0
    }
}

impl fmt::Display for OpMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::INIT => f.write_str("init"),
            Self::CONTINUOUS => f.write_str("continuous"),
            Self::FLASH => f.write_str("flash"),
            Self(raw) => write!(f, "mode({raw})"),
        }
    }
}

bitflags::bitflags! {
    /// Fault conditions reported by the lower half.
    ///
    /// Travels through the command interface as a single byte; bits
    /// without a name are preserved so driver-specific faults survive
    /// the round trip.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FaultFlags: u8 {
        /// Junction or heatsink overheat.
        const OVERHEAT = 1 << 0;
        /// Output current above the locked limit.
        const OVERCURRENT = 1 << 1;
        /// Supply voltage out of range.
        const OVERVOLTAGE = 1 << 2;
        /// Lower-half hardware fault.
        const HARDWARE = 1 << 3;
    }
}

impl FaultFlags {
    /// Creates a fault set from a raw byte, keeping unknown bits.
    pub const fn from_raw(raw: u8) -> Self {
        Self::from_bits_retain(raw)
    }
}

/// Coarse LED controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum LedState {
    /// Not yet set up.
    #[default]
    Init = 0,
    /// Set up, output off.
    Idle = 1,
    /// Output running.
    Run = 2,
    /// A fault was raised; output stopped.
    Fault = 3,
    /// A fault was raised that requires a full shutdown.
    Critical = 4,
}

/// Snapshot returned by `GET_STATE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct State {
    /// Controller state.
    pub state: LedState,
    /// Active faults.
    pub fault: FaultFlags,
}

/// Output current limit.
///
/// Must be set and locked before the LED may be started.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Limits {
    /// Maximum output current, in amperes.
    pub current: f32,
    /// Once set, the limits can no longer be changed.
    pub lock: bool,
}

/// Output parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Params {
    /// Brightness in percent, `0..=100`.
    pub brightness: f32,
    /// Flash frequency in hertz, `>= 0`.
    pub frequency: f32,
    /// Flash duty cycle in percent, `0..=100`.
    pub duty: f32,
    /// Once set, the parameters can no longer be changed.
    pub lock: bool,
}

impl Params {
    /// Checks that every field is within its allowed range.
    ///
    /// NaN is out of range for every field.
    pub fn validate(&self) -> Result<(), PowerError> {
        let percent = 0.0..=100.0;
        if percent.contains(&self.brightness)
            && self.frequency >= 0.0
            && percent.contains(&self.duty)
        {
            Ok(())
        } else {
            Err(PowerError::PermissionDenied)
        }
    }
}

/// In-memory configuration of one device.
///
/// Lives inside [`Control`](crate::Control); the lock fields only ever
/// move from `false` to `true`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlBlock {
    /// Current operating mode.
    pub mode: OpMode,
    /// Current limit and its lock.
    pub limits: Limits,
    /// Output parameters and their lock.
    pub params: Params,
    /// Controller state.
    pub state: LedState,
    /// Active faults.
    pub fault: FaultFlags,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(brightness: f32, frequency: f32, duty: f32) -> Params {
        Params {
            brightness,
            frequency,
            duty,
            lock: false,
        }
    }

    #[test]
    fn runnable_modes() {
        assert!(OpMode::CONTINUOUS.is_runnable());
        assert!(OpMode::FLASH.is_runnable());
        assert!(!OpMode::INIT.is_runnable());
        assert!(!OpMode::new(7).is_runnable());
    }

    #[test]
    fn mode_display() {
        assert_eq!(format!("{}", OpMode::FLASH), "flash");
        assert_eq!(format!("{}", OpMode::new(9)), "mode(9)");
    }

    #[test]
    fn params_in_range_pass() {
        assert_eq!(params(50.0, 1000.0, 50.0).validate(), Ok(()));
        assert_eq!(params(0.0, 0.0, 0.0).validate(), Ok(()));
        assert_eq!(params(100.0, 0.0, 100.0).validate(), Ok(()));
    }

    #[test]
    fn params_out_of_range_denied() {
        let denied = Err(PowerError::PermissionDenied);
        assert_eq!(params(101.0, 1000.0, 50.0).validate(), denied);
        assert_eq!(params(-0.5, 1000.0, 50.0).validate(), denied);
        assert_eq!(params(50.0, -1.0, 50.0).validate(), denied);
        assert_eq!(params(50.0, 1000.0, 100.5).validate(), denied);
        assert_eq!(params(50.0, 1000.0, -3.0).validate(), denied);
    }

    #[test]
    fn params_nan_denied() {
        assert!(params(f32::NAN, 0.0, 0.0).validate().is_err());
        assert!(params(0.0, f32::NAN, 0.0).validate().is_err());
        assert!(params(0.0, 0.0, f32::NAN).validate().is_err());
    }

    #[test]
    fn fault_flags_keep_unknown_bits() {
        let faults = FaultFlags::from_raw(0b1000_0001);
        assert!(faults.contains(FaultFlags::OVERHEAT));
        assert_eq!(faults.bits(), 0b1000_0001);
    }

    #[test]
    fn control_block_starts_unlocked() {
        let cb = ControlBlock::default();
        assert_eq!(cb.mode, OpMode::INIT);
        assert!(!cb.limits.lock);
        assert!(!cb.params.lock);
        assert!(cb.fault.is_empty());
        assert_eq!(cb.state, LedState::Init);
    }
}
