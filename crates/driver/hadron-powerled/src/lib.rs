//! Upper-half power LED driver.
//!
//! Exposes a hardware-agnostic control surface (start/stop, operating
//! mode, current limits, brightness parameters, fault state) for high
//! power LED controllers and forwards every request to a swappable
//! lower half that owns the actual PWM/timer hardware.
//!
//! The crate is organised in the same layers as the rest of the driver
//! model:
//!
//! - **Model** -- [`ControlBlock`], [`Limits`], [`Params`], [`FaultFlags`]
//!   and the shared [`Control`] handle lower halves update.
//! - **Lower-half contract** -- [`PowerLedOps`], plus [`OpsTable`] /
//!   [`TableDriver`] for function-pointer style drivers.
//! - **Session** -- [`PowerLed`]: reference-counted open/close with
//!   one-time setup and teardown, and the [`Command`] dispatcher.
//! - **Registration** -- [`register`] validates a lower half and exposes
//!   the session through a [`DeviceRegistry`] such as [`DevTable`].
//!
//! Everything is host-testable; the kernel supplies interrupt masking
//! and blocking through [`PlatformServices`].

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

extern crate alloc;

pub mod config;
pub mod control;
pub mod counter;
pub mod dispatch;
pub mod error;
pub mod lifecycle;
pub mod log;
pub mod ops;
pub mod registration;
pub mod services;
pub mod session;
pub mod sync;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{PowerLedConfig, SetupFailurePolicy};
pub use control::Control;
pub use counter::OpenCount;
pub use dispatch::{Command, IoctlArg};
pub use error::PowerError;
pub use lifecycle::SessionState;
pub use ops::{OpSet, OpsTable, PowerLedOps, TableDriver};
pub use registration::{DevTable, DeviceNode, DeviceRegistry, FileMode, register};
pub use services::{IrqState, PlatformServices};
pub use session::PowerLed;
pub use types::{ControlBlock, FaultFlags, LedState, Limits, OpMode, Params, State};
