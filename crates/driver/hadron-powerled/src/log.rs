//! Driver logging hooks.
//!
//! The driver never owns an output device. The kernel hands it a leveled
//! log function through [`set_log_fn`]; until then every message is
//! silently discarded. Use the `powerled_*!` macros rather than calling
//! [`_log`] directly so every line carries the `powerled:` prefix.

use core::fmt;
use core::sync::atomic::{AtomicPtr, Ordering};

/// Log severity level. Lower is more severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    /// Fatal: unrecoverable error.
    Fatal = 0,
    /// Error: a command or hardware operation failed.
    Error = 1,
    /// Warning: unexpected condition, not necessarily an error.
    Warn = 2,
    /// Informational: registration and lifecycle progress.
    Info = 3,
    /// Debug: per-command diagnostics.
    Debug = 4,
}

impl LogLevel {
    /// Returns the fixed-width level name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fatal => "FATAL",
            Self::Error => "ERROR",
            Self::Warn => "WARN ",
            Self::Info => "INFO ",
            Self::Debug => "DEBUG",
        }
    }
}

/// The signature of the leveled log function.
pub type LogFn = fn(LogLevel, fmt::Arguments<'_>);

fn null_log(_level: LogLevel, _args: fmt::Arguments<'_>) {}

static LOG_FN: AtomicPtr<()> = AtomicPtr::new(null_log as *mut ());

/// Registers the log function used by the driver.
///
/// # Safety
///
/// `f` must be callable from any context, including with interrupts
/// disabled, since setup and teardown failures are reported from inside
/// the hardware critical section.
pub unsafe fn set_log_fn(f: LogFn) {
    LOG_FN.store(f as *mut (), Ordering::Release);
}

#[inline]
fn load_log_fn() -> LogFn {
    let ptr = LOG_FN.load(Ordering::Acquire);
    // SAFETY: Only valid `LogFn` pointers (or `null_log`) are ever stored.
    unsafe { core::mem::transmute::<*mut (), LogFn>(ptr) }
}

/// Implementation detail for the `powerled_*!` macros. Not public API.
#[doc(hidden)]
pub fn _log(level: LogLevel, args: fmt::Arguments<'_>) {
    load_log_fn()(level, args);
}

/// Logs a driver message at the given level.
#[macro_export]
macro_rules! powerled_log {
    ($level:expr, $($arg:tt)*) => {
        $crate::log::_log($level, format_args!("powerled: {}", format_args!($($arg)*)))
    };
}

/// Logs an error-level driver message.
#[macro_export]
macro_rules! powerled_err {
    ($($arg:tt)*) => { $crate::powerled_log!($crate::log::LogLevel::Error, $($arg)*) };
}

/// Logs a warning-level driver message.
#[macro_export]
macro_rules! powerled_warn {
    ($($arg:tt)*) => { $crate::powerled_log!($crate::log::LogLevel::Warn, $($arg)*) };
}

/// Logs an info-level driver message.
#[macro_export]
macro_rules! powerled_info {
    ($($arg:tt)*) => { $crate::powerled_log!($crate::log::LogLevel::Info, $($arg)*) };
}

/// Logs a debug-level driver message.
#[macro_export]
macro_rules! powerled_debug {
    ($($arg:tt)*) => { $crate::powerled_log!($crate::log::LogLevel::Debug, $($arg)*) };
}
