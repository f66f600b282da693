//! Power LED error types.

use core::fmt;

const EPERM: i32 = 1;
const ENOENT: i32 = 2;
const EINTR: i32 = 4;
const EIO: i32 = 5;
const EBUSY: i32 = 16;
const EEXIST: i32 = 17;
const EINVAL: i32 = 22;
const EMFILE: i32 = 24;
const ENOTTY: i32 = 25;
const ETIMEDOUT: i32 = 110;

/// Errors returned by the power LED upper half and its lower halves.
///
/// Upper-half policy checks only ever produce [`PermissionDenied`],
/// [`TooManyOpens`] or a wait error from the platform. Everything else
/// originates in a lower half and is passed through unchanged.
///
/// [`PermissionDenied`]: PowerError::PermissionDenied
/// [`TooManyOpens`]: PowerError::TooManyOpens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerError {
    /// A configuration lock or range policy rejected the request.
    PermissionDenied,
    /// The device has reached its maximum number of concurrent opens.
    TooManyOpens,
    /// A blocking wait was interrupted before the guard was acquired.
    Interrupted,
    /// A blocking wait gave up before the guard was acquired.
    TimedOut,
    /// An argument was malformed.
    InvalidArgument,
    /// The requested operation is not supported by this driver.
    Unsupported,
    /// The hardware is busy.
    Busy,
    /// An I/O error occurred while driving the hardware.
    Io,
    /// A device is already registered under the requested path.
    AlreadyExists,
    /// No device is registered under the requested path.
    NotFound,
    /// Driver-specific failure, carried as a positive errno value.
    Errno(i32),
}

impl PowerError {
    /// Returns the negated errno value for this error.
    ///
    /// Character-device callers expect `-errno` on failure.
    #[must_use]
    pub const fn errno(self) -> i32 {
        let code = match self {
            Self::PermissionDenied => EPERM,
            Self::TooManyOpens => EMFILE,
            Self::Interrupted => EINTR,
            Self::TimedOut => ETIMEDOUT,
            Self::InvalidArgument => EINVAL,
            Self::Unsupported => ENOTTY,
            Self::Busy => EBUSY,
            Self::Io => EIO,
            Self::AlreadyExists => EEXIST,
            Self::NotFound => ENOENT,
            Self::Errno(code) => code,
        };
        -code
    }

    /// Maps a (possibly negated) errno value back to an error.
    ///
    /// Codes without a dedicated variant become [`PowerError::Errno`].
    #[must_use]
    pub const fn from_errno(code: i32) -> Self {
        match code.unsigned_abs() as i32 {
            EPERM => Self::PermissionDenied,
            EMFILE => Self::TooManyOpens,
            EINTR => Self::Interrupted,
            ETIMEDOUT => Self::TimedOut,
            EINVAL => Self::InvalidArgument,
            ENOTTY => Self::Unsupported,
            EBUSY => Self::Busy,
            EIO => Self::Io,
            EEXIST => Self::AlreadyExists,
            ENOENT => Self::NotFound,
            other => Self::Errno(other),
        }
    }

    /// Returns `true` for errors a caller may retry unchanged.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Interrupted | Self::TimedOut | Self::Busy)
    }
}

impl fmt::Display for PowerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PermissionDenied => f.write_str("operation not permitted"),
            Self::TooManyOpens => f.write_str("too many open sessions"),
            Self::Interrupted => f.write_str("wait interrupted"),
            Self::TimedOut => f.write_str("wait timed out"),
            Self::InvalidArgument => f.write_str("invalid argument"),
            Self::Unsupported => f.write_str("operation not supported"),
            Self::Busy => f.write_str("device busy"),
            Self::Io => f.write_str("I/O error"),
            Self::AlreadyExists => f.write_str("device already registered"),
            Self::NotFound => f.write_str("device not found"),
            Self::Errno(code) => write!(f, "driver error {code}"),
        }
    }
}
