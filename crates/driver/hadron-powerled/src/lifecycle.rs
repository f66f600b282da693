//! Reference-counted open/close.
//!
//! The first successful open runs the lower half's `setup`; the close that
//! drops the last reference runs `shutdown`. Both hooks run inside a
//! [`CriticalSection`], nested inside the device's open/close permit, so
//! they never overlap each other or a concurrent count change.

use crate::config::SetupFailurePolicy;
use crate::error::PowerError;
use crate::session::PowerLed;
use crate::sync::CriticalSection;
use crate::{powerled_debug, powerled_err, powerled_warn};

/// Whether the device's hardware is currently set up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No open references; the hardware is not set up.
    Uninitialized,
    /// At least one open reference; `setup` has succeeded.
    Active,
}

impl PowerLed {
    /// Opens a reference to the device.
    ///
    /// The first open runs `setup`. If it fails the count stays at zero
    /// and the next open retries it; whether the caller sees the failure
    /// depends on [`SetupFailurePolicy`].
    ///
    /// # Errors
    ///
    /// - [`PowerError::TooManyOpens`] if the count is already at the
    ///   configured maximum.
    /// - Whatever [`PlatformServices::check_wait`](crate::PlatformServices::check_wait)
    ///   returns if the wait for the open/close permit is abandoned.
    /// - The `setup` error, under [`SetupFailurePolicy::Report`].
    pub fn open(&self) -> Result<(), PowerError> {
        let _permit = self.guard.wait(&*self.services)?;

        let next = self.ocount.next().inspect_err(|_| {
            powerled_warn!("open limit {} reached", self.ocount.max());
        })?;

        if next == 1 {
            let result = {
                let _cs = CriticalSection::enter(&*self.services);
                self.ops().setup(self.control())
            };
            if let Err(err) = result {
                powerled_err!("setup failed: {}", err);
                return match self.config.setup_failure {
                    SetupFailurePolicy::Conceal => Ok(()),
                    SetupFailurePolicy::Report => Err(err),
                };
            }
        }

        self.ocount.commit(next);
        Ok(())
    }

    /// Closes a reference to the device.
    ///
    /// The close that drops the last reference runs `shutdown`; a
    /// `shutdown` failure is logged and not reported. Closing with no
    /// open references also runs `shutdown`, leaving the count at zero.
    ///
    /// # Errors
    ///
    /// Whatever [`PlatformServices::check_wait`](crate::PlatformServices::check_wait)
    /// returns if the wait for the open/close permit is abandoned. The
    /// count is left unchanged in that case.
    pub fn close(&self) -> Result<(), PowerError> {
        let _permit = self.guard.wait(&*self.services)?;

        let count = self.ocount.get();
        if count > 1 {
            self.ocount.decrement();
            return Ok(());
        }
        if count == 0 {
            powerled_debug!("close with no open references");
        }

        self.ocount.commit(0);
        let result = {
            let _cs = CriticalSection::enter(&*self.services);
            self.ops().shutdown(self.control())
        };
        if let Err(err) = result {
            powerled_err!("shutdown failed: {}", err);
        }
        Ok(())
    }

    /// Returns whether the hardware is currently set up.
    pub fn session_state(&self) -> SessionState {
        if self.is_live() {
            SessionState::Active
        } else {
            SessionState::Uninitialized
        }
    }
}



#[cfg(all(test, shuttle, not(loom)))]
mod shuttle_tests {
    use std::sync::Arc;

    use crate::ops::OpSet;
    use crate::test_support::powerled;

    #[test]
    fn open_close_storm_balances() {
        shuttle::check_random(
            || {
                let (dev, led) = powerled();
                let dev = Arc::new(dev);

                let handles: Vec<_> = (0..3)
                    .map(|_| {
                        let dev = dev.clone();
                        shuttle::thread::spawn(move || {
                            dev.open().unwrap();
                            dev.close().unwrap();
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().unwrap();
                }

                assert_eq!(dev.open_count(), 0);
                assert_eq!(led.calls(OpSet::SETUP), led.calls(OpSet::SHUTDOWN));
            },
            200,
        );
    }
}
