//! Per-device driver configuration.

/// Default open limit, matching the historical 8-bit open counter.
pub const DEFAULT_MAX_OPENS: u8 = u8::MAX;

/// What `open` reports when first-open hardware setup fails.
///
/// Either way the open count stays at zero and the failure is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetupFailurePolicy {
    /// Report success to the caller. Matches existing driver convention,
    /// where a failed first setup is only visible in the log.
    #[default]
    Conceal,
    /// Return the lower half's setup error to the caller.
    Report,
}

/// Configuration applied to a device at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerLedConfig {
    /// Maximum number of concurrent opens. Must be at least 1.
    pub max_opens: u8,
    /// Behaviour when first-open setup fails.
    pub setup_failure: SetupFailurePolicy,
}

impl PowerLedConfig {
    /// Returns the default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_opens: DEFAULT_MAX_OPENS,
            setup_failure: SetupFailurePolicy::Conceal,
        }
    }

    /// Sets the maximum number of concurrent opens.
    #[must_use]
    pub const fn with_max_opens(mut self, max_opens: u8) -> Self {
        self.max_opens = max_opens;
        self
    }

    /// Sets the setup failure policy.
    #[must_use]
    pub const fn with_setup_failure(mut self, policy: SetupFailurePolicy) -> Self {
        self.setup_failure = policy;
        self
    }
}

impl Default for PowerLedConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_preserve_legacy_behaviour() {
        let config = PowerLedConfig::default();
        assert_eq!(config.max_opens, 255);
        assert_eq!(config.setup_failure, SetupFailurePolicy::Conceal);
    }

    #[test]
    fn builders_override_fields() {
        const CONFIG: PowerLedConfig = PowerLedConfig::new()
            .with_max_opens(2)
            .with_setup_failure(SetupFailurePolicy::Report);
        assert_eq!(CONFIG.max_opens, 2);
        assert_eq!(CONFIG.setup_failure, SetupFailurePolicy::Report);
    }
}
