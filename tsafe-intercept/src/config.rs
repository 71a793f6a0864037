//! Configuration applied by an interceptor to every call it runs.

use std::time::Duration;

use tsafe_error::{Error, Result};

use crate::filter::MemberFilter;

/// Environment variable holding the lock timeout in milliseconds
pub const ENV_LOCK_TIMEOUT_MS: &str = "TSAFE_LOCK_TIMEOUT_MS";
/// Environment variable switching transition tracing on or off
pub const ENV_TRACE_TRANSITIONS: &str = "TSAFE_TRACE_TRANSITIONS";

/// Configuration for guarded calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardConfig {
    /// Upper bound on the lock wait and on the signal wait; `None` waits
    /// forever
    pub lock_timeout:     Option<Duration>,
    /// Whether strategies receive a record for every protocol stage
    pub emit_transitions: bool,
    /// Which members of a guarded type are wrapped
    pub member_filter:    MemberFilter,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            lock_timeout:     None,
            emit_transitions: false,
            member_filter:    MemberFilter::default(),
        }
    }
}

impl GuardConfig {
    /// Sets the lock timeout
    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    /// Enables or disables transition records
    #[must_use]
    pub fn with_transitions(mut self, enabled: bool) -> Self {
        self.emit_transitions = enabled;
        self
    }

    /// Replaces the member filter
    #[must_use]
    pub fn with_member_filter(mut self, filter: MemberFilter) -> Self {
        self.member_filter = filter;
        self
    }

    /// Checks the configuration for values that cannot work.
    ///
    /// # Errors
    ///
    /// `INVALID_CONFIG` for a zero lock timeout, which would reject every
    /// call that has to wait at all.
    pub fn validate(&self) -> Result<()> {
        if self.lock_timeout == Some(Duration::ZERO) {
            return Err(Error::invalid_config("Lock timeout must be greater than zero"));
        }
        Ok(())
    }

    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Same as [`from_lookup`](Self::from_lookup).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from `lookup`, starting from the defaults.
    ///
    /// Reads [`ENV_LOCK_TIMEOUT_MS`] (positive integer milliseconds) and
    /// [`ENV_TRACE_TRANSITIONS`] (`1/true/yes/on` or `0/false/no/off`).
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// `INVALID_CONFIG` if a variable is set to a value that does not parse
    /// or the result does not validate.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_LOCK_TIMEOUT_MS) {
            let millis: u64 = raw
                .trim()
                .parse()
                .map_err(|_| Error::invalid_config("Lock timeout is not a whole number of milliseconds"))?;
            config.lock_timeout = Some(Duration::from_millis(millis));
        }

        if let Some(raw) = lookup(ENV_TRACE_TRANSITIONS) {
            config.emit_transitions = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" | "" => false,
                _ => return Err(Error::invalid_config("Transition tracing flag is not a boolean")),
            };
        }

        config.validate()?;
        Ok(config)
    }
}
