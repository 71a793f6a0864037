//! Log level definitions for tsafe diagnostics.
//!
//! This module provides the levels strategies attach to the records they
//! emit. Sinks map them onto whatever logging backend they forward to.

use core::{fmt, str::FromStr};

/// Log levels for guarded-call diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Trace-level messages (every protocol transition)
    Trace,
    /// Debug-level messages (type transformations)
    Debug,
    /// Informational messages (completed calls)
    Info,
    /// Warning messages (rejected calls)
    Warn,
    /// Error messages (failed calls)
    Error,
    /// Critical error messages (severe issues)
    Critical,
}

/// Custom error for parsing log levels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLogLevelError {
    /// The text that failed to parse
    pub invalid_level: String,
}

impl fmt::Display for ParseLogLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid log level: {}", self.invalid_level)
    }
}

impl std::error::Error for ParseLogLevelError {}

impl FromStr for LogLevel {
    type Err = ParseLogLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" | "err" => Ok(Self::Error),
            "critical" | "fatal" => Ok(Self::Critical),
            _ => Err(ParseLogLevelError {
                invalid_level: s.to_string(),
            }),
        }
    }
}

impl LogLevel {
    /// Creates a `LogLevel` from a string, defaulting to Info for invalid
    /// levels
    #[must_use]
    pub fn from_string_or_default(s: &str) -> Self {
        Self::from_str(s).unwrap_or(Self::Info)
    }

    /// Convert `LogLevel` to a string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }

    /// The matching `log` crate level. `Critical` maps to `Error`.
    #[cfg(feature = "log")]
    #[must_use]
    pub const fn to_log_level(self) -> log::Level {
        match self {
            Self::Trace => log::Level::Trace,
            Self::Debug => log::Level::Debug,
            Self::Info => log::Level::Info,
            Self::Warn => log::Level::Warn,
            Self::Error | Self::Critical => log::Level::Error,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
