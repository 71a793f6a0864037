//! Routes strategy records into `tracing` events.

use tracing::{debug, error, info, trace, warn};
use tsafe_intercept::{strategies::LogSink, LogLevel};

/// A [`LogSink`] that emits every entry as a `tracing` event under the
/// `tsafe` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write_log(&self, level: LogLevel, entry: &str) {
        match level {
            LogLevel::Trace => trace!(target: "tsafe", "{entry}"),
            LogLevel::Debug => debug!(target: "tsafe", "{entry}"),
            LogLevel::Info => info!(target: "tsafe", "{entry}"),
            LogLevel::Warn => warn!(target: "tsafe", "{entry}"),
            LogLevel::Error => error!(target: "tsafe", "{entry}"),
            LogLevel::Critical => error!(target: "tsafe", critical = true, "{entry}"),
        }
    }
}
