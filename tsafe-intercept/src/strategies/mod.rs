//! Built-in strategies for guarded calls
//!
//! This module provides implementations of common strategies that can be
//! used out of the box or as examples for creating custom strategies.

mod logging;
mod stats;

#[cfg(feature = "log")]
pub use logging::LogCrateSink;
pub use logging::{LogSink, LoggingConfig, LoggingStrategy};
pub use stats::{OperationStats, StatisticsConfig, StatisticsStrategy};
