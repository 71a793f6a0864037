//! Prelude module for tsafe-intercept
//!
//! Re-exports the wrapper types, the strategy trait and the built-in
//! strategies, together with the error types guarded calls return.

pub use std::{sync::Arc, time::Duration};

pub use tsafe_error::{codes, Error, ErrorCategory, Result};
pub use tsafe_sync::{ProtocolStage, SyncState};

#[cfg(feature = "log")]
pub use crate::strategies::LogCrateSink;
pub use crate::{
    strategies::{LogSink, LoggingConfig, LoggingStrategy, StatisticsConfig, StatisticsStrategy},
    CallOutcome,
    CallSite,
    Completion,
    GuardConfig,
    GuardStrategy,
    Guarded,
    GuardedFn,
    GuardedType,
    Interceptor,
    LogLevel,
    MemberFilter,
    MemberSet,
    SynchronizedMap,
    TransitionRecord,
};
