//! Logging strategy for guarded calls
//!
//! This strategy writes one line per protocol stage, per finished call and
//! per transformed member to a [`LogSink`]. Each line is prefixed with the
//! call site, `[thread|file:line|Type.operation]`.

use std::sync::Arc;

use crate::{
    level::LogLevel,
    site::{CallOutcome, CallSite, Completion, TransitionRecord},
    GuardStrategy, TypeDescriptor,
};
use tsafe_sync::ProtocolStage;

/// A trait for receiving log entries
pub trait LogSink: Send + Sync {
    /// Write a log entry
    fn write_log(&self, level: LogLevel, entry: &str);
}

impl<F> LogSink for F
where
    F: Fn(LogLevel, &str) + Send + Sync,
{
    fn write_log(&self, level: LogLevel, entry: &str) {
        self(level, entry);
    }
}

/// Forwards entries to the `log` facade under the `tsafe` target
#[cfg(feature = "log")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LogCrateSink;

#[cfg(feature = "log")]
impl LogSink for LogCrateSink {
    fn write_log(&self, level: LogLevel, entry: &str) {
        log::log!(target: "tsafe", level.to_log_level(), "{entry}");
    }
}

/// Configuration for the logging strategy
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct LoggingConfig {
    /// Whether to log protocol transitions (needs `emit_transitions` on the
    /// interceptor)
    pub log_transitions: bool,
    /// Whether to log finished calls
    pub log_completions: bool,
    /// Whether to log rejected calls
    pub log_rejections:  bool,
    /// Whether to log type transformations
    pub log_transforms:  bool,
    /// Entries below this level are dropped
    pub min_level:       LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_transitions: true,
            log_completions: true,
            log_rejections:  true,
            log_transforms:  true,
            min_level:       LogLevel::Trace,
        }
    }
}

/// A strategy that logs guarded calls
pub struct LoggingStrategy<S: LogSink> {
    /// Log sink to write logs to
    sink:   Arc<S>,
    /// Configuration
    config: LoggingConfig,
}

impl<S: LogSink> LoggingStrategy<S> {
    /// Create a new logging strategy with the default configuration
    pub fn new(sink: Arc<S>) -> Self {
        Self {
            sink,
            config: LoggingConfig::default(),
        }
    }

    /// Configure the logging strategy
    #[must_use]
    pub fn with_config(mut self, config: LoggingConfig) -> Self {
        self.config = config;
        self
    }

    /// The active configuration
    pub fn config(&self) -> &LoggingConfig {
        &self.config
    }

    fn emit(&self, level: LogLevel, entry: &str) {
        if level >= self.config.min_level {
            self.sink.write_log(level, entry);
        }
    }
}

fn describe_stage(record: &TransitionRecord<'_>) -> String {
    let (lock, signal) = (record.lock_id, record.signal_id);
    match record.stage {
        ProtocolStage::AwaitingLock => format!("waiting to acquire lock {lock}"),
        ProtocolStage::LockAcquired => format!("acquired lock {lock}"),
        ProtocolStage::AwaitingSignal => format!("waiting for signal {signal}"),
        ProtocolStage::SignalConsumed => format!("signal {signal} consumed"),
        ProtocolStage::Executing => "calling operation".to_string(),
        ProtocolStage::ExecutionFinished => "completed operation call".to_string(),
        ProtocolStage::SignalReopened => format!("signal {signal} reopened"),
        ProtocolStage::LockReleased => format!("released lock {lock}"),
    }
}

impl<S: LogSink + 'static> GuardStrategy for LoggingStrategy<S> {
    fn on_transition(&self, record: &TransitionRecord<'_>) {
        if self.config.log_transitions {
            self.emit(
                LogLevel::Trace,
                &format!("{} {}", record.site, describe_stage(record)),
            );
        }
    }

    fn after_call(&self, site: &CallSite, outcome: &CallOutcome) {
        match outcome.completion {
            Completion::Returned if self.config.log_completions => self.emit(
                LogLevel::Info,
                &format!(
                    "{site} returned, waited {:?}, elapsed {:?}",
                    outcome.wait, outcome.elapsed
                ),
            ),
            Completion::Failed if self.config.log_completions => self.emit(
                LogLevel::Error,
                &format!(
                    "{site} failed, waited {:?}, elapsed {:?}",
                    outcome.wait, outcome.elapsed
                ),
            ),
            Completion::Rejected(e) if self.config.log_rejections => {
                self.emit(LogLevel::Warn, &format!("{site} rejected: {e}"));
            }
            _ => {}
        }
    }

    fn on_transform(&self, descriptor: &TypeDescriptor) {
        if !self.config.log_transforms {
            return;
        }
        for member in descriptor.members() {
            let verb = if member.guarded {
                "guarding"
            } else {
                "skipping excluded"
            };
            self.emit(
                LogLevel::Debug,
                &format!("{verb} member {}.{}", descriptor.type_name(), member.name),
            );
        }
    }

    fn clone_strategy(&self) -> Arc<dyn GuardStrategy> {
        Arc::new(Self {
            sink:   Arc::clone(&self.sink),
            config: self.config.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tsafe_error::Error;

    use super::*;
    use crate::{GuardConfig, GuardedFn, Interceptor};

    type Lines = Arc<Mutex<Vec<(LogLevel, String)>>>;

    fn capture() -> (Lines, Arc<impl LogSink>) {
        let lines: Lines = Arc::default();
        let captured = Arc::clone(&lines);
        let sink = Arc::new(move |level: LogLevel, entry: &str| {
            captured.lock().unwrap().push((level, entry.to_string()));
        });
        (lines, sink)
    }

    fn interceptor_with(strategy: Arc<dyn GuardStrategy>, transitions: bool) -> Arc<Interceptor> {
        let mut interceptor = Interceptor::with_config(
            "logging-test",
            GuardConfig::default().with_transitions(transitions),
        )
        .unwrap();
        interceptor.add_strategy(strategy);
        Arc::new(interceptor)
    }

    #[test]
    fn logs_every_stage_then_the_completion() {
        let (lines, sink) = capture();
        let interceptor = interceptor_with(Arc::new(LoggingStrategy::new(sink)), true);
        let double = GuardedFn::with_interceptor("double", |x: u32| x * 2, interceptor);

        assert_eq!(double.call((4,)).unwrap(), 8);

        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), ProtocolStage::ALL.len() + 1);
        assert!(lines[..8].iter().all(|(level, _)| *level == LogLevel::Trace));
        assert!(lines[0].1.contains("waiting to acquire lock"));
        assert!(lines[0].1.ends_with(&format!("lock {}", double.state().lock_id())));
        assert!(lines[1]
            .1
            .ends_with(&format!("acquired lock {}", double.state().lock_id())));
        assert!(lines[2]
            .1
            .ends_with(&format!("waiting for signal {}", double.state().signal_id())));
        assert_eq!(
            lines
                .iter()
                .filter(|(_, line)| line.contains("waiting for signal"))
                .count(),
            1
        );
        assert!(lines[7].1.contains("released lock"));
        let (level, last) = &lines[8];
        assert_eq!(*level, LogLevel::Info);
        assert!(last.contains("|double] returned"));
    }

    #[test]
    fn failures_log_at_error_and_min_level_filters() {
        let (lines, sink) = capture();
        let strategy = LoggingStrategy::new(sink).with_config(LoggingConfig {
            min_level: LogLevel::Warn,
            ..LoggingConfig::default()
        });
        let interceptor = interceptor_with(Arc::new(strategy), true);
        let check = GuardedFn::with_interceptor(
            "check",
            |ok: bool| {
                if ok {
                    Ok(())
                } else {
                    Err(Error::operation_error("check failed"))
                }
            },
            interceptor,
        );

        check.try_call((true,)).unwrap();
        check.try_call((false,)).unwrap_err();

        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, LogLevel::Error);
        assert!(lines[0].1.contains("|check] failed"));
    }

    #[test]
    fn transforms_log_one_line_per_member() {
        let (lines, sink) = capture();
        let strategy = LoggingStrategy::new(sink);
        let descriptor = crate::TypeRegistry::new()
            .transform::<std::collections::HashMap<u8, u8>>(&crate::MemberFilter::new())
            .unwrap()
            .0;
        strategy.on_transform(&descriptor);

        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), descriptor.members().len());
        assert!(lines.iter().all(|(level, _)| *level == LogLevel::Debug));
        assert!(lines
            .iter()
            .any(|(_, line)| line == "skipping excluded member SynchronizedMap.fmt"));
        assert!(lines
            .iter()
            .any(|(_, line)| line == "guarding member SynchronizedMap.insert"));
    }
}
