//! Statistics strategy for guarded calls
//!
//! This strategy collects per-operation metrics: call counts, outcomes, and
//! how long calls waited for and held their synchronization state.

use std::{collections::HashMap, sync::Arc, time::Duration};

use parking_lot::RwLock;

use crate::{
    site::{CallOutcome, CallSite, Completion},
    GuardStrategy, TypeDescriptor,
};

/// Statistics collected for one operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationStats {
    /// Number of times the operation was called
    pub call_count:      u64,
    /// Number of calls that ran and returned normally
    pub success_count:   u64,
    /// Number of calls that ran and returned an error
    pub failure_count:   u64,
    /// Number of calls that never ran
    pub rejection_count: u64,
    /// Total time spent waiting for the lock and the signal
    pub total_wait:      Duration,
    /// Longest wait of a single call
    pub max_wait:        Duration,
    /// Total time from interception until release
    pub total_elapsed:   Duration,
    /// Shortest call
    pub min_elapsed:     Option<Duration>,
    /// Longest call
    pub max_elapsed:     Duration,
}

impl OperationStats {
    /// Calls that actually ran the operation
    #[must_use]
    pub fn completed(&self) -> u64 {
        self.success_count + self.failure_count
    }

    /// Mean wait over completed calls
    #[must_use]
    pub fn avg_wait(&self) -> Duration {
        average(self.total_wait, self.completed())
    }

    /// Mean elapsed time over completed calls
    #[must_use]
    pub fn avg_elapsed(&self) -> Duration {
        average(self.total_elapsed, self.completed())
    }

    fn record(&mut self, outcome: &CallOutcome, config: &StatisticsConfig) {
        self.call_count += 1;
        match outcome.completion {
            Completion::Returned => self.success_count += 1,
            Completion::Failed => self.failure_count += 1,
            Completion::Rejected(_) => {
                if config.track_rejections {
                    self.rejection_count += 1;
                }
                return;
            }
        }

        if config.track_timing {
            self.total_wait += outcome.wait;
            self.max_wait = self.max_wait.max(outcome.wait);
            self.total_elapsed += outcome.elapsed;
            self.max_elapsed = self.max_elapsed.max(outcome.elapsed);
            self.min_elapsed = Some(match self.min_elapsed {
                Some(min) => min.min(outcome.elapsed),
                None => outcome.elapsed,
            });
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn average(total: Duration, count: u64) -> Duration {
    match u32::try_from(count) {
        Ok(0) => Duration::ZERO,
        Ok(n) => total / n,
        Err(_) => Duration::from_secs_f64(total.as_secs_f64() / count as f64),
    }
}

/// Configuration for the statistics strategy
#[derive(Debug, Clone)]
pub struct StatisticsConfig {
    /// Whether to track timings
    pub track_timing:     bool,
    /// Whether to count rejected calls
    pub track_rejections: bool,
    /// Maximum number of operations to track (0 for unlimited)
    pub max_operations:   usize,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            track_timing:     true,
            track_rejections: true,
            max_operations:   1000,
        }
    }
}

/// A strategy that collects statistics on guarded calls
///
/// Operations are keyed by [`CallSite::qualified_name`], so all instances of
/// one guarded type share their members' entries.
pub struct StatisticsStrategy {
    /// Configuration for this strategy
    config:      StatisticsConfig,
    /// Statistics for each operation
    stats:       RwLock<HashMap<String, OperationStats>>,
    /// Names of the types transformed while this strategy was installed
    transformed: RwLock<Vec<&'static str>>,
}

impl Default for StatisticsStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl StatisticsStrategy {
    /// Create a new statistics strategy with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(StatisticsConfig::default())
    }

    /// Create a new statistics strategy with custom configuration
    #[must_use]
    pub fn with_config(config: StatisticsConfig) -> Self {
        Self {
            config,
            stats: RwLock::new(HashMap::new()),
            transformed: RwLock::new(Vec::new()),
        }
    }

    /// Get statistics for all operations
    pub fn get_all_stats(&self) -> HashMap<String, OperationStats> {
        self.stats.read().clone()
    }

    /// Get statistics for one operation, by qualified name (`Type.member`
    /// or the bare function name)
    pub fn get_operation_stats(&self, qualified_name: &str) -> Option<OperationStats> {
        self.stats.read().get(qualified_name).cloned()
    }

    /// Calls recorded across all operations
    pub fn total_calls(&self) -> u64 {
        self.stats.read().values().map(|s| s.call_count).sum()
    }

    /// Types transformed while this strategy was installed, in order
    pub fn transformed_types(&self) -> Vec<&'static str> {
        self.transformed.read().clone()
    }

    /// Reset all statistics
    pub fn reset(&self) {
        self.stats.write().clear();
        self.transformed.write().clear();
    }
}

impl GuardStrategy for StatisticsStrategy {
    fn after_call(&self, site: &CallSite, outcome: &CallOutcome) {
        let key = site.qualified_name();
        let mut stats_map = self.stats.write();

        // At the limit, new operations are not tracked
        if self.config.max_operations > 0
            && stats_map.len() >= self.config.max_operations
            && !stats_map.contains_key(&key)
        {
            return;
        }

        stats_map.entry(key).or_default().record(outcome, &self.config);
    }

    fn on_transform(&self, descriptor: &TypeDescriptor) {
        self.transformed.write().push(descriptor.type_name());
    }

    fn clone_strategy(&self) -> Arc<dyn GuardStrategy> {
        Arc::new(Self {
            config:      self.config.clone(),
            stats:       RwLock::new(self.get_all_stats()),
            transformed: RwLock::new(self.transformed_types()),
        })
    }
}

#[cfg(test)]
mod tests {
    use tsafe_error::Error;

    use super::*;
    use crate::CallerInfo;

    fn outcome(completion: Completion, millis: u64) -> CallOutcome {
        CallOutcome {
            completion,
            wait: Duration::from_millis(millis / 2),
            elapsed: Duration::from_millis(millis),
        }
    }

    fn site(operation: &'static str) -> CallSite {
        CallSite::member("Counter", operation, CallerInfo::capture())
    }

    #[test]
    fn test_statistics_strategy() {
        let strategy = StatisticsStrategy::new();
        let inc = site("inc");

        strategy.after_call(&inc, &outcome(Completion::Returned, 10));
        strategy.after_call(&inc, &outcome(Completion::Returned, 30));
        strategy.after_call(&inc, &outcome(Completion::Failed, 20));
        strategy.after_call(&inc, &outcome(Completion::Rejected(Error::LOCK_TIMEOUT), 50));

        let stats = strategy.get_operation_stats("Counter.inc").unwrap();
        assert_eq!(stats.call_count, 4);
        assert_eq!(stats.success_count, 2);
        assert_eq!(stats.failure_count, 1);
        assert_eq!(stats.rejection_count, 1);
        assert_eq!(stats.min_elapsed, Some(Duration::from_millis(10)));
        assert_eq!(stats.max_elapsed, Duration::from_millis(30));
        assert_eq!(stats.avg_elapsed(), Duration::from_millis(20));
        assert_eq!(stats.max_wait, Duration::from_millis(15));
        assert_eq!(strategy.total_calls(), 4);
    }

    #[test]
    fn test_operation_limit() {
        let strategy = StatisticsStrategy::with_config(StatisticsConfig {
            max_operations: 1,
            ..StatisticsConfig::default()
        });
        strategy.after_call(&site("a"), &outcome(Completion::Returned, 1));
        strategy.after_call(&site("b"), &outcome(Completion::Returned, 1));
        strategy.after_call(&site("a"), &outcome(Completion::Returned, 1));

        assert_eq!(strategy.get_all_stats().len(), 1);
        assert_eq!(strategy.get_operation_stats("Counter.a").unwrap().call_count, 2);
        assert!(strategy.get_operation_stats("Counter.b").is_none());
    }

    #[test]
    fn test_reset_and_untimed() {
        let strategy = StatisticsStrategy::with_config(StatisticsConfig {
            track_timing: false,
            ..StatisticsConfig::default()
        });
        strategy.after_call(&site("a"), &outcome(Completion::Returned, 40));
        let stats = strategy.get_operation_stats("Counter.a").unwrap();
        assert_eq!(stats.total_elapsed, Duration::ZERO);
        assert_eq!(stats.min_elapsed, None);

        strategy.reset();
        assert_eq!(strategy.total_calls(), 0);
        assert!(strategy.transformed_types().is_empty());
    }

    #[test]
    fn test_empty_average_is_zero() {
        assert_eq!(OperationStats::default().avg_wait(), Duration::ZERO);
    }
}
