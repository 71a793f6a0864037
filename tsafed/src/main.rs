//! # tsafe demo client (tsafed)
//!
//! Drives one shared `SynchronizedMap` from several named worker threads and
//! checks that no update was lost.
//!
//! ## Usage
//!
//! ```bash
//! tsafed [--threads 5] [--iterations 2000] [--seed <n>] [--trace] \
//!        [--lock-timeout-ms <ms>] [--stats] [--log-level info]
//! ```
//!
//! `--trace` logs every protocol stage of every guarded call, one line per
//! stage, prefixed with the call site `[thread|file:line|Type.operation]`.
//! Expect a lot of output with the default thread and iteration counts.
//!
//! The `--stats` option prints per-operation call counts and timings once
//! the workers have finished.
//!
//! Output format follows `RUST_LOG_FORMAT` (`pretty`, `compact` or `json`).
//! `RUST_LOG`, when set, replaces the level chosen by `--log-level`.
//! `TSAFE_LOCK_TIMEOUT_MS` and `TSAFE_TRACE_TRANSITIONS` seed the guard
//! configuration; command line flags override them.

#![warn(missing_docs)]

mod sink;
mod workload;

use std::{
    env,
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::{filter::LevelFilter, fmt::format::FmtSpan, EnvFilter};
use tsafe_intercept::{
    strategies::{LoggingConfig, LoggingStrategy, StatisticsStrategy},
    GuardConfig, Interceptor, LogLevel,
};

use crate::{
    sink::TracingSink,
    workload::{SharedMap, WorkloadConfig},
};

/// tsafe demo client CLI arguments
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Number of worker threads
    #[arg(short, long, default_value_t = 5)]
    threads: usize,

    /// Cycles per worker thread
    #[arg(short, long, default_value_t = 2000)]
    iterations: usize,

    /// Seed for key generation; taken from the clock when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Log every protocol stage of every guarded call
    #[arg(long, help = "Trace lock and signal transitions")]
    trace: bool,

    /// Give up on a guarded call after waiting this long
    #[arg(long, value_name = "MS")]
    lock_timeout_ms: Option<u64>,

    /// Show per-operation statistics after running
    #[arg(short, long, help = "Show call statistics")]
    stats: bool,

    /// Minimum level of strategy records
    #[arg(long, default_value = "info", env = "TSAFE_LOG_LEVEL")]
    log_level: LogLevel,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Let --trace through the subscriber even at a higher --log-level.
    let level = if args.trace {
        LogLevel::Trace
    } else {
        args.log_level
    };
    initialize_tracing(tracing_level(level));

    let config = guard_config(&args)?;
    let stats = Arc::new(StatisticsStrategy::new());
    let interceptor = Arc::new(build_interceptor(
        config,
        level,
        args.stats.then(|| Arc::clone(&stats)),
    )?);

    let seed = args.seed.unwrap_or_else(clock_seed);
    let map = Arc::new(
        SharedMap::with_interceptor(interceptor).context("Failed to create the shared map")?,
    );

    let report = workload::run(
        &map,
        WorkloadConfig {
            threads: args.threads,
            iterations: args.iterations,
            seed,
        },
    )?;

    println!(
        "{} workers x {} iterations (seed {seed}) finished in {:?}",
        args.threads, args.iterations, report.elapsed
    );
    println!(
        "final size {} / distinct update keys {}",
        report.final_len, report.distinct_update_keys
    );

    if args.stats {
        display_statistics(&stats);
    }

    if !report.is_consistent() {
        bail!(
            "map holds {} entries, expected {}",
            report.final_len,
            report.distinct_update_keys
        );
    }
    Ok(())
}

/// Initialize the tracing system for logging
///
/// `RUST_LOG` directives take precedence over `max_level` when set.
fn initialize_tracing(max_level: Level) {
    let format = env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let directives = env::var(EnvFilter::DEFAULT_ENV).ok();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(log_filter(max_level, directives.as_deref()))
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true);

    match format.as_str() {
        "json" => subscriber.json().init(),
        "compact" => subscriber.compact().init(),
        _ => subscriber.pretty().init(),
    }
}

/// `RUST_LOG`-style directives if they parse, otherwise `max_level` alone.
fn log_filter(max_level: Level, directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| {
            EnvFilter::default().add_directive(LevelFilter::from_level(max_level).into())
        })
}

fn tracing_level(level: LogLevel) -> Level {
    match level {
        LogLevel::Trace => Level::TRACE,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Info => Level::INFO,
        LogLevel::Warn => Level::WARN,
        LogLevel::Error | LogLevel::Critical => Level::ERROR,
    }
}

/// Environment first, then command line overrides
fn guard_config(args: &Args) -> Result<GuardConfig> {
    let mut config = GuardConfig::from_env().unwrap_or_else(|e| {
        warn!("Ignoring invalid tsafe environment configuration: {}", e);
        GuardConfig::default()
    });
    if let Some(ms) = args.lock_timeout_ms {
        config = config.with_lock_timeout(Duration::from_millis(ms));
    }
    if args.trace {
        config = config.with_transitions(true);
    }
    config.validate().context("Invalid guard configuration")?;
    Ok(config)
}

fn build_interceptor(
    config: GuardConfig,
    min_level: LogLevel,
    stats: Option<Arc<StatisticsStrategy>>,
) -> Result<Interceptor> {
    let mut interceptor = Interceptor::with_config("tsafed", config)?;
    let logging = LoggingStrategy::new(Arc::new(TracingSink)).with_config(LoggingConfig {
        // Completed calls are too frequent for anything but tracing runs.
        log_completions: min_level <= LogLevel::Debug,
        min_level,
        ..LoggingConfig::default()
    });
    interceptor.add_strategy(Arc::new(logging));
    if let Some(stats) = stats {
        interceptor.add_strategy(stats);
    }
    info!(
        interceptor = interceptor.name(),
        strategies = interceptor.strategies.len(),
        "interceptor ready"
    );
    Ok(interceptor)
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(1, |d| u64::from(d.subsec_nanos()) ^ d.as_secs())
}

/// Display per-operation statistics
fn display_statistics(stats: &StatisticsStrategy) {
    let mut operations: Vec<_> = stats.get_all_stats().into_iter().collect();
    operations.sort_by(|a, b| a.0.cmp(&b.0));

    println!("=== Guarded Call Statistics ===");
    println!(
        "{:<28} {:>8} {:>8} {:>8} {:>8} {:>12} {:>12} {:>12}",
        "operation", "calls", "ok", "failed", "rejected", "avg wait", "max wait", "avg run"
    );
    for (name, op) in &operations {
        println!(
            "{:<28} {:>8} {:>8} {:>8} {:>8} {:>12?} {:>12?} {:>12?}",
            name,
            op.call_count,
            op.success_count,
            op.failure_count,
            op.rejection_count,
            op.avg_wait(),
            op.max_wait,
            op.avg_elapsed()
        );
    }
    println!("total calls: {}", stats.total_calls());
    println!("===============================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_applies_without_directives() {
        let filter = log_filter(Level::DEBUG, None);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn rust_log_directives_take_precedence() {
        let filter = log_filter(Level::WARN, Some("tsafe=trace"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));
    }

    #[test]
    fn unparsable_directives_fall_back_to_log_level() {
        let filter = log_filter(Level::INFO, Some("tsafe=loud"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    }
}
