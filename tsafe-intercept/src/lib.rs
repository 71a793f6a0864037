// tsafe - tsafe-intercept
// Module: Call Interception Layer
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! # Transparent synchronization wrappers
//!
//! This crate makes arbitrary values and functions safe to call from many
//! threads at once. Every call on a wrapped target is intercepted and run
//! under the target's own synchronization state (a reentrant lock plus a
//! hand-off signal, see `tsafe-sync`), so at most one thread executes any of
//! the target's operations at a time.
//!
//! ## Overview
//!
//! - [`Guarded<T>`] wraps a value whose type implements [`GuardedType`]. All
//!   member operations of one instance share that instance's state.
//! - [`GuardedFn<F>`] wraps a standalone callable and creates its state on
//!   first call. It can live in a `static`.
//! - [`SynchronizedMap<K, V>`] is a ready-made guarded `HashMap`.
//!
//! Calls pass through an [`Interceptor`], which applies its configuration
//! (lock timeout, transition tracing, member filter) and runs its
//! [`GuardStrategy`] hooks around every call.
//!
//! ## Creating Custom Strategies
//!
//! 1. Implement the `GuardStrategy` trait
//! 2. Add your strategy to an `Interceptor` instance
//! 3. Pass the interceptor to `Guarded::with_interceptor` or
//!    `GuardedFn::with_interceptor`, or install it as the global default
//!
//! ```rust
//! use std::sync::{
//!     atomic::{AtomicUsize, Ordering},
//!     Arc,
//! };
//!
//! use tsafe_intercept::{
//!     CallOutcome, CallSite, GuardStrategy, Guarded, GuardedType, Interceptor, MemberSet,
//! };
//!
//! #[derive(Default)]
//! struct CallCounter(AtomicUsize);
//!
//! impl GuardStrategy for CallCounter {
//!     fn after_call(&self, _site: &CallSite, _outcome: &CallOutcome) {
//!         self.0.fetch_add(1, Ordering::Relaxed);
//!     }
//!
//!     fn clone_strategy(&self) -> Arc<dyn GuardStrategy> {
//!         Arc::new(CallCounter(AtomicUsize::new(self.0.load(Ordering::Relaxed))))
//!     }
//! }
//!
//! struct Account {
//!     balance: i64,
//! }
//!
//! impl GuardedType for Account {
//!     fn enumerate_members(members: &mut MemberSet) -> tsafe_error::Result<()> {
//!         members.add_all(&["deposit", "balance"])?;
//!         Ok(())
//!     }
//! }
//!
//! let counter = Arc::new(CallCounter::default());
//! let mut interceptor = Interceptor::new("accounts");
//! interceptor.add_strategy(counter.clone());
//!
//! let account = Guarded::with_interceptor(Account { balance: 0 }, Arc::new(interceptor))?;
//! account.call("deposit", |a| a.balance += 10)?;
//! assert_eq!(account.call("balance", |a| a.balance)?, 10);
//! assert_eq!(counter.0.load(Ordering::Relaxed), 2);
//! # Ok::<(), tsafe_error::Error>(())
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::missing_panics_doc)]

use core::cell::Cell;
use std::{sync::Arc, time::Instant};

use once_cell::sync::OnceCell;

pub mod caller;
pub mod collections;
pub mod config;
pub mod filter;
pub mod guarded;
pub mod guarded_fn;
pub mod level;
pub mod prelude;
pub mod registry;
pub mod site;

// Built-in strategy implementations
pub mod strategies;

pub use caller::CallerInfo;
pub use collections::SynchronizedMap;
pub use config::GuardConfig;
pub use filter::{FilterRule, MemberFilter, DEFAULT_EXCLUDED};
pub use guarded::{Guarded, GuardedType};
pub use guarded_fn::{GuardedCallable, GuardedFn};
pub use level::LogLevel;
pub use registry::{MemberEntry, MemberSet, TypeDescriptor, TypeRegistry};
pub use site::{CallOutcome, CallSite, Completion, OperationKind, TransitionRecord};
use tsafe_error::{Error, Result};
use tsafe_sync::{ProtocolStage, SyncCell, SyncState, TransitionObserver};

/// Strategy pattern for observing and gating guarded calls
pub trait GuardStrategy: Send + Sync {
    /// Called before the call enters the synchronization protocol
    ///
    /// Returning an error rejects the call: the protocol is not entered and
    /// the operation does not run.
    fn before_call(&self, _site: &CallSite) -> Result<()> {
        Ok(())
    }

    /// Called for every protocol stage the call reaches, when transition
    /// tracing is enabled in the interceptor's configuration
    fn on_transition(&self, _record: &TransitionRecord<'_>) {}

    /// Called after the call has left the protocol
    ///
    /// Strategies see `after_call` in the reverse order of `before_call`.
    /// A call whose operation panics does not reach this hook.
    fn after_call(&self, _site: &CallSite, _outcome: &CallOutcome) {}

    /// Called once when a guarded type is transformed
    fn on_transform(&self, _descriptor: &TypeDescriptor) {}

    /// Clone this strategy
    fn clone_strategy(&self) -> Arc<dyn GuardStrategy>;
}

/// Runs guarded calls: applies configuration and strategies around the
/// synchronization protocol.
#[derive(Clone)]
pub struct Interceptor {
    /// Name of this interceptor for identification
    name:           String,
    /// Collection of strategies to apply
    pub strategies: Vec<Arc<dyn GuardStrategy>>,
    config:         GuardConfig,
}

static GLOBAL_INTERCEPTOR: OnceCell<Interceptor> = OnceCell::new();

impl Interceptor {
    /// Creates a new interceptor with the given name and default
    /// configuration
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name:       name.to_string(),
            strategies: Vec::new(),
            config:     GuardConfig::default(),
        }
    }

    /// Creates a new interceptor with the given configuration
    ///
    /// # Errors
    ///
    /// `INVALID_CONFIG` if the configuration does not validate.
    pub fn with_config(name: &str, config: GuardConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            name: name.to_string(),
            strategies: Vec::new(),
            config,
        })
    }

    /// The interceptor used by wrappers created without one.
    ///
    /// Unless [`install_global`](Self::install_global) ran first, this is an
    /// interceptor named `default` with no strategies, configured from the
    /// environment (see [`GuardConfig::from_env`]), falling back to the
    /// default configuration if the environment is invalid.
    pub fn global() -> &'static Self {
        GLOBAL_INTERCEPTOR.get_or_init(|| {
            let config = GuardConfig::from_env().unwrap_or_else(|_e| {
                #[cfg(feature = "log")]
                log::warn!("ignoring invalid tsafe environment configuration: {_e}");
                GuardConfig::default()
            });
            Self {
                name: "default".to_string(),
                strategies: Vec::new(),
                config,
            }
        })
    }

    /// Installs the interceptor returned by [`global`](Self::global).
    ///
    /// # Errors
    ///
    /// Gives the interceptor back if a global interceptor is already in
    /// place, including the implicit default once any wrapper has used it.
    pub fn install_global(interceptor: Self) -> core::result::Result<(), Self> {
        GLOBAL_INTERCEPTOR.set(interceptor)
    }

    /// Adds a strategy to this interceptor
    ///
    /// Strategies are applied in the order they are added.
    pub fn add_strategy(&mut self, strategy: Arc<dyn GuardStrategy>) {
        self.strategies.push(strategy);
    }

    /// Gets the name of this interceptor
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the configuration of this interceptor
    #[must_use]
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Gets the first strategy in this interceptor
    #[must_use]
    pub fn get_strategy(&self) -> Option<&dyn GuardStrategy> {
        self.strategies.first().map(AsRef::as_ref)
    }

    /// Runs `f` over the value in `cell` under the guarded-call protocol.
    ///
    /// `succeeded` classifies the operation's return value for the
    /// strategies' `after_call` hook.
    ///
    /// # Errors
    ///
    /// Rejections from `before_call` hooks and protocol errors
    /// (`LOCK_TIMEOUT`, `SIGNAL_TIMEOUT`, `REENTRANT_CALL`). The operation
    /// does not run in those cases.
    pub fn intercept_cell<T, R>(
        &self,
        cell: &SyncCell<T>,
        site: &CallSite,
        f: impl FnOnce(&mut T) -> R,
        succeeded: impl FnOnce(&R) -> bool,
    ) -> Result<R> {
        let started = Instant::now();
        self.admit(site, started)?;
        let observer = SiteObserver::new(self, site, cell.state(), started);
        let result = match cell.enter(self.config.lock_timeout, &observer) {
            Ok(mut guard) => f(&mut *guard),
            Err(e) => return Err(self.reject(site, &observer, e)),
        };
        self.finish(site, &observer, succeeded(&result));
        Ok(result)
    }

    /// Runs `f` under the guarded-call protocol of `state`.
    ///
    /// # Errors
    ///
    /// Same as [`intercept_cell`](Self::intercept_cell).
    pub fn intercept_state<R>(
        &self,
        state: &SyncState,
        site: &CallSite,
        f: impl FnOnce() -> R,
        succeeded: impl FnOnce(&R) -> bool,
    ) -> Result<R> {
        let started = Instant::now();
        self.admit(site, started)?;
        let observer = SiteObserver::new(self, site, state, started);
        let result = match state.enter(self.config.lock_timeout, &observer) {
            Ok(_guard) => f(),
            Err(e) => return Err(self.reject(site, &observer, e)),
        };
        self.finish(site, &observer, succeeded(&result));
        Ok(result)
    }

    /// Reports a type transformation to every strategy
    pub fn notify_transform(&self, descriptor: &TypeDescriptor) {
        for strategy in &self.strategies {
            strategy.on_transform(descriptor);
        }
    }

    fn admit(&self, site: &CallSite, started: Instant) -> Result<()> {
        for (index, strategy) in self.strategies.iter().enumerate() {
            if let Err(e) = strategy.before_call(site) {
                let outcome = CallOutcome {
                    completion: Completion::Rejected(e),
                    wait:       core::time::Duration::ZERO,
                    elapsed:    started.elapsed(),
                };
                // Only strategies that already admitted the call hear about it.
                for admitted in self.strategies[..index].iter().rev() {
                    admitted.after_call(site, &outcome);
                }
                return Err(e);
            }
        }
        Ok(())
    }

    fn reject(&self, site: &CallSite, observer: &SiteObserver<'_>, error: Error) -> Error {
        let outcome = CallOutcome {
            completion: Completion::Rejected(error),
            wait:       observer.wait(),
            elapsed:    observer.started.elapsed(),
        };
        for strategy in self.strategies.iter().rev() {
            strategy.after_call(site, &outcome);
        }
        error
    }

    fn finish(&self, site: &CallSite, observer: &SiteObserver<'_>, succeeded: bool) {
        let outcome = CallOutcome {
            completion: if succeeded {
                Completion::Returned
            } else {
                Completion::Failed
            },
            wait:       observer.wait(),
            elapsed:    observer.started.elapsed(),
        };
        for strategy in self.strategies.iter().rev() {
            strategy.after_call(site, &outcome);
        }
    }
}

impl core::fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Interceptor")
            .field("name", &self.name)
            .field("strategies", &self.strategies.len())
            .field("config", &self.config)
            .finish()
    }
}

/// Forwards protocol stages of one call to the interceptor's strategies and
/// records when waiting ended.
struct SiteObserver<'a> {
    interceptor: &'a Interceptor,
    site:        &'a CallSite,
    lock_id:     u64,
    signal_id:   u64,
    started:     Instant,
    consumed:    Cell<Option<Instant>>,
}

impl<'a> SiteObserver<'a> {
    fn new(
        interceptor: &'a Interceptor,
        site: &'a CallSite,
        state: &SyncState,
        started: Instant,
    ) -> Self {
        Self {
            interceptor,
            site,
            lock_id: state.lock_id(),
            signal_id: state.signal_id(),
            started,
            consumed: Cell::new(None),
        }
    }

    /// Lock plus signal wait, or the whole time so far if waiting never
    /// finished.
    fn wait(&self) -> core::time::Duration {
        match self.consumed.get() {
            Some(at) => at.duration_since(self.started),
            None => self.started.elapsed(),
        }
    }
}

impl TransitionObserver for SiteObserver<'_> {
    fn on_stage(&self, stage: ProtocolStage) {
        if stage == ProtocolStage::SignalConsumed {
            self.consumed.set(Some(Instant::now()));
        }
        if !self.interceptor.config.emit_transitions {
            return;
        }
        let record = TransitionRecord {
            site: self.site,
            stage,
            lock_id: self.lock_id,
            signal_id: self.signal_id,
        };
        for strategy in &self.interceptor.strategies {
            strategy.on_transition(&record);
        }
    }
}
