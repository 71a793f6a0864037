// tsafe - tsafe-sync
// Module: Synchronization state
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Per-entity synchronization state and the guarded-call protocol.

use core::{cell::Cell, fmt};
use std::time::Duration;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use tsafe_error::{
    kinds::{ReentrantCall, Timeout, TimeoutPhase},
    Result,
};

use crate::{
    signal::HandoffSignal,
    stage::{ProtocolStage, TransitionObserver},
};

/// Lock + hand-off signal owned by one guarded entity.
///
/// The lock protects an execution depth counter. The counter is only non-zero
/// while the holding thread is inside a guarded body, which is how a nested
/// call from that thread is told apart from a fresh one.
pub struct SyncState {
    lock:    ReentrantMutex<Cell<usize>>,
    lock_id: u64,
    signal:  HandoffSignal,
}

impl SyncState {
    /// Creates an idle state: lock free, signal open.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lock:    ReentrantMutex::new(Cell::new(0)),
            lock_id: crate::next_identity(),
            signal:  HandoffSignal::new(),
        }
    }

    /// Process-unique identity of the lock.
    #[inline]
    #[must_use]
    pub fn lock_id(&self) -> u64 {
        self.lock_id
    }

    /// Process-unique identity of the signal.
    #[inline]
    #[must_use]
    pub fn signal_id(&self) -> u64 {
        self.signal.id()
    }

    /// The hand-off signal.
    #[must_use]
    pub fn signal(&self) -> &HandoffSignal {
        &self.signal
    }

    /// Whether no thread is executing under this state.
    ///
    /// True when the lock can be taken without blocking, no guarded body is
    /// running on the current thread, and the signal is open. Called from
    /// inside a guarded body this returns `false`.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        match self.lock.try_lock() {
            Some(depth) => depth.get() == 0 && self.signal.is_open(),
            None => false,
        }
    }

    /// Runs the entry half of the protocol.
    ///
    /// Acquires the lock, waits for the signal and closes it, then returns a
    /// guard that holds the state in use until dropped. `timeout` bounds both
    /// the lock acquisition and the signal wait.
    ///
    /// # Errors
    ///
    /// - `LOCK_TIMEOUT` if the lock could not be acquired in time.
    /// - `REENTRANT_CALL` if the calling thread is already executing under
    ///   this state.
    /// - `SIGNAL_TIMEOUT` if the signal stayed closed for the whole timeout.
    ///
    /// On error the lock is released before returning.
    pub fn enter<'a>(
        &'a self,
        timeout: Option<Duration>,
        observer: &'a dyn TransitionObserver,
    ) -> Result<ProtocolGuard<'a>> {
        observer.on_stage(ProtocolStage::AwaitingLock);
        let held = match timeout {
            None => self.lock.lock(),
            Some(limit) => self
                .lock
                .try_lock_for(limit)
                .ok_or(Timeout::new(TimeoutPhase::Lock))?,
        };
        observer.on_stage(ProtocolStage::LockAcquired);

        if held.get() > 0 {
            drop(held);
            observer.on_stage(ProtocolStage::LockReleased);
            return Err(ReentrantCall.into());
        }

        observer.on_stage(ProtocolStage::AwaitingSignal);
        if let Err(e) = self.signal.wait_and_close(timeout) {
            drop(held);
            observer.on_stage(ProtocolStage::LockReleased);
            return Err(e);
        }
        observer.on_stage(ProtocolStage::SignalConsumed);

        held.set(1);
        observer.on_stage(ProtocolStage::Executing);
        Ok(ProtocolGuard {
            state: self,
            held: Some(held),
            observer,
        })
    }

    /// Runs `f` under the full protocol and returns its result.
    ///
    /// # Errors
    ///
    /// Any error from [`enter`](Self::enter). The body is not run in that
    /// case.
    pub fn execute<R>(
        &self,
        timeout: Option<Duration>,
        observer: &dyn TransitionObserver,
        f: impl FnOnce() -> R,
    ) -> Result<R> {
        let _guard = self.enter(timeout, observer)?;
        Ok(f())
    }
}

impl Default for SyncState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncState")
            .field("lock_id", &self.lock_id)
            .field("signal", &self.signal)
            .finish_non_exhaustive()
    }
}

/// Holds a [`SyncState`] in the `Executing` stage.
///
/// Dropping the guard re-opens the signal and releases the lock, in that
/// order. This also happens while a panic unwinds through the guarded body.
#[clippy::has_significant_drop]
pub struct ProtocolGuard<'a> {
    state:    &'a SyncState,
    held:     Option<ReentrantMutexGuard<'a, Cell<usize>>>,
    observer: &'a dyn TransitionObserver,
}

impl ProtocolGuard<'_> {
    /// The state this guard holds.
    #[must_use]
    pub fn state(&self) -> &SyncState {
        self.state
    }
}

impl fmt::Debug for ProtocolGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolGuard")
            .field("lock_id", &self.state.lock_id)
            .finish_non_exhaustive()
    }
}

impl Drop for ProtocolGuard<'_> {
    fn drop(&mut self) {
        self.observer.on_stage(ProtocolStage::ExecutionFinished);
        if let Some(held) = self.held.take() {
            held.set(0);
            self.state.signal.reopen();
            self.observer.on_stage(ProtocolStage::SignalReopened);
            drop(held);
            self.observer.on_stage(ProtocolStage::LockReleased);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Barrier, Mutex},
        thread,
    };

    use tsafe_error::codes;

    use super::*;
    use crate::stage::NoopObserver;

    #[test]
    fn new_state_is_idle() {
        let state = SyncState::new();
        assert!(state.is_idle());
        assert_ne!(state.lock_id(), state.signal_id());
    }

    #[test]
    fn guard_holds_and_restores_state() {
        let state = SyncState::new();
        {
            let _guard = state.enter(None, &NoopObserver).unwrap();
            assert!(!state.signal().is_open());
            assert!(!state.is_idle());
        }
        assert!(state.is_idle());
    }

    #[test]
    fn stages_are_reported_in_order() {
        let seen = Mutex::new(Vec::new());
        let observer = |stage: ProtocolStage| seen.lock().unwrap().push(stage);
        let state = SyncState::new();

        let value = state.execute(None, &observer, || 7).unwrap();
        assert_eq!(value, 7);
        assert_eq!(*seen.lock().unwrap(), ProtocolStage::ALL.to_vec());
    }

    #[test]
    fn nested_call_is_rejected() {
        let state = SyncState::new();
        let nested = state
            .execute(None, &NoopObserver, || {
                state.execute(None, &NoopObserver, || ()).unwrap_err()
            })
            .unwrap();
        assert_eq!(nested.code, codes::REENTRANT_CALL);
        assert!(state.is_idle());
    }

    #[test]
    fn nested_rejection_reports_lock_release() {
        let seen = Mutex::new(Vec::new());
        let observer = |stage: ProtocolStage| seen.lock().unwrap().push(stage);
        let state = SyncState::new();

        let _outer = state.enter(None, &NoopObserver).unwrap();
        assert!(state.enter(None, &observer).is_err());
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ProtocolStage::AwaitingLock,
                ProtocolStage::LockAcquired,
                ProtocolStage::LockReleased,
            ]
        );
    }

    #[test]
    fn contended_lock_times_out() {
        let state = Arc::new(SyncState::new());
        let entered = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));

        let holder = {
            let state = Arc::clone(&state);
            let entered = Arc::clone(&entered);
            let release = Arc::clone(&release);
            thread::spawn(move || {
                state
                    .execute(None, &NoopObserver, || {
                        entered.wait();
                        release.wait();
                    })
                    .unwrap();
            })
        };

        entered.wait();
        let err = state
            .execute(Some(Duration::from_millis(20)), &NoopObserver, || ())
            .unwrap_err();
        assert_eq!(err.code, codes::LOCK_TIMEOUT);
        release.wait();
        holder.join().unwrap();
        assert!(state.is_idle());
    }

    #[test]
    fn signal_timeout_releases_the_lock() {
        let state = Arc::new(SyncState::new());
        state.signal().wait_and_close(None).unwrap();
        let limit = Some(Duration::from_millis(20));

        let err = state.execute(limit, &NoopObserver, || ()).unwrap_err();
        assert_eq!(err.code, codes::SIGNAL_TIMEOUT);

        // A lock left held would make the other thread time out on the lock.
        let other = {
            let state = Arc::clone(&state);
            thread::spawn(move || state.execute(limit, &NoopObserver, || ()).unwrap_err())
        };
        assert_eq!(other.join().unwrap().code, codes::SIGNAL_TIMEOUT);

        state.signal().reopen();
        assert_eq!(state.execute(None, &NoopObserver, || 2).unwrap(), 2);
        assert!(state.is_idle());
    }

    #[test]
    fn panic_in_body_restores_state() {
        let state = SyncState::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            state.execute(None, &NoopObserver, || -> u32 { panic!("boom") })
        }));
        assert!(result.is_err());
        assert!(state.is_idle());
        assert_eq!(state.execute(None, &NoopObserver, || 1).unwrap(), 1);
    }
}
