// tsafe - tsafe-sync
// Module: Hand-off signal
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! A binary open/closed flag with a blocking wait-and-close.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tsafe_error::{
    kinds::{Timeout, TimeoutPhase},
    Result,
};

/// Binary hand-off signal.
///
/// The signal starts open. [`wait_and_close`](Self::wait_and_close) blocks
/// until the signal is open and closes it in the same critical section, so
/// two waiters can never both observe it open.
pub struct HandoffSignal {
    id:   u64,
    open: Mutex<bool>,
    cond: Condvar,
}

impl HandoffSignal {
    /// Creates an open signal with a fresh identity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id:   crate::next_identity(),
            open: Mutex::new(true),
            cond: Condvar::new(),
        }
    }

    /// Process-unique identity of this signal.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Snapshot of whether the signal is currently open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        *self.open.lock()
    }

    /// Blocks until the signal is open, then closes it.
    ///
    /// With a `timeout`, gives up once it has elapsed and leaves the signal
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns `SIGNAL_TIMEOUT` if the timeout expires first.
    pub fn wait_and_close(&self, timeout: Option<Duration>) -> Result<()> {
        let mut open = self.open.lock();
        match timeout {
            None => {
                while !*open {
                    self.cond.wait(&mut open);
                }
            }
            Some(limit) => {
                let deadline = Instant::now() + limit;
                while !*open {
                    if self.cond.wait_until(&mut open, deadline).timed_out() && !*open {
                        return Err(Timeout::new(TimeoutPhase::Signal).into());
                    }
                }
            }
        }
        *open = false;
        Ok(())
    }

    /// Opens the signal and wakes one waiter.
    pub fn reopen(&self) {
        let mut open = self.open.lock();
        *open = true;
        drop(open);
        self.cond.notify_one();
    }
}

impl Default for HandoffSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for HandoffSignal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HandoffSignal")
            .field("id", &self.id)
            .field("open", &self.is_open())
            .finish()
    }
}
