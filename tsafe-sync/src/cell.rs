// tsafe - tsafe-sync
// Module: SyncCell
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! A value stored next to the [`SyncState`] that guards it.

use core::{
    cell::UnsafeCell,
    fmt,
    ops::{Deref, DerefMut},
};
use std::time::Duration;

use tsafe_error::Result;

use crate::{
    stage::TransitionObserver,
    state::{ProtocolGuard, SyncState},
};

/// A value protected by its own synchronization state.
///
/// Access goes through [`enter`](Self::enter), which runs the guarded-call
/// protocol and hands back a guard dereferencing to the value.
pub struct SyncCell<T: ?Sized> {
    state: SyncState,
    data:  UnsafeCell<T>,
}

/// A guard that provides mutable access to the data protected by a
/// `SyncCell`.
///
/// When the guard is dropped, the signal is re-opened and the lock released.
#[clippy::has_significant_drop]
pub struct SyncCellGuard<'a, T: ?Sized + 'a> {
    protocol: ProtocolGuard<'a>,
    data:     &'a UnsafeCell<T>,
}

// # Safety
// The data is only reachable through a `SyncCellGuard`. `SyncState::enter`
// hands out at most one `ProtocolGuard` per state at a time: other threads
// block on the lock, and the owning thread is rejected with REENTRANT_CALL
// while the depth counter is non-zero. So at most one guard, on one thread,
// can touch the data at any moment, which is the same contract a mutex gives.
unsafe impl<T: ?Sized + Send> Send for SyncCell<T> {}
// # Safety
// See above. `&SyncCell<T>` only ever yields exclusive access to `T` through
// the protocol, so sharing the cell requires `T: Send` but not `T: Sync`.
unsafe impl<T: ?Sized + Send> Sync for SyncCell<T> {}

impl<T> SyncCell<T> {
    /// Creates a cell with a fresh, idle state.
    #[inline]
    pub fn new(data: T) -> Self {
        Self {
            state: SyncState::new(),
            data:  UnsafeCell::new(data),
        }
    }

    /// Consumes the cell, returning the value.
    #[inline]
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T: ?Sized> SyncCell<T> {
    /// Runs the entry half of the protocol and returns a guard over the
    /// value.
    ///
    /// # Errors
    ///
    /// Same as [`SyncState::enter`].
    pub fn enter<'a>(
        &'a self,
        timeout: Option<Duration>,
        observer: &'a dyn TransitionObserver,
    ) -> Result<SyncCellGuard<'a, T>> {
        let protocol = self.state.enter(timeout, observer)?;
        Ok(SyncCellGuard {
            protocol,
            data: &self.data,
        })
    }

    /// The synchronization state attached to this cell.
    #[inline]
    pub fn state(&self) -> &SyncState {
        &self.state
    }

    /// Mutable access without the protocol; `&mut self` proves exclusivity.
    #[inline]
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }
}

impl<T: Default> Default for SyncCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: ?Sized> fmt::Debug for SyncCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never touches the data: formatting must not enter the protocol.
        f.debug_struct("SyncCell")
            .field("state", &self.state)
            .field("data", &"<guarded>")
            .finish()
    }
}

impl<'a, T: ?Sized> SyncCellGuard<'a, T> {
    /// The protocol guard backing this access.
    pub fn protocol(&self) -> &ProtocolGuard<'a> {
        &self.protocol
    }
}

impl<T: ?Sized> Deref for SyncCellGuard<'_, T> {
    type Target = T;
    #[inline]
    fn deref(&self) -> &Self::Target {
        // # Safety
        // A `SyncCellGuard` only exists while its `ProtocolGuard` holds the
        // state in the Executing stage, which grants exclusive access.
        unsafe { &*self.data.get() }
    }
}

impl<T: ?Sized> DerefMut for SyncCellGuard<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        // # Safety
        // As for `deref`; `&mut self` additionally rules out other borrows
        // through this guard.
        unsafe { &mut *self.data.get() }
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for SyncCellGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::*;
    use crate::stage::NoopObserver;

    #[test]
    fn test_cell_creation() {
        let cell = SyncCell::new(42);
        let guard = cell.enter(None, &NoopObserver).unwrap();
        assert_eq!(*guard, 42);
    }

    #[test]
    fn test_cell_modification() {
        let cell = SyncCell::new(vec![1, 2, 3]);
        {
            let mut guard = cell.enter(None, &NoopObserver).unwrap();
            guard.push(4);
        }
        let guard = cell.enter(None, &NoopObserver).unwrap();
        assert_eq!(*guard, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_second_guard_on_same_thread_is_rejected() {
        let cell = SyncCell::new(String::from("test"));
        let _first = cell.enter(None, &NoopObserver).unwrap();
        let second = cell.enter(None, &NoopObserver);
        assert!(second.is_err());
    }

    #[test]
    fn test_debug_does_not_enter() {
        let cell = SyncCell::new(5_u8);
        let _guard = cell.enter(None, &NoopObserver).unwrap();
        let rendered = format!("{cell:?}");
        assert!(rendered.contains("<guarded>"));
    }

    #[test]
    fn test_cell_concurrent_increments() {
        let cell = Arc::new(SyncCell::new(0_u64));
        let mut handles = vec![];

        for _ in 0..8 {
            let cell = Arc::clone(&cell);
            handles.push(thread::spawn(move || {
                for _ in 0..500 {
                    let mut guard = cell.enter(None, &NoopObserver).unwrap();
                    let current = *guard;
                    thread::yield_now();
                    *guard = current + 1;
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let total = *cell.enter(None, &NoopObserver).unwrap();
        assert_eq!(total, 8 * 500);
    }

    #[test]
    fn test_get_mut_and_into_inner() {
        let mut cell = SyncCell::new(1);
        *cell.get_mut() += 1;
        assert_eq!(cell.into_inner(), 2);
    }
}
