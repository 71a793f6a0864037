//! Prelude module for tsafe-sync
//!
//! Re-exports the synchronization state types together with the error types
//! they return, so guarded wrappers can import everything at once.

pub use core::{
    cell::{Cell, UnsafeCell},
    fmt,
    fmt::Debug,
    ops::{Deref, DerefMut},
};
pub use std::time::{Duration, Instant};

pub use tsafe_error::{codes, kinds, Error, ErrorCategory, Result};

pub use crate::{
    HandoffSignal,
    NoopObserver,
    ProtocolGuard,
    ProtocolStage,
    SyncCell,
    SyncCellGuard,
    SyncState,
    TransitionObserver,
};
