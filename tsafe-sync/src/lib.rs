#![doc = "Lock + hand-off signal synchronization state for tsafe guarded calls."]
#![warn(clippy::missing_panics_doc)]

//! Every guarded entity owns one [`SyncState`]: a reentrant lock and a binary
//! hand-off signal. A guarded call walks the protocol
//!
//! ```text
//! Idle -> LockAcquired -> SignalAwaited -> SignalConsumed -> Executing
//!      -> SignalReopened -> LockReleased
//! ```
//!
//! through [`SyncState::enter`], which returns a [`ProtocolGuard`]. The guard
//! re-opens the signal and releases the lock when dropped, so the state is
//! restored whether the guarded body returns, fails, or panics.
//!
//! [`SyncCell`] pairs a state with the value it protects.
//!
//! ```
//! use tsafe_sync::{NoopObserver, SyncCell};
//!
//! let cell = SyncCell::new(Vec::new());
//! {
//!     let mut guard = cell.enter(None, &NoopObserver).unwrap();
//!     guard.push(1);
//! }
//! assert!(cell.state().is_idle());
//! ```

use core::sync::atomic::{AtomicU64, Ordering};

pub mod cell;
pub mod prelude;
pub mod signal;
pub mod stage;
pub mod state;

pub use cell::{SyncCell, SyncCellGuard};
pub use signal::HandoffSignal;
pub use stage::{NoopObserver, ProtocolStage, TransitionObserver};
pub use state::{ProtocolGuard, SyncState};

static NEXT_IDENTITY: AtomicU64 = AtomicU64::new(1);

/// Hands out process-unique identities for locks and signals.
pub(crate) fn next_identity() -> u64 {
    NEXT_IDENTITY.fetch_add(1, Ordering::Relaxed)
}
