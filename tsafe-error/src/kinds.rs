//! Defines specific error kinds raised by the tsafe synchronization layer.
//!
//! Kinds are zero-sized or tiny values used at the point where a failure is
//! detected. They convert into [`crate::Error`] with `?`.

use core::fmt::{self, Display};

/// A thread re-entered a state it is already executing under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReentrantCall;

impl Display for ReentrantCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reentrant call on a busy state")
    }
}

/// Which protocol wait expired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeoutPhase {
    /// Waiting for the reentrant lock
    Lock,
    /// Waiting for the hand-off signal
    Signal,
}

/// A bounded protocol wait expired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeout {
    /// Phase in which the wait expired
    pub phase: TimeoutPhase,
}

impl Timeout {
    /// Create a timeout for the given phase
    #[must_use]
    pub const fn new(phase: TimeoutPhase) -> Self {
        Self { phase }
    }
}

impl Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.phase {
            TimeoutPhase::Lock => write!(f, "Timed out waiting for lock"),
            TimeoutPhase::Signal => write!(f, "Timed out waiting for signal"),
        }
    }
}

/// A key was missing from a guarded mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyNotFound;

impl Display for KeyNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key not found")
    }
}
