//! Protocol stages and the observer hook that reports them.

use core::fmt;

/// A point in the guarded-call protocol.
///
/// Stages are reported in the order they are listed. A call that is rejected
/// or times out stops early; a call that enters `Executing` always reports
/// the remaining three stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolStage {
    /// About to block on the state lock
    AwaitingLock,
    /// The state lock is held
    LockAcquired,
    /// About to wait for the hand-off signal
    AwaitingSignal,
    /// The signal was observed open and closed
    SignalConsumed,
    /// The guarded body is running
    Executing,
    /// The guarded body returned, failed, or unwound
    ExecutionFinished,
    /// The signal is open again
    SignalReopened,
    /// The state lock was released
    LockReleased,
}

impl ProtocolStage {
    /// Every stage in protocol order.
    pub const ALL: [Self; 8] = [
        Self::AwaitingLock,
        Self::LockAcquired,
        Self::AwaitingSignal,
        Self::SignalConsumed,
        Self::Executing,
        Self::ExecutionFinished,
        Self::SignalReopened,
        Self::LockReleased,
    ];

    /// Short human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AwaitingLock => "awaiting lock",
            Self::LockAcquired => "lock acquired",
            Self::AwaitingSignal => "awaiting signal",
            Self::SignalConsumed => "signal consumed",
            Self::Executing => "executing",
            Self::ExecutionFinished => "execution finished",
            Self::SignalReopened => "signal reopened",
            Self::LockReleased => "lock released",
        }
    }
}

impl fmt::Display for ProtocolStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives every protocol stage of one guarded call.
pub trait TransitionObserver {
    /// Called once per stage, on the calling thread.
    fn on_stage(&self, stage: ProtocolStage);
}

/// Observer that ignores every stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl TransitionObserver for NoopObserver {
    #[inline]
    fn on_stage(&self, _stage: ProtocolStage) {}
}

impl<F> TransitionObserver for F
where
    F: Fn(ProtocolStage),
{
    fn on_stage(&self, stage: ProtocolStage) {
        self(stage);
    }
}
