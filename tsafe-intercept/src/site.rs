//! Call sites and the records strategies receive about them.

use core::fmt;
use std::time::Duration;

use tsafe_error::Error;
use tsafe_sync::ProtocolStage;

use crate::caller::CallerInfo;

/// How a wrapped operation finds its synchronization state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// A member of a guarded type; the state lives on the receiving instance
    Member,
    /// A standalone function; the state lives on the wrapper itself
    Standalone,
}

/// One guarded call: what is being called, and by whom.
#[derive(Debug, Clone)]
pub struct CallSite {
    type_name: &'static str,
    operation: &'static str,
    kind:      OperationKind,
    caller:    CallerInfo,
}

impl CallSite {
    /// A call to member `operation` of the guarded type `type_name`.
    #[must_use]
    pub fn member(type_name: &'static str, operation: &'static str, caller: CallerInfo) -> Self {
        Self {
            type_name,
            operation,
            kind: OperationKind::Member,
            caller,
        }
    }

    /// A call to the standalone guarded function `operation`.
    #[must_use]
    pub fn standalone(operation: &'static str, caller: CallerInfo) -> Self {
        Self {
            type_name: "",
            operation,
            kind: OperationKind::Standalone,
            caller,
        }
    }

    /// Name of the guarded type, empty for standalone functions.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Name of the member or function.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Member or standalone.
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// The caller.
    #[must_use]
    pub fn caller(&self) -> &CallerInfo {
        &self.caller
    }

    /// `Type.operation` for members, `operation` for standalone functions.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match self.kind {
            OperationKind::Member => format!("{}.{}", self.type_name, self.operation),
            OperationKind::Standalone => self.operation.to_string(),
        }
    }
}

impl fmt::Display for CallSite {
    /// Renders as `[thread|file:line|Type.operation]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}|{}:{}|",
            self.caller.thread_name(),
            self.caller.file_name(),
            self.caller.line()
        )?;
        match self.kind {
            OperationKind::Member => write!(f, "{}.{}]", self.type_name, self.operation),
            OperationKind::Standalone => write!(f, "{}]", self.operation),
        }
    }
}

/// A protocol stage reached by one call.
#[derive(Debug, Clone, Copy)]
pub struct TransitionRecord<'a> {
    /// The call
    pub site:      &'a CallSite,
    /// The stage reached
    pub stage:     ProtocolStage,
    /// Identity of the state's lock
    pub lock_id:   u64,
    /// Identity of the state's signal
    pub signal_id: u64,
}

impl fmt::Display for TransitionRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (lock {}, signal {})",
            self.site, self.stage, self.lock_id, self.signal_id
        )
    }
}

/// How a guarded call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The operation ran and returned normally
    Returned,
    /// The operation ran and returned an error of its own
    Failed,
    /// The operation never ran
    Rejected(Error),
}

/// Summary passed to strategies once a call has left the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallOutcome {
    /// How the call ended
    pub completion: Completion,
    /// Time spent waiting for the lock and the signal
    pub wait:       Duration,
    /// Time from entering the interceptor until the state was released
    pub elapsed:    Duration,
}

impl CallOutcome {
    /// Whether the operation ran and returned normally.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.completion, Completion::Returned)
    }

    /// Whether the operation never ran.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self.completion, Completion::Rejected(_))
    }
}
