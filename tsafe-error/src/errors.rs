// tsafe - tsafe-error
// Module: tsafe Error Types
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Unified error type for tsafe
//!
//! Every failure raised by the synchronization protocol, the type
//! transformation and the guarded collections is an [`Error`]. Errors carry a
//! category, a stable numeric code and a static message.

use core::fmt;

use crate::{codes, kinds, ToErrorCategory};

/// `Error` categories for tsafe operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorCategory {
    /// Failures while wrapping a type or resolving a member name
    Wrap          = 1,
    /// Protocol misuse such as nested calls on a busy state
    Concurrency   = 2,
    /// Bounded waits that expired
    Timeout       = 3,
    /// Invalid configuration values
    Configuration = 4,
    /// Failures raised by guarded operations themselves
    Operation     = 5,
    /// Unknown errors
    Unknown       = 9,
}

/// Base trait for all error types
pub trait ErrorSource: fmt::Debug + Send + Sync {
    /// Get the error code
    fn code(&self) -> u16;

    /// Get the error message
    fn message(&self) -> &'static str;

    /// Get the error category
    fn category(&self) -> ErrorCategory;
}

/// tsafe `Error` type
///
/// Equality compares category and code only, so two errors with the same
/// code but different messages are considered the same failure.
#[derive(Debug, Copy, Clone)]
pub struct Error {
    /// `Error` category
    pub category: ErrorCategory,
    /// `Error` code
    pub code:     u16,
    /// `Error` message
    pub message:  &'static str,
}

impl Error {
    /// Nested call on a state already held by the calling thread
    pub const REENTRANT_CALL: Self = Self::new(
        ErrorCategory::Concurrency,
        codes::REENTRANT_CALL,
        "Nested call on a state already executing on this thread",
    );
    /// Lock acquisition timed out
    pub const LOCK_TIMEOUT: Self = Self::new(
        ErrorCategory::Timeout,
        codes::LOCK_TIMEOUT,
        "Timed out waiting for the state lock",
    );
    /// Signal wait timed out
    pub const SIGNAL_TIMEOUT: Self = Self::new(
        ErrorCategory::Timeout,
        codes::SIGNAL_TIMEOUT,
        "Timed out waiting for the hand-off signal",
    );
    /// Key missing from a guarded mapping
    pub const KEY_NOT_FOUND: Self = Self::new(
        ErrorCategory::Operation,
        codes::KEY_NOT_FOUND,
        "Key not found",
    );

    /// Create a new error.
    #[must_use]
    pub const fn new(category: ErrorCategory, code: u16, message: &'static str) -> Self {
        Self {
            category,
            code,
            message,
        }
    }

    /// Create a wrap error for a failed member enumeration
    #[must_use]
    pub const fn member_enumeration_failed(message: &'static str) -> Self {
        Self::new(
            ErrorCategory::Wrap,
            codes::MEMBER_ENUMERATION_FAILED,
            message,
        )
    }

    /// Create a wrap error for a member enumerated twice
    #[must_use]
    pub const fn duplicate_member(message: &'static str) -> Self {
        Self::new(ErrorCategory::Wrap, codes::DUPLICATE_MEMBER, message)
    }

    /// Create a wrap error for a type transformed again with another filter
    #[must_use]
    pub const fn inconsistent_transform(message: &'static str) -> Self {
        Self::new(ErrorCategory::Wrap, codes::INCONSISTENT_TRANSFORM, message)
    }

    /// Create a wrap error for a call to a member the type does not have
    #[must_use]
    pub const fn unknown_member(message: &'static str) -> Self {
        Self::new(ErrorCategory::Wrap, codes::UNKNOWN_MEMBER, message)
    }

    /// Create a wrap error for a call to a member excluded from guarding
    #[must_use]
    pub const fn excluded_member(message: &'static str) -> Self {
        Self::new(ErrorCategory::Wrap, codes::EXCLUDED_MEMBER, message)
    }

    /// Create a generic concurrency error
    #[must_use]
    pub const fn concurrency_error(message: &'static str) -> Self {
        Self::new(ErrorCategory::Concurrency, codes::CONCURRENCY_ERROR, message)
    }

    /// Create a lock timeout error
    #[must_use]
    pub const fn lock_timeout() -> Self {
        Self::LOCK_TIMEOUT
    }

    /// Create a signal timeout error
    #[must_use]
    pub const fn signal_timeout() -> Self {
        Self::SIGNAL_TIMEOUT
    }

    /// Create a configuration error
    #[must_use]
    pub const fn invalid_config(message: &'static str) -> Self {
        Self::new(ErrorCategory::Configuration, codes::INVALID_CONFIG, message)
    }

    /// Create a key not found error with a custom message
    #[must_use]
    pub const fn key_not_found(message: &'static str) -> Self {
        Self::new(ErrorCategory::Operation, codes::KEY_NOT_FOUND, message)
    }

    /// Create a generic operation error
    #[must_use]
    pub const fn operation_error(message: &'static str) -> Self {
        Self::new(ErrorCategory::Operation, codes::OPERATION_ERROR, message)
    }

    /// Check if this is a wrap-time error
    #[must_use]
    pub const fn is_wrap_error(&self) -> bool {
        matches!(self.category, ErrorCategory::Wrap)
    }

    /// Check if this is a concurrency error
    #[must_use]
    pub const fn is_concurrency_error(&self) -> bool {
        matches!(self.category, ErrorCategory::Concurrency)
    }

    /// Check if this is a timeout
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self.category, ErrorCategory::Timeout)
    }

    /// Check if this is a configuration error
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(self.category, ErrorCategory::Configuration)
    }

    /// Check if this error was raised by a guarded operation
    #[must_use]
    pub const fn is_operation_error(&self) -> bool {
        matches!(self.category, ErrorCategory::Operation)
    }

    /// Check whether this error carries the given code
    #[must_use]
    pub const fn has_code(&self, code: u16) -> bool {
        self.code == code
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.category == other.category && self.code == other.code
    }
}

impl Eq for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:?}][E{:04X}] {}",
            self.category, self.code, self.message
        )
    }
}

impl ErrorSource for Error {
    fn code(&self) -> u16 {
        self.code
    }

    fn message(&self) -> &'static str {
        self.message
    }

    fn category(&self) -> ErrorCategory {
        self.category
    }
}

impl ToErrorCategory for Error {
    fn to_category(&self) -> ErrorCategory {
        self.category
    }
}

impl From<core::fmt::Error> for Error {
    fn from(_: core::fmt::Error) -> Self {
        Self::new(
            ErrorCategory::Unknown,
            codes::UNKNOWN,
            "Formatting error (static)",
        )
    }
}

// -- From<kinds::X> for Error implementations --
impl From<kinds::ReentrantCall> for Error {
    fn from(_e: kinds::ReentrantCall) -> Self {
        Self::REENTRANT_CALL
    }
}

impl From<kinds::Timeout> for Error {
    fn from(e: kinds::Timeout) -> Self {
        match e.phase {
            kinds::TimeoutPhase::Lock => Self::LOCK_TIMEOUT,
            kinds::TimeoutPhase::Signal => Self::SIGNAL_TIMEOUT,
        }
    }
}

impl From<kinds::KeyNotFound> for Error {
    fn from(_e: kinds::KeyNotFound) -> Self {
        Self::KEY_NOT_FOUND
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
