// tsafe - tsafe-error
// Module: Error Handling
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! tsafe error handling library
//!
//! This library provides the error type shared by every tsafe crate. Errors
//! are small `Copy` values made of a category, a numeric code and a static
//! message, so they can be produced from inside a synchronization protocol
//! without allocating.
//!
//! # Error Categories
//!
//! ## Wrap errors (1000-1099)
//! - Member enumeration failures
//! - Duplicate member names
//! - Inconsistent re-transformation of a type
//! - Calls to unknown or excluded members
//!
//! ## Concurrency errors (2000-2099)
//! - Nested calls on a state already in use by the calling thread
//!
//! ## Timeout errors (2100-2199)
//! - Bounded lock acquisition or signal wait expired
//!
//! ## Configuration errors (3000-3099)
//!
//! ## Operation errors (4000-4099)
//! - Failures raised by the ready-made guarded collections
//!
//! # Usage
//!
//! ```
//! use tsafe_error::{codes, Error, ErrorCategory};
//!
//! let error = Error::new(ErrorCategory::Wrap, codes::UNKNOWN_MEMBER, "no such member");
//! assert!(error.is_wrap_error());
//!
//! let timeout = Error::lock_timeout();
//! assert!(timeout.is_timeout());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::missing_panics_doc)]

/// Error codes for tsafe
pub mod codes;
/// Error and error category types
pub mod errors;
/// Error kind definitions
pub mod kinds;

pub mod prelude;

pub use errors::{Error, ErrorCategory, ErrorSource};
pub use kinds::{KeyNotFound, ReentrantCall, Timeout, TimeoutPhase};

/// A specialized `Result` type for tsafe operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error conversion trait for converting to specific error categories
pub trait ToErrorCategory {
    /// Convert the error to a specific category
    fn to_category(&self) -> ErrorCategory;
}
