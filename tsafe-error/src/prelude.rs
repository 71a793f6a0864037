// tsafe - tsafe-error
// Module: tsafe Error Prelude
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Prelude module for tsafe-error
//!
//! Re-exports the error type, its categories and the code table so dependent
//! crates can pull everything in with a single import.

pub use core::fmt::{self, Debug, Display};

pub use crate::{
    codes,
    kinds::{self, KeyNotFound, ReentrantCall, Timeout, TimeoutPhase},
    Error,
    ErrorCategory,
    ErrorSource,
    Result,
    ToErrorCategory,
};
