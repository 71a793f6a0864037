// tsafe - tsafe-error
// Module: Error Codes
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Error codes for tsafe

// Wrap-time error codes (1000-1099)
/// Generic wrap-time error
pub const WRAP_ERROR: u16 = 1000;
/// Member enumeration of a guarded type failed
pub const MEMBER_ENUMERATION_FAILED: u16 = 1001;
/// A guarded type enumerated the same member twice
pub const DUPLICATE_MEMBER: u16 = 1002;
/// A type was transformed again with a different member filter
pub const INCONSISTENT_TRANSFORM: u16 = 1003;
/// A call named a member the type never enumerated
pub const UNKNOWN_MEMBER: u16 = 1004;
/// A call named a member the member filter excluded from guarding
pub const EXCLUDED_MEMBER: u16 = 1005;

// Concurrency error codes (2000-2099)
/// Generic concurrency error
pub const CONCURRENCY_ERROR: u16 = 2000;
/// Nested call on a state the calling thread is already executing under
pub const REENTRANT_CALL: u16 = 2001;

// Timeout error codes (2100-2199)
/// Bounded lock acquisition expired
pub const LOCK_TIMEOUT: u16 = 2100;
/// Bounded hand-off signal wait expired
pub const SIGNAL_TIMEOUT: u16 = 2101;

// Configuration error codes (3000-3099)
/// Invalid configuration value
pub const INVALID_CONFIG: u16 = 3000;

// Operation error codes (4000-4099)
/// Generic guarded operation error
pub const OPERATION_ERROR: u16 = 4000;
/// Key missing from a guarded mapping
pub const KEY_NOT_FOUND: u16 = 4001;

/// Unknown error
pub const UNKNOWN: u16 = 9999;
