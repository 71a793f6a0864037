// tsafe - tsafe-intercept
// Module: Guarded values
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Guarded composite values.
//!
//! A type opts in by implementing [`GuardedType`], listing the names of its
//! member operations. Wrapping a value in [`Guarded`] transforms the type
//! once (see [`TypeRegistry`]) and attaches a fresh synchronization state to
//! the instance. Every member call then runs under that state.

use core::{any::Any, fmt};
use std::sync::Arc;

use tsafe_error::{Error, Result};
use tsafe_sync::{SyncCell, SyncState};

use crate::{
    caller::CallerInfo,
    registry::{MemberSet, TypeDescriptor, TypeRegistry},
    site::CallSite,
    Interceptor,
};

/// A type whose member operations can be guarded.
pub trait GuardedType: Any + Send {
    /// Registers the names of the type's member operations.
    ///
    /// Called once per type per process, on first construction of a
    /// `Guarded<Self>`. Operations that should stay unwrapped may be listed
    /// too; the member filter decides.
    ///
    /// # Errors
    ///
    /// Errors from [`MemberSet::add`], or any enumeration failure of the
    /// type's own.
    fn enumerate_members(members: &mut MemberSet) -> Result<()>;

    /// Name used in diagnostics
    fn type_name() -> &'static str {
        let full = core::any::type_name::<Self>();
        // Keep generic arguments intact; strip the module path of the base type.
        let base_end = full.find('<').unwrap_or(full.len());
        match full[..base_end].rfind("::") {
            Some(pos) => &full[pos + 2..],
            None => full,
        }
    }
}

/// A value of a guarded type together with its synchronization state.
///
/// All member calls on one instance share one state; different instances
/// never contend with each other.
pub struct Guarded<T: GuardedType> {
    cell:        SyncCell<T>,
    descriptor:  Arc<TypeDescriptor>,
    interceptor: Option<Arc<Interceptor>>,
}

impl<T: GuardedType> Guarded<T> {
    /// Wraps `value` using the global interceptor.
    ///
    /// # Errors
    ///
    /// Wrap-time errors from transforming `T`.
    pub fn new(value: T) -> Result<Self> {
        Self::build(None, || Ok(value))
    }

    /// Transforms `T`, then builds the value with `construct`.
    ///
    /// Errors from `construct` are returned unchanged.
    ///
    /// # Errors
    ///
    /// Wrap-time errors from transforming `T`, converted into `E`, or
    /// whatever `construct` returns.
    pub fn try_new<E: From<Error>>(
        construct: impl FnOnce() -> core::result::Result<T, E>,
    ) -> core::result::Result<Self, E> {
        Self::build(None, construct)
    }

    /// Wraps `value` using `interceptor`.
    ///
    /// # Errors
    ///
    /// Wrap-time errors from transforming `T`.
    pub fn with_interceptor(value: T, interceptor: Arc<Interceptor>) -> Result<Self> {
        Self::build(Some(interceptor), || Ok(value))
    }

    fn build<E: From<Error>>(
        interceptor: Option<Arc<Interceptor>>,
        construct: impl FnOnce() -> core::result::Result<T, E>,
    ) -> core::result::Result<Self, E> {
        let active = interceptor.as_deref().unwrap_or_else(|| Interceptor::global());
        let (descriptor, fresh) =
            TypeRegistry::global().transform::<T>(&active.config().member_filter)?;
        if fresh {
            active.notify_transform(&descriptor);
        }
        let value = construct()?;
        Ok(Self {
            cell: SyncCell::new(value),
            descriptor,
            interceptor,
        })
    }

    fn interceptor(&self) -> &Interceptor {
        self.interceptor.as_deref().unwrap_or_else(|| Interceptor::global())
    }

    /// Calls member `member` as `f` under this instance's state.
    ///
    /// # Errors
    ///
    /// - `UNKNOWN_MEMBER` / `EXCLUDED_MEMBER` if `member` is not a wrapped
    ///   member of `T`; `f` does not run.
    /// - Rejections and protocol errors from the interceptor; `f` does not
    ///   run.
    #[track_caller]
    pub fn call<R>(&self, member: &str, f: impl FnOnce(&mut T) -> R) -> Result<R> {
        let caller = CallerInfo::capture();
        let operation = self.descriptor.resolve(member)?;
        let site = CallSite::member(self.descriptor.type_name(), operation, caller);
        self.interceptor().intercept_cell(&self.cell, &site, f, |_| true)
    }

    /// Like [`call`](Self::call) for fallible members; the member's own
    /// error is passed through unchanged.
    ///
    /// # Errors
    ///
    /// The member's error, or any error of [`call`](Self::call) converted
    /// into `E`.
    #[track_caller]
    pub fn try_call<R, E: From<Error>>(
        &self,
        member: &str,
        f: impl FnOnce(&mut T) -> core::result::Result<R, E>,
    ) -> core::result::Result<R, E> {
        let caller = CallerInfo::capture();
        let operation = self.descriptor.resolve(member)?;
        let site = CallSite::member(self.descriptor.type_name(), operation, caller);
        self.interceptor()
            .intercept_cell(&self.cell, &site, f, core::result::Result::is_ok)?
    }

    /// The descriptor `T` was transformed into.
    #[must_use]
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    /// The synchronization state of this instance.
    #[must_use]
    pub fn state(&self) -> &SyncState {
        self.cell.state()
    }

    /// Direct access; `&mut self` already rules out other callers.
    pub fn get_mut(&mut self) -> &mut T {
        self.cell.get_mut()
    }

    /// Unwraps the value.
    pub fn into_inner(self) -> T {
        self.cell.into_inner()
    }
}

impl<T: GuardedType> fmt::Debug for Guarded<T> {
    /// Formats the wrapper only. The value itself is never read, so
    /// formatting does not enter the protocol.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guarded")
            .field("type", &self.descriptor.type_name())
            .field("lock_id", &self.state().lock_id())
            .field("signal_id", &self.state().signal_id())
            .finish_non_exhaustive()
    }
}
