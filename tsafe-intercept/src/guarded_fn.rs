// tsafe - tsafe-intercept
// Module: Guarded standalone functions
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Guarded standalone functions.
//!
//! [`GuardedFn`] serializes every call to one callable through a state
//! stored on the wrapper itself. The state is created on the first call, so
//! a wrapper can be built in a `const` context:
//!
//! ```
//! use tsafe_intercept::GuardedFn;
//!
//! fn add(a: u32, b: u32) -> u32 {
//!     a + b
//! }
//!
//! static ADD: GuardedFn<fn(u32, u32) -> u32> = GuardedFn::new("add", add);
//!
//! assert_eq!(ADD.call((2, 3)).unwrap(), 5);
//! ```

use core::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tsafe_error::{Error, Result};
use tsafe_sync::SyncState;

use crate::{caller::CallerInfo, site::CallSite, Interceptor};

/// A callable invoked with its arguments packed in a tuple.
///
/// Implemented for every `Fn` of up to six arguments.
pub trait GuardedCallable<Args> {
    /// What the callable returns
    type Output;

    /// Calls with unpacked `args`.
    fn invoke(&self, args: Args) -> Self::Output;
}

macro_rules! impl_guarded_callable {
    ($($ty:ident $var:ident),*) => {
        impl<Func, Ret, $($ty),*> GuardedCallable<($($ty,)*)> for Func
        where
            Func: Fn($($ty),*) -> Ret,
        {
            type Output = Ret;

            #[inline]
            fn invoke(&self, ($($var,)*): ($($ty,)*)) -> Ret {
                self($($var),*)
            }
        }
    };
}

impl_guarded_callable!();
impl_guarded_callable!(A a);
impl_guarded_callable!(A a, B b);
impl_guarded_callable!(A a, B b, C c);
impl_guarded_callable!(A a, B b, C c, D d);
impl_guarded_callable!(A a, B b, C c, D d, E e);
impl_guarded_callable!(A a, B b, C c, D d, E e, G g);

/// A standalone callable whose calls are serialized.
pub struct GuardedFn<F> {
    name:        &'static str,
    f:           F,
    state:       OnceCell<SyncState>,
    interceptor: Option<Arc<Interceptor>>,
}

impl<F> GuardedFn<F> {
    /// Wraps `f` under `name`, using the global interceptor.
    pub const fn new(name: &'static str, f: F) -> Self {
        Self {
            name,
            f,
            state: OnceCell::new(),
            interceptor: None,
        }
    }

    /// Wraps `f` under `name`, using `interceptor`.
    pub fn with_interceptor(name: &'static str, f: F, interceptor: Arc<Interceptor>) -> Self {
        Self {
            name,
            f,
            state: OnceCell::new(),
            interceptor: Some(interceptor),
        }
    }

    /// Name used in diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The wrapper's state, created on first use.
    pub fn state(&self) -> &SyncState {
        self.state.get_or_init(SyncState::new)
    }

    /// Whether any call has created the state yet.
    pub fn is_initialized(&self) -> bool {
        self.state.get().is_some()
    }

    fn interceptor(&self) -> &Interceptor {
        self.interceptor.as_deref().unwrap_or_else(|| Interceptor::global())
    }

    /// Calls the wrapped function with `args` under the wrapper's state.
    ///
    /// # Errors
    ///
    /// Rejections and protocol errors from the interceptor, including
    /// `REENTRANT_CALL` if the function calls itself through the wrapper.
    /// The function does not run in those cases.
    #[track_caller]
    pub fn call<Args>(&self, args: Args) -> Result<<F as GuardedCallable<Args>>::Output>
    where
        F: GuardedCallable<Args>,
    {
        let site = CallSite::standalone(self.name, CallerInfo::capture());
        self.interceptor()
            .intercept_state(self.state(), &site, || self.f.invoke(args), |_| true)
    }

    /// Like [`call`](Self::call) for fallible functions; the function's own
    /// error is passed through unchanged.
    ///
    /// # Errors
    ///
    /// The function's error, or any error of [`call`](Self::call) converted
    /// into `E`.
    #[track_caller]
    pub fn try_call<Args, R, E>(&self, args: Args) -> core::result::Result<R, E>
    where
        F: GuardedCallable<Args, Output = core::result::Result<R, E>>,
        E: From<Error>,
    {
        let site = CallSite::standalone(self.name, CallerInfo::capture());
        self.interceptor().intercept_state(
            self.state(),
            &site,
            || self.f.invoke(args),
            core::result::Result::is_ok,
        )?
    }
}

impl<F> fmt::Debug for GuardedFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardedFn")
            .field("name", &self.name)
            .field("state", &self.state.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use tsafe_error::codes;

    use super::*;

    fn zero() -> u8 {
        0
    }

    fn six(a: u8, b: u8, c: u8, d: u8, e: u8, g: u8) -> u8 {
        a + b + c + d + e + g
    }

    #[test]
    fn arities_zero_to_six() {
        assert_eq!(GuardedFn::new("zero", zero).call(()).unwrap(), 0);
        assert_eq!(GuardedFn::new("one", |a: u8| a).call((1,)).unwrap(), 1);
        assert_eq!(GuardedFn::new("two", |a: u8, b: u8| a + b).call((1, 2)).unwrap(), 3);
        assert_eq!(GuardedFn::new("six", six).call((1, 1, 1, 1, 1, 1)).unwrap(), 6);
    }

    #[test]
    fn state_is_created_lazily_and_reused() {
        let guarded = GuardedFn::new("lazy", || 1);
        assert!(!guarded.is_initialized());
        guarded.call(()).unwrap();
        assert!(guarded.is_initialized());
        let first = guarded.state().lock_id();
        guarded.call(()).unwrap();
        assert_eq!(guarded.state().lock_id(), first);
    }

    #[test]
    fn try_call_passes_function_error_through() {
        let guarded = GuardedFn::new("parse", |s: &str| {
            s.parse::<u8>()
                .map_err(|_| Error::operation_error("not a number"))
        });
        assert_eq!(guarded.try_call(("7",)).unwrap(), 7);
        assert_eq!(guarded.try_call(("x",)).unwrap_err().code, codes::OPERATION_ERROR);
        assert!(guarded.state().is_idle());
    }
}
