//! Identification of the code that issued a guarded call.

use core::{fmt, panic::Location};
use std::thread::{self, Thread};

/// Who made a guarded call: the calling thread and the source location.
///
/// The location is captured through `#[track_caller]`, so it points at the
/// user's call expression rather than at tsafe internals.
#[derive(Clone)]
pub struct CallerInfo {
    thread:   Thread,
    location: &'static Location<'static>,
}

impl CallerInfo {
    /// Captures the current thread and the caller's location.
    #[track_caller]
    #[must_use]
    pub fn capture() -> Self {
        Self {
            thread:   thread::current(),
            location: Location::caller(),
        }
    }

    /// The calling thread.
    #[must_use]
    pub fn thread(&self) -> &Thread {
        &self.thread
    }

    /// Thread name, or `<unnamed>` for threads spawned without one.
    #[must_use]
    pub fn thread_name(&self) -> &str {
        self.thread.name().unwrap_or("<unnamed>")
    }

    /// Source file of the call, without leading directories.
    #[must_use]
    pub fn file_name(&self) -> &'static str {
        let file = self.location.file();
        file.rsplit(['/', '\\']).next().unwrap_or(file)
    }

    /// Line of the call.
    #[must_use]
    pub fn line(&self) -> u32 {
        self.location.line()
    }

    /// Full source location of the call.
    #[must_use]
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

impl fmt::Debug for CallerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallerInfo")
            .field("thread", &self.thread_name())
            .field("location", &self.location)
            .finish()
    }
}
