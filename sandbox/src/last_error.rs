//! Last-error side channel.
//!
//! Failures are returned as `Result`s; `LastError` additionally keeps the
//! message of the most recent failure for callers that only propagate a
//! status. It belongs to one `Sandbox`, not to the process, and is kept per
//! calling thread: a failure overwrites only the message of the thread that
//! made the failing call.

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

#[derive(Debug, Default)]
pub struct LastError {
    messages: Mutex<HashMap<ThreadId, String>>,
}

impl LastError {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ThreadId, String>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the calling thread's message with `err`.
    pub fn record(&self, err: &dyn Display) {
        self.lock().insert(thread::current().id(), err.to_string());
    }

    /// Byte length of the calling thread's message, 0 when there is none.
    pub fn length(&self) -> usize {
        self.lock()
            .get(&thread::current().id())
            .map_or(0, String::len)
    }

    pub fn message(&self) -> Option<String> {
        self.lock().get(&thread::current().id()).cloned()
    }

    /// Remove and return the calling thread's message.
    pub fn take(&self) -> Option<String> {
        self.lock().remove(&thread::current().id())
    }
}
