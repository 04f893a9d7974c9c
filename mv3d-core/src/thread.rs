//! Thread affinity of the graphics context.
//!
//! OpenGL contexts are current on exactly one OS thread. Everything that issues GL calls must run
//! on the thread that created the context; [`ContextThread`] turns that precondition into a
//! checked error instead of undefined behaviour.

use std::thread::{self, ThreadId};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextThread {
    owner: ThreadId,
}

impl ContextThread {
    /// Claims the calling thread as the context owner.
    pub fn current() -> Self {
        Self {
            owner: thread::current().id(),
        }
    }

    pub fn is_current(&self) -> bool {
        thread::current().id() == self.owner
    }

    pub fn ensure_current(&self) -> Result<()> {
        if self.is_current() {
            Ok(())
        } else {
            Err(Error::WrongThread)
        }
    }
}
