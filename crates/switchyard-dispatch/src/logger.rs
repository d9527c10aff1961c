//! Fallback logger for behaviors that ask for one.
//!
//! The generator resolves any logger-shaped dependency it has no service for
//! to `NullLogger::<Category>::new()`. The category type only exists to keep
//! the constructor signature of the requesting behavior intact.

use std::fmt;
use std::marker::PhantomData;

/// A logger that discards every message.
pub struct NullLogger<T: ?Sized = ()> {
    _category: PhantomData<fn() -> T>,
}

impl<T: ?Sized> NullLogger<T> {
    /// Creates a new null logger.
    pub const fn new() -> Self {
        Self {
            _category: PhantomData,
        }
    }

    pub fn trace(&self, _message: impl fmt::Display) {}

    pub fn debug(&self, _message: impl fmt::Display) {}

    pub fn info(&self, _message: impl fmt::Display) {}

    pub fn warn(&self, _message: impl fmt::Display) {}

    pub fn error(&self, _message: impl fmt::Display) {}

    /// Always false; callers can skip building expensive messages.
    pub fn is_enabled(&self) -> bool {
        false
    }
}

impl<T: ?Sized> Default for NullLogger<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Clone for NullLogger<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for NullLogger<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NullLogger<{}>", std::any::type_name::<T>())
    }
}
