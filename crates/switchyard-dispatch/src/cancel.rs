//! Cooperative cancellation signal.
//!
//! The pipeline never cancels anything itself. The token is threaded into
//! every per-invocation state so hooks and handlers can observe it when they
//! choose to.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

/// Returned by [`CancellationToken::check`] once the token has fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// A clonable, cooperative cancellation signal.
///
/// Clones share the same signal. [`CancellationToken::none`] is the neutral
/// token generated pipelines pass by default; it can never fire.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Option<Arc<AtomicBool>>,
}

impl CancellationToken {
    /// Creates a live token that fires when [`cancel`](Self::cancel) is called.
    pub fn new() -> Self {
        Self {
            flag: Some(Arc::new(AtomicBool::new(false))),
        }
    }

    /// A token that is never cancelled.
    pub const fn none() -> Self {
        Self { flag: None }
    }

    /// Signals cancellation to every clone of this token.
    ///
    /// Has no effect on a [`none`](Self::none) token.
    pub fn cancel(&self) {
        if let Some(flag) = &self.flag {
            flag.store(true, Ordering::Release);
        }
    }

    /// Returns true once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.flag
            .as_ref()
            .map(|flag| flag.load(Ordering::Acquire))
            .unwrap_or(false)
    }

    /// Returns `Err(Cancelled)` if the token has fired.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Returns true if this token can ever be cancelled.
    pub fn can_be_cancelled(&self) -> bool {
        self.flag.is_some()
    }
}
