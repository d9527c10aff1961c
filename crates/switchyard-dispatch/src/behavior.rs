//! Behavior hooks for generated dispatch pipelines.
//!
//! A behavior is a cross-cutting concern (logging, timing, validation) that is
//! woven into every route it applies to. It runs at three points:
//!
//! ```text
//! parsed CLI args
//!   → BEFORE      ← (declared order: setup, auth checks, timers)
//!   → route handler
//!   → AFTER       ← (reverse order, success only)
//!   → ON_ERROR    ← (reverse order, any failure, then the fault is re-raised)
//! ```
//!
//! Behaviors are constructed once per process by the generated `behaviors`
//! registry and shared by every concurrent invocation, so hooks take `&self`.
//! Per-invocation data lives in the state object instead.

use std::fmt;

use async_trait::async_trait;

use crate::context::BehaviorState;

/// The fault type raised by handlers and hooks.
///
/// The pipeline never wraps or replaces a fault: the value a handler raises
/// is the value the dispatch caller receives.
pub type Fault = anyhow::Error;

/// Result type used by handlers, hooks and generated dispatch functions.
pub type Result<T, E = Fault> = std::result::Result<T, E>;

/// The hook at which a behavior is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    /// Runs before the handler, in declared order
    Before,
    /// Runs after a successful handler, in reverse order
    After,
    /// Runs after any failure in the protected region, in reverse order
    Error,
}

impl HookPhase {
    /// The method name generated code calls for this phase.
    pub fn method_name(self) -> &'static str {
        match self {
            HookPhase::Before => "before",
            HookPhase::After => "after",
            HookPhase::Error => "on_error",
        }
    }
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookPhase::Before => write!(f, "before"),
            HookPhase::After => write!(f, "after"),
            HookPhase::Error => write!(f, "error"),
        }
    }
}

/// A cross-cutting concern woven into generated dispatch pipelines.
///
/// All hooks default to doing nothing, so a behavior only implements the
/// phases it cares about. Hooks may fail; a failing `before` or `after` hook
/// sends the invocation down the error path exactly like a failing handler.
///
/// Behaviors that don't need custom per-invocation data use
/// [`GeneratedState<Self>`](crate::GeneratedState) as their state type.
#[async_trait]
pub trait Behavior: Send + Sync + 'static {
    /// Per-invocation state handed to every hook of one route call.
    type State: BehaviorState + Send;

    /// Runs before the route handler.
    async fn before(&self, state: &mut Self::State) -> Result<()> {
        let _ = state;
        Ok(())
    }

    /// Runs after the route handler completed successfully.
    async fn after(&self, state: &mut Self::State) -> Result<()> {
        let _ = state;
        Ok(())
    }

    /// Runs when the handler or any before/after hook of the route failed.
    ///
    /// Every active behavior of the route receives this call, including
    /// behaviors whose `before` hook never ran because an earlier one failed.
    async fn on_error(&self, state: &mut Self::State, fault: &Fault) -> Result<()> {
        let _ = (state, fault);
        Ok(())
    }
}

/// Fails a route that was generated without a handler.
///
/// Generated code calls this in place of the handler invocation so that the
/// route still dispatches through its behaviors and reports a clear fault.
pub fn missing_handler(pattern: &str) -> Result<()> {
    Err(anyhow::anyhow!("no handler registered for route `{}`", pattern))
}

/// The fault generated `dispatch` functions return for an unknown route index.
pub fn unknown_route(index: usize) -> Fault {
    anyhow::anyhow!("no route with index {}", index)
}
