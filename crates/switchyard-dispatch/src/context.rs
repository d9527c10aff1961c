//! Per-invocation behavior state.
//!
//! Every route call creates one fresh state object per active behavior. The
//! state is owned by the generated dispatch function's stack frame and
//! dropped when the pipeline exits, whichever path it takes.
//!
//! # State Types
//!
//! | Behavior declares | Generated code uses |
//! |-------------------|---------------------|
//! | a custom `State` type | that type, built via [`BehaviorState::from_context`] |
//! | nothing | [`GeneratedState<B>`], one alias per behavior |
//!
//! Both carry a [`BehaviorContext`], the shared base every hook can read.

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

use crate::cancel::CancellationToken;

/// The shared base of every per-invocation state object.
#[derive(Debug, Clone)]
pub struct BehaviorContext {
    command_name: String,
    handler_name: String,
    cancellation: CancellationToken,
}

impl BehaviorContext {
    /// Creates the context for one route invocation.
    pub fn new(
        command_name: impl Into<String>,
        handler_name: impl Into<String>,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            command_name: command_name.into(),
            handler_name: handler_name.into(),
            cancellation,
        }
    }

    /// The literal route pattern of the invoked command, e.g. `deploy {env}`.
    pub fn command_name(&self) -> &str {
        &self.command_name
    }

    /// Descriptive label of the invoked handler.
    pub fn handler_name(&self) -> &str {
        &self.handler_name
    }

    /// The cancellation signal for this invocation.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }
}

/// Contract shared by custom and generated behavior state types.
///
/// Custom state types embed a [`BehaviorContext`] and build themselves from
/// it; generated code never constructs state any other way.
///
/// ```rust
/// use std::time::Instant;
/// use switchyard_dispatch::{BehaviorContext, BehaviorState};
///
/// struct TimingState {
///     context: BehaviorContext,
///     started: Option<Instant>,
/// }
///
/// impl BehaviorState for TimingState {
///     fn from_context(context: BehaviorContext) -> Self {
///         Self { context, started: None }
///     }
///
///     fn context(&self) -> &BehaviorContext {
///         &self.context
///     }
/// }
/// ```
pub trait BehaviorState: Sized {
    /// Builds the state for a fresh invocation.
    fn from_context(context: BehaviorContext) -> Self;

    /// The shared invocation context.
    fn context(&self) -> &BehaviorContext;

    /// Shortcut for `self.context().command_name()`.
    fn command_name(&self) -> &str {
        self.context().command_name()
    }

    /// Shortcut for `self.context().handler_name()`.
    fn handler_name(&self) -> &str {
        self.context().handler_name()
    }

    /// Shortcut for `self.context().cancellation()`.
    fn cancellation(&self) -> &CancellationToken {
        self.context().cancellation()
    }
}

impl BehaviorState for BehaviorContext {
    fn from_context(context: BehaviorContext) -> Self {
        context
    }

    fn context(&self) -> &BehaviorContext {
        self
    }
}

/// Empty state for a behavior that declares no state type of its own.
///
/// The type parameter scopes the state to one behavior, so two behaviors
/// never share a state type even though neither adds any fields.
pub struct GeneratedState<B: ?Sized> {
    context: BehaviorContext,
    _behavior: PhantomData<fn() -> B>,
}

impl<B: ?Sized> BehaviorState for GeneratedState<B> {
    fn from_context(context: BehaviorContext) -> Self {
        Self {
            context,
            _behavior: PhantomData,
        }
    }

    fn context(&self) -> &BehaviorContext {
        &self.context
    }
}

impl<B: ?Sized> Deref for GeneratedState<B> {
    type Target = BehaviorContext;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

impl<B: ?Sized> DerefMut for GeneratedState<B> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.context
    }
}

impl<B: ?Sized> fmt::Debug for GeneratedState<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedState")
            .field("behavior", &std::any::type_name::<B>())
            .field("context", &self.context)
            .finish()
    }
}
