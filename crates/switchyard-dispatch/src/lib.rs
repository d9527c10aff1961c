//! Runtime contract for switchyard dispatch pipelines.
//!
//! `switchyard-codegen` emits one dispatch function per command route. The
//! emitted code links against this crate for everything that is shared
//! between routes:
//!
//! - **Behaviors**: the [`Behavior`] trait with its async before/after/error
//!   hooks
//! - **Per-invocation state**: [`BehaviorContext`], the [`BehaviorState`]
//!   contract and the [`GeneratedState`] used by behaviors without a custom
//!   state type
//! - **Cancellation**: a cooperative [`CancellationToken`] threaded into every
//!   state object
//! - **Intrinsic services**: the [`Terminal`] abstraction and the
//!   [`NullLogger`] fallback
//!
//! # Pipeline Shape
//!
//! For a route with behaviors `[A, B]` the generated function runs:
//!
//! ```text
//! state(A), state(B)
//!   → A.before → B.before → HANDLER → B.after → A.after      (success)
//!   → B.on_error → A.on_error → re-raise original fault       (any failure)
//! ```
//!
//! Every hook is awaited in sequence; nothing in the pipeline runs
//! concurrently.
//!
//! # Example
//!
//! ```rust
//! use switchyard_dispatch::{async_trait, Behavior, Fault, GeneratedState, Result};
//!
//! struct Audit;
//!
//! #[async_trait]
//! impl Behavior for Audit {
//!     type State = GeneratedState<Audit>;
//!
//!     async fn before(&self, state: &mut Self::State) -> Result<()> {
//!         eprintln!("running {}", state.command_name());
//!         Ok(())
//!     }
//!
//!     async fn on_error(&self, state: &mut Self::State, fault: &Fault) -> Result<()> {
//!         eprintln!("{} failed: {fault}", state.command_name());
//!         Ok(())
//!     }
//! }
//! ```

mod behavior;
mod cancel;
mod context;
mod logger;
mod terminal;

pub use async_trait::async_trait;

pub use behavior::{missing_handler, unknown_route, Behavior, Fault, HookPhase, Result};

pub use cancel::{CancellationToken, Cancelled};

pub use context::{BehaviorContext, BehaviorState, GeneratedState};

pub use logger::NullLogger;

pub use terminal::{StdTerminal, Terminal};
