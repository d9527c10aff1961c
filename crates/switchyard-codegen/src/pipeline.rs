//! Behavior pipeline composition.
//!
//! The composer wraps a route's handler in its active behaviors. For
//! behaviors `[Logging, Timing]` the emitted body reads:
//!
//! ```rust,ignore
//! let mut __state_0_logging = ...;   // one per behavior, declared order
//! let mut __state_0_timing = ...;
//! let __outcome_0 = async {
//!     Behavior::before(behaviors::logging(), &mut __state_0_logging).await?;
//!     Behavior::before(behaviors::timing(), &mut __state_0_timing).await?;
//!     /* handler emission */
//!     Behavior::after(behaviors::timing(), &mut __state_0_timing).await?;
//!     Behavior::after(behaviors::logging(), &mut __state_0_logging).await?;
//!     ::core::result::Result::<(), Fault>::Ok(())
//! }
//! .await;
//! if let ::core::result::Result::Err(__fault) = __outcome_0 {
//!     Behavior::on_error(behaviors::timing(), &mut __state_0_timing, &__fault).await?;
//!     Behavior::on_error(behaviors::logging(), &mut __state_0_logging, &__fault).await?;
//!     return ::core::result::Result::Err(__fault);
//! }
//! ```
//!
//! # Protocol
//!
//! - The async block is the single protected region. Any `?` inside it
//!   (before-hook, handler, after-hook) lands in the one catch below it.
//! - After- and error-hooks run in reverse declared order.
//! - Error-hooks run for every active behavior, whichever stage failed.
//! - The caught fault is returned as is, after all error-hooks ran.
//! - Hooks are awaited one at a time; nothing runs concurrently.
//!
//! A route with no active behaviors gets the handler emission alone.

use switchyard_dispatch::HookPhase;

use crate::config::GeneratorConfig;
use crate::model::{BehaviorDefinition, RouteDefinition};
use crate::singleton::SingletonPlanner;
use crate::state::StateScopePlanner;
use crate::writer::SourceWriter;

const FAULT_VARIABLE: &str = "__fault";

/// Composes per-route dispatch pipelines.
#[derive(Debug, Clone, Copy)]
pub struct PipelineComposer<'a> {
    config: &'a GeneratorConfig,
    states: StateScopePlanner<'a>,
}

impl<'a> PipelineComposer<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self {
            config,
            states: StateScopePlanner::new(config),
        }
    }

    /// Name of the variable holding the protected region's outcome.
    pub fn outcome_variable(route_index: usize) -> String {
        format!("__outcome_{}", route_index)
    }

    /// Emits the pipeline of one route.
    ///
    /// `behaviors` is the route's active set, already filtered and ordered.
    /// `emit_handler` writes the route action; it is called exactly once, at
    /// the injection point inside the protected region (or alone on the fast
    /// path). Code it writes may use `?` to fail the invocation.
    pub fn compose<F>(
        &self,
        out: &mut SourceWriter,
        route: &RouteDefinition,
        route_index: usize,
        behaviors: &[&BehaviorDefinition],
        emit_handler: F,
    ) where
        F: FnOnce(&mut SourceWriter),
    {
        if behaviors.is_empty() {
            emit_handler(out);
            return;
        }

        tracing::debug!(
            route = route.pattern.as_str(),
            route_index,
            behaviors = behaviors.len(),
            "composing pipeline"
        );

        self.states.plan(out, route, route_index, behaviors);

        let outcome = Self::outcome_variable(route_index);
        out.block(format!("let {} = async {{", outcome), "}", |out| {
            for behavior in behaviors {
                out.line(self.hook_call(HookPhase::Before, route_index, behavior));
            }
            emit_handler(out);
            for behavior in behaviors.iter().rev() {
                out.line(self.hook_call(HookPhase::After, route_index, behavior));
            }
            out.line(format!(
                "::core::result::Result::<(), {}>::Ok(())",
                self.config.runtime_path("Fault")
            ));
        });
        out.line(".await;");

        out.block(
            format!(
                "if let ::core::result::Result::Err({}) = {} {{",
                FAULT_VARIABLE, outcome
            ),
            "}",
            |out| {
                for behavior in behaviors.iter().rev() {
                    out.line(self.hook_call(HookPhase::Error, route_index, behavior));
                }
                out.line(format!(
                    "return ::core::result::Result::Err({});",
                    FAULT_VARIABLE
                ));
            },
        );
    }

    /// One awaited hook invocation.
    fn hook_call(&self, phase: HookPhase, route_index: usize, behavior: &BehaviorDefinition) -> String {
        let fault_argument = match phase {
            HookPhase::Error => format!(", &{}", FAULT_VARIABLE),
            HookPhase::Before | HookPhase::After => String::new(),
        };
        format!(
            "{}({}, &mut {}{}).await?;",
            self.config
                .runtime_path(&format!("Behavior::{}", phase.method_name())),
            SingletonPlanner::accessor_path(behavior),
            StateScopePlanner::state_variable(route_index, behavior),
            fault_argument
        )
    }
}
