//! Per-invocation state creation.
//!
//! Each route invocation builds one fresh state object per active behavior,
//! owned by the generated function's stack frame:
//!
//! ```rust,ignore
//! let mut __state_0_logging_behavior = <behaviors::LoggingBehaviorState as ::switchyard_dispatch::BehaviorState>::from_context(
//!     ::switchyard_dispatch::BehaviorContext::new(
//!         "deploy {env}",
//!         "app::DeployHandler",
//!         ::switchyard_dispatch::CancellationToken::none(),
//!     ),
//! );
//! ```
//!
//! Behaviors with a custom state type use it directly. All others get a
//! `GeneratedState<B>` alias, declared once per behavior in the `behaviors`
//! module by [`StateScopePlanner::declare_generated_states`].

use crate::config::GeneratorConfig;
use crate::escape::escape_text;
use crate::model::{BehaviorDefinition, RouteDefinition, StateKind};
use crate::writer::SourceWriter;

/// Emits state types and per-invocation state variables.
#[derive(Debug, Clone, Copy)]
pub struct StateScopePlanner<'a> {
    config: &'a GeneratorConfig,
}

impl<'a> StateScopePlanner<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self { config }
    }

    /// Name of the state variable of `behavior` in route `route_index`.
    pub fn state_variable(route_index: usize, behavior: &BehaviorDefinition) -> String {
        format!("__state_{}_{}", route_index, behavior.identifier())
    }

    /// The state type as written at a route's call site.
    pub fn state_type(behavior: &BehaviorDefinition) -> String {
        match behavior.state() {
            StateKind::Custom(ty) => ty.trim().to_string(),
            StateKind::Generated => format!("behaviors::{}", behavior.generated_state_name()),
        }
    }

    /// Declares the generated state alias of every behavior without a custom one.
    pub fn declare_generated_states(&self, out: &mut SourceWriter, behaviors: &[BehaviorDefinition]) {
        let generated = behaviors
            .iter()
            .filter(|b| !b.has_custom_state());

        for behavior in generated {
            out.blank();
            out.line(format!("/// Per-invocation state of `{}`.", behavior.name()));
            out.line(format!(
                "pub(crate) type {} = {}<{}>;",
                behavior.generated_state_name(),
                self.config.runtime_path("GeneratedState"),
                behavior.type_name().trim()
            ));
        }
    }

    /// Writes one state variable per active behavior, in declared order.
    pub fn plan(
        &self,
        out: &mut SourceWriter,
        route: &RouteDefinition,
        route_index: usize,
        behaviors: &[&BehaviorDefinition],
    ) {
        let pattern = escape_text(&route.pattern);
        let handler = escape_text(&route.handler_label(route_index));

        for behavior in behaviors {
            out.block(
                format!(
                    "let mut {} = <{} as {}>::from_context(",
                    Self::state_variable(route_index, behavior),
                    Self::state_type(behavior),
                    self.config.runtime_path("BehaviorState")
                ),
                ");",
                |out| {
                    out.block(
                        format!("{}(", self.config.runtime_path("BehaviorContext::new")),
                        "),",
                        |out| {
                            out.line(format!("\"{}\",", pattern));
                            out.line(format!("\"{}\",", handler));
                            out.line(format!(
                                "{}(),",
                                self.config.runtime_path("CancellationToken::none")
                            ));
                        },
                    );
                },
            );
        }
    }
}
