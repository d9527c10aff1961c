//! Process-wide holders for behaviors and services.
//!
//! Every distinct behavior type gets exactly one holder in the generated
//! `behaviors` module, no matter how many routes use it:
//!
//! ```rust,ignore
//! static LOGGING_BEHAVIOR: ::std::sync::OnceLock<app::LoggingBehavior> = ::std::sync::OnceLock::new();
//!
//! pub(crate) fn logging_behavior() -> &'static app::LoggingBehavior {
//!     LOGGING_BEHAVIOR.get_or_init(|| {
//!         app::LoggingBehavior::new(
//!             ::switchyard_dispatch::NullLogger::<app::LoggingBehavior>::new(),
//!             services::system_clock(),
//!         )
//!     })
//! }
//! ```
//!
//! `OnceLock::get_or_init` runs the constructor at most once, even when many
//! invocations race for first access. Routes reach the instance only through
//! [`SingletonPlanner::accessor_path`], never by constructing it again.
//!
//! Services registered in the model get the same treatment in a `services`
//! module, built with `Default::default()` of their implementation type.

use std::fmt;

use crate::model::{expression_path, BehaviorDefinition, ServiceDefinition};
use crate::resolver::{DependencyResolver, Resolution};
use crate::writer::SourceWriter;

/// A constructor dependency no rule could resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedDependency {
    /// Display name of the requesting behavior.
    pub behavior: String,
    /// The requested dependency type.
    pub requested: String,
    /// Zero-based constructor argument position.
    pub position: usize,
}

impl fmt::Display for UnresolvedDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "behavior `{}` argument {}: `{}` is not a registered service",
            self.behavior, self.position, self.requested
        )
    }
}

/// Emits one lazily-initialized holder per behavior and per service.
#[derive(Debug, Clone, Copy)]
pub struct SingletonPlanner<'r, 'a> {
    resolver: &'r DependencyResolver<'a>,
}

impl<'r, 'a> SingletonPlanner<'r, 'a> {
    pub fn new(resolver: &'r DependencyResolver<'a>) -> Self {
        Self { resolver }
    }

    /// Name of the static holding `behavior`.
    pub fn static_name(behavior: &BehaviorDefinition) -> String {
        behavior.identifier().to_ascii_uppercase()
    }

    /// Expression yielding the shared instance, valid outside the `behaviors` module.
    pub fn accessor_path(behavior: &BehaviorDefinition) -> String {
        format!("behaviors::{}()", behavior.identifier())
    }

    /// Resolves every constructor dependency, in declared order.
    pub fn constructor_arguments(&self, behavior: &BehaviorDefinition) -> Vec<Resolution> {
        behavior
            .dependencies()
            .iter()
            .map(|dependency| self.resolver.resolve(&dependency.type_name))
            .collect()
    }

    /// Writes the holders of every behavior in the registered set.
    ///
    /// Writes nothing for an empty set. Returns the dependencies that fell
    /// through to the failure marker.
    pub fn plan_behaviors(
        &self,
        out: &mut SourceWriter,
        behaviors: &[BehaviorDefinition],
    ) -> Vec<UnresolvedDependency> {
        let mut unresolved = Vec::new();

        for (i, behavior) in behaviors.iter().enumerate() {
            if i > 0 {
                out.blank();
            }
            let arguments = self.constructor_arguments(behavior);

            for (position, resolution) in arguments.iter().enumerate() {
                if resolution.is_unresolved() {
                    let requested = &behavior.dependencies()[position].type_name;
                    tracing::warn!(
                        behavior = behavior.type_name(),
                        requested = requested.as_str(),
                        position,
                        "unresolved behavior dependency"
                    );
                    unresolved.push(UnresolvedDependency {
                        behavior: behavior.name().to_string(),
                        requested: requested.clone(),
                        position,
                    });
                }
            }

            self.write_behavior_holder(out, behavior, &arguments);
        }

        tracing::debug!(
            behaviors = behaviors.len(),
            unresolved = unresolved.len(),
            "planned behavior singletons"
        );
        unresolved
    }

    fn write_behavior_holder(
        &self,
        out: &mut SourceWriter,
        behavior: &BehaviorDefinition,
        arguments: &[Resolution],
    ) {
        let ty = behavior.type_name().trim();
        let holder = Self::static_name(behavior);
        let constructor = format!("{}::new", expression_path(ty));

        out.line(format!(
            "/// `{}` behavior, constructed on first access.",
            behavior.name()
        ));
        out.line(format!(
            "static {}: ::std::sync::OnceLock<{}> = ::std::sync::OnceLock::new();",
            holder, ty
        ));
        out.blank();
        out.block(
            format!(
                "pub(crate) fn {}() -> &'static {} {{",
                behavior.identifier(),
                ty
            ),
            "}",
            |out| {
                if arguments.is_empty() {
                    out.line(format!("{}.get_or_init(|| {}())", holder, constructor));
                    return;
                }
                out.block(format!("{}.get_or_init(|| {{", holder), "})", |out| {
                    out.block(format!("{}(", constructor), ")", |out| {
                        for argument in arguments {
                            out.line(format!("{},", argument.expression));
                        }
                    });
                });
            },
        );
    }

    /// Writes one holder per distinct service implementation.
    ///
    /// Services registered under several type names with the same
    /// implementation share a single holder.
    pub fn plan_services(&self, out: &mut SourceWriter, services: &[ServiceDefinition]) {
        let mut holders: Vec<(&ServiceDefinition, Vec<&str>)> = Vec::new();
        for service in services {
            match holders
                .iter_mut()
                .find(|(first, _)| first.storage_name() == service.storage_name())
            {
                Some((_, types)) => {
                    tracing::debug!(
                        type_name = service.type_name(),
                        implementation = service.implementation(),
                        "sharing service holder"
                    );
                    types.push(service.type_name().trim());
                }
                None => holders.push((service, vec![service.type_name().trim()])),
            }
        }

        for (i, (service, types)) in holders.iter().enumerate() {
            if i > 0 {
                out.blank();
            }
            let implementation = service.implementation().trim();
            let holder = service.storage_name().to_ascii_uppercase();
            let types: Vec<String> = types.iter().map(|t| format!("`{}`", t)).collect();

            out.line(format!("/// Storage for {}.", types.join(", ")));
            out.line(format!(
                "static {}: ::std::sync::OnceLock<{}> = ::std::sync::OnceLock::new();",
                holder, implementation
            ));
            out.blank();
            out.block(
                format!(
                    "pub(crate) fn {}() -> &'static {} {{",
                    service.storage_name(),
                    implementation
                ),
                "}",
                |out| {
                    out.line(format!(
                        "{}.get_or_init(<{} as ::core::default::Default>::default)",
                        holder, implementation
                    ));
                },
            );
        }
    }
}
