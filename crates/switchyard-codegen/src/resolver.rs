//! Dependency resolution for behavior constructors.
//!
//! Maps a requested dependency type to the expression generated code uses to
//! obtain it. Resolution walks an ordered rule table; the first rule whose
//! matcher accepts the request decides the expression:
//!
//! | # | Matcher | Expression |
//! |---|---------|------------|
//! | 1 | empty type name | `::core::default::Default::default()` |
//! | 2 | framework intrinsic (`Terminal`, with or without a leading `::`) | the program's terminal accessor |
//! | 3 | contains the configuration marker | the program's configuration accessor |
//! | 4 | contains the logger marker | `NullLogger::<T>::new()` |
//! | 5 | registered service (exact, then without a leading `::`) | `services::{storage}()` |
//! | 6 | anything else | default value carrying an `unresolved dependency` comment |
//!
//! Resolution never fails. An unknown dependency still yields a valid
//! expression, with the defect spelled out in a comment right where the
//! argument goes, so one bad declaration can't abort generation of every
//! other route.

use std::fmt;

use crate::config::GeneratorConfig;
use crate::model::ServiceDefinition;

/// Marker text embedded in expressions for unresolved dependencies.
pub const UNRESOLVED_MARKER: &str = "unresolved dependency";

/// Neutral default-value expression.
pub const DEFAULT_EXPRESSION: &str = "::core::default::Default::default()";

/// Which rule produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    /// Empty request, neutral default
    Missing,
    /// Framework intrinsic
    Intrinsic,
    /// Configuration accessor
    Configuration,
    /// Null logger fallback
    Logger,
    /// Registered service
    Service,
    /// Nothing matched
    Unresolved,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RuleKind::Missing => "missing",
            RuleKind::Intrinsic => "intrinsic",
            RuleKind::Configuration => "configuration",
            RuleKind::Logger => "logger",
            RuleKind::Service => "service",
            RuleKind::Unresolved => "unresolved",
        };
        f.write_str(name)
    }
}

/// Decides whether a rule applies to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// The request names no type.
    Missing,
    /// The request equals one of these names.
    OneOf(Vec<String>),
    /// The request contains this substring.
    Contains(String),
    /// The request names a registered service.
    RegisteredService,
    /// Always applies.
    Any,
}

/// Builds the expression once a rule applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// The neutral default value.
    DefaultValue,
    /// A fixed accessor expression.
    Accessor(String),
    /// A null logger over the request's generic argument.
    NullLogger {
        /// Path of the `NullLogger` type.
        logger_path: String,
        /// Category used when the request has no generic argument.
        placeholder: String,
    },
    /// The accessor of the matched service's storage.
    ServiceAccessor,
    /// The default value with a diagnostic comment.
    FailureMarker,
}

/// One row of the rule table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionRule {
    pub kind: RuleKind,
    pub matcher: Matcher,
    pub strategy: Strategy,
}

/// The outcome of resolving one dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Expression to emit in argument position.
    pub expression: String,
    /// The rule that produced it.
    pub rule: RuleKind,
}

impl Resolution {
    pub fn is_unresolved(&self) -> bool {
        self.rule == RuleKind::Unresolved
    }
}

/// Resolves constructor dependencies against a service registry.
#[derive(Debug, Clone)]
pub struct DependencyResolver<'a> {
    rules: Vec<ResolutionRule>,
    services: &'a [ServiceDefinition],
    namespace_marker: String,
}

impl<'a> DependencyResolver<'a> {
    /// Builds the standard rule table from `config`.
    pub fn new(config: &GeneratorConfig, services: &'a [ServiceDefinition]) -> Self {
        Self::with_rules(default_rules(config), config, services)
    }

    /// Uses a custom rule table. Rules are tried in order.
    pub fn with_rules(
        rules: Vec<ResolutionRule>,
        config: &GeneratorConfig,
        services: &'a [ServiceDefinition],
    ) -> Self {
        Self {
            rules,
            services,
            namespace_marker: config.namespace_marker.clone(),
        }
    }

    /// The rule table, in priority order.
    pub fn rules(&self) -> &[ResolutionRule] {
        &self.rules
    }

    /// Resolves `requested` to an access expression.
    pub fn resolve(&self, requested: &str) -> Resolution {
        let requested = requested.trim();

        for rule in &self.rules {
            let service = match &rule.matcher {
                Matcher::Missing if requested.is_empty() => None,
                Matcher::OneOf(names) if self.is_one_of(names, requested) => None,
                Matcher::Contains(marker) if !marker.is_empty() && requested.contains(marker.as_str()) => {
                    None
                }
                Matcher::RegisteredService => match self.find_service(requested) {
                    Some(service) => Some(service),
                    None => continue,
                },
                Matcher::Any => None,
                _ => continue,
            };

            return Resolution {
                expression: build_expression(&rule.strategy, requested, service),
                rule: rule.kind,
            };
        }

        Resolution {
            expression: failure_marker(requested),
            rule: RuleKind::Unresolved,
        }
    }

    /// Finds a service by exact type name, then by namespace-normalized name.
    pub fn find_service(&self, requested: &str) -> Option<&'a ServiceDefinition> {
        if requested.is_empty() {
            return None;
        }
        let services = self.services;
        services
            .iter()
            .find(|s| s.type_name().trim() == requested)
            .or_else(|| {
                let wanted = self.normalize(requested);
                services
                    .iter()
                    .find(|s| self.normalize(s.type_name().trim()) == wanted)
            })
    }

    fn is_one_of(&self, names: &[String], requested: &str) -> bool {
        let wanted = self.normalize(requested);
        names
            .iter()
            .any(|n| n == requested || self.normalize(n.trim()) == wanted)
    }

    /// Strips one leading namespace marker, keeping a `dyn ` prefix intact.
    fn normalize<'s>(&self, type_name: &'s str) -> (&'s str, &'s str) {
        let (prefix, rest) = match type_name.strip_prefix("dyn ") {
            Some(rest) => ("dyn ", rest.trim_start()),
            None => ("", type_name),
        };
        if self.namespace_marker.is_empty() {
            return (prefix, rest);
        }
        (prefix, rest.strip_prefix(self.namespace_marker.as_str()).unwrap_or(rest))
    }
}

/// The standard rule table, in the fixed priority order.
pub fn default_rules(config: &GeneratorConfig) -> Vec<ResolutionRule> {
    vec![
        ResolutionRule {
            kind: RuleKind::Missing,
            matcher: Matcher::Missing,
            strategy: Strategy::DefaultValue,
        },
        ResolutionRule {
            kind: RuleKind::Intrinsic,
            matcher: Matcher::OneOf(config.intrinsic_types.clone()),
            strategy: Strategy::Accessor(config.terminal_accessor.clone()),
        },
        ResolutionRule {
            kind: RuleKind::Configuration,
            matcher: Matcher::Contains(config.configuration_marker.clone()),
            strategy: Strategy::Accessor(config.configuration_accessor.clone()),
        },
        ResolutionRule {
            kind: RuleKind::Logger,
            matcher: Matcher::Contains(config.logger_marker.clone()),
            strategy: Strategy::NullLogger {
                logger_path: config.runtime_path("NullLogger"),
                placeholder: config.logger_placeholder.clone(),
            },
        },
        ResolutionRule {
            kind: RuleKind::Service,
            matcher: Matcher::RegisteredService,
            strategy: Strategy::ServiceAccessor,
        },
        ResolutionRule {
            kind: RuleKind::Unresolved,
            matcher: Matcher::Any,
            strategy: Strategy::FailureMarker,
        },
    ]
}

/// The generic argument of `requested`: everything between the first `<`
/// and the last `>`.
pub fn generic_argument(requested: &str) -> Option<&str> {
    let open = requested.find('<')?;
    let close = requested.rfind('>')?;
    if close <= open {
        return None;
    }
    let inner = requested[open + 1..close].trim();
    (!inner.is_empty()).then_some(inner)
}

/// Accessor expression for a service's lazily-initialized storage.
pub fn service_accessor(service: &ServiceDefinition) -> String {
    format!("services::{}()", service.storage_name())
}

fn failure_marker(requested: &str) -> String {
    let shown = if requested.is_empty() {
        "<none>".to_string()
    } else {
        requested.replace("*/", "* /")
    };
    format!(
        "{} /* {}: `{}` is not a registered service */",
        DEFAULT_EXPRESSION, UNRESOLVED_MARKER, shown
    )
}

fn build_expression(
    strategy: &Strategy,
    requested: &str,
    service: Option<&ServiceDefinition>,
) -> String {
    match strategy {
        Strategy::DefaultValue => DEFAULT_EXPRESSION.to_string(),
        Strategy::Accessor(expression) => expression.clone(),
        Strategy::NullLogger {
            logger_path,
            placeholder,
        } => {
            let category = generic_argument(requested).unwrap_or(placeholder.as_str());
            format!("{}::<{}>::new()", logger_path, category)
        }
        Strategy::ServiceAccessor => match service {
            Some(service) => service_accessor(service),
            None => failure_marker(requested),
        },
        Strategy::FailureMarker => failure_marker(requested),
    }
}
