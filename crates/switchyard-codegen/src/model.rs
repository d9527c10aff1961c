//! The input model: behaviors, services and routes.
//!
//! The model is built once per generation pass and is read-only afterwards.
//! It is usually loaded from a YAML or JSON file:
//!
//! ```yaml
//! behaviors:
//!   - type: app::LoggingBehavior
//!     name: Logging
//!     dependencies: ["Logger<app::LoggingBehavior>", "dyn app::Clock"]
//!   - type: app::TimingBehavior
//!     state: app::TimingState
//! services:
//!   - type: dyn app::Clock
//!     implementation: app::SystemClock
//! routes:
//!   - pattern: "deploy {env}"
//!     handler: app::DeployHandler
//!     segments:
//!       - { kind: literal, value: deploy }
//!       - { kind: parameter, name: env }
//! ```
//!
//! # Derived Names
//!
//! Behaviors and services get a derived identifier (`app::LoggingBehavior` →
//! `logging_behavior`) that names their generated storage. Identifiers are a
//! pure function of the type name, so regenerating from the same model always
//! produces the same names. When two distinct types collapse to the same
//! identifier, both get a suffix derived from a SHA-256 of the full type name.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::GeneratorConfig;
use crate::error::GenerateError;

// =============================================================================
// Name derivation
// =============================================================================

/// Converts `PascalCase` (including acronyms) to `snake_case`.
///
/// `LoggingBehavior` → `logging_behavior`, `HTTPServer` → `http_server`.
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.map(|n| n.is_lowercase()).unwrap_or(false),
                _ => false,
            };
            if boundary && !result.ends_with('_') {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }

    result
}

/// Converts `snake_case` to `PascalCase`.
pub fn to_pascal_case(s: &str) -> String {
    s.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// The last path segment of a type name, without generics or `dyn`.
///
/// `dyn app::clock::Clock` → `Clock`, `app::Cache<u32>` → `Cache`.
pub fn short_type_name(type_name: &str) -> &str {
    let trimmed = type_name.trim();
    let without_dyn = trimmed
        .strip_prefix("dyn ")
        .or_else(|| trimmed.strip_prefix("impl "))
        .unwrap_or(trimmed);
    let without_generics = match without_dyn.find('<') {
        Some(idx) => &without_dyn[..idx],
        None => without_dyn,
    };
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
        .trim()
}

/// Derives a safe Rust identifier from a type name.
pub fn derive_identifier(type_name: &str) -> String {
    let snake = to_snake_case(short_type_name(type_name));
    let mut ident: String = snake
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if ident.is_empty() {
        ident.push_str("unnamed");
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}

/// Turns a type path into a path usable in expression position.
///
/// `app::Cache<u32>` becomes `app::Cache::<u32>` so that `::new(...)` can be
/// appended; paths without generics are returned unchanged.
pub fn expression_path(type_name: &str) -> String {
    let trimmed = type_name.trim();
    match trimmed.find('<') {
        Some(idx) if !trimmed[..idx].ends_with("::") => {
            format!("{}::{}", &trimmed[..idx], &trimmed[idx..])
        }
        _ => trimmed.to_string(),
    }
}

fn identity_suffix(type_name: &str) -> String {
    let digest = Sha256::digest(type_name.trim().as_bytes());
    digest[..4].iter().map(|b| format!("{:02x}", b)).collect()
}

/// Makes identifiers unique across distinct type names.
///
/// Only identifiers shared by two or more distinct types are changed.
fn disambiguate<'a, I>(entries: I)
where
    I: IntoIterator<Item = (&'a str, &'a mut String)>,
{
    let entries: Vec<(&str, &mut String)> = entries.into_iter().collect();

    let mut owners: BTreeMap<String, BTreeSet<&str>> = BTreeMap::new();
    for (type_name, ident) in &entries {
        owners
            .entry(ident.to_string())
            .or_default()
            .insert(type_name.trim());
    }

    for (type_name, ident) in entries {
        let shared = owners.get(ident.as_str()).map(|o| o.len() > 1).unwrap_or(false);
        if shared {
            let suffixed = format!("{}_{}", ident, identity_suffix(type_name));
            tracing::debug!(type_name, identifier = %suffixed, "disambiguated identifier");
            *ident = suffixed;
        }
    }
}

// =============================================================================
// Definitions
// =============================================================================

/// Which state type a behavior's hooks receive.
///
/// Resolved once when the behavior is defined; planners never re-check it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateKind {
    /// The behavior supplies its own state type.
    Custom(String),
    /// The generator declares an empty state type for the behavior.
    Generated,
}

/// One constructor dependency slot of a behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterBinding {
    pub type_name: String,
}

impl ParameterBinding {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBehavior {
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    dependencies: Vec<ParameterBinding>,
}

/// A cross-cutting concern woven into every route it applies to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawBehavior")]
pub struct BehaviorDefinition {
    type_name: String,
    name: String,
    identifier: String,
    state: StateKind,
    dependencies: Vec<ParameterBinding>,
}

impl From<RawBehavior> for BehaviorDefinition {
    fn from(raw: RawBehavior) -> Self {
        let mut behavior = BehaviorDefinition::new(raw.type_name);
        if let Some(name) = raw.name {
            behavior = behavior.with_name(name);
        }
        if let Some(state) = raw.state.filter(|s| !s.trim().is_empty()) {
            behavior = behavior.with_custom_state(state);
        }
        behavior.dependencies = raw.dependencies;
        behavior
    }
}

impl BehaviorDefinition {
    /// Creates a behavior with derived names, generated state and no dependencies.
    pub fn new(type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self {
            name: short_type_name(&type_name).to_string(),
            identifier: derive_identifier(&type_name),
            state: StateKind::Generated,
            dependencies: Vec::new(),
            type_name,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Declares a custom state type.
    pub fn with_custom_state(mut self, state_type: impl Into<String>) -> Self {
        self.state = StateKind::Custom(state_type.into());
        self
    }

    /// Appends a constructor dependency.
    pub fn with_dependency(mut self, type_name: impl Into<String>) -> Self {
        self.dependencies.push(ParameterBinding::new(type_name));
        self
    }

    /// Fully qualified type name, e.g. `app::LoggingBehavior`.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Short display name, e.g. `Logging`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Safe identifier naming this behavior's generated items.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn state(&self) -> &StateKind {
        &self.state
    }

    /// Constructor dependencies in declared order.
    pub fn dependencies(&self) -> &[ParameterBinding] {
        &self.dependencies
    }

    pub fn has_custom_state(&self) -> bool {
        matches!(self.state, StateKind::Custom(_))
    }

    /// Name of the state type generated for this behavior, e.g. `LoggingBehaviorState`.
    pub fn generated_state_name(&self) -> String {
        format!("{}State", to_pascal_case(&self.identifier))
    }

    /// Answers to a route's behavior reference by name, type or identifier.
    pub fn is_referenced_by(&self, reference: &str) -> bool {
        let reference = reference.trim();
        reference == self.name
            || reference == self.identifier
            || reference.trim_start_matches("::") == self.type_name.trim_start_matches("::")
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawService {
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    implementation: Option<String>,
}

/// A registered dependency-injectable service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawService")]
pub struct ServiceDefinition {
    type_name: String,
    implementation: String,
    storage_name: String,
}

impl From<RawService> for ServiceDefinition {
    fn from(raw: RawService) -> Self {
        match raw.implementation {
            Some(implementation) => ServiceDefinition::new(raw.type_name, implementation),
            None => {
                let implementation = raw.type_name.clone();
                ServiceDefinition::new(raw.type_name, implementation)
            }
        }
    }
}

impl ServiceDefinition {
    pub fn new(type_name: impl Into<String>, implementation: impl Into<String>) -> Self {
        let implementation = implementation.into();
        Self {
            type_name: type_name.into(),
            storage_name: derive_identifier(&implementation),
            implementation,
        }
    }

    /// The service type dependencies ask for, e.g. `dyn app::Clock`.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The concrete type stored, e.g. `app::SystemClock`.
    pub fn implementation(&self) -> &str {
        &self.implementation
    }

    /// Name of the generated storage and accessor, e.g. `system_clock`.
    pub fn storage_name(&self) -> &str {
        &self.storage_name
    }
}

/// One segment of a route pattern.
///
/// Segments come from the upstream pattern parser; the generator only reads
/// them to label generated code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouteSegment {
    Literal {
        value: String,
    },
    Parameter {
        name: String,
        #[serde(default)]
        optional: bool,
    },
    #[serde(rename = "option")]
    OptionFlag {
        long: String,
        #[serde(default)]
        short: Option<char>,
        #[serde(default)]
        value: Option<String>,
    },
}

/// One command route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteDefinition {
    pub pattern: String,
    #[serde(default)]
    pub segments: Vec<RouteSegment>,
    #[serde(default)]
    pub handler: Option<String>,
    /// Behaviors applied to this route; `None` applies every behavior.
    #[serde(default)]
    pub behaviors: Option<Vec<String>>,
}

impl RouteDefinition {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            segments: Vec::new(),
            handler: None,
            behaviors: None,
        }
    }

    pub fn with_handler(mut self, handler: impl Into<String>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    pub fn with_segment(mut self, segment: RouteSegment) -> Self {
        self.segments.push(segment);
        self
    }

    pub fn with_behaviors<I, S>(mut self, behaviors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.behaviors = Some(behaviors.into_iter().map(Into::into).collect());
        self
    }

    /// The handler type name, or `route_{index}` when the route has none.
    pub fn handler_label(&self, route_index: usize) -> String {
        match self.handler.as_deref().map(str::trim) {
            Some(handler) if !handler.is_empty() => handler.to_string(),
            _ => format!("route_{}", route_index),
        }
    }

    /// Names of the parameter segments, in pattern order.
    pub fn parameter_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                RouteSegment::Parameter { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Long names of the option segments, in pattern order.
    pub fn option_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                RouteSegment::OptionFlag { long, .. } => Some(long.as_str()),
                _ => None,
            })
            .collect()
    }
}

// =============================================================================
// Model
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawModel {
    #[serde(default)]
    config: GeneratorConfig,
    #[serde(default)]
    behaviors: Vec<BehaviorDefinition>,
    #[serde(default)]
    services: Vec<ServiceDefinition>,
    #[serde(default)]
    routes: Vec<RouteDefinition>,
}

/// The complete, validated input of one generation pass.
#[derive(Debug, Clone, Default)]
pub struct Model {
    config: GeneratorConfig,
    behaviors: Vec<BehaviorDefinition>,
    services: Vec<ServiceDefinition>,
    routes: Vec<RouteDefinition>,
}

impl Model {
    /// Builds a model, collapsing duplicate behavior types and making every
    /// derived identifier unique.
    pub fn new(
        config: GeneratorConfig,
        behaviors: Vec<BehaviorDefinition>,
        services: Vec<ServiceDefinition>,
        routes: Vec<RouteDefinition>,
    ) -> Self {
        let mut seen = BTreeSet::new();
        let mut behaviors: Vec<BehaviorDefinition> = behaviors
            .into_iter()
            .filter(|b| {
                let fresh = seen.insert(b.type_name.trim().to_string());
                if !fresh {
                    tracing::warn!(behavior = b.type_name(), "duplicate behavior ignored");
                }
                fresh
            })
            .collect();

        disambiguate(
            behaviors
                .iter_mut()
                .map(|b| (b.type_name.as_str(), &mut b.identifier)),
        );

        let mut services = services;
        disambiguate(
            services
                .iter_mut()
                .map(|s| (s.implementation.as_str(), &mut s.storage_name)),
        );

        Self {
            config,
            behaviors,
            services,
            routes,
        }
    }

    /// Parses a YAML model.
    pub fn from_yaml_str(source: &str) -> Result<Self, GenerateError> {
        let raw: RawModel = serde_yaml::from_str(source)?;
        Ok(Self::from_raw(raw))
    }

    /// Parses a JSON model.
    pub fn from_json_str(source: &str) -> Result<Self, GenerateError> {
        let raw: RawModel = serde_json::from_str(source)?;
        Ok(Self::from_raw(raw))
    }

    /// Loads a model file, choosing the format by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GenerateError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let source = match extension.as_str() {
            "yaml" | "yml" | "json" => {
                fs::read_to_string(path).map_err(|e| GenerateError::io(path, e))?
            }
            _ => return Err(GenerateError::UnsupportedFormat(path.display().to_string())),
        };

        tracing::debug!(path = %path.display(), "loading model");
        if extension == "json" {
            Self::from_json_str(&source)
        } else {
            Self::from_yaml_str(&source)
        }
    }

    fn from_raw(raw: RawModel) -> Self {
        Self::new(raw.config, raw.behaviors, raw.services, raw.routes)
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut GeneratorConfig {
        &mut self.config
    }

    /// Every registered behavior, in registration order.
    pub fn behaviors(&self) -> &[BehaviorDefinition] {
        &self.behaviors
    }

    pub fn services(&self) -> &[ServiceDefinition] {
        &self.services
    }

    pub fn routes(&self) -> &[RouteDefinition] {
        &self.routes
    }

    /// The behaviors active on `route`, in registration order.
    ///
    /// References that match no registered behavior are logged and skipped.
    pub fn behaviors_for(&self, route: &RouteDefinition) -> Vec<&BehaviorDefinition> {
        let Some(references) = &route.behaviors else {
            return self.behaviors.iter().collect();
        };

        for reference in references {
            if !self.behaviors.iter().any(|b| b.is_referenced_by(reference)) {
                tracing::warn!(
                    route = route.pattern.as_str(),
                    behavior = reference.as_str(),
                    "route references an unknown behavior"
                );
            }
        }

        self.behaviors
            .iter()
            .filter(|b| references.iter().any(|r| b.is_referenced_by(r)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("Add"), "add");
        assert_eq!(to_snake_case("ListAll"), "list_all");
        assert_eq!(to_snake_case("HTTPServer"), "http_server");
        assert_eq!(to_snake_case("getHTTPResponse"), "get_http_response");
        assert_eq!(to_snake_case("Retry3Times"), "retry3_times");
    }

    #[test]
    fn test_to_pascal_case() {
        assert_eq!(to_pascal_case("logging_behavior"), "LoggingBehavior");
        assert_eq!(to_pascal_case("_private"), "Private");
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("app::LoggingBehavior"), "LoggingBehavior");
        assert_eq!(short_type_name("dyn app::clock::Clock"), "Clock");
        assert_eq!(short_type_name("app::Cache<u32>"), "Cache");
        assert_eq!(short_type_name("Timing"), "Timing");
    }

    #[test]
    fn test_derive_identifier() {
        assert_eq!(derive_identifier("app::LoggingBehavior"), "logging_behavior");
        assert_eq!(derive_identifier("::app::Cache<u32>"), "cache");
        assert_eq!(derive_identifier(""), "unnamed");
    }

    #[test]
    fn test_expression_path() {
        assert_eq!(expression_path("app::Cache<u32>"), "app::Cache::<u32>");
        assert_eq!(expression_path("app::Cache::<u32>"), "app::Cache::<u32>");
        assert_eq!(expression_path("app::Timing"), "app::Timing");
    }

    #[test]
    fn test_behavior_defaults() {
        let behavior = BehaviorDefinition::new("app::LoggingBehavior");
        assert_eq!(behavior.name(), "LoggingBehavior");
        assert_eq!(behavior.identifier(), "logging_behavior");
        assert_eq!(behavior.state(), &StateKind::Generated);
        assert_eq!(behavior.generated_state_name(), "LoggingBehaviorState");
    }

    #[test]
    fn test_colliding_identifiers_are_suffixed_deterministically() {
        let build = || {
            Model::new(
                GeneratorConfig::default(),
                vec![
                    BehaviorDefinition::new("audit::Logging"),
                    BehaviorDefinition::new("trace::Logging"),
                    BehaviorDefinition::new("app::Timing"),
                ],
                vec![],
                vec![],
            )
        };
        let first = build();
        let second = build();

        let ids: Vec<&str> = first.behaviors().iter().map(|b| b.identifier()).collect();
        assert_ne!(ids[0], ids[1]);
        assert!(ids[0].starts_with("logging_"));
        assert!(ids[1].starts_with("logging_"));
        assert_eq!(ids[2], "timing");

        let again: Vec<&str> = second.behaviors().iter().map(|b| b.identifier()).collect();
        assert_eq!(ids, again);
    }

    #[test]
    fn test_duplicate_behavior_types_collapse() {
        let model = Model::new(
            GeneratorConfig::default(),
            vec![
                BehaviorDefinition::new("app::Timing"),
                BehaviorDefinition::new("app::Timing"),
            ],
            vec![],
            vec![],
        );
        assert_eq!(model.behaviors().len(), 1);
        assert_eq!(model.behaviors()[0].identifier(), "timing");
    }

    #[test]
    fn test_behaviors_for_keeps_registration_order() {
        let model = Model::new(
            GeneratorConfig::default(),
            vec![
                BehaviorDefinition::new("app::Logging"),
                BehaviorDefinition::new("app::Timing"),
                BehaviorDefinition::new("app::Auth"),
            ],
            vec![],
            vec![],
        );
        let route = RouteDefinition::new("deploy {env}").with_behaviors(["Auth", "Logging"]);
        let names: Vec<&str> = model.behaviors_for(&route).iter().map(|b| b.name()).collect();
        assert_eq!(names, vec!["Logging", "Auth"]);

        let all = RouteDefinition::new("status");
        assert_eq!(model.behaviors_for(&all).len(), 3);
    }

    #[test]
    fn test_handler_label_falls_back_to_position() {
        let route = RouteDefinition::new("status");
        assert_eq!(route.handler_label(3), "route_3");
        let route = route.with_handler("app::Status");
        assert_eq!(route.handler_label(3), "app::Status");
    }

    #[test]
    fn test_yaml_model() {
        let model = Model::from_yaml_str(
            r#"
behaviors:
  - type: app::TimingBehavior
    name: Timing
    state: app::TimingState
    dependencies: ["dyn app::Clock"]
services:
  - type: dyn app::Clock
    implementation: app::SystemClock
routes:
  - pattern: "deploy {env}"
    handler: app::DeployHandler
    segments:
      - { kind: literal, value: deploy }
      - { kind: parameter, name: env }
      - { kind: option, long: force, short: f }
"#,
        )
        .unwrap();

        let timing = &model.behaviors()[0];
        assert_eq!(timing.name(), "Timing");
        assert_eq!(timing.state(), &StateKind::Custom("app::TimingState".into()));
        assert_eq!(timing.dependencies()[0].type_name, "dyn app::Clock");
        assert_eq!(model.services()[0].storage_name(), "system_clock");
        assert_eq!(model.routes()[0].parameter_names(), vec!["env"]);
        assert_eq!(model.routes()[0].option_names(), vec!["force"]);
    }

    #[test]
    fn test_unknown_model_field_is_rejected() {
        let err = Model::from_yaml_str("routs: []").unwrap_err();
        assert!(matches!(err, GenerateError::Yaml(_)));
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let err = Model::load("model.toml").unwrap_err();
        assert!(matches!(err, GenerateError::UnsupportedFormat(_)));
    }
}
