//! Ahead-of-time generator for switchyard dispatch pipelines.
//!
//! Given a [`Model`] of routes, behaviors and services, this crate writes the
//! Rust source of a dispatch module: one async function per route that wraps
//! the route handler in its behaviors, plus the process-wide registries those
//! functions share. The emitted code links against `switchyard-dispatch`.
//!
//! ## Core Pieces
//!
//! - [`DependencyResolver`]: maps a behavior's constructor dependency to an
//!   access expression through an ordered rule table
//! - [`SingletonPlanner`]: one lazily-initialized holder per behavior type and
//!   per service
//! - [`StateScopePlanner`]: one fresh state object per behavior per invocation
//! - [`PipelineComposer`]: the before/handler/after/on_error sequence of a route
//! - [`ProgramGenerator`]: runs all of the above over a model and renders the
//!   output file
//!
//! ## Quick Start
//!
//! ```rust
//! use switchyard_codegen::{generate, Model};
//!
//! let model = Model::from_yaml_str(r#"
//! behaviors:
//!   - type: app::Logging
//!     dependencies: ["Logger<app::Logging>"]
//! routes:
//!   - pattern: "deploy {env}"
//!     handler: app::DeployHandler
//! "#).unwrap();
//!
//! let program = generate(&model).unwrap();
//! assert!(program.source.contains("pub(crate) async fn route_0("));
//! assert!(program.is_complete());
//! ```
//!
//! Unresolved dependencies never abort generation. They are emitted as
//! `Default::default()` followed by a comment naming the missing service, and
//! listed in [`GeneratedProgram::unresolved`].

mod config;
mod error;
pub mod escape;
mod model;
mod pipeline;
mod program;
pub mod resolver;
mod singleton;
mod state;
mod writer;

pub use config::GeneratorConfig;
pub use error::GenerateError;

pub use model::{
    derive_identifier, expression_path, short_type_name, to_pascal_case, to_snake_case,
    BehaviorDefinition, Model, ParameterBinding, RouteDefinition, RouteSegment,
    ServiceDefinition, StateKind,
};

pub use resolver::{DependencyResolver, Resolution, ResolutionRule, RuleKind};
pub use singleton::{SingletonPlanner, UnresolvedDependency};
pub use state::StateScopePlanner;
pub use pipeline::PipelineComposer;

pub use program::{generate, write_program, GeneratedProgram, ProgramGenerator};
pub use writer::SourceWriter;
