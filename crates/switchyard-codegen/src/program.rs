//! Whole-program generation.
//!
//! [`ProgramGenerator`] drives every planner over a [`Model`] and renders the
//! result into a single Rust source file:
//!
//! 1. the `services` module, one holder per distinct service implementation;
//! 2. the `behaviors` module, one holder per registered behavior plus the
//!    generated state aliases;
//! 3. one `route_{index}` function per route, each composed by the
//!    [`PipelineComposer`] from the route's active behaviors;
//! 4. the `ROUTES` table and a `dispatch(index, args)` entry point.
//!
//! The file skeleton lives in `templates/dispatch.rs.j2` and is rendered with
//! minijinja. Output is a pure function of the model: no timestamps, no
//! randomized ordering.
//!
//! # Handler Contract
//!
//! A route handler type exposes
//! `async fn handle(args: &[String]) -> Result<(), E>` where `E` converts into
//! [`switchyard_dispatch::Fault`]. Routes without a handler dispatch through
//! their behaviors into [`switchyard_dispatch::missing_handler`].

use std::fs;
use std::path::Path;

use minijinja::{context, AutoEscape, Environment};
use serde::Serialize;

use crate::error::GenerateError;
use crate::escape::escape_text;
use crate::model::{expression_path, Model, RouteDefinition};
use crate::pipeline::PipelineComposer;
use crate::resolver::DependencyResolver;
use crate::singleton::{SingletonPlanner, UnresolvedDependency};
use crate::state::StateScopePlanner;
use crate::writer::SourceWriter;

const TEMPLATE_NAME: &str = "dispatch.rs.j2";
const TEMPLATE_SOURCE: &str = include_str!("templates/dispatch.rs.j2");

/// The rendered source of one generation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedProgram {
    /// The complete Rust source file.
    pub source: String,
    /// Dependencies that were emitted as failure markers.
    pub unresolved: Vec<UnresolvedDependency>,
    /// Number of route functions in the program.
    pub route_count: usize,
}

impl GeneratedProgram {
    /// True when every behavior dependency resolved.
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

#[derive(Debug, Serialize)]
struct RouteView {
    index: usize,
    pattern: String,
    source: String,
}

/// Generates dispatch programs from a model.
pub struct ProgramGenerator<'m> {
    model: &'m Model,
    env: Environment<'static>,
}

impl<'m> ProgramGenerator<'m> {
    pub fn new(model: &'m Model) -> Result<Self, GenerateError> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_trim_blocks(true);
        env.set_keep_trailing_newline(true);
        env.add_template(TEMPLATE_NAME, TEMPLATE_SOURCE)?;
        Ok(Self { model, env })
    }

    /// Runs every planner and renders the program.
    pub fn generate(&self) -> Result<GeneratedProgram, GenerateError> {
        let config = self.model.config();
        let resolver = DependencyResolver::new(config, self.model.services());
        for rule in resolver.rules() {
            tracing::trace!(kind = %rule.kind, "resolution rule");
        }
        let singletons = SingletonPlanner::new(&resolver);

        let mut services = SourceWriter::with_depth(1);
        singletons.plan_services(&mut services, self.model.services());

        let mut behaviors = SourceWriter::with_depth(1);
        let unresolved = singletons.plan_behaviors(&mut behaviors, self.model.behaviors());
        StateScopePlanner::new(config).declare_generated_states(&mut behaviors, self.model.behaviors());

        let composer = PipelineComposer::new(config);
        let routes: Vec<RouteView> = self
            .model
            .routes()
            .iter()
            .enumerate()
            .map(|(index, route)| RouteView {
                index,
                pattern: escape_text(&route.pattern),
                source: self.route_function(&composer, route, index),
            })
            .collect();

        let module_doc = config
            .module_doc
            .as_deref()
            .map(str::trim)
            .filter(|doc| !doc.is_empty())
            .map(|doc| {
                doc.lines()
                    .map(|line| format!("//! {}", line).trim_end().to_string())
                    .collect::<Vec<_>>()
                    .join("\n")
            });

        let template = self.env.get_template(TEMPLATE_NAME)?;
        let source = template.render(context! {
            version => env!("CARGO_PKG_VERSION"),
            module_doc => module_doc,
            inner_attributes => config.inner_attributes,
            runtime => config.runtime_crate.trim_end_matches("::"),
            services => services.finish(),
            behaviors => behaviors.finish(),
            routes => &routes,
        })?;

        tracing::info!(
            routes = routes.len(),
            behaviors = self.model.behaviors().len(),
            services = self.model.services().len(),
            unresolved = unresolved.len(),
            "generated dispatch program"
        );

        Ok(GeneratedProgram {
            source,
            unresolved,
            route_count: routes.len(),
        })
    }

    fn route_function(&self, composer: &PipelineComposer<'_>, route: &RouteDefinition, index: usize) -> String {
        let config = self.model.config();
        let active = self.model.behaviors_for(route);
        let mut out = SourceWriter::new();

        out.line(format!("/// `{}`", escape_text(&route.pattern)));
        let parameters = route.parameter_names();
        let options = route.option_names();
        if !parameters.is_empty() || !options.is_empty() {
            out.line("///");
        }
        if !parameters.is_empty() {
            out.line(format!("/// Parameters: {}", code_list(&parameters, "")));
        }
        if !options.is_empty() {
            out.line(format!("/// Options: {}", code_list(&options, "--")));
        }

        out.block(
            format!(
                "pub(crate) async fn route_{}(args: &[::std::string::String]) -> {} {{",
                index,
                config.runtime_path("Result<()>")
            ),
            "}",
            |out| {
                composer.compose(out, route, index, &active, |out| {
                    out.line(handler_invocation(route, config.runtime_path("missing_handler")));
                });
                out.line("::core::result::Result::Ok(())");
            },
        );

        out.finish()
    }
}

fn handler_invocation(route: &RouteDefinition, missing_handler: String) -> String {
    match route.handler.as_deref().map(str::trim) {
        Some(handler) if !handler.is_empty() => {
            format!("{}::handle(args).await?;", expression_path(handler))
        }
        _ => format!("{}(\"{}\")?;", missing_handler, escape_text(&route.pattern)),
    }
}

fn code_list(names: &[&str], prefix: &str) -> String {
    names
        .iter()
        .map(|name| format!("`{}{}`", prefix, escape_text(name)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Generates the dispatch program of `model`.
pub fn generate(model: &Model) -> Result<GeneratedProgram, GenerateError> {
    ProgramGenerator::new(model)?.generate()
}

/// Writes a generated program, creating missing parent directories.
pub fn write_program(path: impl AsRef<Path>, program: &GeneratedProgram) -> Result<(), GenerateError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| GenerateError::io(parent, e))?;
    }
    fs::write(path, &program.source).map_err(|e| GenerateError::io(path, e))?;
    tracing::debug!(path = %path.display(), bytes = program.source.len(), "wrote program");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::model::{BehaviorDefinition, RouteSegment, ServiceDefinition};

    fn model(behaviors: Vec<BehaviorDefinition>, routes: Vec<RouteDefinition>) -> Model {
        Model::new(GeneratorConfig::default(), behaviors, Vec::new(), routes)
    }

    #[test]
    fn test_empty_model_renders_skeleton() {
        let program = generate(&Model::default()).unwrap();

        assert!(program
            .source
            .starts_with("// @generated by switchyard-gen "));
        assert!(program.source.contains("pub(crate) mod services {\n}\n"));
        assert!(program
            .source
            .contains("pub(crate) mod behaviors {\n    use super::services;\n}\n"));
        assert!(program.source.contains("pub(crate) const ROUTES: &[&str] = &[\n];\n"));
        assert!(program
            .source
            .contains("        _ => ::core::result::Result::Err(::switchyard_dispatch::unknown_route(index)),\n"));
        assert!(program.source.ends_with("}\n"));
        assert_eq!(program.route_count, 0);
        assert!(program.is_complete());
    }

    #[test]
    fn test_module_doc_lines() {
        let mut config = GeneratorConfig::default();
        config.module_doc = Some("Dispatch for app.\n\nRegenerate with `make gen`.".into());
        let program = generate(&Model::new(config, vec![], vec![], vec![])).unwrap();

        assert!(program.source.contains(
            "Do not edit.\n//! Dispatch for app.\n//!\n//! Regenerate with `make gen`.\n#![allow("
        ));
    }

    #[test]
    fn test_no_module_doc_goes_straight_to_attributes() {
        let program = generate(&Model::default()).unwrap();
        assert!(program.source.contains("Do not edit.\n#![allow("));
    }

    #[test]
    fn test_route_without_behaviors_is_handler_only() {
        let route = RouteDefinition::new("status").with_handler("app::Status");
        let program = generate(&model(vec![], vec![route])).unwrap();

        assert!(program.source.contains(
            "pub(crate) async fn route_0(args: &[::std::string::String]) -> ::switchyard_dispatch::Result<()> {\n\
             \x20   app::Status::handle(args).await?;\n\
             \x20   ::core::result::Result::Ok(())\n\
             }\n"
        ));
        assert!(!program.source.contains("__state_"));
        assert!(!program.source.contains("__outcome_"));
    }

    #[test]
    fn test_route_without_handler_reports_missing() {
        let route = RouteDefinition::new(r#"echo "x""#);
        let program = generate(&model(vec![], vec![route])).unwrap();
        assert!(program
            .source
            .contains(r#"::switchyard_dispatch::missing_handler("echo \"x\"")?;"#));
        assert!(program.source.contains(r#"    "echo \"x\"","#));
    }

    #[test]
    fn test_dispatch_arms_per_route() {
        let routes = vec![
            RouteDefinition::new("a").with_handler("app::A"),
            RouteDefinition::new("b").with_handler("app::B"),
        ];
        let program = generate(&model(vec![], routes)).unwrap();

        assert!(program.source.contains("        0 => route_0(args).await,\n"));
        assert!(program.source.contains("        1 => route_1(args).await,\n"));
        assert_eq!(program.route_count, 2);
    }

    #[test]
    fn test_route_docs_list_parameters_and_options() {
        let route = RouteDefinition::new("deploy {env} [--force]")
            .with_handler("app::Deploy")
            .with_segment(RouteSegment::Literal { value: "deploy".into() })
            .with_segment(RouteSegment::Parameter {
                name: "env".into(),
                optional: false,
            })
            .with_segment(RouteSegment::OptionFlag {
                long: "force".into(),
                short: Some('f'),
                value: None,
            });
        let program = generate(&model(vec![], vec![route])).unwrap();

        assert!(program.source.contains(
            "/// `deploy {env} [--force]`\n///\n/// Parameters: `env`\n/// Options: `--force`\n"
        ));
    }

    #[test]
    fn test_route_behavior_filter_keeps_registration_order() {
        let behaviors = vec![
            BehaviorDefinition::new("app::Logging"),
            BehaviorDefinition::new("app::Timing"),
            BehaviorDefinition::new("app::Audit"),
        ];
        let route = RouteDefinition::new("x")
            .with_handler("app::X")
            .with_behaviors(["Audit", "Logging"]);
        let program = generate(&model(behaviors, vec![route])).unwrap();

        let logging = program.source.find("let mut __state_0_logging").unwrap();
        let audit = program.source.find("let mut __state_0_audit").unwrap();
        assert!(logging < audit);
        assert!(!program.source.contains("__state_0_timing"));
    }

    #[test]
    fn test_services_and_behaviors_modules() {
        let services = vec![ServiceDefinition::new("dyn app::Clock", "app::SystemClock")];
        let behaviors = vec![BehaviorDefinition::new("app::Timing").with_dependency("dyn app::Clock")];
        let program =
            generate(&Model::new(GeneratorConfig::default(), behaviors, services, vec![])).unwrap();

        assert!(program
            .source
            .contains("pub(crate) mod services {\n    /// Storage for `dyn app::Clock`.\n"));
        assert!(program.source.contains("                services::system_clock(),\n"));
        assert!(program.source.contains(
            "    pub(crate) type TimingState = ::switchyard_dispatch::GeneratedState<app::Timing>;\n"
        ));
    }

    #[test]
    fn test_services_sharing_an_implementation_emit_one_holder() {
        let services = vec![
            ServiceDefinition::new("dyn app::Clock", "app::SystemClock"),
            ServiceDefinition::new("dyn app::TimeSource", "app::SystemClock"),
        ];
        let behaviors = vec![BehaviorDefinition::new("app::Timing")
            .with_dependency("dyn app::Clock")
            .with_dependency("dyn app::TimeSource")];
        let program =
            generate(&Model::new(GeneratorConfig::default(), behaviors, services, vec![])).unwrap();

        assert_eq!(program.source.matches("static SYSTEM_CLOCK:").count(), 1);
        assert_eq!(program.source.matches("pub(crate) fn system_clock()").count(), 1);
        assert_eq!(
            program
                .source
                .matches("                services::system_clock(),\n")
                .count(),
            2
        );
        assert!(program.is_complete());
    }

    #[test]
    fn test_pattern_with_line_break_stays_one_line() {
        let route = RouteDefinition::new("say\nhi");
        let program = generate(&model(vec![], vec![route])).unwrap();

        assert!(program
            .source
            .contains(r#"::switchyard_dispatch::missing_handler("say\nhi")?;"#));
        assert!(program.source.contains("    \"say\\nhi\",\n"));
        assert!(!program.source.contains("say\nhi"));
    }

    #[test]
    fn test_inner_attributes_can_be_omitted() {
        let mut config = GeneratorConfig::default();
        config.module_doc = Some("Dispatch for app.".into());
        config.inner_attributes = false;
        let program = generate(&Model::new(config, vec![], vec![], vec![])).unwrap();

        assert!(!program.source.contains("//!"));
        assert!(!program.source.contains("#!["));
        assert!(program.source.contains("Do not edit.\n\n/// Registered services"));
    }

    #[test]
    fn test_custom_runtime_crate() {
        let mut config = GeneratorConfig::default();
        config.runtime_crate = "crate::rt".into();
        let route = RouteDefinition::new("x");
        let program = generate(&Model::new(config, vec![], vec![], vec![route])).unwrap();

        assert!(program.source.contains("-> crate::rt::Result<()> {"));
        assert!(program.source.contains("crate::rt::missing_handler(\"x\")?;"));
        assert!(program.source.contains("crate::rt::unknown_route(index)"));
    }

    #[test]
    fn test_write_program_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("src").join("generated").join("dispatch.rs");
        let program = generate(&Model::default()).unwrap();

        write_program(&path, &program).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), program.source);
    }
}
