//! `switchyard-gen`: generates dispatch modules from a switchyard model file.
//!
//! ```text
//! switchyard-gen generate app.yaml -o src/dispatch.rs
//! switchyard-gen check app.yaml
//! ```
//!
//! Logs go to stderr. `RUST_LOG` takes precedence over `-v`.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use switchyard_codegen::{generate, write_program, GeneratedProgram, Model};

#[derive(Debug, Parser)]
#[command(name = "switchyard-gen", author, version, about)]
struct Cli {
    /// Increase log verbosity (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate the dispatch module of a model
    Generate {
        /// Model file (.yaml, .yml or .json)
        #[arg(value_name = "MODEL")]
        model: PathBuf,

        /// Output file; prints to stdout when omitted
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Runtime crate path used by the generated code
        #[arg(long, value_name = "PATH")]
        runtime_crate: Option<String>,

        /// Fail without writing output when a dependency is unresolved
        #[arg(long)]
        deny_unresolved: bool,
    },
    /// Report unresolved behavior dependencies of a model
    Check {
        /// Model file (.yaml, .yml or .json)
        #[arg(value_name = "MODEL")]
        model: PathBuf,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn report_unresolved(program: &GeneratedProgram, out: &mut impl Write) -> io::Result<()> {
    for dependency in &program.unresolved {
        writeln!(out, "unresolved: {}", dependency)?;
    }
    Ok(())
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Generate {
            model,
            output,
            runtime_crate,
            deny_unresolved,
        } => {
            let mut loaded = Model::load(&model)
                .with_context(|| format!("failed to load model {}", model.display()))?;
            if let Some(runtime_crate) = runtime_crate {
                loaded.config_mut().runtime_crate = runtime_crate;
            }

            let program = generate(&loaded).context("failed to generate dispatch program")?;

            if deny_unresolved && !program.is_complete() {
                report_unresolved(&program, &mut io::stderr().lock())?;
                return Ok(ExitCode::FAILURE);
            }

            match output {
                Some(path) => {
                    write_program(&path, &program)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    eprintln!(
                        "wrote {} route(s) to {}",
                        program.route_count,
                        path.display()
                    );
                }
                None => {
                    io::stdout()
                        .lock()
                        .write_all(program.source.as_bytes())
                        .context("failed to write to stdout")?;
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { model } => {
            let loaded = Model::load(&model)
                .with_context(|| format!("failed to load model {}", model.display()))?;
            let program = generate(&loaded).context("failed to generate dispatch program")?;

            let mut stdout = io::stdout().lock();
            report_unresolved(&program, &mut stdout)?;
            writeln!(
                stdout,
                "{} route(s), {} behavior(s), {} service(s), {} unresolved",
                program.route_count,
                loaded.behaviors().len(),
                loaded.services().len(),
                program.unresolved.len()
            )?;

            Ok(if program.is_complete() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(2)
        }
    }
}
