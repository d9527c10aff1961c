//! Generates `$OUT_DIR/dispatch.rs` from `fixtures/deploy.yaml`.

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use switchyard_codegen::{generate, write_program, Model};

const MODEL: &str = "fixtures/deploy.yaml";

fn main() -> Result<()> {
    println!("cargo:rerun-if-changed={}", MODEL);
    println!("cargo:rerun-if-changed=build.rs");

    let model = Model::load(MODEL).with_context(|| format!("failed to load {}", MODEL))?;
    let program = generate(&model).context("failed to generate dispatch program")?;
    if !program.is_complete() {
        let unresolved: Vec<String> = program.unresolved.iter().map(ToString::to_string).collect();
        bail!("unresolved dependencies:\n{}", unresolved.join("\n"));
    }

    let out = PathBuf::from(env::var("OUT_DIR").context("OUT_DIR is not set")?).join("dispatch.rs");
    write_program(&out, &program).with_context(|| format!("failed to write {}", out.display()))?;
    Ok(())
}
