//! A dispatch module generated at build time from `fixtures/deploy.yaml`,
//! compiled against the handlers and behaviors in [`app`].
//!
//! `build.rs` runs the generator with `inner_attributes: false`, so the
//! output can be spliced in with `include!`.

use switchyard_dispatch::{StdTerminal, Terminal};

pub mod app;

#[allow(dead_code, unused_imports, unused_mut, unused_variables, clippy::all)]
mod dispatch {
    include!(concat!(env!("OUT_DIR"), "/dispatch.rs"));
}

static TERMINAL: StdTerminal = StdTerminal;

static CONFIGURATION: app::Configuration = app::Configuration {
    environment: "staging",
};

pub(crate) fn terminal() -> &'static dyn Terminal {
    &TERMINAL
}

pub(crate) fn configuration() -> &'static app::Configuration {
    &CONFIGURATION
}

/// Route patterns in dispatch order.
pub fn routes() -> &'static [&'static str] {
    dispatch::ROUTES
}

/// Runs the generated pipeline of the route at `index`.
pub async fn run(index: usize, args: &[String]) -> switchyard_dispatch::Result<()> {
    dispatch::dispatch(index, args).await
}
