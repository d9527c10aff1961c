//! Generator configuration.
//!
//! Read from the `config:` section of a model file. Every field has a
//! default, so an empty or missing section is valid:
//!
//! ```yaml
//! config:
//!   runtime_crate: "::switchyard_dispatch"
//!   terminal_accessor: "crate::terminal()"
//!   configuration_marker: "Configuration"
//!   configuration_accessor: "crate::configuration()"
//!   logger_marker: "Logger"
//!   logger_placeholder: "()"
//!   inner_attributes: true
//! ```

use serde::{Deserialize, Serialize};

/// Settings that shape the emitted program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Path of the runtime crate in generated code.
    pub runtime_crate: String,
    /// Optional `//!` line at the top of the generated file.
    pub module_doc: Option<String>,
    /// Emit the `//!` docs and the `#![allow(...)]` header. Turn off when the
    /// output is pulled in with `include!`, which rejects inner attributes.
    pub inner_attributes: bool,
    /// Dependency names that resolve to the program's terminal.
    pub intrinsic_types: Vec<String>,
    /// Expression yielding the program's terminal.
    pub terminal_accessor: String,
    /// Substring marking a configuration dependency.
    pub configuration_marker: String,
    /// Expression yielding the program's configuration.
    pub configuration_accessor: String,
    /// Substring marking a logger dependency.
    pub logger_marker: String,
    /// Logger category used when the requested logger names none.
    pub logger_placeholder: String,
    /// Leading marker stripped before comparing service type names.
    pub namespace_marker: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            runtime_crate: "::switchyard_dispatch".to_string(),
            module_doc: None,
            inner_attributes: true,
            intrinsic_types: vec![
                "Terminal".to_string(),
                "dyn Terminal".to_string(),
                "switchyard_dispatch::Terminal".to_string(),
                "dyn switchyard_dispatch::Terminal".to_string(),
            ],
            terminal_accessor: "crate::terminal()".to_string(),
            configuration_marker: "Configuration".to_string(),
            configuration_accessor: "crate::configuration()".to_string(),
            logger_marker: "Logger".to_string(),
            logger_placeholder: "()".to_string(),
            namespace_marker: "::".to_string(),
        }
    }
}

impl GeneratorConfig {
    /// Returns `{runtime_crate}::{item}`.
    pub fn runtime_path(&self, item: &str) -> String {
        format!("{}::{}", self.runtime_crate.trim_end_matches("::"), item)
    }
}
