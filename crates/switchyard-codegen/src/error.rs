//! Error types for model loading and program generation.
//!
//! Unresolved dependencies are not errors: they are encoded into the
//! generated source and reported through
//! [`GeneratedProgram::unresolved`](crate::GeneratedProgram::unresolved).

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a generation pass.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Reading the model or writing the output failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The model file is not valid YAML for the model schema.
    #[error("invalid YAML model: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The model file is not valid JSON for the model schema.
    #[error("invalid JSON model: {0}")]
    Json(#[from] serde_json::Error),

    /// The model file extension is not one we can load.
    #[error("unsupported model format `{0}` (expected .yaml, .yml or .json)")]
    UnsupportedFormat(String),

    /// The output file template failed to render.
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
}

impl GenerateError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GenerateError::Io {
            path: path.into(),
            source,
        }
    }
}
