//! Error types for emitter and output operations.
//!
//! Wraps every lower-layer failure the emit pipeline can hit: file I/O,
//! serialization, snapshot loading and merging.

use asdl_schema_core::MergeError;
use asdl_schema_parser::LoadError;
use thiserror::Error;

/// Errors that can occur while loading inputs or writing generated output.
#[derive(Debug, Error)]
pub enum EmitError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A schema file failed to load.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Snapshots could not be merged.
    #[error("merge failed: {0}")]
    Merge(#[from] MergeError),
}

/// Convenience alias for results with [`EmitError`].
pub type Result<T> = std::result::Result<T, EmitError>;
