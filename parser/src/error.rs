//! Parser and loader error types.

use asdl_schema_core::VersionError;
use thiserror::Error;

/// Malformed schema text, located by file, line and column (both 1-based).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{filename}:{line}:{column}: {message}")]
pub struct SyntaxError {
    pub filename: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl SyntaxError {
    pub(crate) fn new(filename: &str, line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            filename: filename.to_string(),
            line,
            column,
            message: message.into(),
        }
    }
}

/// Errors raised while loading a version-tagged schema file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    /// No comment carries a `version=` directive.
    #[error("{filename}: no `version=` tag found in comments")]
    MissingVersionTag { filename: String },
    /// The `version=` directive does not hold an integer tuple.
    #[error("{filename}: invalid version tag {tag:?}: {source}")]
    InvalidVersionTag {
        filename: String,
        tag: String,
        #[source]
        source: VersionError,
    },
}
