//! ASDL schema parsing and version-tagged loading.
//!
//! - [`parse`]: turn ASDL source text into an [`asdl_schema_core::Module`].
//! - [`load_versioned`]: additionally read the snapshot version from a
//!   `-- version=X.Y` comment, producing the `(Version, Module)` pairs the
//!   merge engine consumes.
//! - [`fetch_comments`]: the `--` comments the parser skips.
//!
//! The crate does no file I/O; callers pass source text and a filename used
//! only in error messages.
//!
//! # Example
//!
//! ```
//! use asdl_schema_core::Version;
//! use asdl_schema_parser::load_versioned;
//!
//! let source = "\
//! -- version=3.9
//! module Python {
//!     expr_context = Load | Store | Del
//!     keyword = (identifier? arg, expr value)
//!                attributes (int lineno, int col_offset)
//! }
//! ";
//!
//! let (version, module) = load_versioned(source, "Python.asdl").unwrap();
//! assert_eq!(version, Version::from([3, 9]));
//! assert_eq!(module.type_names(), vec!["expr_context", "keyword"]);
//! ```

mod comments;
mod error;
mod lexer;
mod parser;
mod version;

use asdl_schema_core::{Module, Version};
use tracing::debug;

pub use comments::{Comment, fetch_comments};
pub use error::{LoadError, SyntaxError};
pub use version::extract_version_tag;

use lexer::Lexer;
use parser::Parser;

/// Parses ASDL source into a module.
///
/// # Examples
///
/// ```
/// use asdl_schema_parser::parse;
///
/// let err = parse("module M { x = }", "bad.asdl").unwrap_err();
/// assert_eq!(err.to_string(), "bad.asdl:1:16: expected constructor name, found `}`");
/// ```
pub fn parse(source: &str, filename: &str) -> Result<Module, SyntaxError> {
    let tokens = Lexer::new(source, filename).tokenize()?;
    let module = Parser::new(tokens, filename).parse_module()?;
    debug!(file = filename, module = %module.name, types = module.body.len(), "Parsed schema");
    Ok(module)
}

/// Reads the `version=` tag and parses the module.
pub fn load_versioned(source: &str, filename: &str) -> Result<(Version, Module), LoadError> {
    let version = extract_version_tag(source, filename)?;
    let module = parse(source, filename)?;
    Ok((version, module))
}
