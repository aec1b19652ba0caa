//! `version=` tag extraction.
//!
//! A versioned schema file names its snapshot version in a comment:
//!
//! ```text
//! -- version=3.9
//! module Python { ... }
//! ```
//!
//! The first such comment wins; later ones are ignored with a warning.

use std::sync::LazyLock;

use asdl_schema_core::Version;
use regex::Regex;
use tracing::warn;

use crate::comments::fetch_comments;
use crate::error::LoadError;

static VERSION_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*version=(?P<tag>.*?)\s*$").expect("static regex must compile")
});

/// Extracts the snapshot version from the first `version=` comment.
///
/// # Examples
///
/// ```
/// use asdl_schema_core::Version;
/// use asdl_schema_parser::{LoadError, extract_version_tag};
///
/// let version = extract_version_tag("-- version=3.10\nmodule M {}", "m.asdl").unwrap();
/// assert_eq!(version, Version::from([3, 10]));
///
/// assert!(matches!(
///     extract_version_tag("module M {}", "m.asdl"),
///     Err(LoadError::MissingVersionTag { .. })
/// ));
/// ```
pub fn extract_version_tag(source: &str, filename: &str) -> Result<Version, LoadError> {
    let mut tags = fetch_comments(source).into_iter().filter_map(|comment| {
        VERSION_TAG
            .captures(comment.text)
            .and_then(|caps| caps.name("tag"))
            .map(|tag| (comment.line, tag.as_str()))
    });

    let Some((_, tag)) = tags.next() else {
        return Err(LoadError::MissingVersionTag {
            filename: filename.to_string(),
        });
    };
    for (line, ignored) in tags {
        warn!(file = filename, line, tag = ignored, "Ignoring additional version tag");
    }

    tag.parse().map_err(|source| LoadError::InvalidVersionTag {
        filename: filename.to_string(),
        tag: tag.to_string(),
        source,
    })
}
