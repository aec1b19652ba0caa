//! Schema snapshot versions.
//!
//! A [`Version`] is a tuple of integers compared lexicographically, so
//! `3.8 < 3.8.1 < 3.9 < 3.10`. A [`VersionSet`] is an ordered, duplicate-free
//! set of versions used wherever the merge engine tracks "which snapshots
//! exhibit this shape".

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Errors produced while parsing a [`Version`] from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    /// The text contained no version components.
    #[error("version cannot be empty")]
    Empty,
    /// A component was not an unsigned integer.
    #[error("invalid version component: {0:?}")]
    InvalidComponent(String),
}

/// Integer tuple identifying one schema snapshot.
///
/// # Examples
///
/// ```
/// use asdl_schema_core::Version;
///
/// let v38: Version = "3.8".parse().unwrap();
/// let v310: Version = "(3, 10)".parse().unwrap();
/// assert!(v38 < v310);
/// assert_eq!(v38.to_string(), "3.8");
/// assert_eq!(v38.as_tuple_literal(), "(3, 8)");
/// assert_eq!(Version::from([3]).as_tuple_literal(), "(3,)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(Vec<u32>);

impl Version {
    /// Returns the version components.
    pub fn parts(&self) -> &[u32] {
        &self.0
    }

    /// Renders the version as a Python tuple literal.
    pub fn as_tuple_literal(&self) -> String {
        let parts: Vec<String> = self.0.iter().map(u32::to_string).collect();
        if parts.len() == 1 {
            format!("({},)", parts[0])
        } else {
            format!("({})", parts.join(", "))
        }
    }
}

impl<const N: usize> From<[u32; N]> for Version {
    fn from(parts: [u32; N]) -> Self {
        Self(parts.to_vec())
    }
}

impl From<u32> for Version {
    fn from(major: u32) -> Self {
        Self(vec![major])
    }
}

impl FromStr for Version {
    type Err = VersionError;

    /// Accepts dotted (`3.8`), comma separated (`3,8`) and tuple (`(3, 8)`,
    /// `(3,)`) spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let inner = trimmed
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(trimmed);
        if inner.trim().is_empty() {
            return Err(VersionError::Empty);
        }

        let mut parts = Vec::new();
        let mut pieces = inner.split(['.', ',']).map(str::trim).peekable();
        while let Some(piece) = pieces.next() {
            // "(3,)" leaves one trailing empty piece
            if piece.is_empty() && pieces.peek().is_none() && !parts.is_empty() {
                break;
            }
            let part = piece
                .parse::<u32>()
                .map_err(|_| VersionError::InvalidComponent(piece.to_string()))?;
            parts.push(part);
        }

        Ok(Self(parts))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u32::to_string).collect();
        f.write_str(&parts.join("."))
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Ordered set of versions.
///
/// # Examples
///
/// ```
/// use asdl_schema_core::{Version, VersionSet};
///
/// let set: VersionSet = [3u32, 1, 2, 3].into_iter().map(Version::from).collect();
/// assert_eq!(set.len(), 3);
/// assert_eq!(set.first(), Some(&Version::from(1)));
/// assert_eq!(set.to_string(), "{1, 2, 3}");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct VersionSet(BTreeSet<Version>);

impl VersionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a version, returning `false` if it was already present.
    pub fn insert(&mut self, version: Version) -> bool {
        self.0.insert(version)
    }

    pub fn contains(&self, version: &Version) -> bool {
        self.0.contains(version)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lowest version in the set.
    pub fn first(&self) -> Option<&Version> {
        self.0.first()
    }

    /// Highest version in the set.
    pub fn last(&self) -> Option<&Version> {
        self.0.last()
    }

    /// Iterates versions in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &Version> {
        self.0.iter()
    }

    /// Returns the zero-based rank of `version` within the set.
    pub fn position(&self, version: &Version) -> Option<usize> {
        if !self.0.contains(version) {
            return None;
        }
        Some(self.0.range(..version).count())
    }
}

impl FromIterator<Version> for VersionSet {
    fn from_iter<I: IntoIterator<Item = Version>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for VersionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let versions: Vec<String> = self.0.iter().map(Version::to_string).collect();
        write!(f, "{{{}}}", versions.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_all_spellings() {
        let expected = Version::from([3, 8]);
        assert_eq!("3.8".parse::<Version>().unwrap(), expected);
        assert_eq!("3,8".parse::<Version>().unwrap(), expected);
        assert_eq!(" (3, 8) ".parse::<Version>().unwrap(), expected);
        assert_eq!("(3,)".parse::<Version>().unwrap(), Version::from(3));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!("".parse::<Version>(), Err(VersionError::Empty));
        assert_eq!("()".parse::<Version>(), Err(VersionError::Empty));
        assert_eq!(
            "3.x".parse::<Version>(),
            Err(VersionError::InvalidComponent("x".to_string()))
        );
        assert!("3..8".parse::<Version>().is_err());
    }

    #[test]
    fn test_ordering_is_lexicographic_by_component() {
        let mut versions: Vec<Version> = ["3.10", "3.8.1", "3.8", "3.9"]
            .iter()
            .map(|v| v.parse().unwrap())
            .collect();
        versions.sort();
        let rendered: Vec<String> = versions.iter().map(Version::to_string).collect();
        assert_eq!(rendered, vec!["3.8", "3.8.1", "3.9", "3.10"]);
    }

    #[test]
    fn test_serializes_as_string() {
        let version = Version::from([3, 9]);
        assert_eq!(serde_json::to_string(&version).unwrap(), "\"3.9\"");
        let back: Version = serde_json::from_str("\"3.9\"").unwrap();
        assert_eq!(back, version);
    }

    #[test]
    fn test_version_set_position() {
        let set: VersionSet = [1u32, 4, 9].into_iter().map(Version::from).collect();
        assert_eq!(set.position(&Version::from(4)), Some(1));
        assert_eq!(set.position(&Version::from(5)), None);
    }
}
