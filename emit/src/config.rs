//! Emitter configuration.
//!
//! Controls naming and layout choices shared by the Python-flavoured
//! emitters. Every field has a default, so a partial YAML file is valid.
//!
//! # Example YAML
//!
//! ```yaml
//! base_class: AST
//! with_defaults: true
//! version_variable: sys.version_info
//! header: true
//! indent: "    "
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Settings for the Python dataclass and typing-stub emitters.
///
/// # Examples
///
/// ```
/// use asdl_schema_emit::EmitConfig;
///
/// let config: EmitConfig = serde_yaml::from_str("with_defaults: true").unwrap();
/// assert!(config.with_defaults);
/// assert_eq!(config.base_class, "AST");
/// assert_eq!(config.indent(2), "        ");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitConfig {
    /// Name of the root class every generated class derives from.
    pub base_class: String,
    /// Give optional and sequence dataclass fields default values.
    pub with_defaults: bool,
    /// Expression compared against version tuples in stub guards.
    pub version_variable: String,
    /// Prefix output with an `@generated` header.
    pub header: bool,
    /// One indentation level.
    #[serde(rename = "indent")]
    pub indent_unit: String,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            base_class: "AST".to_string(),
            with_defaults: false,
            version_variable: "sys.version_info".to_string(),
            header: true,
            indent_unit: "    ".to_string(),
        }
    }
}

impl EmitConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::EmitError::IoError) if the file cannot be
    /// read, or [`YamlError`](crate::EmitError::YamlError) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Returns the indentation for `depth` levels.
    pub fn indent(&self, depth: usize) -> String {
        self.indent_unit.repeat(depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_complete() {
        let yaml = r#"
base_class: Node
with_defaults: true
version_variable: VERSION
header: false
indent: "  "
"#;
        let config: EmitConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.base_class, "Node");
        assert!(config.with_defaults);
        assert_eq!(config.version_variable, "VERSION");
        assert!(!config.header);
        assert_eq!(config.indent(1), "  ");
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: EmitConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, EmitConfig::default());
    }

    #[test]
    fn test_load_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("asdlgen.yml");

        let original = EmitConfig {
            base_class: "Base".to_string(),
            with_defaults: true,
            ..EmitConfig::default()
        };
        original.save(&path).unwrap();

        let loaded = EmitConfig::load(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = EmitConfig::load(dir.path().join("missing.yml")).unwrap_err();
        assert!(matches!(err, crate::EmitError::IoError(_)));
    }
}
