//! Structured output of schema models and merge results.

use asdl_schema_core::Module;
use serde::Serialize;

use crate::asdl::print_module;
use crate::error::Result;

/// Serialization formats for any serializable model value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpFormat {
    Json,
    Yaml,
}

/// Output formats for a single parsed module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    Json,
    Yaml,
    /// Canonical ASDL source.
    Asdl,
}

/// Serializes `value` in the requested format.
///
/// # Examples
///
/// ```
/// use asdl_schema_core::Version;
/// use asdl_schema_emit::{DumpFormat, dump};
///
/// let json = dump(&Version::from([3, 8]), DumpFormat::Json).unwrap();
/// assert_eq!(json, "\"3.8\"");
/// ```
pub fn dump<T: Serialize + ?Sized>(value: &T, format: DumpFormat) -> Result<String> {
    let out = match format {
        DumpFormat::Json => serde_json::to_string_pretty(value)?,
        DumpFormat::Yaml => serde_yaml::to_string(value)?,
    };
    Ok(out)
}

/// Formats a parsed module in the requested output format.
pub fn format_module(module: &Module, format: SchemaFormat) -> Result<String> {
    match format {
        SchemaFormat::Json => dump(module, DumpFormat::Json),
        SchemaFormat::Yaml => dump(module, DumpFormat::Yaml),
        SchemaFormat::Asdl => Ok(print_module(module)),
    }
}

#[cfg(test)]
mod tests {
    use asdl_schema_core::{Field, Product, Type};

    use super::*;

    fn sample() -> Module {
        Module::new("M").with_type(Type::product(
            "pair",
            Product::new(vec![Field::required("int", "a"), Field::optional("int", "b")]),
        ))
    }

    #[test]
    fn test_json_dump_parses_back() {
        let json = format_module(&sample(), SchemaFormat::Json).unwrap();
        let back: Module = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn test_yaml_dump_names_qualifiers() {
        let yaml = format_module(&sample(), SchemaFormat::Yaml).unwrap();
        assert!(yaml.contains("name: M"));
        assert!(yaml.contains("qualifier: optional"));
    }

    #[test]
    fn test_asdl_format_prints_source() {
        let text = format_module(&sample(), SchemaFormat::Asdl).unwrap();
        assert!(text.starts_with("module M {"));
        assert!(text.contains("pair = (int a, int? b)"));
    }
}
