//! Schema model validation.
//!
//! Checks the structural invariants every snapshot must satisfy before it is
//! emitted or merged: names are non-empty, type names are unique within a
//! module, constructor names are unique within a sum, field names are unique
//! within one declaration body, and every declaration name (type or
//! constructor) is defined once per module.
//!
//! # Examples
//!
//! ```
//! use asdl_schema_core::*;
//!
//! let module = Module::new("Test").with_type(Type::sum(
//!     "boolop",
//!     Sum::new(vec![Constructor::new("And"), Constructor::new("Or")]),
//! ));
//! assert!(validate_module(&module).is_empty());
//!
//! let bad = Module::new("Test").with_type(Type::sum(
//!     "boolop",
//!     Sum::new(vec![Constructor::new("And"), Constructor::new("And")]),
//! ));
//! assert!(!validate_module(&bad).is_empty());
//! ```

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::{Constructor, Field, Module, Node, NodeKind, Product, Sum, Type, Visitor};

/// Model validation errors.
///
/// Each variant names the declaration it was found in, so the `Display`
/// text identifies the defect without the source file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Module name is empty or whitespace-only.
    #[error("module name cannot be empty")]
    EmptyModuleName,
    /// A type definition has an empty name.
    #[error("type name cannot be empty")]
    EmptyTypeName,
    /// A constructor of the named sum has an empty name.
    #[error("constructor name cannot be empty in sum {sum}")]
    EmptyConstructorName { sum: String },
    /// A field of the named declaration has an empty kind or name.
    #[error("field kind and name cannot be empty in {declaration}")]
    EmptyField { declaration: String },
    /// Two types in the same module share a name.
    #[error("duplicate type in module: {0}")]
    DuplicateType(String),
    /// Two constructors in the same sum share a name.
    #[error("duplicate constructor {constructor} in sum {sum}")]
    DuplicateConstructor { sum: String, constructor: String },
    /// Two fields of one declaration body share a name.
    #[error("duplicate field {field} in {declaration}")]
    DuplicateField { declaration: String, field: String },
    /// A constructor reuses the name of another type or constructor.
    #[error("declaration name defined more than once: {0}")]
    DuplicateDeclaration(String),
}

/// Validates one schema snapshot, returning every violation found.
///
/// # Examples
///
/// ```
/// use asdl_schema_core::*;
///
/// let module = Module::new("Test").with_type(Type::product(
///     "arg",
///     Product::new(vec![Field::required("identifier", "arg")])
///         .with_attribute(Field::required("int", "arg")),
/// ));
/// assert_eq!(
///     validate_module(&module),
///     vec![ValidationError::DuplicateField {
///         declaration: "arg".to_string(),
///         field: "arg".to_string(),
///     }]
/// );
/// ```
pub fn validate_module(module: &Module) -> Vec<ValidationError> {
    let mut validator = Validator::default();
    validator.visit_module(module, "");
    validator.errors
}

#[derive(Default)]
struct Validator<'ast> {
    errors: Vec<ValidationError>,
    declared: HashMap<&'ast str, NodeKind>,
}

impl<'ast> Validator<'ast> {
    fn declare(&mut self, name: &'ast str, kind: NodeKind) {
        match self.declared.entry(name) {
            Entry::Vacant(slot) => {
                slot.insert(kind);
            }
            Entry::Occupied(existing) => {
                let error = if kind == NodeKind::Type && *existing.get() == NodeKind::Type {
                    ValidationError::DuplicateType(name.to_string())
                } else {
                    ValidationError::DuplicateDeclaration(name.to_string())
                };
                self.errors.push(error);
            }
        }
    }

    /// Checks one declaration body: every field individually, then name
    /// uniqueness across the body.
    fn check_body<I>(&mut self, declaration: &str, fields: I)
    where
        I: IntoIterator<Item = &'ast Field>,
    {
        let mut seen = HashSet::new();
        for field in fields {
            self.visit_field(field, declaration);
            if !field.name.is_empty() && !seen.insert(field.name.as_str()) {
                self.errors.push(ValidationError::DuplicateField {
                    declaration: declaration.to_string(),
                    field: field.name.clone(),
                });
            }
        }
    }
}

impl<'ast> Visitor<'ast> for Validator<'ast> {
    type Output = ();
    /// Name of the enclosing declaration.
    type Context = str;

    fn visit_module(&mut self, module: &'ast Module, _cx: &str) {
        if module.name.trim().is_empty() {
            self.errors.push(ValidationError::EmptyModuleName);
        }
        for ty in &module.body {
            self.visit_type(ty, &module.name);
        }
    }

    fn visit_type(&mut self, ty: &'ast Type, _cx: &str) {
        if ty.name.trim().is_empty() {
            self.errors.push(ValidationError::EmptyTypeName);
        } else {
            self.declare(&ty.name, NodeKind::Type);
        }
        self.visit(Node::from(&ty.value), &ty.name);
    }

    fn visit_sum(&mut self, sum: &'ast Sum, cx: &str) {
        let mut seen = HashSet::new();
        for constructor in &sum.types {
            if !constructor.name.is_empty() && !seen.insert(constructor.name.as_str()) {
                self.errors.push(ValidationError::DuplicateConstructor {
                    sum: cx.to_string(),
                    constructor: constructor.name.clone(),
                });
                continue;
            }
            self.visit_constructor(constructor, cx);
        }
        self.check_body(cx, &sum.attributes);
    }

    fn visit_product(&mut self, product: &'ast Product, cx: &str) {
        self.check_body(cx, product.fields.iter().chain(&product.attributes));
    }

    fn visit_constructor(&mut self, constructor: &'ast Constructor, cx: &str) {
        if constructor.name.trim().is_empty() {
            self.errors.push(ValidationError::EmptyConstructorName {
                sum: cx.to_string(),
            });
            return;
        }
        self.declare(&constructor.name, NodeKind::Constructor);
        self.check_body(&constructor.name, constructor.fields());
    }

    fn visit_field(&mut self, field: &'ast Field, cx: &str) {
        if field.kind.trim().is_empty() || field.name.trim().is_empty() {
            self.errors.push(ValidationError::EmptyField {
                declaration: cx.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr_sum() -> Sum {
        Sum::new(vec![
            Constructor::with_fields("Name", vec![Field::required("identifier", "id")]),
            Constructor::with_fields(
                "Call",
                vec![
                    Field::required("expr", "func"),
                    Field::sequence("expr", "args"),
                ],
            ),
        ])
        .with_attribute(Field::required("int", "lineno"))
    }

    #[test]
    fn test_validate_module_accepts_valid_module() {
        let module = Module::new("Python")
            .with_type(Type::sum("expr", expr_sum()))
            .with_type(Type::product(
                "keyword",
                Product::new(vec![
                    Field::optional("identifier", "arg"),
                    Field::required("expr", "value"),
                ]),
            ));
        assert!(validate_module(&module).is_empty());
    }

    #[test]
    fn test_validate_module_rejects_duplicate_types() {
        let module = Module::new("Python")
            .with_type(Type::sum("expr", expr_sum()))
            .with_type(Type::product("expr", Product::default()));
        assert_eq!(
            validate_module(&module),
            vec![ValidationError::DuplicateType("expr".to_string())]
        );
    }

    #[test]
    fn test_validate_module_rejects_constructor_reusing_type_name() {
        let module = Module::new("Python")
            .with_type(Type::product("Name", Product::default()))
            .with_type(Type::sum("expr", expr_sum()));
        assert_eq!(
            validate_module(&module),
            vec![ValidationError::DuplicateDeclaration("Name".to_string())]
        );
    }

    #[test]
    fn test_validate_module_rejects_constructor_shared_between_sums() {
        let module = Module::new("Python")
            .with_type(Type::sum("expr", expr_sum()))
            .with_type(Type::sum("other", expr_sum()));
        let errors = validate_module(&module);
        assert_eq!(
            errors,
            vec![
                ValidationError::DuplicateDeclaration("Name".to_string()),
                ValidationError::DuplicateDeclaration("Call".to_string()),
            ]
        );
    }

    #[test]
    fn test_validate_module_reports_empty_names_with_location() {
        let module = Module::new(" ").with_type(Type::sum(
            "stmt",
            Sum::new(vec![
                Constructor::new(""),
                Constructor::with_fields("Pass", vec![Field::required("", "x")]),
            ]),
        ));
        assert_eq!(
            validate_module(&module),
            vec![
                ValidationError::EmptyModuleName,
                ValidationError::EmptyConstructorName {
                    sum: "stmt".to_string()
                },
                ValidationError::EmptyField {
                    declaration: "Pass".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_validate_module_rejects_duplicate_constructor_in_sum() {
        let module = Module::new("M").with_type(Type::sum(
            "cmpop",
            Sum::new(vec![Constructor::new("Eq"), Constructor::new("Eq")]),
        ));
        assert_eq!(
            validate_module(&module),
            vec![ValidationError::DuplicateConstructor {
                sum: "cmpop".to_string(),
                constructor: "Eq".to_string(),
            }]
        );
    }
}
