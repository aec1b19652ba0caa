//! Python dataclass module generator.
//!
//! Simple sums become `Enum` subclasses, other sums an abstract base class
//! followed by one dataclass per constructor, products a single dataclass.

use asdl_schema_core::{
    Constructor, Field, FieldQualifier, Module, Node, Product, Sum, Type, Visitor,
};
use tracing::debug;

use crate::config::EmitConfig;

/// Union alias for the `constant` builtin, shared with the stub prelude.
pub(crate) const CONSTANT_ALIAS: &str = "\
constant = typing.Union[
    str,
    bytes,
    # strings
    int,
    float,
    complex,
    # numbers
    bool,
    # other
    tuple,
    frozenset,
    # sequences
    None,
    type(Ellipsis)
    # singletons
]
";

/// Returns the Python annotation for `field`.
///
/// # Examples
///
/// ```
/// use asdl_schema_core::Field;
/// use asdl_schema_emit::annotation;
///
/// assert_eq!(annotation(&Field::required("expr", "value")), "expr");
/// assert_eq!(annotation(&Field::optional("expr", "value")), "typing.Optional[expr]");
/// assert_eq!(annotation(&Field::sequence("stmt", "body")), "typing.List[stmt]");
/// ```
pub fn annotation(field: &Field) -> String {
    match field.qualifier {
        FieldQualifier::Required => field.kind.clone(),
        FieldQualifier::Optional => format!("typing.Optional[{}]", field.kind),
        FieldQualifier::Sequence => format!("typing.List[{}]", field.kind),
    }
}

/// Renders a class statement; an empty body becomes `...`.
pub(crate) fn class_block(
    config: &EmitConfig,
    decorator: Option<&str>,
    name: &str,
    base: &str,
    body: &[String],
) -> String {
    let indent = config.indent(1);
    let mut out = String::new();
    if let Some(decorator) = decorator {
        out.push_str(&format!("@{decorator}\n"));
    }
    out.push_str(&format!("class {name}({base}):\n"));
    if body.is_empty() {
        out.push_str(&format!("{indent}...\n"));
    }
    for line in body {
        out.push_str(&format!("{indent}{line}\n"));
    }
    out
}

/// Generates a Python module of dataclasses from one schema.
///
/// # Examples
///
/// ```
/// use asdl_schema_core::*;
/// use asdl_schema_emit::{EmitConfig, PythonGenerator};
///
/// let module = Module::new("M").with_type(Type::product(
///     "alias",
///     Product::new(vec![Field::optional("identifier", "asname")]),
/// ));
/// let config = EmitConfig { with_defaults: true, ..EmitConfig::default() };
/// let source = PythonGenerator::new(&config).generate(&module);
/// assert!(source.contains(
///     "@_dataclass\nclass alias(AST):\n    asname: typing.Optional[identifier] = _field(default=None)\n"
/// ));
/// ```
pub struct PythonGenerator<'c> {
    config: &'c EmitConfig,
}

impl<'c> PythonGenerator<'c> {
    pub fn new(config: &'c EmitConfig) -> Self {
        Self { config }
    }

    /// Returns the complete module source, prelude included.
    pub fn generate(&mut self, module: &Module) -> String {
        let definitions = self.visit_module(module, "");
        debug!(module = %module.name, classes = definitions.len(), "Generated Python module");

        let mut out = self.prelude();
        for definition in definitions {
            out.push_str("\n\n");
            out.push_str(&definition);
        }
        out
    }

    fn prelude(&self) -> String {
        let mut out = String::new();
        out.push_str("from __future__ import annotations\n\n");
        out.push_str("import typing\n");
        out.push_str("from dataclasses import dataclass as _dataclass, field as _field\n");
        out.push_str("from enum import Enum as _Enum, auto as _auto\n\n");
        out.push_str("identifier = str\n");
        out.push_str("string = typing.Union[str, bytes]\n");
        out.push_str(CONSTANT_ALIAS);
        out.push_str(&format!(
            "\n\nclass {}:\n{}...\n",
            self.config.base_class,
            self.config.indent(1)
        ));
        out
    }

    fn dataclass(&self, name: &str, base: &str, body: &[String]) -> String {
        class_block(self.config, Some("_dataclass"), name, base, body)
    }
}

impl<'ast> Visitor<'ast> for PythonGenerator<'_> {
    /// Class definitions, or annotated lines for a field.
    type Output = Vec<String>;
    /// Name of the enclosing type.
    type Context = str;

    fn visit_module(&mut self, module: &'ast Module, cx: &str) -> Vec<String> {
        self.visit_all(&module.body, cx).flatten().collect()
    }

    fn visit_type(&mut self, ty: &'ast Type, _cx: &str) -> Vec<String> {
        self.visit(Node::from(&ty.value), &ty.name)
    }

    fn visit_sum(&mut self, sum: &'ast Sum, cx: &str) -> Vec<String> {
        if sum.is_simple() {
            let members: Vec<String> = sum
                .types
                .iter()
                .map(|constructor| format!("{} = _auto()", constructor.name))
                .collect();
            return vec![class_block(self.config, None, cx, "_Enum", &members)];
        }

        let attributes: Vec<String> = self.visit_all(&sum.attributes, cx).flatten().collect();
        let base = class_block(self.config, None, cx, &self.config.base_class, &attributes);
        std::iter::once(base)
            .chain(self.visit_all(&sum.types, cx).flatten())
            .collect()
    }

    fn visit_product(&mut self, product: &'ast Product, cx: &str) -> Vec<String> {
        let mut body: Vec<String> = self.visit_all(&product.fields, cx).flatten().collect();
        body.extend(self.visit_all(&product.attributes, cx).flatten());
        vec![self.dataclass(cx, &self.config.base_class, &body)]
    }

    fn visit_constructor(&mut self, constructor: &'ast Constructor, cx: &str) -> Vec<String> {
        let body: Vec<String> = self
            .visit_all(constructor.fields(), cx)
            .flatten()
            .collect();
        vec![self.dataclass(&constructor.name, cx, &body)]
    }

    fn visit_field(&mut self, field: &'ast Field, _cx: &str) -> Vec<String> {
        let default = match field.qualifier {
            _ if !self.config.with_defaults => "",
            FieldQualifier::Required => "",
            FieldQualifier::Optional => " = _field(default=None)",
            FieldQualifier::Sequence => " = _field(default_factory=list)",
        };
        vec![format!("{}: {}{default}", field.name, annotation(field))]
    }
}
