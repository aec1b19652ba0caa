//! GraphQL SDL generator.
//!
//! Attribute fields carry source locations and have no GraphQL counterpart,
//! so they are not emitted.

use asdl_schema_core::{
    Constructor, Field, FieldQualifier, Module, Node, Product, Sum, Type, Visitor,
};

const INDENT: &str = "  ";

/// Maps an ASDL builtin to its GraphQL scalar; other kinds pass through.
fn scalar(kind: &str) -> &str {
    match kind {
        "int" => "Int",
        "string" | "identifier" => "String",
        other => other,
    }
}

fn object_type(name: &str, fields: &[String]) -> String {
    let mut lines = vec![format!("type {name} {{")];
    lines.extend(fields.iter().map(|field| format!("{INDENT}{field}")));
    lines.push("}".to_string());
    lines.join("\n")
}

/// Generates GraphQL type definitions from one schema.
///
/// # Examples
///
/// ```
/// use asdl_schema_core::*;
/// use asdl_schema_emit::GraphQlGenerator;
///
/// let module = Module::new("M").with_type(Type::product(
///     "keyword",
///     Product::new(vec![Field::optional("identifier", "arg"), Field::required("expr", "value")]),
/// ));
/// assert_eq!(
///     GraphQlGenerator.generate(&module),
///     "type keyword {\n  arg: String\n  value: expr!\n}\n"
/// );
/// ```
pub struct GraphQlGenerator;

impl GraphQlGenerator {
    /// Returns every definition, one block per type, newline-terminated.
    pub fn generate(&mut self, module: &Module) -> String {
        self.visit_module(module, "")
            .into_iter()
            .map(|block| block + "\n")
            .collect()
    }
}

impl<'ast> Visitor<'ast> for GraphQlGenerator {
    /// SDL blocks, or a single `name: Type` line for a field.
    type Output = Vec<String>;
    type Context = str;

    fn visit_module(&mut self, module: &'ast Module, cx: &str) -> Vec<String> {
        self.visit_all(&module.body, cx).flatten().collect()
    }

    fn visit_type(&mut self, ty: &'ast Type, _cx: &str) -> Vec<String> {
        self.visit(Node::from(&ty.value), &ty.name)
    }

    fn visit_sum(&mut self, sum: &'ast Sum, cx: &str) -> Vec<String> {
        let names: Vec<&str> = sum.types.iter().map(|c| c.name.as_str()).collect();
        if sum.is_simple() {
            let mut lines = vec![format!("enum {cx} {{")];
            lines.extend(names.iter().map(|name| format!("{INDENT}{name}")));
            lines.push("}".to_string());
            return vec![lines.join("\n")];
        }

        let union = format!("union {cx} = {}", names.join(" | "));
        std::iter::once(union)
            .chain(self.visit_all(&sum.types, cx).flatten())
            .collect()
    }

    fn visit_product(&mut self, product: &'ast Product, cx: &str) -> Vec<String> {
        let fields: Vec<String> = self.visit_all(&product.fields, cx).flatten().collect();
        vec![object_type(cx, &fields)]
    }

    fn visit_constructor(&mut self, constructor: &'ast Constructor, cx: &str) -> Vec<String> {
        let fields: Vec<String> = self
            .visit_all(constructor.fields(), cx)
            .flatten()
            .collect();
        vec![object_type(&constructor.name, &fields)]
    }

    fn visit_field(&mut self, field: &'ast Field, _cx: &str) -> Vec<String> {
        let kind = scalar(&field.kind);
        let ty = match field.qualifier {
            FieldQualifier::Required => format!("{kind}!"),
            FieldQualifier::Optional => kind.to_string(),
            FieldQualifier::Sequence => format!("[{kind}]"),
        };
        vec![format!("{}: {ty}", field.name)]
    }
}
