//! Canonical ASDL source printer.
//!
//! Output reparses to an equal [`Module`]: constructors written without a
//! field list stay bare, `Name()` keeps its empty parentheses.

use asdl_schema_core::{Constructor, Field, Module, Node, Product, Sum, Type, Visitor};

/// Prints `module` as ASDL source.
///
/// # Examples
///
/// ```
/// use asdl_schema_core::*;
/// use asdl_schema_emit::print_module;
///
/// let module = Module::new("M").with_type(Type::sum(
///     "ctx",
///     Sum::new(vec![Constructor::new("Load"), Constructor::new("Store")]),
/// ));
/// assert_eq!(print_module(&module), "module M {\n    ctx = Load | Store\n}\n");
/// ```
pub fn print_module(module: &Module) -> String {
    AsdlPrinter.visit_module(module, &())
}

struct AsdlPrinter;

impl AsdlPrinter {
    fn field_list(fields: &[Field]) -> String {
        let fields: Vec<String> = fields.iter().map(ToString::to_string).collect();
        format!("({})", fields.join(", "))
    }

    fn attributes(attributes: &[Field]) -> String {
        if attributes.is_empty() {
            String::new()
        } else {
            format!(" attributes {}", Self::field_list(attributes))
        }
    }
}

impl<'ast> Visitor<'ast> for AsdlPrinter {
    type Output = String;
    type Context = ();

    fn visit_module(&mut self, module: &'ast Module, cx: &()) -> String {
        let mut out = String::new();
        out.push_str(&format!("module {} {{\n", module.name));
        for line in self.visit_all(&module.body, cx) {
            out.push_str(&format!("    {line}\n"));
        }
        out.push_str("}\n");
        out
    }

    fn visit_type(&mut self, ty: &'ast Type, cx: &()) -> String {
        format!("{} = {}", ty.name, self.visit(Node::from(&ty.value), cx))
    }

    fn visit_sum(&mut self, sum: &'ast Sum, cx: &()) -> String {
        let constructors: Vec<String> = self.visit_all(&sum.types, cx).collect();
        format!("{}{}", constructors.join(" | "), Self::attributes(&sum.attributes))
    }

    fn visit_product(&mut self, product: &'ast Product, _cx: &()) -> String {
        format!(
            "{}{}",
            Self::field_list(&product.fields),
            Self::attributes(&product.attributes)
        )
    }

    fn visit_constructor(&mut self, constructor: &'ast Constructor, _cx: &()) -> String {
        match &constructor.fields {
            Some(fields) => format!("{}{}", constructor.name, Self::field_list(fields)),
            None => constructor.name.clone(),
        }
    }

    fn visit_field(&mut self, field: &'ast Field, _cx: &()) -> String {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_reparses_to_same_module() {
        let module = Module::new("Test")
            .with_type(Type::sum(
                "expr",
                Sum::new(vec![
                    Constructor::with_fields(
                        "Call",
                        vec![Field::required("expr", "func"), Field::sequence("expr", "args")],
                    ),
                    Constructor::with_fields("Empty", Vec::new()),
                    Constructor::new("Ellipsis"),
                ])
                .with_attribute(Field::required("int", "lineno"))
                .with_attribute(Field::optional("int", "end_lineno")),
            ))
            .with_type(Type::product(
                "alias",
                Product::new(vec![
                    Field::required("identifier", "name"),
                    Field::optional("identifier", "asname"),
                ]),
            ));

        let text = print_module(&module);
        assert!(text.contains(
            "expr = Call(expr func, expr* args) | Empty() | Ellipsis attributes (int lineno, int? end_lineno)"
        ));
        let reparsed = asdl_schema_parser::parse(&text, "printed.asdl").unwrap();
        assert_eq!(reparsed, module);
    }

    #[test]
    fn test_print_empty_module() {
        assert_eq!(print_module(&Module::new("Empty")), "module Empty {\n}\n");
    }
}
