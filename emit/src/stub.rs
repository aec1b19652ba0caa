//! Multi-version Python typing stub generator.
//!
//! Renders a [`MergedModule`] through [`MergedModule::render`]: each merged
//! declaration becomes a class statement, every guard an `if` on the
//! configured version expression, and every base alias an
//! `if`/`elif`/`else` assignment chain placed before its class.

use asdl_schema_core::{
    Base, BaseAlias, BaseRef, Condition, Field, GuardNode, GuardTree, MergedModule, Rendered,
};
use tracing::debug;

use crate::config::EmitConfig;
use crate::python::{CONSTANT_ALIAS, annotation};

/// Generates a typing stub covering every version of a merged module.
///
/// Upper bounds compare against the bare tagged version, so
/// `sys.version_info <= (3, 8)` is false on a 3.8.x interpreter; tag
/// snapshots with the full version when patch releases matter.
///
/// # Examples
///
/// ```
/// use asdl_schema_core::*;
/// use asdl_schema_emit::{EmitConfig, StubGenerator};
///
/// let snapshot = |fields: Vec<Field>| {
///     Module::new("M").with_type(Type::product("arguments", Product::new(fields)))
/// };
/// let merged = merge(vec![
///     (Version::from([3, 7]), snapshot(vec![Field::sequence("arg", "args")])),
///     (
///         Version::from([3, 8]),
///         snapshot(vec![Field::sequence("arg", "posonlyargs"), Field::sequence("arg", "args")]),
///     ),
/// ])
/// .unwrap();
///
/// let config = EmitConfig::default();
/// let stub = StubGenerator::new(&config).generate(&merged);
/// assert!(stub.contains(
///     "class arguments(AST):\n    if sys.version_info >= (3, 8):\n        posonlyargs: typing.List[arg]\n    args: typing.List[arg]\n"
/// ));
/// ```
pub struct StubGenerator<'c> {
    config: &'c EmitConfig,
}

impl<'c> StubGenerator<'c> {
    pub fn new(config: &'c EmitConfig) -> Self {
        Self { config }
    }

    /// Returns the complete stub source, prelude included.
    pub fn generate(&self, merged: &MergedModule) -> String {
        let tree = merged.render(|name, base, body| self.class_lines(name, base, body));

        let mut lines = Vec::new();
        self.write_tree(&tree, 0, &mut lines, &mut |item, depth, out| {
            if depth == 0 {
                separate(out);
            }
            match item {
                Rendered::Alias(alias) => self.alias_lines(alias, depth, out),
                Rendered::Declaration(class) => {
                    out.extend(class.iter().map(|line| self.line(depth, line)));
                }
            }
        });
        debug!(
            module = %merged.name,
            versions = %merged.versions,
            lines = lines.len(),
            "Generated typing stub"
        );

        let mut out = self.prelude();
        out.push_str("\n\n");
        for line in lines {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }

    fn prelude(&self) -> String {
        let indent = self.config.indent(1);
        let mut out = String::new();
        out.push_str("from __future__ import annotations\n\n");
        out.push_str("import sys\n");
        out.push_str("import typing\n\n\n");
        out.push_str(&format!("class {}:\n", self.config.base_class));
        out.push_str(&format!(
            "{indent}_attributes: typing.ClassVar[typing.Tuple[str, ...]]\n"
        ));
        out.push_str(&format!("{indent}_fields: typing.ClassVar[typing.Tuple[str, ...]]\n"));
        out.push_str(&format!(
            "{indent}def __init__(self, *args: typing.Any, **kwargs: typing.Any) -> None: ...\n"
        ));
        out.push_str(&format!(
            "{indent}def __getattribute__(self, name: str) -> typing.Any: ...\n"
        ));
        out.push_str(&format!(
            "{indent}def __setattr__(self, name: str, value: typing.Any) -> None: ...\n"
        ));
        out.push_str(&format!("{indent}def __delattr__(self, name: str) -> None: ...\n\n\n"));
        out.push_str("identifier = str\n");
        out.push_str("string = typing.AnyStr\n");
        out.push_str(CONSTANT_ALIAS);
        out
    }

    /// Class statement lines, relative to depth zero.
    fn class_lines(&self, name: &str, base: &BaseRef, body: &GuardTree<Field>) -> Vec<String> {
        let base = match base {
            BaseRef::Fixed(base) => self.base_name(base),
            BaseRef::Alias(alias) => alias.as_str(),
        };
        let mut lines = vec![format!("class {name}({base}):")];
        self.write_tree(body, 1, &mut lines, &mut |field, depth, out| {
            out.push(self.line(depth, &format!("{}: {}", field.name, annotation(field))));
        });
        if lines.len() == 1 {
            lines.push(self.line(1, "..."));
        }
        lines
    }

    fn alias_lines(&self, alias: &BaseAlias, depth: usize, out: &mut Vec<String>) {
        let last = alias.cases.len().saturating_sub(1);
        for (idx, case) in alias.cases.iter().enumerate() {
            let header = if idx == 0 {
                format!("if {}:", self.condition(&case.condition))
            } else if idx == last {
                "else:".to_string()
            } else {
                format!("elif {}:", self.condition(&case.condition))
            };
            out.push(self.line(depth, &header));
            out.push(self.line(
                depth + 1,
                &format!("{} = {}", alias.name, self.base_name(&case.base)),
            ));
        }
    }

    fn write_tree<T, F>(
        &self,
        tree: &GuardTree<T>,
        depth: usize,
        out: &mut Vec<String>,
        item: &mut F,
    ) where
        F: FnMut(&T, usize, &mut Vec<String>),
    {
        if tree.condition.is_always() {
            self.write_nodes(&tree.body, depth, out, item);
            return;
        }

        if depth == 0 {
            separate(out);
        }
        out.push(self.line(depth, &format!("if {}:", self.condition(&tree.condition))));
        let before = out.len();
        self.write_nodes(&tree.body, depth + 1, out, item);
        if out.len() == before {
            out.push(self.line(depth + 1, "..."));
        }
    }

    fn write_nodes<T, F>(
        &self,
        body: &[GuardNode<T>],
        depth: usize,
        out: &mut Vec<String>,
        item: &mut F,
    ) where
        F: FnMut(&T, usize, &mut Vec<String>),
    {
        for node in body {
            match node {
                GuardNode::Item(value) => item(value, depth, out),
                GuardNode::Guard(tree) => self.write_tree(tree, depth, out, item),
            }
        }
    }

    /// Python test expression for a version range.
    fn condition(&self, condition: &Condition) -> String {
        let var = &self.config.version_variable;
        match condition {
            Condition::Always => "True".to_string(),
            Condition::AtLeast(min) => format!("{var} >= {}", min.as_tuple_literal()),
            Condition::AtMost(max) => format!("{var} <= {}", max.as_tuple_literal()),
            Condition::Between(min, max) => format!(
                "{} <= {var} <= {}",
                min.as_tuple_literal(),
                max.as_tuple_literal()
            ),
        }
    }

    fn base_name<'a>(&'a self, base: &'a Base) -> &'a str {
        match base {
            Base::Root => &self.config.base_class,
            Base::Named(name) => name,
        }
    }

    fn line(&self, depth: usize, text: &str) -> String {
        format!("{}{text}", self.config.indent(depth))
    }
}

/// Blank line between top-level statements.
fn separate(out: &mut Vec<String>) {
    let needs_gap = out
        .last()
        .is_some_and(|last| !last.is_empty() && !last.ends_with(':'));
    if needs_gap {
        out.push(String::new());
    }
}
