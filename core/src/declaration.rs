//! Flat declaration namespace.
//!
//! Emitters that produce one class per definition (and the merge engine)
//! see a module as a flat list of [`Declaration`]s: each sum contributes a
//! declaration for itself plus one per constructor, each product one
//! declaration. Declarations are collected with a [`Visitor`], then grouped
//! by name across snapshots into [`VersionedDefinition`]s.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Constructor, Field, Module, Node, Product, Sum, Type, Version, VersionSet, Visitor};

/// Parent a declaration derives from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Base {
    /// The target language's root node class.
    Root,
    /// Another declaration, by name.
    Named(String),
}

impl fmt::Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("<root>"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    Sum,
    Product,
    Constructor,
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sum => "sum",
            Self::Product => "product",
            Self::Constructor => "constructor",
        })
    }
}

/// One named entry of the flat namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclarationKind,
    pub base: Base,
    /// Body fields in order: a sum's attributes, a constructor's fields, or
    /// a product's fields followed by its attributes.
    pub fields: Vec<Field>,
}

/// Flattens `module` into declarations, in declaration order.
///
/// # Examples
///
/// ```
/// use asdl_schema_core::*;
///
/// let module = Module::new("M").with_type(Type::sum(
///     "expr",
///     Sum::new(vec![Constructor::with_fields("Name", vec![Field::required("identifier", "id")])])
///         .with_attribute(Field::required("int", "lineno")),
/// ));
/// let decls = collect_declarations(&module);
/// assert_eq!(decls.len(), 2);
/// assert_eq!(decls[0].name, "expr");
/// assert_eq!(decls[0].fields, vec![Field::required("int", "lineno")]);
/// assert_eq!(decls[1].base, Base::Named("expr".to_string()));
/// ```
pub fn collect_declarations(module: &Module) -> Vec<Declaration> {
    DeclarationCollector.visit_module(module, "")
}

struct DeclarationCollector;

impl<'ast> Visitor<'ast> for DeclarationCollector {
    type Output = Vec<Declaration>;
    /// Name of the enclosing type.
    type Context = str;

    fn visit_module(&mut self, module: &'ast Module, cx: &str) -> Vec<Declaration> {
        self.visit_all(&module.body, cx).flatten().collect()
    }

    fn visit_type(&mut self, ty: &'ast Type, _cx: &str) -> Vec<Declaration> {
        self.visit(Node::from(&ty.value), &ty.name)
    }

    fn visit_sum(&mut self, sum: &'ast Sum, cx: &str) -> Vec<Declaration> {
        let own = Declaration {
            name: cx.to_string(),
            kind: DeclarationKind::Sum,
            base: Base::Root,
            fields: sum.attributes.clone(),
        };
        std::iter::once(own)
            .chain(self.visit_all(&sum.types, cx).flatten())
            .collect()
    }

    fn visit_product(&mut self, product: &'ast Product, cx: &str) -> Vec<Declaration> {
        vec![Declaration {
            name: cx.to_string(),
            kind: DeclarationKind::Product,
            base: Base::Root,
            fields: product
                .fields
                .iter()
                .chain(&product.attributes)
                .cloned()
                .collect(),
        }]
    }

    fn visit_constructor(&mut self, constructor: &'ast Constructor, cx: &str) -> Vec<Declaration> {
        vec![Declaration {
            name: constructor.name.clone(),
            kind: DeclarationKind::Constructor,
            base: Base::Named(cx.to_string()),
            fields: constructor.fields().to_vec(),
        }]
    }
}

/// Every shape one declaration name takes across the snapshots that define
/// it, sorted by version ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedDefinition {
    pub name: String,
    pub versions: Vec<(Version, Declaration)>,
}

impl VersionedDefinition {
    /// Versions in which this name is defined.
    pub fn observed(&self) -> VersionSet {
        self.versions.iter().map(|(version, _)| version.clone()).collect()
    }

    /// Shape at the highest observed version.
    pub fn latest(&self) -> Option<&Declaration> {
        self.versions.last().map(|(_, declaration)| declaration)
    }
}

/// Groups declarations by name across version-sorted snapshots.
///
/// Definitions come out in first-seen order: version ascending, then
/// declaration order within the snapshot.
pub fn group_definitions(snapshots: &[(Version, Module)]) -> Vec<VersionedDefinition> {
    let mut definitions: Vec<VersionedDefinition> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (version, module) in snapshots {
        for declaration in collect_declarations(module) {
            let slot = *index.entry(declaration.name.clone()).or_insert_with(|| {
                definitions.push(VersionedDefinition {
                    name: declaration.name.clone(),
                    versions: Vec::new(),
                });
                definitions.len() - 1
            });
            definitions[slot]
                .versions
                .push((version.clone(), declaration));
        }
    }

    definitions
}

/// Field shapes of one definition mapped to the versions exhibiting them.
///
/// Shapes compare structurally (kind, name and qualifier) and are kept in
/// first-seen order.
#[derive(Debug, Clone, Default)]
pub struct FieldVersionMap {
    entries: Vec<(Field, VersionSet)>,
    index: HashMap<Field, usize>,
}

impl FieldVersionMap {
    pub fn from_definition(definition: &VersionedDefinition) -> Self {
        let mut map = Self::default();
        for (version, declaration) in &definition.versions {
            for field in &declaration.fields {
                map.insert(field, version);
            }
        }
        map
    }

    fn insert(&mut self, field: &Field, version: &Version) {
        let slot = match self.index.get(field) {
            Some(&slot) => slot,
            None => {
                self.entries.push((field.clone(), VersionSet::new()));
                self.index.insert(field.clone(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        self.entries[slot].1.insert(version.clone());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First-seen rank of a field shape.
    pub fn position(&self, field: &Field) -> Option<usize> {
        self.index.get(field).copied()
    }

    pub fn get(&self, position: usize) -> Option<(&Field, &VersionSet)> {
        self.entries
            .get(position)
            .map(|(field, versions)| (field, versions))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Field, &VersionSet)> {
        self.entries.iter().map(|(field, versions)| (field, versions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(version: u32, fields: Vec<Field>) -> (Version, Module) {
        (
            Version::from(version),
            Module::new("M").with_type(Type::product("point", Product::new(fields))),
        )
    }

    #[test]
    fn test_collect_declarations_flattens_sums_and_products() {
        let module = Module::new("M")
            .with_type(Type::sum(
                "expr_context",
                Sum::new(vec![Constructor::new("Load"), Constructor::new("Store")]),
            ))
            .with_type(Type::product(
                "arg",
                Product::new(vec![Field::required("identifier", "arg")])
                    .with_attribute(Field::required("int", "lineno")),
            ));

        let decls = collect_declarations(&module);
        let names: Vec<&str> = decls.iter().map(|decl| decl.name.as_str()).collect();
        assert_eq!(names, vec!["expr_context", "Load", "Store", "arg"]);
        assert_eq!(decls[0].kind, DeclarationKind::Sum);
        assert!(decls[1].fields.is_empty());
        assert_eq!(decls[2].base, Base::Named("expr_context".to_string()));
        assert_eq!(
            decls[3].fields,
            vec![
                Field::required("identifier", "arg"),
                Field::required("int", "lineno")
            ]
        );
    }

    #[test]
    fn test_group_definitions_keeps_first_seen_order() {
        let v1 = (
            Version::from(1),
            Module::new("M").with_type(Type::product("b", Product::default())),
        );
        let v2 = (
            Version::from(2),
            Module::new("M")
                .with_type(Type::product("a", Product::default()))
                .with_type(Type::product("b", Product::default())),
        );

        let definitions = group_definitions(&[v1, v2]);
        let names: Vec<&str> = definitions.iter().map(|def| def.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(definitions[0].observed().len(), 2);
        assert_eq!(definitions[1].observed().first(), Some(&Version::from(2)));
    }

    #[test]
    fn test_field_version_map_groups_structurally() {
        let snapshots = [
            snapshot(1, vec![Field::required("int", "x"), Field::required("int", "y")]),
            snapshot(2, vec![Field::required("int", "x"), Field::optional("int", "y")]),
        ];
        let definitions = group_definitions(&snapshots);
        let map = FieldVersionMap::from_definition(&definitions[0]);

        assert_eq!(map.len(), 3);
        let (field, versions) = map.get(0).unwrap();
        assert_eq!(field, &Field::required("int", "x"));
        assert_eq!(versions.len(), 2);
        assert_eq!(map.position(&Field::optional("int", "y")), Some(2));
    }
}
