//! Visitor dispatch over the schema model.
//!
//! Every model node is reachable through the closed [`Node`] enum. A
//! [`Visitor`] overrides the `visit_*` handler for the kinds it cares about;
//! every handler it leaves alone falls back to [`Visitor::generic_visit`],
//! which dispatches each child in declaration order and discards the child
//! results.
//!
//! Handlers receive an extra context argument (`Self::Context`) so a visitor
//! can thread information such as the enclosing type name down the tree
//! without storing it in mutable state.
//!
//! [`Visitor::visit_all`] is lazy: it returns an iterator that dispatches the
//! next node only when the caller pulls the next result.
//!
//! # Example
//!
//! ```
//! use asdl_schema_core::*;
//!
//! #[derive(Default)]
//! struct FieldCounter {
//!     fields: usize,
//! }
//!
//! impl<'ast> Visitor<'ast> for FieldCounter {
//!     type Output = ();
//!     type Context = ();
//!
//!     fn visit_field(&mut self, _field: &'ast Field, _cx: &()) {
//!         self.fields += 1;
//!     }
//! }
//!
//! let module = Module::new("M").with_type(Type::product(
//!     "pair",
//!     Product::new(vec![Field::required("int", "a"), Field::required("int", "b")]),
//! ));
//! let mut counter = FieldCounter::default();
//! counter.visit_module(&module, &());
//! assert_eq!(counter.fields, 2);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Constructor, Field, Module, Product, Sum, Type, TypeValue};

/// Errors raised when a node kind is selected dynamically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// The name does not denote any model node kind.
    #[error("unknown node kind: {0:?} (expected one of module, type, sum, product, constructor, field)")]
    UnknownNodeKind(String),
}

/// Runtime kind tag of a model node.
///
/// # Examples
///
/// ```
/// use asdl_schema_core::{ModelError, NodeKind};
///
/// assert_eq!("Constructor".parse::<NodeKind>(), Ok(NodeKind::Constructor));
/// assert_eq!(
///     "Enum".parse::<NodeKind>(),
///     Err(ModelError::UnknownNodeKind("Enum".to_string()))
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Module,
    Type,
    Sum,
    Product,
    Constructor,
    Field,
}

impl NodeKind {
    pub const ALL: [NodeKind; 6] = [
        Self::Module,
        Self::Type,
        Self::Sum,
        Self::Product,
        Self::Constructor,
        Self::Field,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Type => "type",
            Self::Sum => "sum",
            Self::Product => "product",
            Self::Constructor => "constructor",
            Self::Field => "field",
        }
    }
}

impl FromStr for NodeKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ModelError::UnknownNodeKind(s.to_string()))
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Borrowed reference to any model node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node<'ast> {
    Module(&'ast Module),
    Type(&'ast Type),
    Sum(&'ast Sum),
    Product(&'ast Product),
    Constructor(&'ast Constructor),
    Field(&'ast Field),
}

impl<'ast> Node<'ast> {
    /// Returns the kind tag of this node.
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Module(_) => NodeKind::Module,
            Self::Type(_) => NodeKind::Type,
            Self::Sum(_) => NodeKind::Sum,
            Self::Product(_) => NodeKind::Product,
            Self::Constructor(_) => NodeKind::Constructor,
            Self::Field(_) => NodeKind::Field,
        }
    }

    /// Returns the declared name, if this kind of node has one.
    pub fn name(&self) -> Option<&'ast str> {
        match self {
            Self::Module(module) => Some(&module.name),
            Self::Type(ty) => Some(&ty.name),
            Self::Constructor(constructor) => Some(&constructor.name),
            Self::Field(field) => Some(&field.name),
            Self::Sum(_) | Self::Product(_) => None,
        }
    }

    /// Returns the child nodes in declaration order.
    ///
    /// Scalar members (names, kinds, qualifiers) are not nodes and are
    /// skipped; sequences are expanded element-wise.
    pub fn children(&self) -> Vec<Node<'ast>> {
        match *self {
            Self::Module(module) => module.body.iter().map(Node::from).collect(),
            Self::Type(ty) => vec![Node::from(&ty.value)],
            Self::Sum(sum) => sum
                .types
                .iter()
                .map(Node::from)
                .chain(sum.attributes.iter().map(Node::from))
                .collect(),
            Self::Product(product) => product
                .fields
                .iter()
                .chain(&product.attributes)
                .map(Node::from)
                .collect(),
            Self::Constructor(constructor) => constructor.fields().iter().map(Node::from).collect(),
            Self::Field(_) => Vec::new(),
        }
    }
}

impl<'ast> From<&'ast Module> for Node<'ast> {
    fn from(node: &'ast Module) -> Self {
        Self::Module(node)
    }
}

impl<'ast> From<&'ast Type> for Node<'ast> {
    fn from(node: &'ast Type) -> Self {
        Self::Type(node)
    }
}

impl<'ast> From<&'ast TypeValue> for Node<'ast> {
    fn from(node: &'ast TypeValue) -> Self {
        match node {
            TypeValue::Sum(sum) => Self::Sum(sum),
            TypeValue::Product(product) => Self::Product(product),
        }
    }
}

impl<'ast> From<&'ast Sum> for Node<'ast> {
    fn from(node: &'ast Sum) -> Self {
        Self::Sum(node)
    }
}

impl<'ast> From<&'ast Product> for Node<'ast> {
    fn from(node: &'ast Product) -> Self {
        Self::Product(node)
    }
}

impl<'ast> From<&'ast Constructor> for Node<'ast> {
    fn from(node: &'ast Constructor) -> Self {
        Self::Constructor(node)
    }
}

impl<'ast> From<&'ast Field> for Node<'ast> {
    fn from(node: &'ast Field) -> Self {
        Self::Field(node)
    }
}

/// Schema model visitor.
///
/// Override `visit_*` methods to handle specific node kinds. Anything not
/// overridden is routed to [`generic_visit`](Visitor::generic_visit).
///
/// A visitor may mutate its own state during traversal; the model itself is
/// never mutated. One visitor instance must not be shared between concurrent
/// traversals, but any number of visitors may read the same model.
pub trait Visitor<'ast> {
    /// Value produced for each dispatched node. The fallback returns
    /// `Default::default()`.
    type Output: Default;
    /// Extra argument handed to every handler.
    type Context: ?Sized;

    /// Dispatches `node` to the handler for its kind.
    fn visit(&mut self, node: Node<'ast>, cx: &Self::Context) -> Self::Output {
        match node {
            Node::Module(module) => self.visit_module(module, cx),
            Node::Type(ty) => self.visit_type(ty, cx),
            Node::Sum(sum) => self.visit_sum(sum, cx),
            Node::Product(product) => self.visit_product(product, cx),
            Node::Constructor(constructor) => self.visit_constructor(constructor, cx),
            Node::Field(field) => self.visit_field(field, cx),
        }
    }

    /// Lazily dispatches every node of `nodes`, preserving order.
    fn visit_all<'v, N>(
        &'v mut self,
        nodes: &'ast [N],
        cx: &'v Self::Context,
    ) -> VisitAll<'v, 'ast, Self, N>
    where
        &'ast N: Into<Node<'ast>>,
    {
        VisitAll {
            visitor: self,
            nodes: nodes.iter(),
            cx,
        }
    }

    /// Structural fallback: visits every child, then returns the default output.
    fn generic_visit(&mut self, node: Node<'ast>, cx: &Self::Context) -> Self::Output {
        for child in node.children() {
            self.visit(child, cx);
        }
        Self::Output::default()
    }

    fn visit_module(&mut self, module: &'ast Module, cx: &Self::Context) -> Self::Output {
        self.generic_visit(Node::Module(module), cx)
    }

    fn visit_type(&mut self, ty: &'ast Type, cx: &Self::Context) -> Self::Output {
        self.generic_visit(Node::Type(ty), cx)
    }

    fn visit_sum(&mut self, sum: &'ast Sum, cx: &Self::Context) -> Self::Output {
        self.generic_visit(Node::Sum(sum), cx)
    }

    fn visit_product(&mut self, product: &'ast Product, cx: &Self::Context) -> Self::Output {
        self.generic_visit(Node::Product(product), cx)
    }

    fn visit_constructor(
        &mut self,
        constructor: &'ast Constructor,
        cx: &Self::Context,
    ) -> Self::Output {
        self.generic_visit(Node::Constructor(constructor), cx)
    }

    fn visit_field(&mut self, field: &'ast Field, cx: &Self::Context) -> Self::Output {
        self.generic_visit(Node::Field(field), cx)
    }
}

/// Lazy iterator returned by [`Visitor::visit_all`].
pub struct VisitAll<'v, 'ast, V: Visitor<'ast> + ?Sized, N> {
    visitor: &'v mut V,
    nodes: std::slice::Iter<'ast, N>,
    cx: &'v V::Context,
}

impl<'ast, V, N> Iterator for VisitAll<'_, 'ast, V, N>
where
    V: Visitor<'ast> + ?Sized,
    &'ast N: Into<Node<'ast>>,
{
    type Item = V::Output;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.nodes.next()?;
        Some(self.visitor.visit(node.into(), self.cx))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.nodes.size_hint()
    }
}

impl<'ast, V, N> ExactSizeIterator for VisitAll<'_, 'ast, V, N>
where
    V: Visitor<'ast> + ?Sized,
    &'ast N: Into<Node<'ast>>,
{
}
