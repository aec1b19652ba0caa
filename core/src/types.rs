//! Schema model for ASDL-style definitions.
//!
//! A [`Module`] is an ordered list of named [`Type`]s. Each type is either a
//! [`Sum`] (a closed set of [`Constructor`]s sharing a list of attribute
//! fields) or a [`Product`] (a single fixed-field record). The model is built
//! once per schema snapshot and consumed read-only afterwards; every type
//! derives value equality so two snapshots can be compared structurally.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Multiplicity marker of a [`Field`].
///
/// # Examples
///
/// ```
/// use asdl_schema_core::FieldQualifier;
///
/// assert_eq!(FieldQualifier::default(), FieldQualifier::Required);
/// assert_eq!(FieldQualifier::Optional.marker(), "?");
/// assert_eq!(FieldQualifier::Sequence.marker(), "*");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FieldQualifier {
    /// Exactly one value (no marker in source).
    #[default]
    Required,
    /// Zero or one value (`?`).
    Optional,
    /// Zero or more values (`*`).
    Sequence,
}

impl FieldQualifier {
    /// Returns the ASDL source marker for this qualifier.
    pub fn marker(self) -> &'static str {
        match self {
            Self::Required => "",
            Self::Optional => "?",
            Self::Sequence => "*",
        }
    }

    /// Returns the qualifier for an ASDL source marker character.
    pub fn from_marker(marker: char) -> Option<Self> {
        match marker {
            '?' => Some(Self::Optional),
            '*' => Some(Self::Sequence),
            _ => None,
        }
    }
}

/// A single typed field of a constructor, product or attribute list.
///
/// Equality is structural: two fields are the same shape when kind, name and
/// qualifier all match, regardless of where they were declared.
///
/// # Examples
///
/// ```
/// use asdl_schema_core::{Field, FieldQualifier};
///
/// let lineno = Field::required("int", "lineno");
/// let end = Field::optional("int", "end_lineno");
/// assert_eq!(lineno.qualifier, FieldQualifier::Required);
/// assert_eq!(end.to_string(), "int? end_lineno");
/// assert_eq!(lineno, Field::required("int", "lineno"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    /// Element type name (e.g. `expr`, `identifier`).
    pub kind: String,
    /// Declared field identifier.
    pub name: String,
    /// Multiplicity of the field.
    #[serde(default)]
    pub qualifier: FieldQualifier,
}

impl Field {
    /// Creates a field with an explicit qualifier.
    pub fn new(kind: &str, name: &str, qualifier: FieldQualifier) -> Self {
        Self {
            kind: kind.to_string(),
            name: name.to_string(),
            qualifier,
        }
    }

    /// Creates a required field (`kind name`).
    pub fn required(kind: &str, name: &str) -> Self {
        Self::new(kind, name, FieldQualifier::Required)
    }

    /// Creates an optional field (`kind? name`).
    pub fn optional(kind: &str, name: &str) -> Self {
        Self::new(kind, name, FieldQualifier::Optional)
    }

    /// Creates a sequence field (`kind* name`).
    pub fn sequence(kind: &str, name: &str) -> Self {
        Self::new(kind, name, FieldQualifier::Sequence)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{} {}", self.kind, self.qualifier.marker(), self.name)
    }
}

/// A named alternative of a [`Sum`].
///
/// `fields` is `None` when the constructor was written without parentheses.
/// That is semantically the same as an empty field list; use
/// [`Constructor::fields`] to read either form uniformly.
///
/// # Examples
///
/// ```
/// use asdl_schema_core::{Constructor, Field};
///
/// let load = Constructor::new("Load");
/// assert!(load.fields.is_none());
/// assert!(load.fields().is_empty());
///
/// let name = Constructor::with_fields("Name", vec![Field::required("identifier", "id")]);
/// assert_eq!(name.fields().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constructor {
    /// Constructor name, unique within its sum.
    pub name: String,
    /// Constructor fields, `None` when declared without a field list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<Field>>,
}

impl Constructor {
    /// Creates a constructor without a field list.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: None,
        }
    }

    /// Creates a constructor with an explicit field list.
    pub fn with_fields(name: &str, fields: Vec<Field>) -> Self {
        Self {
            name: name.to_string(),
            fields: Some(fields),
        }
    }

    /// Returns the constructor fields, empty when none were declared.
    pub fn fields(&self) -> &[Field] {
        self.fields.as_deref().unwrap_or(&[])
    }
}

/// Tagged union of constructors with shared attribute fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sum {
    /// Alternatives in declaration order.
    pub types: Vec<Constructor>,
    /// Attribute fields shared by every constructor.
    #[serde(default)]
    pub attributes: Vec<Field>,
}

impl Sum {
    /// Creates a sum from its constructors.
    pub fn new(types: Vec<Constructor>) -> Self {
        Self {
            types,
            attributes: Vec::new(),
        }
    }

    /// Adds an attribute field.
    pub fn with_attribute(mut self, field: Field) -> Self {
        self.attributes.push(field);
        self
    }

    /// Returns `true` when no constructor carries fields (an enumeration).
    ///
    /// # Examples
    ///
    /// ```
    /// use asdl_schema_core::{Constructor, Field, Sum};
    ///
    /// let ctx = Sum::new(vec![Constructor::new("Load"), Constructor::new("Store")]);
    /// assert!(ctx.is_simple());
    ///
    /// let expr = Sum::new(vec![
    ///     Constructor::with_fields("Name", vec![Field::required("identifier", "id")]),
    /// ]);
    /// assert!(!expr.is_simple());
    /// ```
    pub fn is_simple(&self) -> bool {
        self.types.iter().all(|constructor| constructor.fields().is_empty())
    }

    /// Finds a constructor by name.
    pub fn find_constructor(&self, name: &str) -> Option<&Constructor> {
        self.types.iter().find(|constructor| constructor.name == name)
    }
}

/// Single fixed-field record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Record fields in declaration order.
    pub fields: Vec<Field>,
    /// Attribute fields, emitted after the record fields.
    #[serde(default)]
    pub attributes: Vec<Field>,
}

impl Product {
    /// Creates a product from its fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self {
            fields,
            attributes: Vec::new(),
        }
    }

    /// Adds an attribute field.
    pub fn with_attribute(mut self, field: Field) -> Self {
        self.attributes.push(field);
        self
    }
}

/// Right-hand side of a type definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeValue {
    Sum(Sum),
    Product(Product),
}

impl TypeValue {
    /// Returns the attribute fields of either variant.
    pub fn attributes(&self) -> &[Field] {
        match self {
            Self::Sum(sum) => &sum.attributes,
            Self::Product(product) => &product.attributes,
        }
    }
}

/// A named type definition (`name = ...`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Type {
    /// Type name, unique within its module.
    pub name: String,
    /// Sum or product body.
    pub value: TypeValue,
}

impl Type {
    /// Creates a sum type definition.
    pub fn sum(name: &str, sum: Sum) -> Self {
        Self {
            name: name.to_string(),
            value: TypeValue::Sum(sum),
        }
    }

    /// Creates a product type definition.
    pub fn product(name: &str, product: Product) -> Self {
        Self {
            name: name.to_string(),
            value: TypeValue::Product(product),
        }
    }
}

/// Top-level container for one schema snapshot.
///
/// # Examples
///
/// ```
/// use asdl_schema_core::*;
///
/// let module = Module::new("Test")
///     .with_type(Type::sum(
///         "operator",
///         Sum::new(vec![Constructor::new("Add"), Constructor::new("Sub")]),
///     ))
///     .with_type(Type::product(
///         "alias",
///         Product::new(vec![
///             Field::required("identifier", "name"),
///             Field::optional("identifier", "asname"),
///         ]),
///     ));
///
/// assert_eq!(module.type_names(), vec!["operator", "alias"]);
/// assert!(module.find_type("alias").is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    /// Module name.
    pub name: String,
    /// Type definitions in declaration order.
    #[serde(default)]
    pub body: Vec<Type>,
}

impl Module {
    /// Creates an empty module.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            body: Vec::new(),
        }
    }

    /// Appends a type definition.
    pub fn with_type(mut self, ty: Type) -> Self {
        self.body.push(ty);
        self
    }

    /// Finds a type definition by name.
    pub fn find_type(&self, name: &str) -> Option<&Type> {
        self.body.iter().find(|ty| ty.name == name)
    }

    /// Returns type names in declaration order.
    pub fn type_names(&self) -> Vec<&str> {
        self.body.iter().map(|ty| ty.name.as_str()).collect()
    }
}
