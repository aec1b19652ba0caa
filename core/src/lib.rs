//! Core schema model, visitor framework and multi-version merge engine.
//!
//! This crate defines the foundational types for ASDL-style schemas:
//!
//! - [`Module`]: one schema snapshot, an ordered list of named [`Type`]s.
//! - [`Sum`] / [`Product`]: tagged unions of [`Constructor`]s and fixed
//!   records, both built from typed [`Field`]s.
//! - [`Version`] / [`VersionSet`]: snapshot identifiers compared
//!   lexicographically.
//!
//! Traversal goes through the [`Visitor`] trait: per-kind `visit_*` hooks with
//! a structural fallback that walks children in declaration order.
//!
//! Validation ([`validate_module`]) catches structural errors such as
//! duplicate type, constructor or field names.
//!
//! Merging ([`merge`]) combines version-tagged snapshots into one
//! [`MergedModule`] whose differences are expressed as version-range guards.
//!
//! # Example
//!
//! ```
//! use asdl_schema_core::*;
//!
//! let v38 = Module::new("Python").with_type(Type::product(
//!     "arguments",
//!     Product::new(vec![Field::sequence("arg", "args")]),
//! ));
//! let v39 = Module::new("Python").with_type(Type::product(
//!     "arguments",
//!     Product::new(vec![
//!         Field::sequence("arg", "posonlyargs"),
//!         Field::sequence("arg", "args"),
//!     ]),
//! ));
//! assert!(validate_module(&v39).is_empty());
//!
//! let merged = merge(vec![
//!     ("3.8".parse().unwrap(), v38),
//!     ("3.9".parse().unwrap(), v39),
//! ])
//! .unwrap();
//! let arguments = merged.find("arguments").unwrap();
//! assert_eq!(arguments.body.items().len(), 2);
//! assert_eq!(merged.evaluate(&"3.8".parse().unwrap())[0].fields.len(), 1);
//! ```

mod declaration;
mod guard;
mod merge;
mod types;
mod validate;
mod version;
mod visit;

pub use declaration::{
    Base, Declaration, DeclarationKind, FieldVersionMap, VersionedDefinition,
    collect_declarations, group_definitions,
};
pub use guard::{Condition, GuardNode, GuardTree, classify};
pub use merge::{
    BaseAlias, BaseCase, BaseRef, KindCase, MergeError, MergedDeclaration, MergedItem,
    MergedModule, Rendered, merge,
};
pub use types::*;
pub use validate::{ValidationError, validate_module};
pub use version::{Version, VersionError, VersionSet};
pub use visit::{ModelError, Node, NodeKind, VisitAll, Visitor};
