//! Multi-version schema merging.
//!
//! [`merge`] takes N version-tagged snapshots of one evolving schema and
//! produces a single [`MergedModule`] in which every declaration name appears
//! exactly once. Fields shared by every version a declaration exists in stay
//! unconditional; the rest are wrapped in version-range guards. Declarations
//! that exist only in some versions are wrapped in an existence guard, and
//! declarations whose parent changes between versions get a guarded base
//! alias instead of being duplicated.
//!
//! The pipeline runs in five passes:
//!
//! 1. group declarations by name across snapshots
//! 2. map each structural field shape to the versions exhibiting it
//! 3. classify each shape's version set into a guard condition, relative to
//!    the versions its declaration is observed in
//! 4. resolve base reparenting into a guarded alias, and kind changes into
//!    guarded kind cases
//! 5. flatten redundant guards
//!
//! Any gap in a version run is a hard error; the engine never approximates.
//!
//! # Example
//!
//! ```
//! use asdl_schema_core::*;
//!
//! let snapshot = |fields: Vec<Field>| {
//!     Module::new("M").with_type(Type::product("point", Product::new(fields)))
//! };
//! let merged = merge(vec![
//!     (Version::from(1), snapshot(vec![Field::required("int", "a")])),
//!     (Version::from(2), snapshot(vec![Field::required("int", "a"), Field::required("int", "b")])),
//!     (Version::from(3), snapshot(vec![Field::required("int", "a"), Field::required("int", "b")])),
//! ])
//! .unwrap();
//!
//! let point = merged.find("point").unwrap();
//! assert_eq!(
//!     point.body,
//!     GuardTree::unconditional(vec![
//!         GuardNode::Item(Field::required("int", "a")),
//!         GuardNode::Guard(GuardTree::guarded(
//!             Condition::AtLeast(Version::from(2)),
//!             vec![GuardNode::Item(Field::required("int", "b"))],
//!         )),
//!     ])
//! );
//! ```

use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    Base, Condition, Declaration, DeclarationKind, Field, FieldVersionMap, GuardNode, GuardTree,
    Module, ValidationError, Version, VersionSet, VersionedDefinition, classify,
    group_definitions, validate_module,
};

/// Errors that abort a merge.
///
/// Every failure is a structural defect of the input snapshots; no partial
/// result is ever produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("no schema snapshots to merge")]
    NoSnapshots,
    #[error("more than one snapshot tagged with version {0}")]
    DuplicateVersion(Version),
    #[error("snapshot {version} is invalid: {}", join_errors(.errors))]
    InvalidSnapshot {
        version: Version,
        errors: Vec<ValidationError>,
    },
    /// A declaration or field shape disappears and later reappears.
    #[error("{name}: {item} is present in versions {versions}, which is not a contiguous run of {observed}")]
    NonContiguousVersionRange {
        name: String,
        item: String,
        versions: VersionSet,
        observed: VersionSet,
    },
    /// A declaration's parent switches away and later switches back.
    #[error("{name}: base {base} is used in versions {versions}, which is not a contiguous run")]
    AmbiguousBaseReparenting {
        name: String,
        base: String,
        versions: VersionSet,
    },
    /// Two versions order the same fields incompatibly.
    #[error("{name}: field order cannot be reconciled across versions {versions}")]
    ConflictingFieldOrder { name: String, versions: VersionSet },
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// One arm of a base alias: the parent in effect while `condition` holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaseCase {
    pub condition: Condition,
    pub base: Base,
}

/// Synthesized `_{Name}Base` declaration selecting a parent per version range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaseAlias {
    pub name: String,
    /// Cases in first-seen order.
    pub cases: Vec<BaseCase>,
}

impl BaseAlias {
    /// Returns the base in effect at `version`.
    pub fn resolve(&self, version: &Version) -> Option<&Base> {
        self.cases
            .iter()
            .find(|case| case.condition.contains(version))
            .map(|case| &case.base)
    }
}

/// Kind of a merged declaration while `condition` holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindCase {
    pub condition: Condition,
    pub kind: DeclarationKind,
}

/// Parent reference of a merged declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseRef {
    /// Same parent in every observed version.
    Fixed(Base),
    /// Parent selected by the named [`BaseAlias`].
    Alias(String),
}

/// One declaration of the merged namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedDeclaration {
    pub name: String,
    /// Kind per version range, relative to `versions`; a single
    /// unconditional case unless the kind changes.
    pub kinds: Vec<KindCase>,
    pub base: BaseRef,
    /// Versions the declaration is defined in.
    pub versions: VersionSet,
    /// Existence range relative to the merged module's versions.
    pub existence: Condition,
    /// Fields, guarded relative to `versions`.
    pub body: GuardTree<Field>,
}

impl MergedDeclaration {
    /// Returns the kind in effect at `version`.
    pub fn kind_at(&self, version: &Version) -> Option<DeclarationKind> {
        self.kinds
            .iter()
            .find(|case| case.condition.contains(version))
            .map(|case| case.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MergedItem {
    Alias(BaseAlias),
    Declaration(MergedDeclaration),
}

/// Item of a rendered module tree; see [`MergedModule::render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered<'m, R> {
    Alias(&'m BaseAlias),
    Declaration(R),
}

/// Result of merging versioned snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedModule {
    /// Module name at the latest version.
    pub name: String,
    /// Every input version.
    pub versions: VersionSet,
    pub body: GuardTree<MergedItem>,
}

impl MergedModule {
    /// Merged declarations in output order.
    pub fn declarations(&self) -> Vec<&MergedDeclaration> {
        self.body
            .items()
            .into_iter()
            .filter_map(|item| match item {
                MergedItem::Declaration(declaration) => Some(declaration),
                MergedItem::Alias(_) => None,
            })
            .collect()
    }

    pub fn find(&self, name: &str) -> Option<&MergedDeclaration> {
        self.declarations()
            .into_iter()
            .find(|declaration| declaration.name == name)
    }

    /// Finds a synthesized base alias by its own name.
    pub fn alias(&self, name: &str) -> Option<&BaseAlias> {
        self.body.items().into_iter().find_map(|item| match item {
            MergedItem::Alias(alias) if alias.name == name => Some(alias),
            _ => None,
        })
    }

    /// Renders the module through a per-declaration callback.
    ///
    /// `render` is invoked exactly once per merged declaration, in output
    /// order, with the declaration name, its parent reference and its
    /// guarded field tree. The returned tree keeps the module-level guard
    /// structure and the base aliases, so a target emitter only has to
    /// translate conditions and aliases into its own syntax.
    pub fn render<'m, R, F>(&'m self, mut render: F) -> GuardTree<Rendered<'m, R>>
    where
        F: FnMut(&'m str, &'m BaseRef, &'m GuardTree<Field>) -> R,
    {
        self.body.map(&mut |item| match item {
            MergedItem::Alias(alias) => Rendered::Alias(alias),
            MergedItem::Declaration(declaration) => Rendered::Declaration(render(
                declaration.name.as_str(),
                &declaration.base,
                &declaration.body,
            )),
        })
    }

    /// Returns the flat declarations visible at `version`, aliases resolved.
    pub fn evaluate(&self, version: &Version) -> Vec<Declaration> {
        let visible = self.body.evaluate(version);
        let resolve_alias = |name: &str| {
            visible.iter().find_map(|item| match item {
                MergedItem::Alias(alias) if alias.name == name => alias.resolve(version),
                _ => None,
            })
        };

        let mut declarations = Vec::new();
        for item in &visible {
            let MergedItem::Declaration(declaration) = item else {
                continue;
            };
            let Some(kind) = declaration.kind_at(version) else {
                continue;
            };
            let base = match &declaration.base {
                BaseRef::Fixed(base) => base.clone(),
                BaseRef::Alias(alias) => resolve_alias(alias.as_str())
                    .cloned()
                    .unwrap_or(Base::Root),
            };
            declarations.push(Declaration {
                name: declaration.name.clone(),
                kind,
                base,
                fields: declaration.body.evaluate(version).into_iter().cloned().collect(),
            });
        }
        declarations
    }
}

/// Merges version-tagged snapshots into one guarded module.
///
/// Input order does not matter; snapshots are sorted by version first.
/// Every snapshot is validated before merging.
pub fn merge<I>(snapshots: I) -> Result<MergedModule, MergeError>
where
    I: IntoIterator<Item = (Version, Module)>,
{
    let mut snapshots: Vec<(Version, Module)> = snapshots.into_iter().collect();
    snapshots.sort_by(|a, b| a.0.cmp(&b.0));

    let Some((_, latest)) = snapshots.last() else {
        return Err(MergeError::NoSnapshots);
    };
    let name = latest.name.clone();

    for pair in snapshots.windows(2) {
        if pair[0].0 == pair[1].0 {
            return Err(MergeError::DuplicateVersion(pair[1].0.clone()));
        }
    }
    for (version, module) in &snapshots {
        let errors = validate_module(module);
        if !errors.is_empty() {
            return Err(MergeError::InvalidSnapshot {
                version: version.clone(),
                errors,
            });
        }
    }

    let versions: VersionSet = snapshots.iter().map(|(version, _)| version.clone()).collect();
    let definitions = group_definitions(&snapshots);

    let mut body = Vec::new();
    for definition in &definitions {
        body.extend(merge_definition(definition, &versions)?);
    }
    let body = GuardTree::unconditional(body).flatten();

    info!(
        module = %name,
        versions = %versions,
        declarations = definitions.len(),
        "Merged schema snapshots"
    );
    Ok(MergedModule {
        name,
        versions,
        body,
    })
}

/// Merges one declaration name into `[alias?, declaration]`, wrapped in its
/// existence guard.
fn merge_definition(
    definition: &VersionedDefinition,
    global: &VersionSet,
) -> Result<Vec<GuardNode<MergedItem>>, MergeError> {
    if definition.latest().is_none() {
        return Ok(Vec::new());
    }
    let observed = definition.observed();
    let existence =
        classify(&observed, global).ok_or_else(|| MergeError::NonContiguousVersionRange {
            name: definition.name.clone(),
            item: "declaration".to_string(),
            versions: observed.clone(),
            observed: global.clone(),
        })?;

    let fields = FieldVersionMap::from_definition(definition);
    let mut field_nodes = Vec::with_capacity(fields.len());
    for position in order_fields(definition, &fields)? {
        let Some((field, versions)) = fields.get(position) else {
            continue;
        };
        // Relative to `observed`, so a field guard never equals `existence`.
        let condition =
            classify(versions, &observed).ok_or_else(|| MergeError::NonContiguousVersionRange {
                name: definition.name.clone(),
                item: format!("field `{field}`"),
                versions: versions.clone(),
                observed: observed.clone(),
            })?;
        let node = GuardNode::Item(field.clone());
        field_nodes.push(if condition.is_always() {
            node
        } else {
            GuardNode::Guard(GuardTree::guarded(condition, vec![node]))
        });
    }
    let body = GuardTree::unconditional(field_nodes).flatten();

    let kinds = resolve_kinds(definition, &observed)?;
    let (base, alias) = resolve_base(definition, &observed)?;
    debug!(
        name = %definition.name,
        existence = %existence,
        observed = %observed,
        reparented = alias.is_some(),
        kinds = kinds.len(),
        "Merged declaration"
    );

    let declaration = MergedDeclaration {
        name: definition.name.clone(),
        kinds,
        base,
        versions: observed,
        existence: existence.clone(),
        body,
    };
    let mut items = Vec::with_capacity(2);
    if let Some(alias) = alias {
        items.push(GuardNode::Item(MergedItem::Alias(alias)));
    }
    items.push(GuardNode::Item(MergedItem::Declaration(declaration)));

    Ok(if existence.is_always() {
        items
    } else {
        vec![GuardNode::Guard(GuardTree::guarded(existence, items))]
    })
}

/// Orders field shapes so that every version's own order is a subsequence.
///
/// A stable topological sort over the "immediately follows" edges of every
/// version, breaking ties by first-seen rank.
fn order_fields(
    definition: &VersionedDefinition,
    fields: &FieldVersionMap,
) -> Result<Vec<usize>, MergeError> {
    let count = fields.len();
    let mut successors: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); count];
    let mut indegree = vec![0usize; count];

    for (_, declaration) in &definition.versions {
        let positions: Vec<usize> = declaration
            .fields
            .iter()
            .filter_map(|field| fields.position(field))
            .collect();
        for pair in positions.windows(2) {
            if successors[pair[0]].insert(pair[1]) {
                indegree[pair[1]] += 1;
            }
        }
    }

    let mut ready: BTreeSet<usize> = (0..count).filter(|&i| indegree[i] == 0).collect();
    let mut order = Vec::with_capacity(count);
    while let Some(next) = ready.pop_first() {
        order.push(next);
        for &successor in &successors[next] {
            indegree[successor] -= 1;
            if indegree[successor] == 0 {
                ready.insert(successor);
            }
        }
    }

    if order.len() < count {
        let versions = (0..count)
            .filter(|&i| indegree[i] > 0)
            .filter_map(|i| fields.get(i))
            .flat_map(|(_, versions)| versions.iter().cloned())
            .collect();
        return Err(MergeError::ConflictingFieldOrder {
            name: definition.name.clone(),
            versions,
        });
    }
    Ok(order)
}

/// Splits the declaration's kind into one case per contiguous version run.
fn resolve_kinds(
    definition: &VersionedDefinition,
    observed: &VersionSet,
) -> Result<Vec<KindCase>, MergeError> {
    let mut runs: Vec<(DeclarationKind, VersionSet)> = Vec::new();
    for (version, declaration) in &definition.versions {
        match runs.iter_mut().find(|(kind, _)| *kind == declaration.kind) {
            Some((_, versions)) => {
                versions.insert(version.clone());
            }
            None => runs.push((declaration.kind, [version.clone()].into_iter().collect())),
        }
    }

    let mut cases = Vec::with_capacity(runs.len());
    for (kind, versions) in runs {
        let condition =
            classify(&versions, observed).ok_or_else(|| MergeError::NonContiguousVersionRange {
                name: definition.name.clone(),
                item: format!("kind {kind}"),
                versions: versions.clone(),
                observed: observed.clone(),
            })?;
        cases.push(KindCase { condition, kind });
    }
    Ok(cases)
}

/// Returns the declaration's parent reference, synthesizing a base alias
/// when the parent differs between observed versions.
fn resolve_base(
    definition: &VersionedDefinition,
    observed: &VersionSet,
) -> Result<(BaseRef, Option<BaseAlias>), MergeError> {
    let mut bases: Vec<(&Base, VersionSet)> = Vec::new();
    for (version, declaration) in &definition.versions {
        match bases.iter_mut().find(|(base, _)| **base == declaration.base) {
            Some((_, versions)) => {
                versions.insert(version.clone());
            }
            None => bases.push((&declaration.base, [version.clone()].into_iter().collect())),
        }
    }

    if let [(base, _)] = bases.as_slice() {
        return Ok((BaseRef::Fixed((*base).clone()), None));
    }

    let mut cases = Vec::with_capacity(bases.len());
    for (base, versions) in bases {
        let condition = classify(&versions, observed).ok_or_else(|| {
            MergeError::AmbiguousBaseReparenting {
                name: definition.name.clone(),
                base: base.to_string(),
                versions: versions.clone(),
            }
        })?;
        cases.push(BaseCase {
            condition,
            base: base.clone(),
        });
    }

    let alias = BaseAlias {
        name: format!("_{}Base", definition.name),
        cases,
    };
    debug!(name = %definition.name, alias = %alias.name, "Synthesized base alias");
    Ok((BaseRef::Alias(alias.name.clone()), Some(alias)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Constructor, Product, Sum, Type, collect_declarations};

    fn product(fields: Vec<Field>) -> Module {
        Module::new("M").with_type(Type::product("node", Product::new(fields)))
    }

    fn int(name: &str) -> Field {
        Field::required("int", name)
    }

    fn versioned(modules: Vec<Module>) -> Vec<(Version, Module)> {
        modules
            .into_iter()
            .enumerate()
            .map(|(i, module)| (Version::from(i as u32 + 1), module))
            .collect()
    }

    /// Asserts that evaluating `merged` at each input version reproduces
    /// that snapshot's declarations.
    fn assert_covers(merged: &MergedModule, snapshots: &[(Version, Module)]) {
        for (version, module) in snapshots {
            let expected = collect_declarations(module);
            let actual = merged.evaluate(version);
            assert_eq!(actual.len(), expected.len(), "declaration count at {version}");
            for declaration in &expected {
                let found = actual
                    .iter()
                    .find(|candidate| candidate.name == declaration.name)
                    .unwrap_or_else(|| panic!("{} missing at {version}", declaration.name));
                assert_eq!(found.fields, declaration.fields, "{} at {version}", declaration.name);
                assert_eq!(found.base, declaration.base, "{} at {version}", declaration.name);
                assert_eq!(found.kind, declaration.kind, "{} at {version}", declaration.name);
            }
        }
    }

    #[test]
    fn test_single_version_merge_is_identity() {
        let module = Module::new("M")
            .with_type(Type::sum(
                "expr",
                Sum::new(vec![
                    Constructor::with_fields("Name", vec![Field::required("identifier", "id")]),
                    Constructor::new("Ellipsis"),
                ])
                .with_attribute(int("lineno")),
            ))
            .with_type(Type::product("alias", Product::new(vec![Field::optional("identifier", "asname")])));

        let merged = merge(vec![(Version::from([3, 8]), module.clone())]).unwrap();
        assert!(merged.body.condition.is_always());
        assert!(merged
            .body
            .body
            .iter()
            .all(|node| matches!(node, GuardNode::Item(MergedItem::Declaration(_)))));
        for declaration in merged.declarations() {
            assert!(declaration.body.body.iter().all(|node| matches!(node, GuardNode::Item(_))));
            assert!(matches!(declaration.base, BaseRef::Fixed(_)));
        }
        assert_eq!(merged.evaluate(&Version::from([3, 8])), collect_declarations(&module));
    }

    #[test]
    fn test_guard_minimality() {
        let snapshots = versioned(vec![
            product(vec![int("a")]),
            product(vec![int("a"), int("b")]),
            product(vec![int("a"), int("b")]),
        ]);
        let merged = merge(snapshots.clone()).unwrap();

        let node = merged.find("node").unwrap();
        assert_eq!(node.existence, Condition::Always);
        assert_eq!(
            node.body,
            GuardTree::unconditional(vec![
                GuardNode::Item(int("a")),
                GuardNode::Guard(GuardTree::guarded(
                    Condition::AtLeast(Version::from(2)),
                    vec![GuardNode::Item(int("b"))]
                )),
            ])
        );
        assert_covers(&merged, &snapshots);
    }

    #[test]
    fn test_merge_is_independent_of_input_order() {
        let snapshots = versioned(vec![
            product(vec![int("a")]),
            product(vec![int("a"), int("b")]),
            product(vec![int("b"), int("c")]),
        ]);
        let forward = merge(snapshots.clone()).unwrap();
        let mut reversed = snapshots.clone();
        reversed.reverse();
        let mut rotated = snapshots.clone();
        rotated.rotate_left(1);

        assert_eq!(merge(reversed).unwrap(), forward);
        assert_eq!(merge(rotated).unwrap(), forward);
        assert_covers(&forward, &snapshots);
    }

    #[test]
    fn test_reappearing_field_is_rejected() {
        let snapshots = versioned(vec![
            product(vec![int("a"), int("b")]),
            product(vec![int("a")]),
            product(vec![int("a"), int("b")]),
        ]);
        let err = merge(snapshots).unwrap_err();
        match err {
            MergeError::NonContiguousVersionRange { name, versions, .. } => {
                assert_eq!(name, "node");
                assert_eq!(versions.to_string(), "{1, 3}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_reappearing_declaration_is_rejected() {
        let with_extra = Module::new("M")
            .with_type(Type::product("node", Product::default()))
            .with_type(Type::product("extra", Product::default()));
        let snapshots = versioned(vec![with_extra.clone(), product(vec![]), with_extra]);
        assert!(matches!(
            merge(snapshots),
            Err(MergeError::NonContiguousVersionRange { name, item, .. })
                if name == "extra" && item == "declaration"
        ));
    }

    #[test]
    fn test_declarations_present_in_some_versions_are_guarded() {
        let snapshots = versioned(vec![
            product(vec![int("a")]),
            Module::new("M")
                .with_type(Type::product("node", Product::new(vec![int("a")])))
                .with_type(Type::product("late", Product::new(vec![int("x")]))),
        ]);
        let merged = merge(snapshots.clone()).unwrap();

        assert_eq!(merged.body.body.len(), 2);
        let GuardNode::Guard(late) = &merged.body.body[1] else {
            panic!("expected a guarded declaration");
        };
        assert_eq!(late.condition, Condition::AtLeast(Version::from(2)));
        let late = merged.find("late").unwrap();
        // fields are guarded relative to the declaration's own versions
        assert_eq!(late.body, GuardTree::unconditional(vec![GuardNode::Item(int("x"))]));
        assert_covers(&merged, &snapshots);
    }

    #[test]
    fn test_adjacent_declarations_share_existence_guard() {
        let module = |extra: bool| {
            let mut module = product(vec![]);
            if extra {
                module = module
                    .with_type(Type::product("x", Product::default()))
                    .with_type(Type::product("y", Product::default()));
            }
            module
        };
        let merged = merge(versioned(vec![module(true), module(true), module(false)])).unwrap();

        assert_eq!(merged.body.body.len(), 2);
        let GuardNode::Guard(guard) = &merged.body.body[1] else {
            panic!("expected one shared guard");
        };
        assert_eq!(guard.condition, Condition::AtMost(Version::from(2)));
        assert_eq!(guard.body.len(), 2);
    }

    #[test]
    fn test_base_reparenting_synthesizes_one_alias() {
        let v1 = Module::new("M").with_type(Type::sum(
            "Old",
            Sum::new(vec![Constructor::new("C"), Constructor::new("D")]),
        ));
        let v2 = Module::new("M")
            .with_type(Type::sum("Old", Sum::new(vec![Constructor::new("D")])))
            .with_type(Type::sum("New", Sum::new(vec![Constructor::new("C")])));
        let snapshots = versioned(vec![v1, v2.clone(), v2]);
        let merged = merge(snapshots.clone()).unwrap();

        let constructors: Vec<&MergedDeclaration> = merged
            .declarations()
            .into_iter()
            .filter(|declaration| declaration.name == "C")
            .collect();
        assert_eq!(constructors.len(), 1);
        assert_eq!(constructors[0].base, BaseRef::Alias("_CBase".to_string()));

        let alias = merged.alias("_CBase").unwrap();
        assert_eq!(
            alias.cases,
            vec![
                BaseCase {
                    condition: Condition::AtMost(Version::from(1)),
                    base: Base::Named("Old".to_string()),
                },
                BaseCase {
                    condition: Condition::AtLeast(Version::from(2)),
                    base: Base::Named("New".to_string()),
                },
            ]
        );
        assert_eq!(alias.resolve(&Version::from(3)), Some(&Base::Named("New".to_string())));
        assert_covers(&merged, &snapshots);
    }

    #[test]
    fn test_base_switching_back_is_ambiguous() {
        let under = |parent: &str| {
            Module::new("M")
                .with_type(Type::sum(parent, Sum::new(vec![Constructor::new("C")])))
                .with_type(Type::sum(
                    if parent == "A" { "B" } else { "A" },
                    Sum::new(vec![Constructor::new("Other")]),
                ))
        };
        let err = merge(versioned(vec![under("A"), under("B"), under("A")])).unwrap_err();
        assert!(matches!(
            err,
            MergeError::AmbiguousBaseReparenting { ref name, ref base, .. } if name == "C" && base == "A"
        ));
    }

    #[test]
    fn test_field_order_is_refined_across_versions() {
        let snapshots = versioned(vec![
            product(vec![int("a"), int("c")]),
            product(vec![int("a"), int("b"), int("c")]),
        ]);
        let merged = merge(snapshots.clone()).unwrap();
        let order: Vec<&str> = merged
            .find("node")
            .unwrap()
            .body
            .items()
            .into_iter()
            .map(|field| field.name.as_str())
            .collect();
        assert_eq!(order, vec!["a", "b", "c"]);
        assert_covers(&merged, &snapshots);
    }

    #[test]
    fn test_incompatible_field_order_is_rejected() {
        let snapshots = versioned(vec![
            product(vec![int("a"), int("b")]),
            product(vec![int("b"), int("a")]),
        ]);
        assert!(matches!(
            merge(snapshots),
            Err(MergeError::ConflictingFieldOrder { name, .. }) if name == "node"
        ));
    }

    #[test]
    fn test_input_defects_are_reported() {
        assert_eq!(merge(Vec::new()), Err(MergeError::NoSnapshots));
        assert_eq!(
            merge(vec![(Version::from(1), product(vec![])), (Version::from(1), product(vec![]))]),
            Err(MergeError::DuplicateVersion(Version::from(1)))
        );
        let invalid = merge(vec![(Version::from(1), product(vec![int("a"), int("a")]))]).unwrap_err();
        assert!(matches!(invalid, MergeError::InvalidSnapshot { .. }));
        assert!(invalid.to_string().contains("duplicate field a in node"));
    }

    #[test]
    fn test_changed_qualifier_splits_into_guarded_shapes() {
        let snapshots = versioned(vec![
            product(vec![int("end")]),
            product(vec![Field::optional("int", "end")]),
        ]);
        let merged = merge(snapshots.clone()).unwrap();
        let node = merged.find("node").unwrap();
        assert_eq!(node.body.body.len(), 2);
        assert_eq!(node.body.evaluate(&Version::from(2)), vec![&Field::optional("int", "end")]);
        assert_covers(&merged, &snapshots);
    }

    #[test]
    fn test_render_invokes_callback_once_per_declaration() {
        let snapshots = versioned(vec![
            product(vec![int("a")]),
            Module::new("M")
                .with_type(Type::product("node", Product::new(vec![int("a")])))
                .with_type(Type::product("late", Product::default())),
        ]);
        let merged = merge(snapshots).unwrap();

        let mut calls = Vec::new();
        let rendered = merged.render(|name, _base, body| {
            calls.push(name.to_string());
            body.items().len()
        });
        assert_eq!(calls, vec!["node", "late"]);
        assert_eq!(rendered.items(), vec![&Rendered::Declaration(1), &Rendered::Declaration(0)]);
        assert!(matches!(&rendered.body[1], GuardNode::Guard(_)));
    }

    #[test]
    fn test_kind_change_is_guarded_per_version() {
        let v1 = Module::new("M").with_type(Type::product("x", Product::new(vec![int("a")])));
        let v2 = Module::new("M").with_type(Type::sum("x", Sum::new(vec![Constructor::new("C")])));
        let snapshots = versioned(vec![v1, v2]);
        let merged = merge(snapshots.clone()).unwrap();

        let x = merged.find("x").unwrap();
        assert_eq!(
            x.kinds,
            vec![
                KindCase {
                    condition: Condition::AtMost(Version::from(1)),
                    kind: DeclarationKind::Product,
                },
                KindCase {
                    condition: Condition::AtLeast(Version::from(2)),
                    kind: DeclarationKind::Sum,
                },
            ]
        );
        assert_eq!(x.kind_at(&Version::from(1)), Some(DeclarationKind::Product));
        assert_eq!(merged.evaluate(&Version::from(1)), collect_declarations(&snapshots[0].1));
        assert_covers(&merged, &snapshots);
    }

    #[test]
    fn test_stable_kind_is_a_single_unconditional_case() {
        let snapshots = versioned(vec![product(vec![int("a")]), product(vec![int("a"), int("b")])]);
        let merged = merge(snapshots).unwrap();
        assert_eq!(
            merged.find("node").unwrap().kinds,
            vec![KindCase {
                condition: Condition::Always,
                kind: DeclarationKind::Product,
            }]
        );
    }

    #[test]
    fn test_kind_switching_back_is_rejected() {
        let as_product = Module::new("M").with_type(Type::product("x", Product::default()));
        let as_sum =
            Module::new("M").with_type(Type::sum("x", Sum::new(vec![Constructor::new("C")])));
        let err = merge(versioned(vec![as_product.clone(), as_sum, as_product])).unwrap_err();
        assert!(matches!(
            err,
            MergeError::NonContiguousVersionRange { ref name, ref item, .. }
                if name == "x" && item == "kind product"
        ));
    }

    #[test]
    fn test_late_declaration_fields_never_repeat_existence_guard() {
        let late = |fields: Vec<Field>| {
            product(vec![int("a")]).with_type(Type::product("late", Product::new(fields)))
        };
        let snapshots = vec![
            (Version::from(1), product(vec![int("a")])),
            (Version::from(2), late(vec![int("x")])),
            (Version::from(3), late(vec![int("x"), int("y")])),
            (Version::from(4), late(vec![int("x"), int("y")])),
        ];
        let merged = merge(snapshots.clone()).unwrap();

        let GuardNode::Guard(existence) = &merged.body.body[1] else {
            panic!("expected a guarded declaration");
        };
        assert_eq!(existence.condition, Condition::AtLeast(Version::from(2)));
        let late = merged.find("late").unwrap();
        assert_eq!(late.existence, existence.condition);
        assert_eq!(
            late.body,
            GuardTree::unconditional(vec![
                GuardNode::Item(int("x")),
                GuardNode::Guard(GuardTree::guarded(
                    Condition::AtLeast(Version::from(3)),
                    vec![GuardNode::Item(int("y"))]
                )),
            ])
        );
        assert_covers(&merged, &snapshots);
    }

    #[test]
    fn test_constructor_shared_between_sums_blocks_merge() {
        let module = Module::new("M")
            .with_type(Type::sum("a", Sum::new(vec![Constructor::new("C")])))
            .with_type(Type::sum("b", Sum::new(vec![Constructor::new("C")])));
        let err = merge(vec![(Version::from(1), module)]).unwrap_err();
        assert_eq!(
            err,
            MergeError::InvalidSnapshot {
                version: Version::from(1),
                errors: vec![ValidationError::DuplicateDeclaration("C".to_string())],
            }
        );
    }
}
