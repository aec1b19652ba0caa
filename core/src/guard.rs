//! Version-range predicates and guard trees.
//!
//! A [`Condition`] is the range predicate attached to a guarded block. The
//! merge engine derives it with [`classify`] from the set of versions that
//! exhibit some shape, relative to the set of versions in which the
//! enclosing definition was observed. A [`GuardTree`] pairs a condition with
//! an ordered body of items and nested guards; it is the engine's output
//! representation and what emitters render.

use std::fmt;

use serde::Serialize;

use crate::{Version, VersionSet};

/// Version-range predicate of a guarded block.
///
/// # Examples
///
/// ```
/// use asdl_schema_core::{Condition, Version};
///
/// let cond = Condition::AtLeast(Version::from([3, 8]));
/// assert!(cond.contains(&Version::from([3, 9])));
/// assert!(!cond.contains(&Version::from([3, 7])));
/// assert_eq!(cond.to_string(), "version >= 3.8");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "op", content = "bounds", rename_all = "snake_case")]
pub enum Condition {
    /// Holds at every version.
    Always,
    /// `version >= min`.
    AtLeast(Version),
    /// `version <= max`.
    AtMost(Version),
    /// `min <= version <= max`.
    Between(Version, Version),
}

impl Condition {
    pub fn is_always(&self) -> bool {
        matches!(self, Self::Always)
    }

    /// Returns `true` if `version` satisfies the predicate.
    pub fn contains(&self, version: &Version) -> bool {
        match self {
            Self::Always => true,
            Self::AtLeast(min) => version >= min,
            Self::AtMost(max) => version <= max,
            Self::Between(min, max) => min <= version && version <= max,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => f.write_str("always"),
            Self::AtLeast(min) => write!(f, "version >= {min}"),
            Self::AtMost(max) => write!(f, "version <= {max}"),
            Self::Between(min, max) => write!(f, "{min} <= version <= {max}"),
        }
    }
}

/// Classifies `subset` against the sorted `observed` set.
///
/// Returns `None` when `subset` is empty, not contained in `observed`, or
/// not a single contiguous run of `observed`. Otherwise the narrowest of
/// [`Condition::Always`] (all of `observed`), [`Condition::AtLeast`] (a
/// suffix), [`Condition::AtMost`] (a prefix) or [`Condition::Between`].
///
/// # Examples
///
/// ```
/// use asdl_schema_core::{classify, Condition, Version, VersionSet};
///
/// let set = |vs: &[u32]| vs.iter().copied().map(Version::from).collect::<VersionSet>();
/// let observed = set(&[1, 2, 3, 4]);
///
/// assert_eq!(classify(&set(&[1, 2, 3, 4]), &observed), Some(Condition::Always));
/// assert_eq!(classify(&set(&[3, 4]), &observed), Some(Condition::AtLeast(Version::from(3))));
/// assert_eq!(classify(&set(&[1, 2]), &observed), Some(Condition::AtMost(Version::from(2))));
/// assert_eq!(
///     classify(&set(&[2, 3]), &observed),
///     Some(Condition::Between(Version::from(2), Version::from(3)))
/// );
/// assert_eq!(classify(&set(&[1, 3]), &observed), None);
/// ```
pub fn classify(subset: &VersionSet, observed: &VersionSet) -> Option<Condition> {
    let ranks = subset
        .iter()
        .map(|version| observed.position(version))
        .collect::<Option<Vec<usize>>>()?;
    let (&first, &last) = (ranks.first()?, ranks.last()?);
    if last - first + 1 != ranks.len() {
        return None;
    }

    let reaches_start = first == 0;
    let reaches_end = last + 1 == observed.len();
    let min = subset.first()?.clone();
    let max = subset.last()?.clone();
    Some(match (reaches_start, reaches_end) {
        (true, true) => Condition::Always,
        (false, true) => Condition::AtLeast(min),
        (true, false) => Condition::AtMost(max),
        (false, false) => Condition::Between(min, max),
    })
}

/// One entry of a guard body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardNode<T> {
    Item(T),
    Guard(GuardTree<T>),
}

/// A condition paired with an ordered body of items and nested guards.
///
/// # Examples
///
/// ```
/// use asdl_schema_core::{Condition, GuardNode, GuardTree, Version};
///
/// let tree = GuardTree::unconditional(vec![
///     GuardNode::Item("a"),
///     GuardNode::Guard(GuardTree::guarded(
///         Condition::AtLeast(Version::from(2)),
///         vec![GuardNode::Item("b")],
///     )),
/// ]);
/// assert_eq!(tree.evaluate(&Version::from(1)), vec![&"a"]);
/// assert_eq!(tree.evaluate(&Version::from(2)), vec![&"a", &"b"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardTree<T> {
    pub condition: Condition,
    pub body: Vec<GuardNode<T>>,
}

impl<T> GuardTree<T> {
    /// Creates a tree whose body always applies.
    pub fn unconditional(body: Vec<GuardNode<T>>) -> Self {
        Self::guarded(Condition::Always, body)
    }

    pub fn guarded(condition: Condition, body: Vec<GuardNode<T>>) -> Self {
        Self { condition, body }
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Returns the items visible at `version`, in body order.
    pub fn evaluate(&self, version: &Version) -> Vec<&T> {
        let mut items = Vec::new();
        self.collect_visible(version, &mut items);
        items
    }

    fn collect_visible<'a>(&'a self, version: &Version, items: &mut Vec<&'a T>) {
        if !self.condition.contains(version) {
            return;
        }
        for node in &self.body {
            match node {
                GuardNode::Item(item) => items.push(item),
                GuardNode::Guard(tree) => tree.collect_visible(version, items),
            }
        }
    }

    /// Returns every item regardless of conditions, depth first.
    pub fn items(&self) -> Vec<&T> {
        let mut items = Vec::new();
        let mut stack: Vec<std::slice::Iter<'_, GuardNode<T>>> = vec![self.body.iter()];
        while let Some(level) = stack.last_mut() {
            match level.next() {
                Some(GuardNode::Item(item)) => items.push(item),
                Some(GuardNode::Guard(tree)) => stack.push(tree.body.iter()),
                None => {
                    stack.pop();
                }
            }
        }
        items
    }

    /// Builds a tree of the same shape with every item transformed by `f`.
    pub fn map<'a, U, F>(&'a self, f: &mut F) -> GuardTree<U>
    where
        F: FnMut(&'a T) -> U,
    {
        let body = self
            .body
            .iter()
            .map(|node| match node {
                GuardNode::Item(item) => GuardNode::Item(f(item)),
                GuardNode::Guard(tree) => GuardNode::Guard(tree.map(f)),
            })
            .collect();
        GuardTree::guarded(self.condition.clone(), body)
    }

    /// Normalizes the tree bottom-up into a new tree.
    ///
    /// - a nested guard whose condition equals its enclosing guard's (or is
    ///   [`Condition::Always`]) is replaced by its body, in place
    /// - guards left with an empty body are dropped
    /// - adjacent sibling guards with identical conditions are merged into
    ///   one, keeping body order
    ///
    /// Applied at every depth; flattening a flattened tree is a no-op.
    ///
    /// # Examples
    ///
    /// ```
    /// use asdl_schema_core::{Condition, GuardNode, GuardTree, Version};
    ///
    /// let at_least_2 = Condition::AtLeast(Version::from(2));
    /// let tree = GuardTree::guarded(
    ///     at_least_2.clone(),
    ///     vec![
    ///         GuardNode::Item("a"),
    ///         GuardNode::Guard(GuardTree::guarded(at_least_2.clone(), vec![GuardNode::Item("b")])),
    ///     ],
    /// );
    /// assert_eq!(
    ///     tree.flatten(),
    ///     GuardTree::guarded(at_least_2, vec![GuardNode::Item("a"), GuardNode::Item("b")])
    /// );
    /// ```
    pub fn flatten(self) -> Self {
        let mut body = Vec::with_capacity(self.body.len());
        for node in self.body {
            absorb(&mut body, &self.condition, node);
        }
        Self {
            condition: self.condition,
            body,
        }
    }
}

fn absorb<T>(out: &mut Vec<GuardNode<T>>, enclosing: &Condition, node: GuardNode<T>) {
    match node {
        GuardNode::Item(item) => out.push(GuardNode::Item(item)),
        GuardNode::Guard(tree) => {
            let tree = tree.flatten();
            if tree.is_empty() {
                return;
            }
            if tree.condition.is_always() || tree.condition == *enclosing {
                for child in tree.body {
                    absorb(out, enclosing, child);
                }
            } else {
                push_coalescing(out, GuardNode::Guard(tree));
            }
        }
    }
}

fn push_coalescing<T>(out: &mut Vec<GuardNode<T>>, node: GuardNode<T>) {
    let coalesce = match (&node, out.last()) {
        (GuardNode::Guard(next), Some(GuardNode::Guard(prev))) => prev.condition == next.condition,
        _ => false,
    };
    if !coalesce {
        out.push(node);
        return;
    }
    if let (GuardNode::Guard(next), Some(GuardNode::Guard(prev))) = (node, out.last_mut()) {
        for child in next.body {
            push_coalescing(&mut prev.body, child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(versions: &[u32]) -> VersionSet {
        versions.iter().copied().map(Version::from).collect()
    }

    fn item(name: &'static str) -> GuardNode<&'static str> {
        GuardNode::Item(name)
    }

    fn guard(condition: Condition, body: Vec<GuardNode<&'static str>>) -> GuardNode<&'static str> {
        GuardNode::Guard(GuardTree::guarded(condition, body))
    }

    #[test]
    fn test_classify_rejects_gaps_and_foreign_versions() {
        let observed = set(&[1, 2, 3]);
        assert_eq!(classify(&set(&[1, 3]), &observed), None);
        assert_eq!(classify(&set(&[4]), &observed), None);
        assert_eq!(classify(&VersionSet::new(), &observed), None);
    }

    #[test]
    fn test_classify_is_relative_to_observed_set() {
        // 2 is the first observed version of this definition: a prefix.
        let observed = set(&[2, 3, 5]);
        assert_eq!(
            classify(&set(&[2, 3]), &observed),
            Some(Condition::AtMost(Version::from(3)))
        );
        // 3 and 5 are adjacent within the observed set.
        assert_eq!(
            classify(&set(&[3, 5]), &observed),
            Some(Condition::AtLeast(Version::from(3)))
        );
        assert_eq!(
            classify(&set(&[3]), &observed),
            Some(Condition::Between(Version::from(3), Version::from(3)))
        );
    }

    #[test]
    fn test_flatten_collapses_identical_nested_guards_at_depth() {
        let outer = Condition::AtMost(Version::from(5));
        let inner = Condition::AtLeast(Version::from(2));
        let tree = GuardTree::guarded(
            outer.clone(),
            vec![guard(
                inner.clone(),
                vec![
                    item("a"),
                    guard(inner.clone(), vec![item("b"), guard(inner.clone(), vec![item("c")])]),
                    item("d"),
                ],
            )],
        );

        let flat = tree.flatten();
        assert_eq!(
            flat,
            GuardTree::guarded(
                outer,
                vec![guard(inner, vec![item("a"), item("b"), item("c"), item("d")])]
            )
        );
    }

    #[test]
    fn test_flatten_drops_empty_and_always_guards() {
        let tree = GuardTree::unconditional(vec![
            item("a"),
            guard(Condition::AtLeast(Version::from(2)), vec![]),
            guard(Condition::Always, vec![item("b")]),
        ]);
        assert_eq!(
            tree.flatten(),
            GuardTree::unconditional(vec![item("a"), item("b")])
        );
    }

    #[test]
    fn test_flatten_coalesces_adjacent_siblings() {
        let ge2 = Condition::AtLeast(Version::from(2));
        let le1 = Condition::AtMost(Version::from(1));
        let tree = GuardTree::unconditional(vec![
            guard(ge2.clone(), vec![item("a"), guard(le1.clone(), vec![item("x")])]),
            guard(ge2.clone(), vec![guard(le1.clone(), vec![item("y")]), item("b")]),
            item("c"),
            guard(ge2.clone(), vec![item("d")]),
        ]);

        let flat = tree.clone().flatten();
        assert_eq!(
            flat,
            GuardTree::unconditional(vec![
                guard(
                    ge2.clone(),
                    vec![item("a"), guard(le1, vec![item("x"), item("y")]), item("b")]
                ),
                item("c"),
                guard(ge2, vec![item("d")]),
            ])
        );
        assert_eq!(flat.clone().flatten(), flat);
        for version in [1, 2, 3] {
            let version = Version::from(version);
            assert_eq!(flat.evaluate(&version), tree.evaluate(&version));
        }
    }

    #[test]
    fn test_items_ignores_conditions() {
        let tree = GuardTree::unconditional(vec![
            item("a"),
            guard(Condition::AtMost(Version::from(1)), vec![item("b")]),
            item("c"),
        ]);
        assert_eq!(tree.items(), vec![&"a", &"b", &"c"]);
        assert_eq!(tree.evaluate(&Version::from(2)), vec![&"a", &"c"]);
    }

    #[test]
    fn test_condition_display() {
        assert_eq!(Condition::Always.to_string(), "always");
        assert_eq!(
            Condition::Between(Version::from([3, 6]), Version::from([3, 8])).to_string(),
            "3.6 <= version <= 3.8"
        );
    }
}
