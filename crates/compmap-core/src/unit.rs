use crate::types::UnitKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Unit
// ---------------------------------------------------------------------------

/// One node of the organizational hierarchy. Supplied whole by the org-unit
/// collaborator; read-only to this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub code: i64,
    pub acronym: String,
    pub name: String,
    pub kind: UnitKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub titular_user: Option<i64>,
    #[serde(default)]
    pub children: Vec<Unit>,
}

impl Unit {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

// ---------------------------------------------------------------------------
// UnitTree
// ---------------------------------------------------------------------------

/// Immutable forest of organizational units with code-based lookup.
///
/// Invariant: acyclic, each code appears exactly once. The parent index is
/// built once at construction; everything else is computed on demand.
/// Deliberately not deserializable: always construct through `new` so the
/// parent index matches the roots.
#[derive(Debug, Clone, Default)]
pub struct UnitTree {
    roots: Vec<Unit>,
    parents: BTreeMap<i64, Option<i64>>,
}

impl UnitTree {
    pub fn new(roots: Vec<Unit>) -> Self {
        let mut parents = BTreeMap::new();
        for root in &roots {
            index_parents(root, None, &mut parents);
        }
        Self { roots, parents }
    }

    pub fn roots(&self) -> &[Unit] {
        &self.roots
    }

    /// Depth-first flattening, parents before children. Pure function of the
    /// tree: same input, same order.
    pub fn flatten(&self) -> Vec<&Unit> {
        let mut out = Vec::new();
        for root in &self.roots {
            flatten_into(root, &mut out);
        }
        out
    }

    pub fn find(&self, code: i64) -> Option<&Unit> {
        self.flatten().into_iter().find(|u| u.code == code)
    }

    pub fn contains(&self, code: i64) -> bool {
        self.parents.contains_key(&code)
    }

    /// Direct parent of a unit, `None` for roots and unknown codes.
    pub fn parent_of(&self, code: i64) -> Option<i64> {
        self.parents.get(&code).copied().flatten()
    }

    /// Strict ancestors, nearest first.
    pub fn ancestors_of(&self, code: i64) -> Vec<i64> {
        let mut out = Vec::new();
        let mut current = self.parent_of(code);
        while let Some(parent) = current {
            out.push(parent);
            current = self.parent_of(parent);
        }
        out
    }

    /// All descendants of a unit in depth-first order, excluding the unit
    /// itself. Empty for leaves and unknown codes.
    pub fn descendants_of(&self, code: i64) -> Vec<i64> {
        let mut out = Vec::new();
        if let Some(unit) = self.find(code) {
            for child in &unit.children {
                collect_codes(child, &mut out);
            }
        }
        out
    }
}

fn index_parents(unit: &Unit, parent: Option<i64>, parents: &mut BTreeMap<i64, Option<i64>>) {
    parents.insert(unit.code, parent);
    for child in &unit.children {
        index_parents(child, Some(unit.code), parents);
    }
}

fn flatten_into<'a>(unit: &'a Unit, out: &mut Vec<&'a Unit>) {
    out.push(unit);
    for child in &unit.children {
        flatten_into(child, out);
    }
}

fn collect_codes(unit: &Unit, out: &mut Vec<i64>) {
    out.push(unit.code);
    for child in &unit.children {
        collect_codes(child, out);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(code: i64, acronym: &str, kind: UnitKind, children: Vec<Unit>) -> Unit {
        Unit {
            code,
            acronym: acronym.to_string(),
            name: acronym.to_string(),
            kind,
            titular_user: None,
            children,
        }
    }

    fn sample_tree() -> UnitTree {
        // STIC
        //   COSIS
        //     SEDESENV, SEDIA, SESEL
        UnitTree::new(vec![unit(
            2,
            "STIC",
            UnitKind::Interoperational,
            vec![unit(
                6,
                "COSIS",
                UnitKind::Intermediate,
                vec![
                    unit(8, "SEDESENV", UnitKind::Operational, vec![]),
                    unit(9, "SEDIA", UnitKind::Operational, vec![]),
                    unit(10, "SESEL", UnitKind::Operational, vec![]),
                ],
            )],
        )])
    }

    #[test]
    fn flatten_is_depth_first_parents_first() {
        let tree = sample_tree();
        let codes: Vec<i64> = tree.flatten().iter().map(|u| u.code).collect();
        assert_eq!(codes, vec![2, 6, 8, 9, 10]);
        // Deterministic: flatten twice, same order.
        let again: Vec<i64> = tree.flatten().iter().map(|u| u.code).collect();
        assert_eq!(codes, again);
    }

    #[test]
    fn find_and_parents() {
        let tree = sample_tree();
        assert_eq!(tree.find(9).unwrap().acronym, "SEDIA");
        assert!(tree.find(999).is_none());
        assert_eq!(tree.parent_of(9), Some(6));
        assert_eq!(tree.parent_of(2), None);
        assert_eq!(tree.ancestors_of(9), vec![6, 2]);
        assert_eq!(tree.ancestors_of(2), Vec::<i64>::new());
    }

    #[test]
    fn descendants() {
        let tree = sample_tree();
        assert_eq!(tree.descendants_of(2), vec![6, 8, 9, 10]);
        assert_eq!(tree.descendants_of(6), vec![8, 9, 10]);
        assert!(tree.descendants_of(10).is_empty());
    }
}
