use crate::types::UnitKind;
use crate::unit::UnitTree;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ---------------------------------------------------------------------------
// CheckState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckState {
    Checked,
    Unchecked,
    Indeterminate,
}

impl fmt::Display for CheckState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CheckState::Checked => "checked",
            CheckState::Unchecked => "unchecked",
            CheckState::Indeterminate => "indeterminate",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// SelectionModel
// ---------------------------------------------------------------------------

/// Tri-state selection over a unit tree.
///
/// Holds only the explicit checked set; everything an ancestor shows is
/// derived on read from that set and the tree, so there is no cached parent
/// state to go stale. Session-scoped: discarded when the selection UI
/// closes.
///
/// Interoperational units are exempt from hierarchical propagation: they can
/// be checked on their own without dragging their subtree along, and their
/// parents aggregate as if they were not there.
#[derive(Debug, Clone, Default)]
pub struct SelectionModel {
    checked: BTreeSet<i64>,
    disabled: BTreeSet<i64>,
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Units the caller has locked out of selection (e.g. already bound to
    /// another running process). They keep whatever state they have and are
    /// skipped by propagation and aggregation.
    pub fn with_disabled(disabled: impl IntoIterator<Item = i64>) -> Self {
        Self {
            checked: BTreeSet::new(),
            disabled: disabled.into_iter().collect(),
        }
    }

    pub fn is_disabled(&self, code: i64) -> bool {
        self.disabled.contains(&code)
    }

    /// Explicitly checked codes, ascending.
    pub fn checked_codes(&self) -> Vec<i64> {
        self.checked.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.checked.clear();
    }

    /// Set the unit's explicit state and cascade through its subtree.
    ///
    /// Disabled nodes are skipped without blocking their siblings.
    /// Interoperational nodes are never written by the cascade; toggling one
    /// directly affects only itself.
    pub fn toggle(&mut self, tree: &UnitTree, code: i64, checked: bool) {
        if self.disabled.contains(&code) || !tree.contains(code) {
            return;
        }
        self.set(code, checked);

        let interoperational = matches!(
            tree.find(code).map(|u| u.kind),
            Some(UnitKind::Interoperational)
        );
        if interoperational {
            return;
        }

        for descendant in tree.descendants_of(code) {
            if self.disabled.contains(&descendant) {
                continue;
            }
            if matches!(
                tree.find(descendant).map(|u| u.kind),
                Some(UnitKind::Interoperational)
            ) {
                continue;
            }
            self.set(descendant, checked);
        }
    }

    /// Derived tri-state of a unit. Pure function of the explicit set and
    /// the tree.
    pub fn effective_state(&self, tree: &UnitTree, code: i64) -> CheckState {
        let Some(unit) = tree.find(code) else {
            return CheckState::Unchecked;
        };

        // Interoperational units and leaves answer for themselves.
        if unit.kind == UnitKind::Interoperational || unit.is_leaf() {
            return self.explicit_state(code);
        }

        let mut saw_checked = false;
        let mut saw_unchecked = false;
        let mut considered = 0usize;
        for child in &unit.children {
            if self.disabled.contains(&child.code) || child.kind == UnitKind::Interoperational {
                continue;
            }
            considered += 1;
            match self.effective_state(tree, child.code) {
                CheckState::Checked => saw_checked = true,
                CheckState::Unchecked => saw_unchecked = true,
                CheckState::Indeterminate => {
                    saw_checked = true;
                    saw_unchecked = true;
                }
            }
        }

        // Every child disabled or exempt: nothing to aggregate over.
        if considered == 0 {
            return self.explicit_state(code);
        }

        match (saw_checked, saw_unchecked) {
            (true, false) => CheckState::Checked,
            (false, _) => CheckState::Unchecked,
            (true, true) => CheckState::Indeterminate,
        }
    }

    /// Units whose effective state is checked, in tree order. This is the
    /// set a selection-backed request is built from.
    pub fn effective_checked(&self, tree: &UnitTree) -> Vec<i64> {
        tree.flatten()
            .iter()
            .map(|u| u.code)
            .filter(|&c| self.effective_state(tree, c) == CheckState::Checked)
            .collect()
    }

    fn explicit_state(&self, code: i64) -> CheckState {
        if self.checked.contains(&code) {
            CheckState::Checked
        } else {
            CheckState::Unchecked
        }
    }

    fn set(&mut self, code: i64, checked: bool) {
        if checked {
            self.checked.insert(code);
        } else {
            self.checked.remove(&code);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UnitKind;
    use crate::unit::Unit;

    fn unit(code: i64, kind: UnitKind, children: Vec<Unit>) -> Unit {
        Unit {
            code,
            acronym: format!("U{code}"),
            name: format!("Unit {code}"),
            kind,
            titular_user: None,
            children,
        }
    }

    /// Root (1, intermediate)
    ///   ├─ C1 (2, operational)
    ///   └─ C2 (3, operational)
    fn small_tree() -> UnitTree {
        UnitTree::new(vec![unit(
            1,
            UnitKind::Intermediate,
            vec![
                unit(2, UnitKind::Operational, vec![]),
                unit(3, UnitKind::Operational, vec![]),
            ],
        )])
    }

    /// STIC (2, interoperational)
    ///   └─ COSIS (6, intermediate)
    ///       ├─ SEDESENV (8), SEDIA (9), SESEL (10)
    fn org_tree() -> UnitTree {
        UnitTree::new(vec![unit(
            2,
            UnitKind::Interoperational,
            vec![unit(
                6,
                UnitKind::Intermediate,
                vec![
                    unit(8, UnitKind::Operational, vec![]),
                    unit(9, UnitKind::Operational, vec![]),
                    unit(10, UnitKind::Operational, vec![]),
                ],
            )],
        )])
    }

    #[test]
    fn toggle_parent_checks_all_descendants() {
        let tree = org_tree();
        let mut sel = SelectionModel::new();
        sel.toggle(&tree, 6, true);

        for code in [6, 8, 9, 10] {
            assert_eq!(sel.effective_state(&tree, code), CheckState::Checked);
        }
    }

    #[test]
    fn toggle_parent_unchecks_all_descendants() {
        let tree = org_tree();
        let mut sel = SelectionModel::new();
        sel.toggle(&tree, 6, true);
        sel.toggle(&tree, 6, false);

        for code in [6, 8, 9, 10] {
            assert_eq!(sel.effective_state(&tree, code), CheckState::Unchecked);
        }
    }

    #[test]
    fn checking_all_children_checks_the_parent() {
        let tree = org_tree();
        let mut sel = SelectionModel::new();
        sel.toggle(&tree, 8, true);
        sel.toggle(&tree, 9, true);
        sel.toggle(&tree, 10, true);

        assert_eq!(sel.effective_state(&tree, 6), CheckState::Checked);
    }

    #[test]
    fn partial_children_make_parent_indeterminate() {
        let tree = org_tree();
        let mut sel = SelectionModel::new();
        sel.toggle(&tree, 6, true);
        sel.toggle(&tree, 9, false);

        assert_eq!(sel.effective_state(&tree, 8), CheckState::Checked);
        assert_eq!(sel.effective_state(&tree, 9), CheckState::Unchecked);
        assert_eq!(sel.effective_state(&tree, 6), CheckState::Indeterminate);
    }

    #[test]
    fn root_scenario_indeterminate_then_checked_then_cleared() {
        let tree = small_tree();
        let mut sel = SelectionModel::new();

        sel.toggle(&tree, 2, true);
        assert_eq!(sel.effective_state(&tree, 1), CheckState::Indeterminate);

        sel.toggle(&tree, 3, true);
        assert_eq!(sel.effective_state(&tree, 1), CheckState::Checked);

        sel.toggle(&tree, 1, false);
        assert_eq!(sel.effective_state(&tree, 2), CheckState::Unchecked);
        assert_eq!(sel.effective_state(&tree, 3), CheckState::Unchecked);
        assert_eq!(sel.effective_state(&tree, 1), CheckState::Unchecked);
    }

    #[test]
    fn toggle_is_idempotent() {
        let tree = org_tree();
        let mut sel = SelectionModel::new();
        sel.toggle(&tree, 6, true);
        let snapshot: Vec<CheckState> = [2, 6, 8, 9, 10]
            .iter()
            .map(|&c| sel.effective_state(&tree, c))
            .collect();

        sel.toggle(&tree, 6, true);
        let again: Vec<CheckState> = [2, 6, 8, 9, 10]
            .iter()
            .map(|&c| sel.effective_state(&tree, c))
            .collect();
        assert_eq!(snapshot, again);
    }

    #[test]
    fn ancestors_checked_or_indeterminate_after_toggle() {
        // Three non-exempt levels: 1 → 5 → {8, 9}.
        let tree = UnitTree::new(vec![unit(
            1,
            UnitKind::Intermediate,
            vec![unit(
                5,
                UnitKind::Intermediate,
                vec![
                    unit(8, UnitKind::Operational, vec![]),
                    unit(9, UnitKind::Operational, vec![]),
                ],
            )],
        )]);
        let mut sel = SelectionModel::new();
        sel.toggle(&tree, 8, true);

        for ancestor in tree.ancestors_of(8) {
            let state = sel.effective_state(&tree, ancestor);
            assert!(
                state == CheckState::Checked || state == CheckState::Indeterminate,
                "ancestor {ancestor} is {state}"
            );
        }
        for descendant in tree.descendants_of(8) {
            assert_eq!(sel.effective_state(&tree, descendant), CheckState::Checked);
        }
    }

    #[test]
    fn interoperational_checked_independently() {
        let tree = org_tree();
        let mut sel = SelectionModel::new();

        // Checking the interoperational root does not force its subtree.
        sel.toggle(&tree, 2, true);
        assert_eq!(sel.effective_state(&tree, 2), CheckState::Checked);
        assert_eq!(sel.effective_state(&tree, 6), CheckState::Unchecked);
        assert_eq!(sel.effective_state(&tree, 8), CheckState::Unchecked);

        // And emptying the subtree later does not uncheck it.
        sel.toggle(&tree, 6, true);
        sel.toggle(&tree, 6, false);
        assert_eq!(sel.effective_state(&tree, 2), CheckState::Checked);
    }

    #[test]
    fn checking_subordinates_does_not_force_interoperational() {
        let tree = org_tree();
        let mut sel = SelectionModel::new();
        sel.toggle(&tree, 6, true);

        assert_eq!(sel.effective_state(&tree, 6), CheckState::Checked);
        assert_eq!(sel.effective_state(&tree, 2), CheckState::Unchecked);
    }

    #[test]
    fn disabled_nodes_keep_state_and_do_not_block_siblings() {
        let tree = org_tree();
        let mut sel = SelectionModel::with_disabled([9]);
        sel.toggle(&tree, 6, true);

        assert_eq!(sel.effective_state(&tree, 8), CheckState::Checked);
        assert_eq!(sel.effective_state(&tree, 10), CheckState::Checked);
        // The disabled unit was not written.
        assert_eq!(sel.effective_state(&tree, 9), CheckState::Unchecked);
        // Aggregation ignores it, so the parent still reads checked.
        assert_eq!(sel.effective_state(&tree, 6), CheckState::Checked);
    }

    #[test]
    fn toggling_a_disabled_node_is_a_no_op() {
        let tree = org_tree();
        let mut sel = SelectionModel::with_disabled([9]);
        sel.toggle(&tree, 9, true);
        assert_eq!(sel.effective_state(&tree, 9), CheckState::Unchecked);
        assert!(sel.checked_codes().is_empty());
    }

    #[test]
    fn effective_checked_in_tree_order() {
        let tree = org_tree();
        let mut sel = SelectionModel::new();
        sel.toggle(&tree, 6, true);
        assert_eq!(sel.effective_checked(&tree), vec![6, 8, 9, 10]);
    }
}
