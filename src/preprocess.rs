//! Formula rewriting driven by computed tables.
//!
//! For every fully solved (partial) decomposition, the clauses covered by
//! its bags can be replaced by one clause per positive-cost row: the negated
//! row assignment, weighted by the row's cost (capped at the hard weight).
//! The replacement is only kept when it shrinks the formula.

use std::collections::BTreeSet;

use log::info;

use crate::formula::{Clause, Formula};
use crate::table::Table;
use crate::td::Td;
use crate::types::Weight;

/// A pending edit: clauses to append and clause indices to drop.
#[derive(Debug, Clone, Default)]
pub struct FormulaChange {
    pub add: Vec<Clause>,
    pub remove: BTreeSet<usize>,
}

impl FormulaChange {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }

    /// Accumulates another change into this one.
    pub fn merge(&mut self, other: FormulaChange) {
        self.add.extend(other.add);
        self.remove.extend(other.remove);
    }
}

/// Derives a formula change from one solved table.
///
/// All clauses induced by the decomposition's bags are marked for removal;
/// each row with positive cost contributes a replacement clause forbidding
/// its assignment. Rows at the hard threshold emit hard clauses. If the
/// replacement would not shrink the formula, an empty change is returned
/// (and any unsat cores are logged for inspection).
pub fn process_table(table: &Table, tree: &Td, formula: &Formula) -> FormulaChange {
    let bag_union = tree.union_of_bags();
    let mut change = FormulaChange::default();

    info!("processing table with hard weight {}", table.hard_weight());
    for (i, clause) in formula.clauses.iter().enumerate() {
        if clause.induced_by(&bag_union) {
            info!("clause {} to be deleted: {}", i, clause);
            change.remove.insert(i);
        }
    }

    for row in table.rows() {
        if row.cost == 0 {
            continue;
        }
        let weight: Weight = if row.cost < table.hard_weight() {
            row.cost
        } else {
            formula.hard_weight
        };
        let literals = row.assignment.to_literals().iter().map(|l| l.negate()).collect();
        let clause = Clause::new(weight, literals);
        info!("new clause: {}", clause);
        change.add.push(clause);
    }

    if change.add.len() < change.remove.len() {
        info!("decrease in clauses: {}", change.remove.len() - change.add.len());
        change
    } else {
        info!(
            "no improvement, leaving formula unchanged (increase would have been {})",
            change.add.len() - change.remove.len()
        );
        for core in table.unsat_cores() {
            info!("unsat core: {:?}", core);
        }
        FormulaChange::default()
    }
}

/// Applies an accumulated change to the formula.
///
/// Soft weight moved in or out of the formula shifts the hard threshold by
/// the same amount, so every existing hard clause is rewritten to the new
/// threshold and the row-derived hard clauses stay hard. When more soft
/// weight leaves than the threshold holds, the shift saturates and the
/// threshold is clamped to stay above every remaining soft weight.
pub fn apply_changes(formula: &mut Formula, change: FormulaChange) {
    let added_soft: Weight = change
        .add
        .iter()
        .filter(|c| c.weight < formula.hard_weight)
        .map(|c| c.weight)
        .sum();
    let removed_soft: Weight = change
        .remove
        .iter()
        .map(|&i| formula.clauses[i].weight)
        .filter(|&w| w < formula.hard_weight)
        .sum();

    let old_hard_weight = formula.hard_weight;
    let mut clauses: Vec<Clause> = formula
        .clauses
        .drain(..)
        .enumerate()
        .filter(|(i, _)| !change.remove.contains(i))
        .map(|(_, c)| c)
        .collect();
    clauses.extend(change.add);

    // Invariant for the new threshold: every surviving soft clause stays
    // strictly below it, and the rebalance never wraps around zero.
    let max_soft = clauses
        .iter()
        .map(|c| c.weight)
        .filter(|&w| w < old_hard_weight)
        .max()
        .unwrap_or(0);
    let new_hard_weight = (old_hard_weight + added_soft)
        .saturating_sub(removed_soft)
        .max(max_soft + 1);

    for clause in &mut clauses {
        if clause.weight >= old_hard_weight {
            clause.weight = new_hard_weight;
        }
    }

    formula.clauses = clauses;
    formula.hard_weight = new_hard_weight;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decompose::{DecomposeConfig, Decomposer};

    fn parse(text: &str) -> Formula {
        Formula::parse(text.as_bytes()).unwrap()
    }

    fn solve(formula: &Formula) -> (Table, Td) {
        let decomposition =
            Decomposer::new(&formula.primal_graph(), DecomposeConfig::default()).decompose();
        assert_eq!(decomposition.roots.len(), 1);
        let tree = decomposition.roots[0].clone();
        let mut table = Table::new(&tree, formula);
        assert!(table.compute(formula, None));
        (table, tree)
    }

    #[test_log::test]
    fn test_shrinking_replacement_is_kept() {
        // Five clauses over {1,2} collapse into at most four row clauses
        // (one per assignment), so the rewrite is an improvement.
        let formula = parse(
            "p wcnf 2 5 100\n100 1 2 0\n100 -1 2 0\n4 -2 0\n3 1 -2 0\n2 -1 0\n",
        );
        let (table, tree) = solve(&formula);
        let change = process_table(&table, &tree, &formula);
        assert!(!change.is_empty());
        assert_eq!(change.remove.len(), 5);
        assert!(change.add.len() < change.remove.len());
        // Every added clause forbids exactly one positive-cost assignment.
        for clause in &change.add {
            assert_eq!(clause.literals.len(), 2);
        }
    }

    #[test_log::test]
    fn test_non_shrinking_replacement_is_dropped() {
        // Two clauses over two variables cannot beat their row rewrite.
        let formula = parse("p wcnf 2 2 10\n5 1 2 0\n5 -1 -2 0\n");
        let (table, tree) = solve(&formula);
        let change = process_table(&table, &tree, &formula);
        assert!(change.is_empty());
    }

    #[test_log::test]
    fn test_apply_changes_rebalances_hard_weight() {
        let mut formula = parse("p wcnf 2 3 10\n10 1 2 0\n5 -1 0\n4 -2 0\n");
        // Drop both soft clauses, add one soft clause of weight 7.
        let change = FormulaChange {
            add: vec![Clause::new(7, vec![crate::types::Lit::from_dimacs(1)])],
            remove: [1, 2].into_iter().collect(),
        };
        apply_changes(&mut formula, change);
        // 10 + 7 - (5 + 4) = 8
        assert_eq!(formula.hard_weight, 8);
        assert_eq!(formula.clauses.len(), 2);
        // The surviving hard clause is rewritten to the new threshold.
        assert_eq!(formula.clauses[0].weight, 8);
        assert_eq!(formula.clauses[1].weight, 7);
    }

    #[test_log::test]
    fn test_hard_threshold_rows_emit_hard_clauses() {
        // Contradictory hard units plus a soft one: both rows reach the hard
        // threshold, so the replacement clauses must come out hard.
        let formula = parse("p wcnf 1 3 10\n10 1 0\n10 -1 0\n2 1 0\n");
        let (table, tree) = solve(&formula);
        for row in table.rows() {
            assert!(row.cost >= table.hard_weight());
        }
        let change = process_table(&table, &tree, &formula);
        assert_eq!(change.remove.len(), 3);
        assert_eq!(change.add.len(), 2);
        for clause in &change.add {
            assert_eq!(clause.weight, formula.hard_weight);
        }
    }

    #[test_log::test]
    fn test_apply_changes_survives_oversubscribed_soft_removal() {
        // Five weight-9 copies of the same soft unit under a threshold of
        // 10: the rewrite removes 45 soft weight against a threshold shift
        // budget of 10, and the lone replacement clause is hard. The
        // rebalance must saturate instead of wrapping, and the result must
        // still classify the replacement clause as hard.
        let formula = parse("p wcnf 1 5 10\n9 1 0\n9 1 0\n9 1 0\n9 1 0\n9 1 0\n");
        let (table, tree) = solve(&formula);
        let change = process_table(&table, &tree, &formula);
        assert_eq!(change.remove.len(), 5);
        assert_eq!(change.add.len(), 1);

        let mut rewritten = formula.clone();
        apply_changes(&mut rewritten, change);
        assert_eq!(rewritten.clauses.len(), 1);
        assert!(rewritten.hard_weight > 0);
        assert!(rewritten.is_hard(0));
        let max_soft = rewritten
            .clauses
            .iter()
            .map(|c| c.weight)
            .filter(|&w| w < rewritten.hard_weight)
            .max()
            .unwrap_or(0);
        assert!(rewritten.hard_weight > max_soft);
    }

    #[test_log::test]
    fn test_rewrite_preserves_optimum() {
        // The rewritten formula must have the same minimum cost as the
        // original.
        let formula = parse(
            "p wcnf 2 5 100\n100 1 2 0\n100 -1 2 0\n4 -2 0\n3 1 -2 0\n2 -1 0\n",
        );
        let (table, tree) = solve(&formula);
        let before = table.min_cost();

        let mut rewritten = formula.clone();
        let change = process_table(&table, &tree, &formula);
        apply_changes(&mut rewritten, change);

        let (rewritten_table, _) = solve(&rewritten);
        assert_eq!(rewritten_table.min_cost(), before);
    }
}
