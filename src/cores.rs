//! Satisfiability queries and unsatisfiable-core extraction on DP tables.
//!
//! A table is *unsat* when every row's cost reaches the hard-clause weight
//! threshold: no completion of the subtree avoids violating a hard clause.
//! Cost propagates upward, so an unsat descendant makes every ancestor unsat
//! as well; the interesting nodes are the deepest ones where the conflict
//! first materializes. From such a node a core is reconstructed by following
//! EPTs back down to the rows that actually falsify clauses.

use std::collections::BTreeSet;

use crate::table::{Row, Table};

impl Table {
    /// True iff every row violates a hard clause somewhere in the subtree.
    pub fn unsat(&self) -> bool {
        self.rows.iter().all(|r| r.cost >= self.hard_weight)
    }

    pub fn sat(&self) -> bool {
        !self.unsat()
    }

    /// True iff every row already falsifies a clause at this very node, so
    /// no descent is needed to witness a violation.
    pub fn locally_unsat(&self) -> bool {
        self.rows.iter().all(|r| !r.falsified.is_empty())
    }

    /// Returns the frontier of the inconsistency: the shallowest unsat
    /// tables that either have only sat children or are locally unsat.
    pub fn deep_unsat_descendants(&self) -> Vec<&Table> {
        let mut result = Vec::new();
        self.collect_deep_unsat(&mut result);
        result
    }

    fn collect_deep_unsat<'a>(&'a self, out: &mut Vec<&'a Table>) {
        if self.sat() {
            return;
        }
        if self.children.iter().all(Table::sat) || self.locally_unsat() {
            out.push(self);
        } else {
            for child in &self.children {
                child.collect_deep_unsat(out);
            }
        }
    }

    /// Extracts one unsatisfiable core from an unsat table: a set of clause
    /// indices such that no assignment consistent with this sub-decomposition
    /// satisfies all of them.
    ///
    /// Every row either falsifies clauses right here (contributing them to
    /// the core) or owes its positive cost to some child row, which is pushed
    /// onto the backtracking stack for the same treatment.
    pub fn unsat_core(&self) -> BTreeSet<usize> {
        let mut core = BTreeSet::new();
        let mut stack: Vec<(&Table, &Row)> = self.rows.iter().map(|r| (self, r)).collect();
        while let Some((table, row)) = stack.pop() {
            if !row.falsified.is_empty() {
                core.extend(row.falsified.iter().copied());
                continue;
            }
            for ept in &row.epts {
                let culprit = ept
                    .iter()
                    .enumerate()
                    .map(|(i, &r)| (&table.children[i], &table.children[i].rows[r]))
                    .find(|(_, child_row)| child_row.cost > 0)
                    .expect("costless row under an unsat table");
                stack.push(culprit);
            }
        }
        core
    }

    /// One core per deep unsat descendant; empty if the table is sat.
    pub fn unsat_cores(&self) -> Vec<BTreeSet<usize>> {
        self.deep_unsat_descendants()
            .into_iter()
            .map(Table::unsat_core)
            .collect()
    }
}
