//! Lazy enumeration of a row's optimal extensions.
//!
//! A row's EPTs, followed recursively through the child tables, span every
//! optimal way to complete the row's partial assignment over the whole
//! subtree. The number of such witnesses can be exponential in the tree
//! depth, so [`Extensions`] produces them one at a time: it keeps one
//! sub-iterator per child of the current EPT and advances them like an
//! odometer, moving to the next EPT when the last wheel wraps.

use std::collections::BTreeSet;

use num_bigint::BigUint;

use crate::assignment::Assignment;
use crate::table::{Row, Table};
use crate::types::Weight;

/// One fully extended optimal witness of a row.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Extension {
    /// The row's assignment combined with one optimal assignment per subtree.
    pub assignment: Assignment,
    /// All clause indices falsified along the witness path.
    pub falsified: BTreeSet<usize>,
    /// Equals the originating row's cost.
    pub cost: Weight,
}

/// Iterator over all optimal extensions of one row of a table.
pub struct Extensions<'a> {
    table: &'a Table,
    row: &'a Row,
    /// Index into `row.epts` of the EPT currently being expanded.
    active_ept: Option<usize>,
    child_iters: Vec<Extensions<'a>>,
    current: Vec<Extension>,
}

impl Table {
    /// Returns a lazy iterator over all optimal extensions of a row.
    pub fn extensions(&self, row_index: usize) -> Extensions<'_> {
        Extensions {
            table: self,
            row: &self.rows[row_index],
            active_ept: None,
            child_iters: Vec::new(),
            current: Vec::new(),
        }
    }

    /// Counts the optimal extensions of every row, bottom-up.
    ///
    /// The result is indexed like [`Table::rows`]. Counts are exact and can
    /// exceed any fixed-width integer, hence the big integers.
    pub fn extension_counts(&self) -> Vec<BigUint> {
        let child_counts: Vec<Vec<BigUint>> =
            self.children.iter().map(Table::extension_counts).collect();
        self.rows
            .iter()
            .map(|row| {
                row.epts
                    .iter()
                    .map(|ept| {
                        ept.iter()
                            .enumerate()
                            .map(|(i, &r)| child_counts[i][r].clone())
                            .product::<BigUint>()
                    })
                    .sum()
            })
            .collect()
    }
}

impl<'a> Extensions<'a> {
    /// Moves on to the next EPT and resets all child iterators to its rows.
    /// Returns `false` when the EPTs are exhausted.
    fn advance_ept(&mut self) -> bool {
        let next = self.active_ept.map_or(0, |i| i + 1);
        let Some(ept) = self.row.epts.get(next) else {
            return false;
        };
        self.active_ept = Some(next);
        self.child_iters = ept
            .iter()
            .enumerate()
            .map(|(i, &r)| self.table.children[i].extensions(r))
            .collect();
        self.current = self
            .child_iters
            .iter_mut()
            .map(|it| it.next().expect("computed row has at least one extension"))
            .collect();
        true
    }

    /// Odometer step: advances wheel `i`, wrapping it and carrying into the
    /// next wheel on exhaustion. A carry past the last wheel moves to the
    /// next EPT. Returns `false` when everything is exhausted.
    fn increment(&mut self, i: usize) -> bool {
        if i == self.child_iters.len() {
            return self.advance_ept();
        }
        if let Some(extension) = self.child_iters[i].next() {
            self.current[i] = extension;
            return true;
        }
        let ept = &self.row.epts[self.active_ept.expect("increment before first EPT")];
        self.child_iters[i] = self.table.children[i].extensions(ept[i]);
        self.current[i] = self.child_iters[i]
            .next()
            .expect("computed row has at least one extension");
        self.increment(i + 1)
    }

    /// Combines the row with the current child extensions into one witness.
    fn build(&self) -> Extension {
        for extension in &self.current {
            assert!(extension.cost <= self.row.cost, "child extension costlier than parent row");
        }
        let assignment = Assignment::combine(
            std::iter::once(&self.row.assignment).chain(self.current.iter().map(|e| &e.assignment)),
        );
        let mut falsified = self.row.falsified.clone();
        for extension in &self.current {
            falsified.extend(extension.falsified.iter().copied());
        }
        Extension { assignment, falsified, cost: self.row.cost }
    }
}

impl<'a> Iterator for Extensions<'a> {
    type Item = Extension;

    fn next(&mut self) -> Option<Extension> {
        let advanced = match self.active_ept {
            None => self.advance_ept(),
            Some(_) => self.increment(0),
        };
        if !advanced {
            return None;
        }
        Some(self.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decompose::{DecomposeConfig, Decomposer};
    use crate::formula::Formula;
    use crate::types::Var;

    fn solve(text: &str) -> (Formula, Table) {
        let formula = Formula::parse(text.as_bytes()).unwrap();
        let decomposition =
            Decomposer::new(&formula.primal_graph(), DecomposeConfig::default()).decompose();
        assert_eq!(decomposition.roots.len(), 1);
        let mut table = Table::new(&decomposition.roots[0], &formula);
        assert!(table.compute(&formula, None));
        (formula, table)
    }

    #[test_log::test]
    fn test_leaf_row_extends_to_itself() {
        let (_, table) = solve("p wcnf 2 1 10\n10 1 2 0\n");
        for (i, row) in table.rows().iter().enumerate() {
            let extensions: Vec<Extension> = table.extensions(i).collect();
            assert_eq!(extensions.len(), 1);
            assert_eq!(extensions[0].assignment, row.assignment);
            assert_eq!(extensions[0].falsified, row.falsified);
            assert_eq!(extensions[0].cost, row.cost);
        }
    }

    #[test_log::test]
    fn test_extensions_cover_all_optimal_witnesses() {
        // (1 | 2) & (2 | 3) has five satisfying assignments; summed over the
        // cost-0 root rows, exactly five extensions must appear, each a full
        // assignment over all three variables.
        let (_, table) = solve("p wcnf 3 2 10\n10 1 2 0\n10 2 3 0\n");
        let mut witnesses = Vec::new();
        for (i, row) in table.rows().iter().enumerate() {
            if row.cost != 0 {
                continue;
            }
            for extension in table.extensions(i) {
                assert_eq!(extension.cost, 0);
                assert!(extension.falsified.is_empty());
                assert_eq!(extension.assignment.len(), 3);
                witnesses.push(extension.assignment);
            }
        }
        witnesses.sort_by_key(|a| {
            [Var::new(1), Var::new(2), Var::new(3)].map(|v| a.value(v).unwrap())
        });
        witnesses.dedup();
        assert_eq!(witnesses.len(), 5);
    }

    #[test_log::test]
    fn test_extension_counts_match_iteration() {
        let (_, table) = solve("p wcnf 3 3 10\n10 1 2 0\n10 2 3 0\n2 -2 0\n");
        let counts = table.extension_counts();
        assert_eq!(counts.len(), table.rows().len());
        for (i, count) in counts.iter().enumerate() {
            let iterated = table.extensions(i).count();
            assert_eq!(count, &BigUint::from(iterated));
        }
    }

    #[test_log::test]
    fn test_extensions_carry_falsified_clauses() {
        // The soft unit -1 (index 1) is falsified whenever 1 is true; its
        // index must surface in every such witness.
        let (_, table) = solve("p wcnf 2 2 10\n10 1 2 0\n3 -1 0\n");
        for (i, row) in table.rows().iter().enumerate() {
            for extension in table.extensions(i) {
                assert_eq!(
                    extension.falsified.contains(&1),
                    extension.assignment.value(Var::new(1)) == Some(true),
                );
                assert_eq!(extension.cost, row.cost);
            }
        }
    }
}
