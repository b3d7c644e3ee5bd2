//! Dynamic programming over a tree decomposition.
//!
//! Every decomposition node gets a [`Table`] mapping each feasible partial
//! assignment over its bag to the minimum total weight of clauses falsified
//! anywhere in the subtree. Rows record how that minimum is achieved through
//! *extension pointer tuples* (EPTs): one optimal child row per child table.
//! Multiple EPTs on a row are alternative optimal witnesses.
//!
//! Tables own their child tables, and EPTs store row indices into them, so a
//! row never outlives the child rows it points to.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::time::Instant;

use log::{debug, info};

use crate::assignment::Assignment;
use crate::formula::Formula;
use crate::td::Td;
use crate::types::{Var, Weight};

/// One extension pointer tuple: a row index into each child table.
pub type Ept = Vec<usize>;

/// One table entry: a partial assignment over the bag, the locally visible
/// clauses it falsifies, the minimum subtree cost, and the optimal witnesses.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Row {
    pub assignment: Assignment,
    /// Indices (into the formula) of local clauses falsified by `assignment`.
    pub falsified: BTreeSet<usize>,
    /// Minimum total weight falsified in the subtree under `assignment`.
    pub cost: Weight,
    pub epts: Vec<Ept>,
}

impl Row {
    fn new(assignment: Assignment, falsified: BTreeSet<usize>, cost: Weight, ept: Ept) -> Self {
        Row { assignment, falsified, cost, epts: vec![ept] }
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let falsified: Vec<String> = self.falsified.iter().map(usize::to_string).collect();
        write!(f, "{}; {{{}}}; {}", self.assignment, falsified.join(", "), self.cost)
    }
}

/// The DP table of one decomposition node.
pub struct Table {
    pub(crate) bag: Vec<Var>,
    /// Variables first constrained at this node.
    new_vars: Vec<Var>,
    /// Per child, the separator variables in bag order.
    shared_vars: Vec<Vec<Var>>,
    pub(crate) children: Vec<Table>,
    /// Indices of the clauses induced by this node's bag.
    local_clauses: Vec<usize>,
    /// Per child, the local clauses also induced at that child.
    shared_clauses: Vec<BTreeSet<usize>>,
    pub(crate) hard_weight: Weight,
    pub(crate) rows: Vec<Row>,
    index: HashMap<Assignment, usize>,
}

impl Table {
    /// Builds the (empty) table skeleton for a subtree, child tables first.
    pub fn new(tree: &Td, formula: &Formula) -> Self {
        let bag: Vec<Var> = tree.bag().iter().copied().collect();
        let new_vars: Vec<Var> = tree.introduced().into_iter().collect();
        let shared_vars = tree.shared();
        let children: Vec<Table> = tree
            .children()
            .iter()
            .map(|subtree| Table::new(subtree, formula))
            .collect();

        let local_clauses = formula.induced_clauses(tree.bag());
        // A local clause without introduced variables is "shared" with every
        // child that also induces it; its falsified weight stays visible here.
        let mut shared_clauses = vec![BTreeSet::new(); children.len()];
        for &c in &local_clauses {
            let clause = &formula.clauses[c];
            if clause.variables().any(|v| new_vars.contains(&v)) {
                continue;
            }
            for (i, child) in children.iter().enumerate() {
                if child.local_clauses.contains(&c) {
                    shared_clauses[i].insert(c);
                }
            }
        }

        Table {
            bag,
            new_vars,
            shared_vars,
            children,
            local_clauses,
            shared_clauses,
            hard_weight: formula.hard_weight,
            rows: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn bag(&self) -> &[Var] {
        &self.bag
    }

    pub fn children(&self) -> &[Table] {
        &self.children
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn hard_weight(&self) -> Weight {
        self.hard_weight
    }

    /// The minimum cost over all rows, or `None` for an empty table.
    pub fn min_cost(&self) -> Option<Weight> {
        self.rows.iter().map(|r| r.cost).min()
    }

    /// Fills the tables of the whole subtree, children strictly first.
    ///
    /// Returns `false` if the deadline expired before the subtree was
    /// complete; already-computed tables are left intact.
    pub fn compute(&mut self, formula: &Formula, deadline: Option<Instant>) -> bool {
        for child in &mut self.children {
            if !child.compute(formula, deadline) {
                return false;
            }
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            info!("deadline expired, leaving table of bag {:?} incomplete", self.bag);
            return false;
        }

        debug!("computing table of bag {:?}", self.bag);
        if self.children.iter().any(|c| c.rows.is_empty()) {
            // The child-row product is empty; so is this table.
            return true;
        }
        let mut ept: Ept = vec![0; self.children.len()];
        loop {
            self.process_ept(&ept, formula);

            // Odometer increment over the child row indices.
            let mut i = 0;
            loop {
                if i == ept.len() {
                    debug!("table of bag {:?} has {} rows", self.bag, self.rows.len());
                    return true;
                }
                ept[i] += 1;
                if ept[i] < self.children[i].rows.len() {
                    break;
                }
                ept[i] = 0;
                i += 1;
            }
        }
    }

    /// True iff all rows of the tuple agree on their shared variables.
    fn joinable(&self, ept: &Ept) -> bool {
        assert_eq!(ept.len(), self.children.len(), "row tuple of mismatched arity");
        for (i, &r) in ept.iter().enumerate() {
            for (j, &s) in ept.iter().enumerate().skip(i + 1) {
                let a = &self.children[i].rows[r].assignment;
                let b = &self.children[j].rows[s].assignment;
                if !a.consistent(b) {
                    return false;
                }
            }
        }
        true
    }

    /// Generates all rows arising from one child-row combination.
    fn process_ept(&mut self, ept: &Ept, formula: &Formula) {
        if !self.joinable(ept) {
            return;
        }

        let restricted: Vec<Assignment> = ept
            .iter()
            .enumerate()
            .map(|(i, &r)| self.children[i].rows[r].assignment.restrict(&self.shared_vars[i]))
            .collect();
        let inherited = Assignment::combine(&restricted);

        // Clauses shared with a child stay visible here and get counted
        // again locally, so their weight is kept out of the forgotten cost.
        let mut forgotten_cost: Weight = 0;
        for (i, &r) in ept.iter().enumerate() {
            let row = &self.children[i].rows[r];
            let shared_weight: Weight = row
                .falsified
                .iter()
                .filter(|c| self.shared_clauses[i].contains(c))
                .map(|&c| formula.clauses[c].weight)
                .sum();
            forgotten_cost += row.cost - shared_weight;
        }

        for bits in 0..(1u64 << self.new_vars.len()) {
            let assignment = inherited.extend_disjoint(&self.new_vars, bits);
            let falsified: BTreeSet<usize> = self
                .local_clauses
                .iter()
                .copied()
                .filter(|&c| formula.clauses[c].falsified(&assignment))
                .collect();
            let local_weight: Weight = falsified.iter().map(|&c| formula.clauses[c].weight).sum();
            let cost = forgotten_cost + local_weight;

            match self.index.get(&assignment) {
                Some(&i) => {
                    let row = &mut self.rows[i];
                    if cost < row.cost {
                        row.falsified = falsified;
                        row.cost = cost;
                        row.epts = vec![ept.clone()];
                    } else if cost == row.cost {
                        // Equal cost under the same local assignment must
                        // come with the same locally falsified clauses.
                        assert_eq!(
                            row.falsified, falsified,
                            "cost-equal rows disagree on falsified clauses"
                        );
                        row.epts.push(ept.clone());
                    }
                }
                None => {
                    self.index.insert(assignment.clone(), self.rows.len());
                    self.rows.push(Row::new(assignment, falsified, cost, ept.clone()));
                }
            }
        }
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        for row in &self.rows {
            writeln!(f, "{}{}", "  ".repeat(depth), row)?;
        }
        for child in &self.children {
            child.fmt_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}
