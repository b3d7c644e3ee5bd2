//! # tdmax: treewidth-based Weighted MaxSAT solving and preprocessing
//!
//! **`tdmax`** exploits bounded treewidth to solve and simplify Weighted
//! MaxSAT instances: it builds a tree decomposition of the formula's
//! variable-interaction graph and runs a bottom-up dynamic program over it,
//! tracking for every locally consistent partial assignment the minimum
//! clause weight that must be violated.
//!
//! ## Pipeline
//!
//! 1. Parse a WCNF instance ([`formula`]).
//! 2. Build the primal graph and decompose it by greedy vertex elimination
//!    ([`graph`], [`decompose`]), optionally bounded in width and time.
//! 3. Normalize the decomposition into binary-join form ([`td`]).
//! 4. Compute one DP table per node, children first ([`table`]).
//! 5. Read off the optimum, enumerate optimal witnesses lazily
//!    ([`extensions`]), extract unsatisfiable cores ([`cores`]), or rewrite
//!    the formula ([`preprocess`]).
//!
//! ## Basic Usage
//!
//! ```rust
//! use tdmax::decompose::{DecomposeConfig, Decomposer};
//! use tdmax::formula::Formula;
//! use tdmax::table::Table;
//!
//! let wcnf = "p wcnf 2 2 10\n10 -1 -2 0\n5 1 0\n";
//! let formula = Formula::parse(wcnf.as_bytes()).unwrap();
//!
//! let decomposition =
//!     Decomposer::new(&formula.primal_graph(), DecomposeConfig::default()).decompose();
//! let mut table = Table::new(&decomposition.roots[0], &formula);
//! table.compute(&formula, None);
//!
//! assert!(table.sat());
//! assert_eq!(table.min_cost(), Some(0));
//! ```
//!
//! Instances whose primal graph has small treewidth are solved exactly; for
//! everything else, a width bound yields partial decompositions that the
//! [`preprocess`] module turns into an equivalent, often smaller formula.

pub mod assignment;
pub mod cores;
pub mod decompose;
pub mod extensions;
pub mod formula;
pub mod graph;
pub mod preprocess;
pub mod table;
pub mod td;
pub mod types;
