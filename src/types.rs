//! Type-safe wrappers for formula variables and literals.
//!
//! This module provides newtype wrappers that enforce compile-time distinction
//! between variable ids, signed literals, and clause weights, preventing
//! common mistakes in decomposition and table-construction code.

use std::fmt;
use std::ops::Neg;

/// The weight of a clause, and the unit in which row costs are accumulated.
///
/// A clause whose weight reaches the formula's hard-weight threshold is a
/// *hard* clause; a row whose cost reaches the threshold violates a hard
/// clause somewhere in its subtree.
pub type Weight = u64;

/// A variable identifier (1-indexed).
///
/// Variables are stable integer ids taken from the input file. Unlike bag
/// positions, they never change during decomposition or table computation.
///
/// # Invariants
///
/// - Variable ids must be >= 1 (0 is reserved by the DIMACS-family formats
///   as the clause terminator)
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Var(u32);

impl Var {
    /// Creates a new variable with the given id.
    ///
    /// # Panics
    ///
    /// Panics if `id == 0`. Variables must be 1-indexed.
    pub fn new(id: u32) -> Self {
        assert_ne!(id, 0, "Variable ids must be >= 1");
        Var(id)
    }

    /// Returns the raw variable id as a `u32`.
    pub fn id(self) -> u32 {
        self.0
    }

    /// Returns the positive literal over this variable.
    pub fn pos(self) -> Lit {
        Lit::new(self, true)
    }

    /// Returns the negative literal over this variable.
    pub fn neg(self) -> Lit {
        Lit::new(self, false)
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

impl From<Var> for u32 {
    fn from(var: Var) -> Self {
        var.0
    }
}

/// A signed literal: a variable together with a polarity.
///
/// The DIMACS encoding is the signed integer whose magnitude is the variable
/// id and whose sign is the polarity.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Lit {
    var: Var,
    positive: bool,
}

impl Lit {
    pub fn new(var: Var, positive: bool) -> Self {
        Lit { var, positive }
    }

    /// Parses a literal from its signed DIMACS form.
    ///
    /// # Panics
    ///
    /// Panics if `value == 0` (the clause terminator is not a literal).
    pub fn from_dimacs(value: i32) -> Self {
        assert_ne!(value, 0, "0 terminates a clause and is not a literal");
        Lit {
            var: Var::new(value.unsigned_abs()),
            positive: value > 0,
        }
    }

    /// Returns the signed DIMACS form of the literal.
    pub fn to_dimacs(self) -> i32 {
        let v = self.var.id() as i32;
        if self.positive {
            v
        } else {
            -v
        }
    }

    pub fn var(self) -> Var {
        self.var
    }

    pub fn is_positive(self) -> bool {
        self.positive
    }

    pub fn negate(self) -> Self {
        Lit {
            var: self.var,
            positive: !self.positive,
        }
    }
}

impl Neg for Lit {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negate()
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_dimacs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_creation() {
        let v1 = Var::new(1);
        let v2 = Var::new(2);
        assert_eq!(v1.id(), 1);
        assert_eq!(v2.id(), 2);
        assert!(v1 < v2);
    }

    #[test]
    #[should_panic(expected = "Variable ids must be >= 1")]
    fn test_var_zero_panics() {
        Var::new(0);
    }

    #[test]
    fn test_lit_dimacs_roundtrip() {
        for value in [1, -1, 5, -42] {
            let lit = Lit::from_dimacs(value);
            assert_eq!(lit.to_dimacs(), value);
        }
    }

    #[test]
    fn test_lit_negation() {
        let lit = Var::new(3).pos();
        assert!(lit.is_positive());
        assert_eq!(-lit, Var::new(3).neg());
        assert_eq!((-lit).to_dimacs(), -3);
        assert_eq!(-(-lit), lit);
    }
}
