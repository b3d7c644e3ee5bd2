//! Bit-packed partial assignments over an ordered variable list.
//!
//! An [`Assignment`] stores a duplicate-free, ordered list of variables and
//! one truth bit per variable. The first listed variable occupies the most
//! significant bit of the field; this convention is fixed here and relied on
//! by the whole DP engine.
//!
//! Assignments are immutable values: `restrict`, `extend_disjoint` and
//! `combine` all build new assignments. Equality is order-sensitive (same
//! variable list, same bits), because tables key rows on assignments over a
//! fixed bag ordering.

use crate::types::{Lit, Var};

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Assignment {
    variables: Vec<Var>,
    bits: u64,
}

impl Assignment {
    /// Creates an assignment over `variables` with the given truth bits.
    ///
    /// # Panics
    ///
    /// Panics if the variable list contains duplicates, is longer than 64
    /// (the bit-field width), or if `bits` has bits set beyond the list
    /// length.
    pub fn new(variables: Vec<Var>, bits: u64) -> Self {
        assert!(variables.len() <= 64, "bags wider than 64 variables are not supported");
        for (i, v) in variables.iter().enumerate() {
            assert!(!variables[..i].contains(v), "duplicate variable {} in assignment", v);
        }
        if variables.len() < 64 {
            assert_eq!(bits >> variables.len(), 0, "unused bits must be zero");
        }
        Assignment { variables, bits }
    }

    /// The empty assignment.
    pub fn empty() -> Self {
        Assignment { variables: Vec::new(), bits: 0 }
    }

    pub fn variables(&self) -> &[Var] {
        &self.variables
    }

    pub fn bits(&self) -> u64 {
        self.bits
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Returns the truth bit with the given index, counted from the right
    /// (the *last* listed variable has index 0).
    pub fn bit(&self, index: usize) -> bool {
        assert!(index < self.variables.len(), "bit index out of range");
        (self.bits >> index) & 1 != 0
    }

    /// Returns the truth value of `var`, or `None` if the assignment does
    /// not mention it.
    pub fn value(&self, var: Var) -> Option<bool> {
        let position = self.variables.iter().position(|&v| v == var)?;
        Some(self.bit(self.variables.len() - 1 - position))
    }

    /// True iff every variable shared between the two assignments has the
    /// same truth value in both.
    pub fn consistent(&self, other: &Assignment) -> bool {
        self.variables
            .iter()
            .filter_map(|&v| Some((self.value(v)?, other.value(v)?)))
            .all(|(a, b)| a == b)
    }

    /// Projects onto the given variable list, dropping variables the
    /// assignment does not mention and preserving the order of the request.
    pub fn restrict(&self, variables: &[Var]) -> Assignment {
        let mut vars = Vec::new();
        let mut bits = 0u64;
        for &v in variables {
            if let Some(value) = self.value(v) {
                vars.push(v);
                bits = (bits << 1) | value as u64;
            }
        }
        Assignment::new(vars, bits)
    }

    /// Extends this assignment by a variable-disjoint one, appending
    /// `new_vars` (with truth bits `new_bits`) after the existing variables.
    ///
    /// # Panics
    ///
    /// Panics if `new_vars` shares a variable with this assignment.
    pub fn extend_disjoint(&self, new_vars: &[Var], new_bits: u64) -> Assignment {
        for v in new_vars {
            assert!(
                !self.variables.contains(v),
                "extend_disjoint: variable {} already assigned",
                v
            );
        }
        if new_vars.is_empty() {
            return self.clone();
        }
        let mut variables = self.variables.clone();
        variables.extend_from_slice(new_vars);
        let bits = (self.bits << new_vars.len()) | new_bits;
        Assignment::new(variables, bits)
    }

    /// Combines several assignments into one, keeping each variable's
    /// *first* occurrence among the inputs.
    ///
    /// All inputs must be pairwise consistent; callers must never use the
    /// first-occurrence rule to resolve conflicting values.
    ///
    /// # Panics
    ///
    /// Panics if two inputs assign a shared variable differently.
    pub fn combine<'a>(assignments: impl IntoIterator<Item = &'a Assignment>) -> Assignment {
        let assignments: Vec<&Assignment> = assignments.into_iter().collect();
        for (i, a) in assignments.iter().enumerate() {
            for b in &assignments[i + 1..] {
                assert!(a.consistent(b), "combining inconsistent assignments");
            }
        }

        let mut variables: Vec<Var> = Vec::new();
        let mut bits = 0u64;
        for a in &assignments {
            for (position, &v) in a.variables.iter().enumerate() {
                if !variables.contains(&v) {
                    let value = a.bit(a.variables.len() - 1 - position);
                    variables.push(v);
                    bits = (bits << 1) | value as u64;
                }
            }
        }
        Assignment::new(variables, bits)
    }

    /// Converts to signed-literal form, one literal per variable in
    /// assignment order.
    pub fn to_literals(&self) -> Vec<Lit> {
        self.variables
            .iter()
            .enumerate()
            .map(|(position, &v)| {
                let value = self.bit(self.variables.len() - 1 - position);
                Lit::new(v, value)
            })
            .collect()
    }
}

impl std::fmt::Display for Assignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let literals: Vec<String> = self.to_literals().iter().map(Lit::to_string).collect();
        write!(f, "[{}]", literals.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(id: u32) -> Var {
        Var::new(id)
    }

    fn a(vars: impl IntoIterator<Item = u32>, bits: u64) -> Assignment {
        Assignment::new(vars.into_iter().map(Var::new).collect(), bits)
    }

    #[test]
    fn test_bit() {
        // {-1, 2}: first variable is the most significant bit.
        let a1 = a([1, 2], 0b01);
        assert!(a1.bit(0));
        assert!(!a1.bit(1));

        // {1, -2}
        let a2 = a([1, 2], 0b10);
        assert!(!a2.bit(0));
        assert!(a2.bit(1));
    }

    #[test]
    fn test_value() {
        let a1 = a([1, 2], 0b01);
        assert_eq!(a1.value(v(1)), Some(false));
        assert_eq!(a1.value(v(2)), Some(true));
        assert_eq!(a1.value(v(3)), None);
    }

    #[test]
    fn test_consistent() {
        let a1 = a([1, 2], 0b01); // {-1, 2}
        let a2 = a([1, 2], 0b10); // {1, -2}
        let a3 = a([2], 0b0); // {-2}
        let a4 = a([3], 0b1); // {3}

        assert!(a1.consistent(&a1));
        assert!(!a1.consistent(&a2));
        assert!(!a1.consistent(&a3));
        assert!(a1.consistent(&a4));
        assert!(a2.consistent(&a3));
        assert!(a3.consistent(&a4));
        assert!(!a3.consistent(&a1));
    }

    #[test]
    fn test_restrict() {
        let full = a([1, 2, 3], 0b101); // {1, -2, 3}
        let restricted = full.restrict(&[v(3), v(1)]);
        assert_eq!(restricted.variables(), &[v(3), v(1)]);
        assert_eq!(restricted.value(v(3)), Some(true));
        assert_eq!(restricted.value(v(1)), Some(true));
        // Variables not mentioned are dropped.
        let restricted = full.restrict(&[v(2), v(7)]);
        assert_eq!(restricted.variables(), &[v(2)]);
        assert_eq!(restricted.value(v(2)), Some(false));
    }

    #[test]
    fn test_extend_disjoint() {
        let a1 = a([1, 2], 0b01); // {-1, 2}
        let a4 = a([3], 0b1); // {3}

        let a1a4 = a1.extend_disjoint(a4.variables(), a4.bits());
        assert_eq!(a1a4.value(v(1)), Some(false));
        assert_eq!(a1a4.value(v(2)), Some(true));
        assert_eq!(a1a4.value(v(3)), Some(true));

        let a4a1 = a4.extend_disjoint(a1.variables(), a1.bits());
        assert_eq!(a4a1.value(v(1)), Some(false));
        assert_eq!(a4a1.value(v(2)), Some(true));
        assert_eq!(a4a1.value(v(3)), Some(true));
    }

    #[test]
    #[should_panic(expected = "already assigned")]
    fn test_extend_disjoint_overlap_panics() {
        let a1 = a([1, 2], 0b01);
        a1.extend_disjoint(&[v(2)], 0b1);
    }

    #[test]
    fn test_combine() {
        let a1 = a([1, 2], 0b01); // {-1, 2}
        let a2 = a([1, 2], 0b10); // {1, -2}
        let a3 = a([2], 0b0); // {-2}
        let a4 = a([3], 0b1); // {3}

        assert_eq!(Assignment::combine([&a1, &a1]), a1);

        let a1a4 = Assignment::combine([&a1, &a4]);
        assert_eq!(a1a4.value(v(1)), Some(false));
        assert_eq!(a1a4.value(v(2)), Some(true));
        assert_eq!(a1a4.value(v(3)), Some(true));

        let a2a3 = Assignment::combine([&a2, &a3]);
        assert_eq!(a2a3.variables(), &[v(1), v(2)]);
        assert_eq!(a2a3.value(v(1)), Some(true));
        assert_eq!(a2a3.value(v(2)), Some(false));

        let a2a3a4 = Assignment::combine([&a2, &a3, &a4]);
        assert_eq!(a2a3a4.value(v(1)), Some(true));
        assert_eq!(a2a3a4.value(v(2)), Some(false));
        assert_eq!(a2a3a4.value(v(3)), Some(true));
    }

    #[test]
    fn test_combine_empty() {
        assert_eq!(Assignment::combine([]), Assignment::empty());
    }

    #[test]
    #[should_panic(expected = "inconsistent")]
    fn test_combine_inconsistent_panics() {
        let a1 = a([1, 2], 0b01);
        let a2 = a([1, 2], 0b10);
        Assignment::combine([&a1, &a2]);
    }

    #[test]
    fn test_combine_commutative_on_values() {
        let x = a([1, 2], 0b10);
        let y = a([2, 3], 0b01);
        let xy = Assignment::combine([&x, &y]);
        let yx = Assignment::combine([&y, &x]);
        // Variable order differs, but the assigned values agree.
        for var in [v(1), v(2), v(3)] {
            assert_eq!(xy.value(var), yx.value(var));
        }
    }

    #[test]
    fn test_combine_associative_on_values() {
        let x = a([1, 2], 0b10); // {1, -2}
        let y = a([2, 3], 0b01); // {-2, 3}
        let z = a([3, 4], 0b11); // {3, 4}
        let left = Assignment::combine([&Assignment::combine([&x, &y]), &z]);
        let right = Assignment::combine([&x, &Assignment::combine([&y, &z])]);
        // Variable bookkeeping may differ, but the assigned values agree.
        for var in [v(1), v(2), v(3), v(4)] {
            assert_eq!(left.value(var), right.value(var));
            assert_eq!(left.value(var), Assignment::combine([&x, &y, &z]).value(var));
        }
    }

    #[test]
    fn test_to_literals() {
        let a1 = a([1, 2], 0b01);
        let lits: Vec<i32> = a1.to_literals().iter().map(|l| l.to_dimacs()).collect();
        assert_eq!(lits, vec![-1, 2]);

        let a4 = a([3], 0b1);
        let lits: Vec<i32> = a4.to_literals().iter().map(|l| l.to_dimacs()).collect();
        assert_eq!(lits, vec![3]);
    }

    #[test]
    fn test_to_literals_roundtrip() {
        // For all bit patterns over up to 6 variables, converting to literals
        // and back recovers the original assignment.
        for width in 0..=6u32 {
            for bits in 0..(1u64 << width) {
                let original = a(1..=width, bits);
                let mut vars = Vec::new();
                let mut rebuilt_bits = 0u64;
                for lit in original.to_literals() {
                    vars.push(lit.var());
                    rebuilt_bits = (rebuilt_bits << 1) | lit.is_positive() as u64;
                }
                assert_eq!(Assignment::new(vars, rebuilt_bits), original);
            }
        }
    }

    #[test]
    fn test_restrict_extend_roundtrip() {
        // Restricting to a prefix and extending by the complement recovers
        // the original assignment.
        let original = a([1, 2, 3, 4], 0b1010);
        let prefix = original.restrict(&[v(1), v(2)]);
        let suffix = original.restrict(&[v(3), v(4)]);
        let rebuilt = prefix.extend_disjoint(suffix.variables(), suffix.bits());
        assert_eq!(rebuilt, original);
    }
}
