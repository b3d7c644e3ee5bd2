//! Tree-decomposition nodes and structural transforms.
//!
//! A [`Td`] is one node of a tree decomposition: a bag of variables plus the
//! owned subtrees below it. Parent links are deliberately absent — a node's
//! "parentless" status is tracked by the decomposer's root worklist, so
//! dropping a subtree never has to visit its parent.
//!
//! The transforms in this module rewrite the tree while preserving the
//! tree-decomposition property: every clause's variables stay inside some
//! bag, and for any two bags sharing a variable, every bag on the path
//! between them contains that variable as well (running intersection).

use std::collections::BTreeSet;
use std::fmt;

use crate::types::Var;

/// A tree-decomposition node: a bag of variables and its owned children.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Td {
    bag: BTreeSet<Var>,
    children: Vec<Td>,
}

impl Td {
    pub fn new(bag: BTreeSet<Var>) -> Self {
        Td { bag, children: Vec::new() }
    }

    pub fn bag(&self) -> &BTreeSet<Var> {
        &self.bag
    }

    pub fn children(&self) -> &[Td] {
        &self.children
    }

    pub fn add_child(&mut self, child: Td) {
        self.children.push(child);
    }

    /// Returns the variables first constrained at this node: the bag minus
    /// the union of all children's bags.
    pub fn introduced(&self) -> BTreeSet<Var> {
        let mut result = self.bag.clone();
        for child in &self.children {
            for v in &child.bag {
                result.remove(v);
            }
        }
        result
    }

    /// Returns, for each child, the separator: the bag variables also present
    /// in that child's bag, in this bag's (ascending) order.
    pub fn shared(&self) -> Vec<Vec<Var>> {
        self.children
            .iter()
            .map(|c| self.bag.iter().copied().filter(|v| c.bag.contains(v)).collect())
            .collect()
    }

    /// Returns the size of the largest bag in the subtree, minus one.
    pub fn width(&self) -> usize {
        let own = self.bag.len().saturating_sub(1);
        self.children.iter().map(Td::width).fold(own, usize::max)
    }

    /// Returns the union of every bag in the subtree.
    pub fn union_of_bags(&self) -> BTreeSet<Var> {
        let mut result = self.bag.clone();
        for child in &self.children {
            result.extend(child.union_of_bags());
        }
        result
    }

    /// Recursively removes every child whose bag is a subset of its parent's
    /// bag, reparenting the grandchildren directly under the parent.
    ///
    /// This preserves the tree-decomposition property because the separator
    /// between the adopted grandchildren and the parent only shrinks.
    pub fn remove_subset_children(&mut self) {
        // Adopted grandchildren go back on the queue: they may themselves be
        // subsets of this bag.
        let mut queue = std::mem::take(&mut self.children);
        let mut kept = Vec::new();
        while !queue.is_empty() {
            for mut child in std::mem::take(&mut queue) {
                if child.bag.is_subset(&self.bag) {
                    queue.append(&mut child.children);
                } else {
                    child.remove_subset_children();
                    kept.push(child);
                }
            }
        }
        self.children = kept;
    }

    /// Recursively rotates up every child whose bag is a superset of its
    /// parent's bag: the child becomes the new subtree root and the parent's
    /// other children are attached underneath it.
    ///
    /// Returns the (possibly new) subtree root.
    pub fn move_superset_children(mut self) -> Td {
        if let Some(i) = self.children.iter().position(|c| c.bag.is_superset(&self.bag)) {
            let mut new_root = self.children.swap_remove(i);
            for other in self.children {
                new_root.add_child(other);
            }
            return new_root.move_superset_children();
        }

        self.children = self
            .children
            .into_iter()
            .map(Td::move_superset_children)
            .collect();
        self
    }

    /// Rewrites the subtree so that any node with two or more children has a
    /// bag equal to each child's bag (binary-join normal form, postorder).
    ///
    /// A multi-child node first gains a single synthetic join child whose bag
    /// is the intersection of its own bag with the union of the children's
    /// bags; each original child is then attached to the join node either
    /// directly (if its bag already equals the join bag) or via an
    /// intermediate node carrying the join bag.
    ///
    /// Idempotent: normalizing an already-normalized tree changes nothing.
    pub fn weakly_normalize(&mut self) {
        for child in &mut self.children {
            child.weakly_normalize();
        }

        if self.children.len() < 2 {
            return;
        }

        let children = std::mem::take(&mut self.children);
        let child_union: BTreeSet<Var> = children.iter().flat_map(|c| c.bag.iter().copied()).collect();
        let join_bag: BTreeSet<Var> = child_union.intersection(&self.bag).copied().collect();

        let mut wrapped = Vec::with_capacity(children.len());
        for child in children {
            if child.bag == join_bag {
                wrapped.push(child);
            } else {
                let mut intermediate = Td::new(join_bag.clone());
                intermediate.add_child(child);
                wrapped.push(intermediate);
            }
        }

        if join_bag == self.bag {
            // The node itself acts as the join node.
            self.children = wrapped;
        } else {
            let mut join_node = Td::new(join_bag);
            join_node.children = wrapped;
            self.children = vec![join_node];
        }
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let bag: Vec<String> = self.bag.iter().map(|v| v.id().to_string()).collect();
        write!(f, "{}{}", "  ".repeat(depth), bag.join(","))?;
        for child in &self.children {
            writeln!(f)?;
            child.fmt_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for Td {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}
