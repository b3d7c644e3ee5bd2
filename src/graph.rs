//! Undirected variable-interaction graph with elimination heuristics.
//!
//! The graph is consumed destructively by the [`Decomposer`]: eliminating a
//! vertex turns its neighborhood into a clique and removes the vertex from
//! every neighbor set. Two greedy elimination heuristics are provided,
//! min-degree and min-fill, both width-bounded.
//!
//! [`Decomposer`]: crate::decompose::Decomposer

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::types::Var;

/// An undirected graph over positive integer vertex ids.
///
/// The adjacency structure is symmetric (`x` is a neighbor of `y` iff `y` is
/// a neighbor of `x`) and has no self-loops. Vertex sets are ordered, so all
/// iteration is in ascending id order; the heuristics below rely on this for
/// their documented lowest-id tie-break.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Graph {
    vertices: BTreeSet<Var>,
    neighbors: BTreeMap<Var, BTreeSet<Var>>,
}

impl Graph {
    /// Creates an edgeless graph over the vertices `1..=num_vertices`.
    pub fn new(num_vertices: u32) -> Self {
        let vertices: BTreeSet<Var> = (1..=num_vertices).map(Var::new).collect();
        let neighbors = vertices.iter().map(|&v| (v, BTreeSet::new())).collect();
        Graph { vertices, neighbors }
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn vertices(&self) -> &BTreeSet<Var> {
        &self.vertices
    }

    pub fn contains(&self, v: Var) -> bool {
        self.vertices.contains(&v)
    }

    /// Returns the open neighborhood of `v`.
    ///
    /// # Panics
    ///
    /// Panics if `v` is not a vertex of the graph.
    pub fn neighbors(&self, v: Var) -> &BTreeSet<Var> {
        &self.neighbors[&v]
    }

    pub fn degree(&self, v: Var) -> usize {
        self.neighbors[&v].len()
    }

    /// Returns the closed neighborhood of `v`: the vertex itself plus all its
    /// neighbors. This is the bag created when `v` is eliminated.
    pub fn neighborhood(&self, v: Var) -> BTreeSet<Var> {
        let mut bag = self.neighbors[&v].clone();
        bag.insert(v);
        bag
    }

    /// Adds the undirected edge `{x, y}`. Adding an existing edge is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if either endpoint is not a vertex, or if `x == y`.
    pub fn add_edge(&mut self, x: Var, y: Var) {
        assert!(self.vertices.contains(&x), "{} is not a vertex", x);
        assert!(self.vertices.contains(&y), "{} is not a vertex", y);
        assert_ne!(x, y, "self-loops are not allowed");
        self.neighbors.get_mut(&x).unwrap().insert(y);
        self.neighbors.get_mut(&y).unwrap().insert(x);
    }

    /// Removes `v` from the graph and from every neighbor set.
    ///
    /// # Panics
    ///
    /// Panics if `v` is not a vertex of the graph.
    pub fn remove_vertex(&mut self, v: Var) {
        assert!(self.vertices.remove(&v), "{} is not a vertex", v);
        let neighbors = self.neighbors.remove(&v).unwrap();
        for x in neighbors {
            self.neighbors.get_mut(&x).unwrap().remove(&v);
        }
    }

    /// Counts the pairs of neighbors of `v` that are not adjacent, i.e. the
    /// number of fill-in edges that eliminating `v` would introduce.
    pub fn fill_in(&self, v: Var) -> usize {
        let neighbors: Vec<Var> = self.neighbors[&v].iter().copied().collect();
        let mut count = 0;
        for (i, &x) in neighbors.iter().enumerate() {
            for &y in &neighbors[i + 1..] {
                if !self.neighbors[&x].contains(&y) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Returns the vertex of minimum degree among vertices of degree at most
    /// `max_width`, or `None` if no vertex satisfies the bound.
    ///
    /// Ties are broken toward the lowest vertex id.
    pub fn min_degree_vertex(&self, max_width: Option<usize>) -> Option<Var> {
        let mut result = None;
        let mut min_degree = usize::MAX;
        for &v in &self.vertices {
            let degree = self.degree(v);
            if max_width.is_some_and(|w| degree > w) {
                continue;
            }
            if degree < min_degree {
                min_degree = degree;
                result = Some(v);
            }
        }
        result
    }

    /// Returns the vertex of minimum fill-in among vertices of degree at most
    /// `max_width`, or `None` if no vertex satisfies the bound.
    ///
    /// Ties are broken toward the lowest vertex id.
    pub fn min_fill_vertex(&self, max_width: Option<usize>) -> Option<Var> {
        let mut result = None;
        let mut min_fill = usize::MAX;
        for &v in &self.vertices {
            if max_width.is_some_and(|w| self.degree(v) > w) {
                continue;
            }
            let fill = self.fill_in(v);
            if fill < min_fill {
                min_fill = fill;
                result = Some(v);
            }
        }
        result
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut edges = Vec::new();
        for (&x, neighbors) in &self.neighbors {
            for &y in neighbors {
                if x < y {
                    edges.push((x.id(), y.id()));
                }
            }
        }
        let vertices: Vec<u32> = self.vertices.iter().map(|v| v.id()).collect();
        write!(f, "V = {:?}, E = {:?}", vertices, edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(id: u32) -> Var {
        Var::new(id)
    }

    /// The 6-vertex graph for which min-fill and min-degree produce
    /// decompositions of different widths (3 vs. 4).
    fn prism_graph() -> Graph {
        let mut g = Graph::new(6);
        for (x, y) in [(1, 2), (1, 3), (1, 4), (2, 5), (2, 6), (3, 5), (3, 6), (4, 5), (4, 6), (5, 6)] {
            g.add_edge(v(x), v(y));
        }
        g
    }

    #[test]
    fn test_add_edge_symmetric() {
        let mut g = Graph::new(3);
        g.add_edge(v(1), v(2));
        assert!(g.neighbors(v(1)).contains(&v(2)));
        assert!(g.neighbors(v(2)).contains(&v(1)));
        assert!(!g.neighbors(v(3)).contains(&v(1)));
        // Duplicate insertion is a no-op.
        g.add_edge(v(2), v(1));
        assert_eq!(g.degree(v(1)), 1);
    }

    #[test]
    #[should_panic(expected = "self-loops")]
    fn test_self_loop_panics() {
        let mut g = Graph::new(2);
        g.add_edge(v(1), v(1));
    }

    #[test]
    fn test_remove_vertex() {
        let mut g = Graph::new(3);
        g.add_edge(v(1), v(2));
        g.add_edge(v(2), v(3));
        g.remove_vertex(v(2));
        assert_eq!(g.num_vertices(), 2);
        assert!(g.neighbors(v(1)).is_empty());
        assert!(g.neighbors(v(3)).is_empty());
    }

    #[test]
    fn test_neighborhood_is_closed() {
        let mut g = Graph::new(3);
        g.add_edge(v(1), v(2));
        let bag = g.neighborhood(v(1));
        assert_eq!(bag, [v(1), v(2)].into_iter().collect());
    }

    #[test]
    fn test_min_degree_vertex() {
        let g = prism_graph();
        // Vertices 1..=4 all have degree 3; the lowest id wins.
        assert_eq!(g.min_degree_vertex(None), Some(v(1)));
        assert_eq!(g.min_degree_vertex(Some(3)), Some(v(1)));
        assert_eq!(g.min_degree_vertex(Some(2)), None);
    }

    #[test]
    fn test_min_fill_vertex() {
        let g = prism_graph();
        // Eliminating 1 requires connecting {2,3}, {2,4}, {3,4}: fill 3.
        assert_eq!(g.fill_in(v(1)), 3);
        // Eliminating 2 only requires connecting {1,5} and {1,6}: fill 2.
        assert_eq!(g.fill_in(v(2)), 2);
        assert_eq!(g.min_fill_vertex(None), Some(v(2)));
        assert_eq!(g.min_fill_vertex(Some(2)), None);
    }

    #[test]
    fn test_min_degree_empty_graph() {
        let g = Graph::new(0);
        assert_eq!(g.min_degree_vertex(None), None);
        assert_eq!(g.min_fill_vertex(None), None);
    }
}
