//! Greedy elimination-order tree decomposition.
//!
//! The [`Decomposer`] owns a private copy of the interaction graph and
//! repeatedly eliminates vertices chosen by a [`Heuristic`], building one
//! tree-decomposition node per eliminated vertex. Under a width bound the
//! elimination may stall before the graph is empty; the result then carries
//! one or more partial decompositions plus the undecomposed remainder, and
//! the caller decides what to do with them.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use log::{debug, info};

use crate::graph::Graph;
use crate::td::Td;
use crate::types::Var;

/// The closed set of vertex-elimination heuristics.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum Heuristic {
    /// Eliminate a vertex of minimum degree.
    #[default]
    MinDegree,
    /// Eliminate a vertex introducing the fewest fill-in edges.
    MinFill,
}

impl Heuristic {
    /// Returns the next vertex to eliminate, or `None` if no vertex
    /// satisfies the width bound. Ties go to the lowest vertex id.
    pub fn select(self, graph: &Graph, max_width: Option<usize>) -> Option<Var> {
        match self {
            Heuristic::MinDegree => graph.min_degree_vertex(max_width),
            Heuristic::MinFill => graph.min_fill_vertex(max_width),
        }
    }
}

/// Configuration for one decomposition run.
#[derive(Debug, Clone, Default)]
pub struct DecomposeConfig {
    /// Vertex-selection heuristic.
    pub heuristic: Heuristic,
    /// If set, only eliminate vertices whose current degree is at most this
    /// bound, i.e. only produce bags of width at most `max_width`. Vertices
    /// that cannot be eliminated within the bound end up in the remainder.
    pub max_width: Option<usize>,
    /// Weakly normalize every produced root (binary-join normal form).
    pub normalize: bool,
    /// If a produced root's bag is not a subset of the remainder, synthesize
    /// a smaller parent carrying the intersection with the remainder.
    pub minimize_roots: bool,
    /// Cooperative deadline: elimination stops at the first step after this
    /// instant, keeping everything produced so far.
    pub deadline: Option<Instant>,
}

/// The outcome of a decomposition run: zero or more tree roots plus the
/// set of vertices that were never eliminated.
///
/// In width-unbounded mode the remainder is empty and there is at most one
/// root. A width bound too tight to eliminate anything is not an error: it
/// yields no roots and the entire vertex set as remainder.
#[derive(Debug, Clone)]
pub struct Decomposition {
    pub roots: Vec<Td>,
    pub remainder: BTreeSet<Var>,
}

impl Decomposition {
    /// Maximum width over all roots, or `None` if there are no roots.
    pub fn width(&self) -> Option<usize> {
        self.roots.iter().map(Td::width).max()
    }
}

/// Builds a tree decomposition by vertex elimination.
///
/// All worklist state lives in this value, so independent runs are fully
/// isolated: the graph is deep-copied on construction and consumed
/// destructively.
pub struct Decomposer {
    graph: Graph,
    config: DecomposeConfig,
    /// Open (parentless) nodes. Attaching a node to a parent `take`s it out
    /// of its slot; stale slot indices are skipped as `None`.
    slots: Vec<Option<Td>>,
    /// Maps each vertex to the slots of the bags containing it.
    bags_containing: BTreeMap<Var, Vec<usize>>,
}

impl Decomposer {
    pub fn new(graph: &Graph, config: DecomposeConfig) -> Self {
        Decomposer {
            graph: graph.clone(),
            config,
            slots: Vec::new(),
            bags_containing: BTreeMap::new(),
        }
    }

    /// Eliminates `vertex`: forms a bag from its closed neighborhood, turns
    /// the neighborhood into a clique, removes the vertex from the graph, and
    /// adopts every open node containing the vertex as a child of the new
    /// node. The new node becomes an open root itself.
    fn eliminate(&mut self, vertex: Var) {
        let bag = self.graph.neighborhood(vertex);
        debug!("eliminate({}) -> bag {:?}", vertex, bag);

        // Fill-in edges.
        let neighbors: Vec<Var> = self.graph.neighbors(vertex).iter().copied().collect();
        for (i, &x) in neighbors.iter().enumerate() {
            for &y in &neighbors[i + 1..] {
                self.graph.add_edge(x, y);
            }
        }
        self.graph.remove_vertex(vertex);

        let mut node = Td::new(bag.clone());
        if let Some(slot_ids) = self.bags_containing.get(&vertex) {
            for &s in slot_ids {
                if let Some(open) = self.slots[s].take() {
                    node.add_child(open);
                }
            }
        }

        let slot = self.slots.len();
        self.slots.push(Some(node));
        for &v in &bag {
            self.bags_containing.entry(v).or_default().push(slot);
        }
    }

    /// Eliminates vertices as long as the heuristic finds one within the
    /// width bound and the deadline has not expired.
    fn do_eliminations(&mut self) {
        loop {
            if let Some(deadline) = self.config.deadline {
                if Instant::now() >= deadline {
                    info!("decomposition deadline reached, stopping eliminations");
                    return;
                }
            }
            match self.config.heuristic.select(&self.graph, self.config.max_width) {
                Some(v) => self.eliminate(v),
                None => return,
            }
        }
    }

    /// Connects roots that are disjoint from `remainder` into a single chain.
    ///
    /// Only remainder-disjoint roots may be joined: an anchor edge between
    /// them cannot introduce a spurious shared-variable path, because any
    /// variable they could share has already been eliminated into both.
    fn connect_roots(roots: Vec<Td>, remainder: &BTreeSet<Var>) -> Vec<Td> {
        let (connect, ignore): (Vec<Td>, Vec<Td>) =
            roots.into_iter().partition(|td| td.bag().is_disjoint(remainder));
        if connect.is_empty() {
            return ignore;
        }
        let mut chained: Option<Td> = None;
        for td in connect.into_iter().rev() {
            let mut td = td;
            if let Some(below) = chained.take() {
                td.add_child(below);
            }
            chained = Some(td);
        }
        let mut result = vec![chained.unwrap()];
        result.extend(ignore);
        result
    }

    /// Runs the full decomposition using the parameters given at
    /// construction and returns the roots plus the undecomposed remainder.
    pub fn decompose(mut self) -> Decomposition {
        self.do_eliminations();

        let mut roots: Vec<Td> = self.slots.into_iter().flatten().collect();
        let remainder: BTreeSet<Var> = self.graph.vertices().clone();
        info!(
            "eliminations done: {} open root(s), {} remainder vertices",
            roots.len(),
            remainder.len()
        );

        for td in &mut roots {
            td.remove_subset_children();
        }
        let roots: Vec<Td> = roots.into_iter().map(Td::move_superset_children).collect();
        let mut roots = Self::connect_roots(roots, &remainder);

        for td in &mut roots {
            if self.config.normalize {
                td.weakly_normalize();
            }
            if self.config.minimize_roots {
                let intersection: BTreeSet<Var> =
                    td.bag().intersection(&remainder).copied().collect();
                if intersection.len() < td.bag().len() {
                    let mut new_root = Td::new(intersection);
                    new_root.add_child(std::mem::replace(td, Td::new(BTreeSet::new())));
                    *td = new_root;
                }
            }
        }

        Decomposition { roots, remainder }
    }
}
