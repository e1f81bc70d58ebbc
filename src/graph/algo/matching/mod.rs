//! Matchings in general graphs with Edmonds' blossom algorithm.
//!
//! - [`MaxMatching`]: maximum cardinality matching and the Gallai-Edmonds decomposition
//! - [`MaxWeightedMatching`]: maximum weighted matching with an optimal dual solution
//! - [`MaxWeightedPerfectMatching`]: maximum weighted perfect matching
//!
//! The engines work on any undirected graph implementing the visit traits, and report
//! nodes and edges with the graph's own ids. The free functions below run an engine and
//! hand back a plain [`Matching`].

mod arc_graph;
mod fractional;
mod max_matching;
mod weighted;
mod weighted_core;

pub use arc_graph::Arc;
pub use max_matching::{DensityPolicy, MaxMatching, Status};
pub use weighted::{MaxWeightedMatching, MaxWeightedPerfectMatching};
pub use weighted_core::SolveState;

use thiserror::Error;

use self::arc_graph::ArcGraph;
use crate::graph::algo::DualMeasure;
use crate::graph::visit::{
    EdgeIndexable, GraphBase, IntoEdgeReferences, IntoNodeIdentifiers, NodeIndexable,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchingError {
    #[error("node {node} is covered by more than one edge of the initial matching")]
    InvalidMatching { node: usize },
    #[error("the graph has no perfect matching")]
    InfeasiblePerfectMatching,
}

/// A matching detached from the engine that computed it.
pub struct Matching<G: GraphBase> {
    graph: G,
    mate: Vec<Option<usize>>,
    nodes: usize,
    len: usize,
}

impl<G> Matching<G>
where
    G: GraphBase + NodeIndexable + Copy,
{
    pub(crate) fn from_arcs(graph: G, arcs: &ArcGraph, matching: &[Option<Arc>]) -> Self {
        let mut mate = vec![None; arcs.node_bound()];
        let mut len = 0;
        for &n in arcs.nodes() {
            if let Some(a) = matching[n] {
                let m = arcs.target(a);
                mate[n] = Some(m);
                if n < m {
                    len += 1;
                }
            }
        }

        Matching {
            graph,
            mate,
            nodes: arcs.node_count(),
            len,
        }
    }

    /// the node `n` is matched with
    pub fn mate(&self, n: G::NodeId) -> Option<G::NodeId> {
        self.mate
            .get(self.graph.to_index(n))
            .copied()
            .flatten()
            .map(|m| self.graph.from_index(m))
    }

    /// the matched pairs, each once with the lower indexed node first
    pub fn edges(&self) -> impl Iterator<Item = (G::NodeId, G::NodeId)> + '_ {
        self.mate.iter().enumerate().filter_map(|(n, &m)| match m {
            Some(m) if n < m => Some((self.graph.from_index(n), self.graph.from_index(m))),
            _ => None,
        })
    }

    /// the matched nodes
    pub fn nodes(&self) -> impl Iterator<Item = G::NodeId> + '_ {
        self.mate
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_some())
            .map(|(n, _)| self.graph.from_index(n))
    }

    /// number of matched edges
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// whether every node of the graph is matched
    pub fn is_perfect(&self) -> bool {
        2 * self.len == self.nodes
    }

    /// whether `a` and `b` are matched with each other
    pub fn contains_edge(&self, a: G::NodeId, b: G::NodeId) -> bool {
        let (a, b) = (self.graph.to_index(a), self.graph.to_index(b));
        self.mate.get(a).copied().flatten() == Some(b)
    }
}

/// Pair up nodes greedily, every node is matched with its first free neighbor. The
/// result is maximal, not necessarily maximum.
pub fn greedy_matching<G>(g: G) -> Matching<G>
where
    G: IntoEdgeReferences + IntoNodeIdentifiers + NodeIndexable + EdgeIndexable,
{
    let mut mm = MaxMatching::new(g);
    mm.greedy_init();
    mm.to_matching()
}

/// Maximum cardinality matching, see [`MaxMatching`].
///
/// # Example
/// ```rust
/// use edmonds_matching::graph::algo::matching::maximum_matching;
/// use edmonds_matching::graph::graph_adjacency_list::Graph;
/// use edmonds_matching::graph::UnDirected;
///
/// // a triangle with a pendant edge
/// let g: Graph<(), (), UnDirected> = Graph::from_edges([(0, 1), (1, 2), (2, 0), (2, 3)]);
/// let m = maximum_matching(&g);
/// assert_eq!(m.len(), 2);
/// assert!(m.is_perfect());
/// assert!(m.contains_edge(2, 3));
/// ```
pub fn maximum_matching<G>(g: G) -> Matching<G>
where
    G: IntoEdgeReferences + IntoNodeIdentifiers + NodeIndexable + EdgeIndexable,
{
    let mut mm = MaxMatching::new(g);
    mm.run();
    mm.to_matching()
}

/// Maximum weighted matching, see [`MaxWeightedMatching`].
pub fn maximum_weight_matching<G, F, W>(g: G, weight: F) -> Matching<G>
where
    G: IntoEdgeReferences + IntoNodeIdentifiers + NodeIndexable + EdgeIndexable,
    F: Fn(G::EdgeRef) -> W,
    W: DualMeasure,
{
    let mut mwm = MaxWeightedMatching::new(g, weight);
    mwm.run();
    mwm.to_matching()
}

/// Maximum weighted perfect matching, see [`MaxWeightedPerfectMatching`].
pub fn maximum_weight_perfect_matching<G, F, W>(
    g: G,
    weight: F,
) -> Result<Matching<G>, MatchingError>
where
    G: IntoEdgeReferences + IntoNodeIdentifiers + NodeIndexable + EdgeIndexable,
    F: Fn(G::EdgeRef) -> W,
    W: DualMeasure,
{
    let mut mwpm = MaxWeightedPerfectMatching::new(g, weight);
    if mwpm.run() {
        Ok(mwpm.to_matching())
    } else {
        Err(MatchingError::InfeasiblePerfectMatching)
    }
}
