use super::arc_graph::Arc;
use super::weighted_core::{SolveState, Variant, WeightedCore};
use super::Matching;
use crate::graph::algo::DualMeasure;
use crate::graph::visit::{EdgeIndexable, IntoEdgeReferences, IntoNodeIdentifiers, NodeIndexable};

macro_rules! weighted_queries {
    () => {
        /// the factor all weights are multiplied with internally, the duals are reported
        /// in this scale
        pub fn dual_scale(&self) -> W {
            W::dual_scale()
        }

        pub fn state(&self) -> SolveState {
            self.core.state()
        }

        /// total weight of the matching
        pub fn matching_weight(&self) -> W {
            self.core.matching_weight()
        }

        /// number of matched edges
        pub fn matching_size(&self) -> usize {
            self.core.matching_size()
        }

        /// whether the edge is in the matching
        pub fn is_matching_edge(&self, e: G::EdgeId) -> bool {
            self.core.is_matching_edge(self.graph.to_edge_index(e))
        }

        /// the matching arc leaving `n`
        pub fn matching(&self, n: G::NodeId) -> Option<Arc> {
            self.core.matching(self.graph.to_index(n))
        }

        /// the matching arc of every node slot, indexed by node index
        pub fn matching_map(&self) -> &[Option<Arc>] {
            self.core.matching_map()
        }

        pub fn mate(&self, n: G::NodeId) -> Option<G::NodeId> {
            self.matching(n)
                .map(|a| self.graph.from_index(self.core.arcs().target(a)))
        }

        /// value of the dual solution, equals `matching_weight() * dual_scale()` after a
        /// successful run
        pub fn dual_value(&self) -> W {
            self.core.dual_value()
        }

        /// the potential of the node
        pub fn node_value(&self, n: G::NodeId) -> W {
            self.core.node_value(self.graph.to_index(n))
        }

        /// number of blossoms with a dual variable
        pub fn blossom_num(&self) -> usize {
            self.core.blossom_num()
        }

        pub fn blossom_size(&self, k: usize) -> usize {
            self.core.blossom_size(k)
        }

        pub fn blossom_value(&self, k: usize) -> W {
            self.core.blossom_value(k)
        }

        /// the nodes of the `k`th dual blossom
        pub fn blossom_nodes(&self, k: usize) -> impl Iterator<Item = G::NodeId> + '_ {
            self.core
                .blossom_nodes(k)
                .iter()
                .map(|&n| self.graph.from_index(n))
        }

        /// copy the current matching out of the engine
        pub fn to_matching(&self) -> Matching<G> {
            Matching::from_arcs(self.graph, self.core.arcs(), self.core.matching_map())
        }
    };
}

/// Maximum weighted matching in general graphs with the primal-dual blossom algorithm.
///
/// Besides the matching, the engine keeps an optimal solution of the dual problem: a
/// potential per node and a value per blossom, both multiplied by
/// [`dual_scale`](Self::dual_scale). Every edge `uv` satisfies
/// `pot(u) + pot(v) + sum of the values of the blossoms holding u and v >= scale * w(uv)`,
/// with equality for the matching edges.
///
/// # Example
/// ```rust
/// use edmonds_matching::graph::algo::matching::MaxWeightedMatching;
/// use edmonds_matching::graph::graph_adjacency_list::Graph;
/// use edmonds_matching::graph::UnDirected;
///
/// let g: Graph<(), i64, UnDirected> = Graph::from_edges([(0, 1, 1), (1, 2, 1), (2, 0, 3)]);
/// let mut mwm = MaxWeightedMatching::new(&g, |e| *e.weight());
/// mwm.run();
/// assert_eq!(mwm.matching_weight(), 3);
/// assert_eq!(mwm.mate(0), Some(2));
/// ```
pub struct MaxWeightedMatching<G, W> {
    graph: G,
    core: WeightedCore<W>,
}

impl<G, W> MaxWeightedMatching<G, W>
where
    G: IntoEdgeReferences + IntoNodeIdentifiers + NodeIndexable + EdgeIndexable,
    W: DualMeasure,
{
    /// the weights are read once here
    pub fn new<F>(graph: G, weight: F) -> Self
    where
        F: Fn(G::EdgeRef) -> W,
    {
        MaxWeightedMatching {
            graph,
            core: WeightedCore::new(graph, weight, Variant::Maximum),
        }
    }

    /// start from the empty matching
    pub fn init(&mut self) {
        self.core.init();
    }

    /// start from an optimal fractional matching
    pub fn fractional_init(&mut self) {
        self.core.fractional_init();
    }

    /// compute the optimum from the current initialization
    pub fn start(&mut self) {
        self.core.start();
    }

    pub fn run(&mut self) {
        self.fractional_init();
        self.start();
    }

    weighted_queries!();
}

/// Maximum weighted perfect matching in general graphs with the primal-dual blossom
/// algorithm. Unlike [`MaxWeightedMatching`] every node has to be covered, so the node
/// potentials may become negative and the run fails when no perfect matching exists.
///
/// # Example
/// ```rust
/// use edmonds_matching::graph::algo::matching::MaxWeightedPerfectMatching;
/// use edmonds_matching::graph::graph_adjacency_list::Graph;
/// use edmonds_matching::graph::UnDirected;
///
/// let g: Graph<(), i64, UnDirected> =
///     Graph::from_edges([(0, 1, 1), (1, 2, 2), (2, 3, 1), (3, 0, 2)]);
/// let mut mwpm = MaxWeightedPerfectMatching::new(&g, |e| *e.weight());
/// assert!(mwpm.run());
/// assert_eq!(mwpm.matching_weight(), 4);
/// assert!(mwpm.is_matching_edge(1));
/// ```
pub struct MaxWeightedPerfectMatching<G, W> {
    graph: G,
    core: WeightedCore<W>,
}

impl<G, W> MaxWeightedPerfectMatching<G, W>
where
    G: IntoEdgeReferences + IntoNodeIdentifiers + NodeIndexable + EdgeIndexable,
    W: DualMeasure,
{
    /// the weights are read once here
    pub fn new<F>(graph: G, weight: F) -> Self
    where
        F: Fn(G::EdgeRef) -> W,
    {
        MaxWeightedPerfectMatching {
            graph,
            core: WeightedCore::new(graph, weight, Variant::Perfect),
        }
    }

    /// start from the empty matching
    pub fn init(&mut self) {
        self.core.init();
    }

    /// start from an optimal fractional perfect matching, the engine turns
    /// [`SolveState::Infeasible`] when there is none
    pub fn fractional_init(&mut self) {
        self.core.fractional_init();
    }

    /// compute the optimum from the current initialization, false if the graph has no
    /// perfect matching
    pub fn start(&mut self) -> bool {
        self.core.start()
    }

    pub fn run(&mut self) -> bool {
        self.fractional_init();
        self.start()
    }

    weighted_queries!();
}
