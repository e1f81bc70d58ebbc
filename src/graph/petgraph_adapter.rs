//! Lets the matching engines run on `petgraph::Graph<_, _, Undirected>` directly.
//! Node and edge ids are petgraph's own `NodeIndex` and `EdgeIndex`.

use petgraph::graph::{self as pg, EdgeIndex, IndexType, NodeIndex};
use petgraph::Undirected;

use super::visit::{
    EdgeIndexable, EdgeRef, GraphBase, IntoEdgeReferences, IntoNodeIdentifiers, NodeIndexable,
};

type UnGraph<N, E, Ix> = petgraph::Graph<N, E, Undirected, Ix>;

impl<N, E, Ix: IndexType> GraphBase for UnGraph<N, E, Ix> {
    type NodeId = NodeIndex<Ix>;
    type EdgeId = EdgeIndex<Ix>;
}

impl<'a, E, Ix: IndexType> EdgeRef for pg::EdgeReference<'a, E, Ix> {
    type NodeId = NodeIndex<Ix>;
    type EdgeId = EdgeIndex<Ix>;
    type EdgeWeight = E;

    fn source(&self) -> Self::NodeId {
        petgraph::visit::EdgeRef::source(self)
    }

    fn target(&self) -> Self::NodeId {
        petgraph::visit::EdgeRef::target(self)
    }

    fn weight(&self) -> &Self::EdgeWeight {
        petgraph::visit::EdgeRef::weight(self)
    }

    fn id(&self) -> Self::EdgeId {
        petgraph::visit::EdgeRef::id(self)
    }
}

impl<'a, N, E, Ix: IndexType> IntoNodeIdentifiers for &'a UnGraph<N, E, Ix> {
    type NodeIdentifiers = pg::NodeIndices<Ix>;

    fn node_identifiers(self) -> Self::NodeIdentifiers {
        self.node_indices()
    }
}

impl<'a, N, E, Ix: IndexType> IntoEdgeReferences for &'a UnGraph<N, E, Ix> {
    type EdgeWeight = E;
    type EdgeRef = pg::EdgeReference<'a, E, Ix>;
    type EdgeReferences = pg::EdgeReferences<'a, E, Ix>;

    fn edge_references(self) -> Self::EdgeReferences {
        petgraph::visit::IntoEdgeReferences::edge_references(self)
    }
}

impl<'a, N, E, Ix: IndexType> NodeIndexable for &'a UnGraph<N, E, Ix> {
    fn node_bound(&self) -> usize {
        UnGraph::node_count(self)
    }

    fn to_index(&self, n: Self::NodeId) -> usize {
        n.index()
    }

    fn from_index(&self, i: usize) -> Self::NodeId {
        NodeIndex::new(i)
    }
}

impl<'a, N, E, Ix: IndexType> EdgeIndexable for &'a UnGraph<N, E, Ix> {
    fn edge_bound(&self) -> usize {
        UnGraph::edge_count(self)
    }

    fn to_edge_index(&self, e: Self::EdgeId) -> usize {
        e.index()
    }

    fn from_edge_index(&self, i: usize) -> Self::EdgeId {
        EdgeIndex::new(i)
    }
}
