use super::visit::{
    EdgeIndexable, EdgeRef, GraphBase, GraphRef, IntoEdgeReferences, IntoNodeIdentifiers,
    NodeIndexable,
};
use super::{Direction, GraphType, IntoWeightedEdge, UnDirected};
use std::marker::PhantomData;
use std::ops::{Index, Range};

const END: usize = usize::MAX;

/// `N` is the type of Vertex, `E` is the type of Edge,
/// `T` is the Type of Graph, default is undirected since matchings ignore edge direction.
///
/// Every node keeps the head of two intrusive edge lists, its outcoming edges and its
/// incoming edges. For an undirected graph the edge `a -- b` lives in the outcoming list of
/// `a` and the incoming list of `b`, `a` is the stable source of the edge.
pub struct Graph<N, E, T: GraphType = UnDirected> {
    nodes: Vec<Node<N>>,
    edges: Vec<Edge<E>>,
    phantomdata: PhantomData<T>,
}

pub struct Edge<E> {
    data: E,
    // start node idx and end node idx
    nodes: [usize; 2],
    /// the first ele is the value of start node's next outcoming edge idx,
    /// the second ele is the value of end node's next incoming edge idx
    next: [usize; 2],
}

pub struct Node<N> {
    data: N,
    /// the first ele is the idx value of first outcoming edge,
    /// the second ele is the idx value of first incoming edge
    next: [usize; 2],
}

impl<N, E> Graph<N, E, UnDirected> {
    pub fn new_undirected() -> Self {
        Self::with_capacity((0, 0))
    }
}

impl<N, E, T: GraphType> Graph<N, E, T> {
    pub fn with_capacity((n, e): (usize, usize)) -> Self {
        Graph {
            nodes: Vec::with_capacity(n),
            edges: Vec::with_capacity(e),
            phantomdata: PhantomData,
        }
    }

    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoWeightedEdge<E, NodeId = usize>,
        N: Default,
    {
        let mut graph = Self::with_capacity((0, 0));
        graph.extends_with_edges(edges);
        graph
    }

    /// add edges, the missing nodes are created with default weight
    pub fn extends_with_edges<I>(&mut self, edges: I)
    where
        I: IntoIterator,
        I::Item: IntoWeightedEdge<E, NodeId = usize>,
        N: Default,
    {
        let iter = edges.into_iter();
        self.edges.reserve(iter.size_hint().0);

        for edge in iter {
            let (from, to, weight) = edge.into_weighted_edge();
            // make sure there is a node for edge
            while from.max(to) >= self.node_count() {
                self.add_node(N::default());
            }
            self.add_edge(from, to, weight);
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }

    pub fn is_directed(&self) -> bool {
        T::is_directed()
    }

    /// Add node into the graph, return the index of new inserted node
    pub fn add_node(&mut self, node: N) -> usize {
        self.nodes.push(Node {
            data: node,
            next: [END; 2],
        });
        self.nodes.len() - 1
    }

    /// Add edge into the Graph, return the index of new inserted edge
    pub fn add_edge(&mut self, start_node: usize, end_node: usize, edge: E) -> usize {
        assert!(
            start_node.max(end_node) < self.nodes.len(),
            "unable to find the node to add edge"
        );

        let pos = self.edges.len();
        let outcoming = usize::from(Direction::Outcoming);
        let incoming = usize::from(Direction::Incoming);
        let next = [
            self.nodes[start_node].next[outcoming],
            self.nodes[end_node].next[incoming],
        ];
        self.nodes[start_node].next[outcoming] = pos;
        self.nodes[end_node].next[incoming] = pos;
        self.edges.push(Edge {
            data: edge,
            nodes: [start_node, end_node],
            next,
        });

        pos
    }

    /// find the first edge which connects the two nodes
    pub fn find_edge(&self, a: usize, b: usize) -> Option<usize> {
        self.edges(a).find(|e| e.target() == b).map(|e| e.index())
    }

    pub fn contains_edge(&self, a: usize, b: usize) -> bool {
        self.find_edge(a, b).is_some()
    }

    // find the source and target node idx
    pub fn edge_endpoints(&self, edge_idx: usize) -> Option<(usize, usize)> {
        let nodes = self.edges.get(edge_idx)?.nodes;
        Some((nodes[0], nodes[1]))
    }

    /// get all references of all edges, in insertion order
    pub fn edge_references(&self) -> EdgeReferences<E> {
        EdgeReferences {
            r: 0..self.edge_count(),
            edges: &self.edges,
        }
    }

    /// Outcoing Edges for Directed Graph
    /// All Edges for UnDirected Graph, `target` is always the other end
    pub fn edges(&self, n: usize) -> Edges<E> {
        let (out, inc) = match self.nodes.get(n) {
            Some(node) if self.is_directed() => (node.next[0], END),
            Some(node) => (node.next[0], node.next[1]),
            None => (END, END),
        };
        Edges {
            edges: &self.edges,
            node: n,
            next: [out, inc],
        }
    }

    pub fn edge_weight(&self, edge_idx: usize) -> Option<&E> {
        self.edges.get(edge_idx).map(|edge| &edge.data)
    }

    /// get all of node indices
    pub fn node_indices(&self) -> NodeIndices {
        NodeIndices {
            r: 0..self.node_count(),
        }
    }
}

impl<N, E, T: GraphType> Index<usize> for Graph<N, E, T> {
    type Output = N;

    fn index(&self, index: usize) -> &Self::Output {
        &self.nodes[index].data
    }
}

/// Walks the outcoming list of a node, then its incoming list.
pub struct Edges<'a, E> {
    edges: &'a [Edge<E>],
    node: usize,
    next: [usize; 2],
}

impl<'a, E> Iterator for Edges<'a, E> {
    type Item = EdgeReference<'a, E>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(edge) = self.edges.get(self.next[0]) {
            let idx = self.next[0];
            self.next[0] = edge.next[0];
            return Some(EdgeReference {
                nodes: edge.nodes,
                weight: &edge.data,
                idx,
            });
        }
        while let Some(edge) = self.edges.get(self.next[1]) {
            let idx = self.next[1];
            self.next[1] = edge.next[1];
            // a selfloop was already reported by the outcoming list
            if edge.nodes[0] != self.node {
                return Some(EdgeReference {
                    nodes: [edge.nodes[1], edge.nodes[0]],
                    weight: &edge.data,
                    idx,
                });
            }
        }

        None
    }
}

pub struct NodeIndices {
    r: Range<usize>,
}

impl Iterator for NodeIndices {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        self.r.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.r.size_hint()
    }
}

pub struct EdgeReferences<'a, E: 'a> {
    r: Range<usize>,
    edges: &'a [Edge<E>],
}

impl<'a, E: 'a> Iterator for EdgeReferences<'a, E> {
    type Item = EdgeReference<'a, E>;

    fn next(&mut self) -> Option<Self::Item> {
        let i = self.r.next()?;
        let edge = &self.edges[i];
        Some(EdgeReference {
            nodes: edge.nodes,
            weight: &edge.data,
            idx: i,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.r.size_hint()
    }
}

pub struct EdgeReference<'a, E: 'a> {
    nodes: [usize; 2],
    weight: &'a E,
    idx: usize,
}

impl<'a, E: 'a> Clone for EdgeReference<'a, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, E: 'a> Copy for EdgeReference<'a, E> {}

impl<'a, E: 'a> EdgeRef for EdgeReference<'a, E> {
    type EdgeId = usize;
    type EdgeWeight = E;
    type NodeId = usize;

    fn id(&self) -> Self::EdgeId {
        EdgeReference::index(self)
    }

    fn source(&self) -> Self::NodeId {
        EdgeReference::source(self)
    }

    fn target(&self) -> Self::NodeId {
        EdgeReference::target(self)
    }

    fn weight(&self) -> &Self::EdgeWeight {
        EdgeReference::weight(self)
    }
}

impl<'a, E: 'a> EdgeReference<'a, E> {
    pub fn source(&self) -> usize {
        self.nodes[0]
    }

    pub fn target(&self) -> usize {
        self.nodes[1]
    }

    pub fn weight(&self) -> &'a E {
        self.weight
    }

    pub fn index(&self) -> usize {
        self.idx
    }
}

impl<N, E, T: GraphType> GraphBase for Graph<N, E, T> {
    type EdgeId = usize;
    type NodeId = usize;
}

impl<'a, G> GraphBase for &'a G
where
    G: GraphBase,
{
    type EdgeId = G::EdgeId;
    type NodeId = G::NodeId;
}

impl<'a, G> GraphRef for &'a G where G: GraphBase {}

impl<'a, N, E, T: GraphType> IntoNodeIdentifiers for &'a Graph<N, E, T> {
    type NodeIdentifiers = NodeIndices;

    fn node_identifiers(self) -> Self::NodeIdentifiers {
        Graph::node_indices(self)
    }
}

impl<'a, N, E, T: GraphType> IntoEdgeReferences for &'a Graph<N, E, T> {
    type EdgeWeight = E;
    type EdgeRef = EdgeReference<'a, E>;
    type EdgeReferences = EdgeReferences<'a, E>;

    fn edge_references(self) -> Self::EdgeReferences {
        Graph::edge_references(self)
    }
}

impl<'a, N, E, T: GraphType> NodeIndexable for &'a Graph<N, E, T> {
    fn node_bound(&self) -> usize {
        self.node_count()
    }

    fn from_index(&self, i: usize) -> Self::NodeId {
        i
    }

    fn to_index(&self, n: Self::NodeId) -> usize {
        n
    }
}

impl<'a, N, E, T: GraphType> EdgeIndexable for &'a Graph<N, E, T> {
    fn edge_bound(&self) -> usize {
        Graph::edge_count(self)
    }

    fn from_edge_index(&self, i: usize) -> Self::EdgeId {
        i
    }

    fn to_edge_index(&self, e: Self::EdgeId) -> usize {
        e
    }
}
