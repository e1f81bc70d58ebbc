use fixedbitset::FixedBitSet;

pub trait GraphBase {
    type NodeId: Copy;
    type EdgeId: Copy;
}

pub trait GraphRef: Copy + GraphBase {}

pub trait IntoNodeIdentifiers: GraphRef {
    type NodeIdentifiers: Iterator<Item = Self::NodeId>;

    fn node_identifiers(self) -> Self::NodeIdentifiers;
}

/// Definition of a Edge ref
pub trait EdgeRef: Copy {
    type NodeId;
    type EdgeId;
    type EdgeWeight;

    // Required methods
    fn source(&self) -> Self::NodeId;
    fn target(&self) -> Self::NodeId;
    fn weight(&self) -> &Self::EdgeWeight;
    fn id(&self) -> Self::EdgeId;
}

/// Enumerate every edge once. For an undirected graph `source` and `target` are the
/// stable "u" and "v" ends of the edge.
pub trait IntoEdgeReferences: GraphRef {
    type EdgeWeight;
    type EdgeRef: EdgeRef<
        NodeId = Self::NodeId,
        EdgeId = Self::EdgeId,
        EdgeWeight = Self::EdgeWeight,
    >;
    type EdgeReferences: Iterator<Item = Self::EdgeRef>;

    fn edge_references(self) -> Self::EdgeReferences;
}

pub trait VisitMap<N> {
    fn visit(&mut self, n: N) -> bool;

    fn is_visit(&self, n: N) -> bool;
}

/// use `FixedBitSet` to record the visited node, save much memory space
impl VisitMap<usize> for FixedBitSet {
    fn is_visit(&self, n: usize) -> bool {
        self.contains(n)
    }

    fn visit(&mut self, n: usize) -> bool {
        !self.put(n)
    }
}

/// convert graph's NodeId to numberic index
pub trait NodeIndexable: GraphBase {
    fn node_bound(&self) -> usize;

    fn to_index(&self, n: Self::NodeId) -> usize;

    fn from_index(&self, i: usize) -> Self::NodeId;
}

/// convert graph's EdgeId to numberic index, the matching engines keep their per-edge
/// state in arrays of `edge_bound` slots
pub trait EdgeIndexable: GraphBase {
    fn edge_bound(&self) -> usize;

    fn to_edge_index(&self, e: Self::EdgeId) -> usize;

    fn from_edge_index(&self, i: usize) -> Self::EdgeId;
}
