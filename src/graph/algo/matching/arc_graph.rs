use crate::graph::visit::{
    EdgeIndexable, EdgeRef, IntoEdgeReferences, IntoNodeIdentifiers, NodeIndexable,
};

const NONE: usize = usize::MAX;

/// One direction of an undirected edge. The two arcs of edge `e` are `2e` (from `u` to
/// `v`) and `2e + 1` (from `v` to `u`).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Arc(usize);

impl Arc {
    pub(crate) fn new(edge: usize, forward: bool) -> Self {
        Arc(edge << 1 | usize::from(!forward))
    }

    pub(crate) fn from_index(i: usize) -> Self {
        Arc(i)
    }

    pub(crate) fn index(self) -> usize {
        self.0
    }

    /// index of the underlying edge
    pub fn edge_index(self) -> usize {
        self.0 >> 1
    }

    /// whether the arc goes from the `u` end to the `v` end of its edge
    pub fn is_forward(self) -> bool {
        self.0 & 1 == 0
    }

    pub fn opposite(self) -> Arc {
        Arc(self.0 ^ 1)
    }
}

/// A read-only snapshot of an undirected graph in compressed sparse row form. The node
/// and edge indices are the ones of the source graph, so slots of removed nodes or edges
/// may exist, they are simply never listed.
#[derive(Default)]
pub(crate) struct ArcGraph {
    nodes: Vec<usize>,
    edges: Vec<usize>,
    node_bound: usize,
    /// the `u` and `v` end of every edge slot
    ends: Vec<[usize; 2]>,
    /// out arcs of node `n` are `out_arcs[offsets[n]..offsets[n + 1]]`
    offsets: Vec<usize>,
    out_arcs: Vec<Arc>,
}

impl ArcGraph {
    /// rebuild the snapshot from a graph, the buffers are reused
    pub fn build<G>(&mut self, g: G)
    where
        G: IntoNodeIdentifiers + IntoEdgeReferences + NodeIndexable + EdgeIndexable,
    {
        self.node_bound = g.node_bound();
        self.nodes.clear();
        self.nodes.extend(g.node_identifiers().map(|n| g.to_index(n)));

        self.edges.clear();
        self.ends.clear();
        self.ends.resize(g.edge_bound(), [NONE; 2]);

        let mut degree = vec![0usize; self.node_bound + 1];
        for edge in g.edge_references() {
            let e = g.to_edge_index(edge.id());
            let (u, v) = (g.to_index(edge.source()), g.to_index(edge.target()));
            self.edges.push(e);
            self.ends[e] = [u, v];
            // selfloops never take part in a matching
            if u != v {
                degree[u] += 1;
                degree[v] += 1;
            }
        }

        self.offsets.clear();
        self.offsets.push(0);
        for n in 0..self.node_bound {
            let last = self.offsets[n];
            self.offsets.push(last + degree[n]);
        }

        let mut fill = self.offsets.clone();
        self.out_arcs.clear();
        self.out_arcs
            .resize(self.offsets[self.node_bound], Arc::from_index(NONE));
        for &e in &self.edges {
            let [u, v] = self.ends[e];
            if u == v {
                continue;
            }
            self.out_arcs[fill[u]] = Arc::new(e, true);
            fill[u] += 1;
            self.out_arcs[fill[v]] = Arc::new(e, false);
            fill[v] += 1;
        }
    }

    /// the live nodes
    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    /// the live edges, selfloops included
    pub fn edges(&self) -> &[usize] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node_bound(&self) -> usize {
        self.node_bound
    }

    pub fn edge_bound(&self) -> usize {
        self.ends.len()
    }

    /// whether the edge slot holds a live edge
    pub fn contains_edge(&self, e: usize) -> bool {
        self.ends.get(e).map_or(false, |ends| ends[0] != NONE)
    }

    pub fn u(&self, e: usize) -> usize {
        self.ends[e][0]
    }

    pub fn v(&self, e: usize) -> usize {
        self.ends[e][1]
    }

    pub fn source(&self, a: Arc) -> usize {
        let [u, v] = self.ends[a.edge_index()];
        if a.is_forward() {
            u
        } else {
            v
        }
    }

    pub fn target(&self, a: Arc) -> usize {
        self.source(a.opposite())
    }

    pub fn direct(&self, e: usize, forward: bool) -> Arc {
        Arc::new(e, forward)
    }

    /// arcs leaving node `n`, selfloops excluded. The arcs entering `n` are their opposites.
    pub fn out_arcs(&self, n: usize) -> &[Arc] {
        &self.out_arcs[self.offsets[n]..self.offsets[n + 1]]
    }
}
