use std::collections::{HashSet, VecDeque};

use fixedbitset::FixedBitSet;
use log::{debug, trace};

use super::arc_graph::{Arc, ArcGraph};
use super::{Matching, MatchingError};
use crate::graph::visit::{
    EdgeIndexable, GraphBase, IntoEdgeReferences, IntoNodeIdentifiers, NodeIndexable, VisitMap,
};
use crate::union_find_cus::{ExtendFindEnum, UnionFindEnum};

/// Label of a node in the alternating forest. After `start_*` the labels are the
/// Gallai-Edmonds decomposition of the graph.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Status {
    /// reachable from an exposed node on an even alternating path
    Even,
    /// covered by the matching and out of every tree
    Matched,
    /// reachable from an exposed node on an odd alternating path
    Odd,
    /// exposed and not reached yet, never left after a run
    Unmatched,
}

impl Status {
    /// the factor-critical part of the decomposition
    pub const D: Status = Status::Even;
    /// the canonical barrier
    pub const A: Status = Status::Odd;
    /// the part with a perfect matching
    pub const C: Status = Status::Matched;
}

/// When `run` treats a graph as dense. Dense graphs are searched with the postponed
/// shrinking strategy and start from the empty matching, sparse ones from a greedy
/// matching.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DensityPolicy {
    pub dense_ratio: usize,
}

impl Default for DensityPolicy {
    fn default() -> Self {
        DensityPolicy { dense_ratio: 2 }
    }
}

impl DensityPolicy {
    pub fn is_dense(&self, node_count: usize, edge_count: usize) -> bool {
        edge_count >= self.dense_ratio.saturating_mul(node_count)
    }
}

/// Maximum cardinality matching in general graphs with Edmonds' blossom algorithm.
///
/// Alternating trees are grown from every exposed node one after another. Blossoms are
/// kept in a union-find structure together with an ear arc per node, which is enough to
/// walk around a blossom when the matching is flipped along an augmenting path.
///
/// Besides the matching the engine labels every node with its [`Status`], the
/// Gallai-Edmonds decomposition: `Even` nodes induce factor-critical components, `Odd`
/// nodes form the barrier and `Matched` nodes are perfectly matched among each other.
pub struct MaxMatching<G> {
    graph: G,
    arcs: ArcGraph,
    policy: DensityPolicy,

    matching: Vec<Option<Arc>>,
    status: Vec<Status>,
    ear: Vec<Option<Arc>>,

    blossom_set: UnionFindEnum,
    /// base node of every blossom class
    blossom_rep: Vec<usize>,
    tree_set: ExtendFindEnum,

    node_queue: Vec<usize>,
    process: usize,
    postpone: usize,
}

impl<G> MaxMatching<G>
where
    G: IntoEdgeReferences + IntoNodeIdentifiers + NodeIndexable + EdgeIndexable,
{
    pub fn new(graph: G) -> Self {
        Self::with_policy(graph, DensityPolicy::default())
    }

    pub fn with_policy(graph: G, policy: DensityPolicy) -> Self {
        MaxMatching {
            graph,
            arcs: ArcGraph::default(),
            policy,
            matching: Vec::new(),
            status: Vec::new(),
            ear: Vec::new(),
            blossom_set: UnionFindEnum::new(),
            blossom_rep: Vec::new(),
            tree_set: ExtendFindEnum::new(),
            node_queue: Vec::new(),
            process: 0,
            postpone: 0,
        }
    }

    pub fn policy(&self) -> DensityPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: DensityPolicy) {
        self.policy = policy;
    }

    /// snapshot the graph and reset every per node state
    fn prepare(&mut self) {
        self.arcs.build(self.graph);
        let bound = self.arcs.node_bound();

        self.matching.clear();
        self.matching.resize(bound, None);
        self.status.clear();
        self.status.resize(bound, Status::Unmatched);
        self.ear.clear();
        self.ear.resize(bound, None);

        self.blossom_set.clear();
        self.blossom_rep.clear();
        self.tree_set.clear();
        self.node_queue.clear();
        self.process = 0;
        self.postpone = 0;
    }

    /// start from the empty matching
    pub fn init(&mut self) {
        self.prepare();
    }

    /// start from a greedy matching: every exposed node takes its first exposed neighbor
    pub fn greedy_init(&mut self) {
        self.prepare();
        self.greedy_fill();
    }

    /// start from the edges for which `matched` returns true, it fails if two of them
    /// share a node
    pub fn matching_init<F>(&mut self, matched: F) -> Result<(), MatchingError>
    where
        F: Fn(G::EdgeId) -> bool,
    {
        self.prepare();

        for i in 0..self.arcs.edge_count() {
            let e = self.arcs.edges()[i];
            if !matched(self.graph.from_edge_index(e)) {
                continue;
            }

            for (node, forward) in [(self.arcs.u(e), true), (self.arcs.v(e), false)] {
                if self.matching[node].is_some() {
                    return Err(MatchingError::InvalidMatching { node });
                }
                self.matching[node] = Some(self.arcs.direct(e, forward));
                self.status[node] = Status::Matched;
            }
        }

        Ok(())
    }

    fn greedy_fill(&mut self) {
        for i in 0..self.arcs.node_count() {
            let n = self.arcs.nodes()[i];
            if self.matching[n].is_some() {
                continue;
            }

            let free = self
                .arcs
                .out_arcs(n)
                .iter()
                .copied()
                .find(|&a| self.matching[self.arcs.target(a)].is_none());
            if let Some(a) = free {
                let v = self.arcs.target(a);
                self.matching[n] = Some(a);
                self.status[n] = Status::Matched;
                self.matching[v] = Some(a.opposite());
                self.status[v] = Status::Matched;
            }
        }
    }

    /// grow a tree from every exposed node, shrinking blossoms as soon as they are found
    pub fn start_sparse(&mut self) {
        for i in 0..self.arcs.node_count() {
            let n = self.arcs.nodes()[i];
            if self.status[n] == Status::Unmatched {
                self.plant_root(n);
                self.process_sparse(n);
            }
        }
        debug!("sparse search done, matching size: {}", self.matching_size());
    }

    /// grow a tree from every exposed node, the blossoms found while scanning the
    /// frontier are shrunk after the frontier is exhausted
    pub fn start_dense(&mut self) {
        for i in 0..self.arcs.node_count() {
            let n = self.arcs.nodes()[i];
            if self.status[n] == Status::Unmatched {
                self.plant_root(n);
                self.process_dense(n);
            }
        }
        debug!("dense search done, matching size: {}", self.matching_size());
    }

    /// choose the strategy with the density policy and compute the maximum matching
    pub fn run(&mut self) {
        self.prepare();
        let (nodes, edges) = (self.arcs.node_count(), self.arcs.edge_count());
        if self.policy.is_dense(nodes, edges) {
            debug!("maximum matching on a dense graph: {nodes} nodes, {edges} edges");
            self.start_dense();
        } else {
            debug!("maximum matching on a sparse graph: {nodes} nodes, {edges} edges");
            self.greedy_fill();
            self.start_sparse();
        }
    }

    fn plant_root(&mut self, n: usize) {
        let class = self.blossom_set.insert(n);
        self.set_rep(class, n);
        self.tree_set.insert(n);
        self.status[n] = Status::Even;
    }

    fn process_sparse(&mut self, root: usize) {
        self.node_queue.clear();
        self.node_queue.push(root);
        self.process = 0;

        while self.process < self.node_queue.len() {
            let u = self.node_queue[self.process];
            self.process += 1;

            for i in 0..self.arcs.out_arcs(u).len() {
                let a = self.arcs.out_arcs(u)[i];
                let v = self.arcs.target(a);
                match self.status[v] {
                    Status::Even => {
                        if self.blossom_set.find(u) != self.blossom_set.find(v) {
                            self.shrink_on_edge(a.edge_index());
                        }
                    }
                    Status::Matched => self.extend_on_arc(a),
                    Status::Unmatched => {
                        self.augment_on_arc(a);
                        return;
                    }
                    Status::Odd => {}
                }
            }
        }
    }

    fn process_dense(&mut self, root: usize) {
        self.node_queue.clear();
        self.node_queue.push(root);
        self.process = 0;
        self.postpone = 0;

        if self.extend_frontier() {
            return;
        }

        while self.postpone < self.node_queue.len() {
            let u = self.node_queue[self.postpone];
            self.postpone += 1;

            for i in 0..self.arcs.out_arcs(u).len() {
                let a = self.arcs.out_arcs(u)[i];
                let v = self.arcs.target(a);
                if self.status[v] == Status::Even
                    && self.blossom_set.find(u) != self.blossom_set.find(v)
                {
                    self.shrink_on_edge(a.edge_index());
                }

                // the shrink may have enqueued new even nodes
                if self.extend_frontier() {
                    return;
                }
            }
        }
    }

    /// extend the tree from the queued even nodes without shrinking, return true once the
    /// tree augmented
    fn extend_frontier(&mut self) -> bool {
        while self.process < self.node_queue.len() {
            let u = self.node_queue[self.process];
            self.process += 1;

            for i in 0..self.arcs.out_arcs(u).len() {
                let a = self.arcs.out_arcs(u)[i];
                match self.status[self.arcs.target(a)] {
                    Status::Matched => self.extend_on_arc(a),
                    Status::Unmatched => {
                        self.augment_on_arc(a);
                        return true;
                    }
                    _ => {}
                }
            }
        }
        false
    }

    fn set_rep(&mut self, class: usize, node: usize) {
        if class >= self.blossom_rep.len() {
            self.blossom_rep.resize(class + 1, usize::MAX);
        }
        self.blossom_rep[class] = node;
    }

    /// base node of the blossom containing n
    fn rep(&self, n: usize) -> usize {
        self.blossom_rep[self.blossom_set.find(n)]
    }

    fn mate_index(&self, n: usize) -> usize {
        match self.matching[n] {
            Some(a) => self.arcs.target(a),
            None => unreachable!("node {n} is expected to be matched"),
        }
    }

    fn ear_of(&self, n: usize) -> Arc {
        match self.ear[n] {
            Some(a) => a,
            None => unreachable!("node {n} has no ear"),
        }
    }

    /// base of the blossom two levels up in the tree
    fn tree_grandparent(&self, base: usize) -> usize {
        let odd = self.mate_index(base);
        self.rep(self.arcs.target(self.ear_of(odd)))
    }

    fn tree_of(&self, n: usize) -> usize {
        match self.tree_set.find(self.rep(n)) {
            Some(tree) => tree,
            None => unreachable!("even node {n} is out of every tree"),
        }
    }

    fn shrink_on_edge(&mut self, e: usize) {
        let (u, v) = (self.arcs.u(e), self.arcs.v(e));
        trace!("shrink blossom on edge {u} -- {v}");

        // walk up from both ends in turn, until one side reaches a base the other side
        // has already visited
        let mut left = self.rep(u);
        let mut right = self.rep(v);
        let mut left_set = HashSet::from([left]);
        let mut right_set = HashSet::from([right]);
        let mut nca = None;

        loop {
            if self.matching[left].is_none() {
                break;
            }
            left = self.tree_grandparent(left);
            if right_set.contains(&left) {
                nca = Some(left);
                break;
            }
            left_set.insert(left);

            if self.matching[right].is_none() {
                break;
            }
            right = self.tree_grandparent(right);
            if left_set.contains(&right) {
                nca = Some(right);
                break;
            }
            right_set.insert(right);
        }

        let nca = match nca {
            Some(nca) => nca,
            None if self.matching[left].is_none() => {
                let mut nca = right;
                while !left_set.contains(&nca) {
                    nca = self.tree_grandparent(nca);
                }
                nca
            }
            None => {
                let mut nca = left;
                while !right_set.contains(&nca) {
                    nca = self.tree_grandparent(nca);
                }
                nca
            }
        };

        self.shrink_path(u, self.arcs.direct(e, true), nca);
        let class = self.blossom_set.find(nca);
        self.set_rep(class, nca);

        self.shrink_path(v, self.arcs.direct(e, false), nca);
        let class = self.blossom_set.find(nca);
        self.set_rep(class, nca);
    }

    /// merge the blossoms on the tree path from `node` up to `nca` into the blossom of
    /// `nca`, `arc` is the arc which closes the new blossom at `node`
    fn shrink_path(&mut self, mut node: usize, mut arc: Arc, nca: usize) {
        let mut base = self.rep(node);

        while base != nca {
            self.ear[node] = Some(arc);

            // reverse the ears between node and the base of its blossom
            let mut n = node;
            while n != base {
                n = self.mate_index(n);
                let a = self.ear_of(n);
                n = self.arcs.target(a);
                self.ear[n] = Some(a.opposite());
            }

            node = self.mate_index(base);
            self.tree_set.erase(base);
            self.tree_set.erase(node);
            let class = self.blossom_set.find(base);
            self.blossom_set.insert_into(node, class);
            self.status[node] = Status::Even;
            self.node_queue.push(node);

            let ear = self.ear_of(node);
            arc = ear.opposite();
            node = self.arcs.target(ear);
            base = self.rep(node);
            self.blossom_set.join(self.arcs.target(arc), base);
        }
    }

    fn extend_on_arc(&mut self, a: Arc) {
        let base = self.arcs.source(a);
        let odd = self.arcs.target(a);
        trace!("extend tree from {base} over {odd}");

        self.ear[odd] = Some(a.opposite());
        let even = self.mate_index(odd);
        let class = self.blossom_set.insert(even);
        self.set_rep(class, even);
        self.status[odd] = Status::Odd;
        self.status[even] = Status::Even;

        let tree = self.tree_of(base);
        self.tree_set.insert_into(odd, tree);
        self.tree_set.insert_into(even, tree);
        self.node_queue.push(even);
    }

    fn augment_on_arc(&mut self, a: Arc) {
        let mut even = self.arcs.source(a);
        let mut odd = self.arcs.target(a);
        trace!("augment from {even} to exposed {odd}");

        let tree = self.tree_of(even);

        self.matching[odd] = Some(a.opposite());
        self.status[odd] = Status::Matched;

        let mut arc = self.matching[even].replace(a);
        while let Some(m) = arc {
            odd = self.arcs.target(m);
            let ear = self.ear_of(odd);
            even = self.arcs.target(ear);
            self.matching[odd] = Some(ear);
            arc = self.matching[even].replace(ear.opposite());
        }

        // dissolve the tree, its blossoms are expanded on the way
        let members: Vec<_> = self.tree_set.items(tree).collect();
        for n in members {
            if self.status[n] == Status::Odd {
                self.status[n] = Status::Matched;
            } else {
                let blossom = self.blossom_set.find(n);
                for &m in self.blossom_set.items(blossom) {
                    self.status[m] = Status::Matched;
                }
                self.blossom_set.erase_class(blossom);
            }
        }
        self.tree_set.erase_class(tree);
    }

    pub fn node_count(&self) -> usize {
        self.arcs.node_count()
    }

    /// number of matched edges
    pub fn matching_size(&self) -> usize {
        self.arcs
            .nodes()
            .iter()
            .filter(|&&n| self.matching[n].is_some())
            .count()
            / 2
    }

    /// whether the edge is in the matching
    pub fn is_matching_edge(&self, e: G::EdgeId) -> bool {
        let e = self.graph.to_edge_index(e);
        self.arcs.contains_edge(e)
            && self.matching[self.arcs.u(e)] == Some(self.arcs.direct(e, true))
    }

    /// the matching arc leaving `n`
    pub fn matching(&self, n: G::NodeId) -> Option<Arc> {
        self.matching[self.graph.to_index(n)]
    }

    /// the matching arc of every node slot, indexed by node index
    pub fn matching_map(&self) -> &[Option<Arc>] {
        &self.matching
    }

    pub fn mate(&self, n: G::NodeId) -> Option<G::NodeId> {
        self.matching(n)
            .map(|a| self.graph.from_index(self.arcs.target(a)))
    }

    pub fn status(&self, n: G::NodeId) -> Status {
        self.status[self.graph.to_index(n)]
    }

    /// the status of every node slot, indexed by node index
    pub fn status_map(&self) -> &[Status] {
        &self.status
    }

    /// whether the node is in the canonical barrier
    pub fn barrier(&self, n: G::NodeId) -> bool {
        self.status(n) == Status::Odd
    }

    /// number of connected components induced by the even nodes minus the size of the
    /// barrier, it equals the number of exposed nodes after a run
    pub fn deficiency(&self) -> usize {
        let mut visited = FixedBitSet::with_capacity(self.arcs.node_bound());
        let mut components = 0usize;
        let mut queue = VecDeque::new();

        for &n in self.arcs.nodes() {
            if self.status[n] != Status::Even || !visited.visit(n) {
                continue;
            }
            components += 1;
            queue.push_back(n);
            while let Some(u) = queue.pop_front() {
                for &a in self.arcs.out_arcs(u) {
                    let v = self.arcs.target(a);
                    if self.status[v] == Status::Even && visited.visit(v) {
                        queue.push_back(v);
                    }
                }
            }
        }

        let barrier = self
            .arcs
            .nodes()
            .iter()
            .filter(|&&n| self.status[n] == Status::Odd)
            .count();
        components.saturating_sub(barrier)
    }

    pub fn arc_source(&self, a: Arc) -> G::NodeId {
        self.graph.from_index(self.arcs.source(a))
    }

    pub fn arc_target(&self, a: Arc) -> G::NodeId {
        self.graph.from_index(self.arcs.target(a))
    }

    pub fn arc_edge(&self, a: Arc) -> G::EdgeId {
        self.graph.from_edge_index(a.edge_index())
    }

    /// copy the current matching out of the engine
    pub fn to_matching(&self) -> Matching<G> {
        Matching::from_arcs(self.graph, &self.arcs, &self.matching)
    }
}

impl<G: GraphBase> std::fmt::Debug for MaxMatching<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaxMatching")
            .field("policy", &self.policy)
            .field("matching", &self.matching)
            .field("status", &self.status)
            .finish()
    }
}
