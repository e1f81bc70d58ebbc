//! Optimal fractional matching, used to jumpstart the weighted blossom engines.
//!
//! Every node is split into a left and a right copy, and every arc `u -> v` of the graph
//! becomes an edge between the left copy of `u` and the right copy of `v`. A maximum
//! weight matching of that bipartite double cover is computed with successive shortest
//! paths (Dijkstra on reduced costs). Halving it gives an optimal fractional matching of
//! the original graph, and halving the bipartite duals gives optimal node potentials.
//!
//! The matched arcs form node disjoint paths and cycles. Paths and even cycles are split
//! into pairs, odd cycles are kept as they are and become the initial blossoms.

use fixedbitset::FixedBitSet;
use log::{debug, trace};

use super::arc_graph::{Arc, ArcGraph};
use super::weighted_core::Variant;
use crate::binary_heap_cus::{BinHeap, HeapState};
use crate::graph::algo::DualMeasure;

pub(crate) struct FractionalMatching<W> {
    /// dual of the left copy of every node
    left: Vec<W>,
    /// dual of the right copy of every node
    right: Vec<W>,
    /// the arc matched to the left copy, it leads to the right copy of its target
    match_l: Vec<Option<Arc>>,
    /// the arc matched to the right copy
    match_r: Vec<Option<Arc>>,

    dist_l: Vec<Option<W>>,
    dist_r: Vec<Option<W>>,
    pred_r: Vec<Option<Arc>>,
    reached: Vec<usize>,
    scanned: Vec<usize>,
    touched: Vec<usize>,
    /// right copies are keyed by their node, the zero events of left duals by
    /// `node_bound + node`
    heap: BinHeap<W>,

    matching: Vec<Option<Arc>>,
    potential: Vec<W>,
}

impl<W: DualMeasure> Default for FractionalMatching<W> {
    fn default() -> Self {
        FractionalMatching {
            left: Vec::new(),
            right: Vec::new(),
            match_l: Vec::new(),
            match_r: Vec::new(),
            dist_l: Vec::new(),
            dist_r: Vec::new(),
            pred_r: Vec::new(),
            reached: Vec::new(),
            scanned: Vec::new(),
            touched: Vec::new(),
            heap: BinHeap::new(),
            matching: Vec::new(),
            potential: Vec::new(),
        }
    }
}

impl<W: DualMeasure> FractionalMatching<W> {
    /// Compute the fractional matching. `scaled` holds the scaled weight of every edge
    /// slot. For the perfect variant it returns false when no fractional perfect
    /// matching exists.
    pub fn run(&mut self, arcs: &ArcGraph, scaled: &[W], variant: Variant) -> bool {
        let bound = arcs.node_bound();
        let zero = W::default();

        self.left.clear();
        self.left.resize(bound, zero);
        self.right.clear();
        self.right.resize(bound, zero);
        self.match_l.clear();
        self.match_l.resize(bound, None);
        self.match_r.clear();
        self.match_r.resize(bound, None);
        self.dist_l.clear();
        self.dist_l.resize(bound, None);
        self.dist_r.clear();
        self.dist_r.resize(bound, None);
        self.pred_r.clear();
        self.pred_r.resize(bound, None);

        for &u in arcs.nodes() {
            let heaviest = arcs
                .out_arcs(u)
                .iter()
                .map(|a| scaled[a.edge_index()])
                .fold(None, |best, w| match best {
                    Some(best) if !(best < w) => Some(best),
                    _ => Some(w),
                });

            self.left[u] = match (variant, heaviest) {
                (Variant::Perfect, None) => {
                    debug!("node {u} has no edges, no perfect matching exists");
                    return false;
                }
                (Variant::Perfect, Some(w)) => w,
                (Variant::Maximum, Some(w)) if zero < w => w,
                (Variant::Maximum, _) => zero,
            };
        }

        for i in 0..arcs.node_count() {
            let root = arcs.nodes()[i];
            if variant == Variant::Maximum && !(zero < self.left[root]) {
                continue;
            }
            if !self.search(arcs, scaled, variant, root) {
                debug!("no augmenting path from {root}, no perfect matching exists");
                return false;
            }
        }

        self.decompose(arcs);
        for &n in arcs.nodes() {
            self.potential[n] = (self.left[n] + self.right[n]) / W::two();
        }
        true
    }

    /// the potential of node, already scaled
    pub fn node_value(&self, n: usize) -> W {
        self.potential[n]
    }

    /// the arc leaving node: towards its partner, or towards its successor on an odd
    /// cycle
    pub fn matching(&self, n: usize) -> Option<Arc> {
        self.matching[n]
    }

    /// grow a shortest path tree from the left copy of root, until it reaches a free
    /// right copy or (for the maximum variant) a left dual drops to zero
    fn search(&mut self, arcs: &ArcGraph, scaled: &[W], variant: Variant, root: usize) -> bool {
        let bound = arcs.node_bound();
        self.heap.clear();
        self.reach(arcs, scaled, variant, root, W::default());

        let found = loop {
            let Some((key, time)) = self.heap.pop() else {
                break false;
            };

            if key < bound {
                let v = key;
                self.scanned.push(v);
                match self.match_r[v] {
                    None => {
                        trace!("augment from {root} to the right copy of {v}");
                        self.finish(time);
                        self.flip(arcs, root, v);
                        break true;
                    }
                    Some(m) => self.reach(arcs, scaled, variant, arcs.source(m), time),
                }
            } else {
                let u = key - bound;
                trace!("dual of {u} drops to zero in the search from {root}");
                self.finish(time);
                if u != root {
                    let Some(m) = self.match_l[u].take() else {
                        unreachable!("reached left node {u} is unmatched");
                    };
                    self.flip(arcs, root, arcs.target(m));
                }
                break true;
            }
        };

        for &u in &self.reached {
            self.dist_l[u] = None;
        }
        for &v in &self.touched {
            self.dist_r[v] = None;
            self.pred_r[v] = None;
        }
        self.reached.clear();
        self.scanned.clear();
        self.touched.clear();

        found
    }

    fn reach(&mut self, arcs: &ArcGraph, scaled: &[W], variant: Variant, u: usize, dist: W) {
        self.dist_l[u] = Some(dist);
        self.reached.push(u);
        if variant == Variant::Maximum {
            self.heap.push(arcs.node_bound() + u, dist + self.left[u]);
        }

        for &a in arcs.out_arcs(u) {
            let v = arcs.target(a);
            if self.heap.state(v) == HeapState::PostHeap {
                continue;
            }

            let reduced = dist + self.left[u] + self.right[v] - scaled[a.edge_index()];
            if self.dist_r[v].map_or(true, |old| reduced < old) {
                if self.dist_r[v].is_none() {
                    self.touched.push(v);
                }
                self.dist_r[v] = Some(reduced);
                self.pred_r[v] = Some(a);
                self.heap.set(v, reduced);
            }
        }
    }

    /// move the duals of the scanned part of the tree to the current time
    fn finish(&mut self, time: W) {
        for &u in &self.reached {
            if let Some(d) = self.dist_l[u] {
                if d < time {
                    self.left[u] = self.left[u] - (time - d);
                }
            }
        }
        for &v in &self.scanned {
            if let Some(d) = self.dist_r[v] {
                if d < time {
                    self.right[v] = self.right[v] + (time - d);
                }
            }
        }
    }

    /// flip the matching along the tree path from the right copy `r` back to root
    fn flip(&mut self, arcs: &ArcGraph, root: usize, mut r: usize) {
        loop {
            let Some(arc) = self.pred_r[r] else {
                unreachable!("right copy of {r} is out of the search tree");
            };
            let p = arcs.source(arc);
            let old = self.match_l[p].replace(arc);
            self.match_r[r] = Some(arc);
            if p == root {
                break;
            }

            let Some(old) = old else {
                unreachable!("inner left node {p} is unmatched");
            };
            r = arcs.target(old);
        }
    }

    fn decompose(&mut self, arcs: &ArcGraph) {
        let bound = arcs.node_bound();
        self.matching.clear();
        self.matching.resize(bound, None);
        self.potential.clear();
        self.potential.resize(bound, W::default());

        let mut visited = FixedBitSet::with_capacity(bound);
        let succ = |m: &[Option<Arc>], n: usize| m[n].map(|a| arcs.target(a));

        // paths start at nodes whose right copy is free
        for &n in arcs.nodes() {
            if self.match_r[n].is_some() || self.match_l[n].is_none() {
                continue;
            }

            let mut x = n;
            loop {
                visited.insert(x);
                let Some(a) = self.match_l[x] else {
                    break;
                };
                let y = arcs.target(a);
                visited.insert(y);
                self.matching[x] = Some(a);
                self.matching[y] = Some(a.opposite());

                match succ(&self.match_l, y) {
                    Some(z) => x = z,
                    None => break,
                }
            }
        }

        let mut odd_cycles = 0usize;
        for &n in arcs.nodes() {
            if visited.contains(n) || self.match_l[n].is_none() {
                continue;
            }

            let mut cycle = vec![n];
            visited.insert(n);
            let mut x = succ(&self.match_l, n);
            while let Some(y) = x.filter(|&y| y != n) {
                visited.insert(y);
                cycle.push(y);
                x = succ(&self.match_l, y);
            }

            if cycle.len() % 2 == 0 {
                for pair in cycle.chunks(2) {
                    let a = self.match_l[pair[0]];
                    self.matching[pair[0]] = a;
                    self.matching[pair[1]] = a.map(Arc::opposite);
                }
            } else {
                odd_cycles += 1;
                for &c in &cycle {
                    self.matching[c] = self.match_l[c];
                }
            }
        }
        debug!("fractional matching with {odd_cycles} odd cycles");
    }
}
