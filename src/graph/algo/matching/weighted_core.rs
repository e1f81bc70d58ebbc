//! The primal-dual blossom algorithm shared by the maximum weighted and the maximum
//! weighted perfect matching.
//!
//! Dual variables are kept lazily. `delta_sum` is the global clock: the potential of an
//! even node drops and the potential of an odd node grows with it, and they are only
//! materialized when the blossom containing the node changes its label. The `offset` of
//! a blossom records the clock at the time it entered an odd position, so that the
//! reduced costs in the event queues stay valid without touching every node each round.
//!
//! Four event queues drive the loop:
//! - `delta1`: potentials of even nodes, reaching zero makes the node exposed (maximum
//!   variant only)
//! - `delta2`: the cheapest arc from a matched blossom into some even blossom, it extends
//!   a tree or augments on an exposed blossom
//! - `delta3`: half the reduced cost of edges between even blossoms, it augments between
//!   two trees or shrinks a new blossom inside one tree
//! - `delta4`: half the potential of odd blossoms, reaching zero splits the blossom

use std::collections::HashSet;

use fixedbitset::FixedBitSet;
use indexmap::IndexMap;
use log::{debug, trace};

use super::arc_graph::{Arc, ArcGraph};
use super::fractional::FractionalMatching;
use crate::binary_heap_cus::{BinHeap, SparseLocator};
use crate::graph::algo::DualMeasure;
use crate::graph::visit::{
    EdgeIndexable, EdgeRef, IntoEdgeReferences, IntoNodeIdentifiers, NodeIndexable,
};
use crate::union_find_cus::{ExtendFindEnum, HeapUnionFind};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Variant {
    Maximum,
    Perfect,
}

/// Progress of a weighted engine.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SolveState {
    /// the graph has no perfect matching, only reachable by the perfect engine
    Infeasible,
    /// initialized, the optimum is not computed yet
    InProgress,
    /// the matching and its dual certificate are available
    Complete,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Label {
    Even,
    Matched,
    Odd,
}

#[derive(Clone, Copy, Debug)]
struct BlossomData<W> {
    status: Label,
    /// arc from this blossom to its parent in the tree
    pred: Option<Arc>,
    /// arc from this blossom to the blossom it is matched with
    next: Option<Arc>,
    pot: W,
    offset: W,
    /// the exposed node of an unmatched blossom
    base: Option<usize>,
}

impl<W: DualMeasure> BlossomData<W> {
    fn new(status: Label) -> Self {
        BlossomData {
            status,
            pred: None,
            next: None,
            pot: W::default(),
            offset: W::default(),
            base: None,
        }
    }
}

struct NodeData<W> {
    pot: W,
    /// reduced costs of the arcs from this node into even blossoms, keyed by arc index,
    /// at most one arc per tree
    heap: BinHeap<W, SparseLocator>,
    heap_index: IndexMap<usize, Arc>,
}

impl<W: DualMeasure> Default for NodeData<W> {
    fn default() -> Self {
        NodeData {
            pot: W::default(),
            heap: BinHeap::new(),
            heap_index: IndexMap::new(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct BlossomVariable<W> {
    begin: usize,
    end: usize,
    value: W,
}

#[derive(Clone, Copy, Debug)]
enum Event {
    Unmatch,
    Grow,
    Tight,
    Split,
}

#[derive(Default, Debug)]
struct Counters {
    augments: usize,
    extends: usize,
    shrinks: usize,
    splits: usize,
    unmatches: usize,
}

fn twice<W: DualMeasure>(w: W) -> W {
    w + w
}

pub(crate) struct WeightedCore<W> {
    variant: Variant,
    arcs: ArcGraph,
    /// weight of every edge slot
    weights: Vec<W>,
    /// weight of every edge slot multiplied by the dual scale
    scaled: Vec<W>,

    matching: Vec<Option<Arc>>,
    node_potential: Vec<W>,
    blossom_potential: Vec<BlossomVariable<W>>,
    blossom_node_list: Vec<usize>,

    blossom_set: HeapUnionFind<W>,
    blossom_data: Vec<BlossomData<W>>,
    node_data: Vec<NodeData<W>>,
    tree_set: ExtendFindEnum,

    delta1: BinHeap<W>,
    delta2: BinHeap<W>,
    delta3: BinHeap<W>,
    delta4: BinHeap<W>,

    delta_sum: W,
    unmatched: usize,
    state: SolveState,
    counters: Counters,

    fractional: FractionalMatching<W>,
}

impl<W: DualMeasure> WeightedCore<W> {
    pub fn new<G, F>(graph: G, weight: F, variant: Variant) -> Self
    where
        G: IntoEdgeReferences + IntoNodeIdentifiers + NodeIndexable + EdgeIndexable,
        F: Fn(G::EdgeRef) -> W,
    {
        let mut arcs = ArcGraph::default();
        arcs.build(graph);

        let mut weights = vec![W::default(); arcs.edge_bound()];
        for edge in graph.edge_references() {
            weights[graph.to_edge_index(edge.id())] = weight(edge);
        }
        let scaled = weights.iter().map(|&w| W::dual_scale() * w).collect();

        WeightedCore {
            variant,
            arcs,
            weights,
            scaled,
            matching: Vec::new(),
            node_potential: Vec::new(),
            blossom_potential: Vec::new(),
            blossom_node_list: Vec::new(),
            blossom_set: HeapUnionFind::new(),
            blossom_data: Vec::new(),
            node_data: Vec::new(),
            tree_set: ExtendFindEnum::new(),
            delta1: BinHeap::new(),
            delta2: BinHeap::new(),
            delta3: BinHeap::new(),
            delta4: BinHeap::new(),
            delta_sum: W::default(),
            unmatched: 0,
            state: SolveState::InProgress,
            counters: Counters::default(),
            fractional: FractionalMatching::default(),
        }
    }

    fn reset(&mut self) {
        let bound = self.arcs.node_bound();

        self.matching.clear();
        self.matching.resize(bound, None);
        self.node_potential.clear();
        self.node_potential.resize(bound, W::default());
        self.blossom_potential.clear();
        self.blossom_node_list.clear();

        self.blossom_set.clear();
        self.blossom_data.clear();
        self.node_data.clear();
        self.node_data.resize_with(bound, NodeData::default);
        self.tree_set.clear();

        self.delta1.clear();
        self.delta2.clear();
        self.delta3.clear();
        self.delta4.clear();

        self.delta_sum = W::default();
        self.unmatched = 0;
        self.state = SolveState::InProgress;
        self.counters = Counters::default();
    }

    /// make room for the blossom ids handed out so far
    fn grow_blossoms(&mut self) {
        let bound = self.blossom_set.class_bound();
        if self.blossom_data.len() < bound {
            self.blossom_data.resize(bound, BlossomData::new(Label::Matched));
        }
    }

    fn new_blossom(&mut self, n: usize) -> usize {
        let blossom = self.blossom_set.insert(n, W::infinite());
        self.grow_blossoms();
        blossom
    }

    /// every node is an exposed even blossom and the root of its own tree
    pub fn init(&mut self) {
        self.reset();
        let zero = W::default();
        let floor = match self.variant {
            Variant::Maximum => zero,
            Variant::Perfect => zero - W::infinite(),
        };

        self.unmatched = self.arcs.node_count();
        for i in 0..self.arcs.node_count() {
            let n = self.arcs.nodes()[i];
            let max = self
                .arcs
                .out_arcs(n)
                .iter()
                .map(|a| self.scaled[a.edge_index()] / W::two())
                .fold(floor, |max, w| if max < w { w } else { max });

            self.node_data[n].pot = max;
            if self.variant == Variant::Maximum {
                self.delta1.push(n, max);
            }

            let blossom = self.new_blossom(n);
            self.tree_set.insert(blossom);
            self.blossom_data[blossom] = BlossomData::new(Label::Even);
        }

        for i in 0..self.arcs.edge_count() {
            let e = self.arcs.edges()[i];
            let (u, v) = (self.arcs.u(e), self.arcs.v(e));
            if u != v {
                let rw = self.node_data[u].pot + self.node_data[v].pot - self.scaled[e];
                self.delta3.push(e, rw / W::two());
            }
        }
        debug!("weighted matching initialized, {} exposed nodes", self.unmatched);
    }

    /// Start from an optimal fractional matching: its pairs become matched blossoms, its
    /// odd cycles become exposed even blossoms. Marks the engine infeasible when the
    /// perfect relaxation has no solution.
    pub fn fractional_init(&mut self) {
        self.reset();
        if !self.fractional.run(&self.arcs, &self.scaled, self.variant) {
            self.state = SolveState::Infeasible;
            return;
        }

        for i in 0..self.arcs.node_count() {
            let n = self.arcs.nodes()[i];
            self.node_data[n].pot = self.fractional.node_value(n);

            let blossom = self.new_blossom(n);
            let next = self.fractional.matching(n);
            self.blossom_data[blossom] = BlossomData {
                next,
                base: if next.is_none() { Some(n) } else { None },
                ..BlossomData::new(Label::Matched)
            };
        }

        let mut processed = FixedBitSet::with_capacity(self.arcs.node_bound());
        for i in 0..self.arcs.node_count() {
            let n = self.arcs.nodes()[i];
            if processed.put(n) {
                continue;
            }
            let Some(first) = self.fractional.matching(n) else {
                continue;
            };

            let mut cycle = vec![n];
            let mut v = self.arcs.target(first);
            while v != n {
                processed.insert(v);
                cycle.push(v);
                let Some(a) = self.fractional.matching(v) else {
                    unreachable!("node {v} breaks a fractional cycle");
                };
                v = self.arcs.target(a);
            }

            if cycle.len() % 2 == 1 {
                let subblossoms: Vec<_> = cycle
                    .iter()
                    .rev()
                    .map(|&v| self.blossom_set.find(v))
                    .collect();
                if self.variant == Variant::Maximum {
                    for &v in &cycle {
                        self.delta1.push(v, self.fractional.node_value(v));
                    }
                }

                let surface = self.blossom_set.join(&subblossoms);
                self.grow_blossoms();
                self.blossom_data[surface] = BlossomData::new(Label::Even);
                self.tree_set.insert(surface);
                self.unmatched += 1;
            }
        }

        for i in 0..self.arcs.edge_count() {
            let e = self.arcs.edges()[i];
            let (u, v) = (self.arcs.u(e), self.arcs.v(e));
            let (ub, vb) = (self.blossom_set.find(u), self.blossom_set.find(v));
            if self.blossom_data[ub].status == Label::Even
                && self.blossom_data[vb].status == Label::Even
                && ub != vb
            {
                let rw = self.node_data[u].pot + self.node_data[v].pot - self.scaled[e];
                self.delta3.push(e, rw / W::two());
            }
        }

        for i in 0..self.arcs.node_count() {
            let n = self.arcs.nodes()[i];
            let nb = self.blossom_set.find(n);
            if self.blossom_data[nb].status != Label::Matched {
                continue;
            }

            for j in 0..self.arcs.out_arcs(n).len() {
                let a = self.arcs.out_arcs(n)[j];
                let v = self.arcs.target(a);
                let vb = self.blossom_set.find(v);
                if self.blossom_data[vb].status == Label::Even {
                    let Some(vt) = self.tree_set.find(vb) else {
                        unreachable!("even blossom {vb} is out of every tree");
                    };
                    let rw = self.reduced_cost(n, v, a);
                    self.offer_arc(n, vt, a, rw);
                }
            }

            if let Some(prio) = self.node_data[n].heap.prio() {
                self.blossom_set.decrease(n, prio);
                if let Some(class_prio) = self.blossom_set.class_prio(nb) {
                    self.delta2.set(nb, class_prio - self.blossom_data[nb].offset);
                }
            }
        }
        debug!(
            "weighted matching jumpstarted, {} exposed blossoms",
            self.unmatched
        );
    }

    fn reduced_cost(&self, u: usize, v: usize, a: Arc) -> W {
        self.node_data[u].pot + self.node_data[v].pot - self.scaled[a.edge_index()]
    }

    fn next_arc(&self, blossom: usize) -> Arc {
        match self.blossom_data[blossom].next {
            Some(a) => a,
            None => unreachable!("blossom {blossom} has no matching arc"),
        }
    }

    fn pred_arc(&self, blossom: usize) -> Arc {
        match self.blossom_data[blossom].pred {
            Some(a) => a,
            None => unreachable!("blossom {blossom} has no parent"),
        }
    }

    fn tree_of(&self, blossom: usize) -> usize {
        match self.tree_set.find(blossom) {
            Some(tree) => tree,
            None => unreachable!("blossom {blossom} is out of every tree"),
        }
    }

    /// the blossom of the parent of `blossom` in its tree
    fn parent(&self, blossom: usize) -> usize {
        self.blossom_set
            .find(self.arcs.target(self.pred_arc(blossom)))
    }

    /// record arc `a` leaving node `v` towards `tree`, only the cheapest arc per tree is
    /// kept
    fn offer_arc(&mut self, v: usize, tree: usize, a: Arc, rw: W) {
        let data = &mut self.node_data[v];
        match data.heap_index.get(&tree).copied() {
            Some(old) => {
                if data.heap.get(old.index()).map_or(false, |cur| rw < cur) {
                    data.heap.replace(old.index(), a.index());
                    data.heap.decrease(a.index(), rw);
                    data.heap_index.insert(tree, a);
                }
            }
            None => {
                data.heap.push(a.index(), rw);
                data.heap_index.insert(tree, a);
            }
        }
    }

    /// propagate a cheaper arc of node `v` to the blossom set, and to `delta2` when
    /// `update` is set
    fn lower_node(&mut self, v: usize, vb: usize, update: bool) {
        let Some(top) = self.node_data[v].heap.prio() else {
            return;
        };
        if self.blossom_set.item_prio(v).map_or(true, |cur| top < cur) {
            self.blossom_set.decrease(v, top);
            if update {
                self.lower_delta2(vb);
            }
        }
    }

    fn lower_delta2(&mut self, blossom: usize) {
        let Some(class_prio) = self.blossom_set.class_prio(blossom) else {
            return;
        };
        let prio = class_prio - self.blossom_data[blossom].offset;
        match self.delta2.get(blossom) {
            None => self.delta2.push(blossom, prio),
            Some(cur) if prio < cur => self.delta2.decrease(blossom, prio),
            Some(_) => {}
        }
    }

    /// Scan the arcs entering a node of the even blossom, after its potential has been
    /// brought up to date. Edges to other even blossoms become `delta3` candidates, arcs
    /// from the other nodes are offered to their heaps.
    fn scan_even_node(&mut self, n: usize, blossom: usize, tree: usize) {
        for i in 0..self.arcs.out_arcs(n).len() {
            let a = self.arcs.out_arcs(n)[i];
            let e = a.opposite();
            let v = self.arcs.target(a);
            let vb = self.blossom_set.find(v);
            let rw = self.reduced_cost(n, v, a);

            if self.blossom_data[vb].status == Label::Even {
                let edge = a.edge_index();
                if !self.delta3.contains(edge) && blossom != vb {
                    self.delta3.push(edge, rw / W::two());
                }
            } else {
                self.offer_arc(v, tree, e, rw);
                let matched = self.blossom_data[vb].status == Label::Matched;
                self.lower_node(v, vb, matched);
            }
        }
    }

    /// move the nodes of blossom into even position, `shift` is added to their potential
    fn make_even(&mut self, blossom: usize, tree: usize, shift: W) {
        for n in self.blossom_set.items(blossom) {
            self.blossom_set.increase(n, W::infinite());

            let data = &mut self.node_data[n];
            data.heap.clear();
            data.heap_index.clear();
            data.pot = data.pot + shift;
            if self.variant == Variant::Maximum {
                self.delta1.push(n, data.pot);
            }

            self.scan_even_node(n, blossom, tree);
        }
        self.blossom_data[blossom].offset = W::default();
    }

    fn matched_to_even(&mut self, blossom: usize, tree: usize) {
        self.delta2.erase(blossom);

        let shift = self.delta_sum - self.blossom_data[blossom].offset;
        if !self.blossom_set.trivial(blossom) {
            let data = &mut self.blossom_data[blossom];
            data.pot = data.pot - twice(shift);
        }
        self.make_even(blossom, tree, shift);
    }

    fn matched_to_odd(&mut self, blossom: usize) {
        self.delta2.erase(blossom);

        let data = &mut self.blossom_data[blossom];
        data.offset = data.offset + self.delta_sum;
        if !self.blossom_set.trivial(blossom) {
            let prio = data.pot / W::two() + data.offset;
            self.delta4.push(blossom, prio);
        }
    }

    fn even_to_matched(&mut self, blossom: usize, tree: usize) {
        if !self.blossom_set.trivial(blossom) {
            let data = &mut self.blossom_data[blossom];
            data.pot = data.pot + twice(self.delta_sum);
        }

        for n in self.blossom_set.items(blossom) {
            let data = &mut self.node_data[n];
            data.pot = data.pot - self.delta_sum;
            if self.variant == Variant::Maximum {
                self.delta1.erase(n);
            }

            for i in 0..self.arcs.out_arcs(n).len() {
                let a = self.arcs.out_arcs(n)[i];
                let v = self.arcs.target(a);
                let vb = self.blossom_set.find(v);
                let rw = self.reduced_cost(n, v, a);

                if vb == blossom {
                    self.delta3.erase(a.edge_index());
                } else if self.blossom_data[vb].status == Label::Even {
                    self.delta3.erase(a.edge_index());

                    let vt = self.tree_of(vb);
                    if vt != tree {
                        self.offer_arc(n, vt, a, rw);
                        self.lower_node(n, blossom, true);
                    }
                } else {
                    self.withdraw_arc(v, vb, tree);
                }
            }
        }
    }

    /// drop the arc of node `v` towards the leaving tree
    fn withdraw_arc(&mut self, v: usize, vb: usize, tree: usize) {
        let data = &mut self.node_data[v];
        let Some(old) = data.heap_index.swap_remove(&tree) else {
            return;
        };
        data.heap.erase(old.index());

        let cur = self.blossom_set.item_prio(v);
        match data.heap.prio() {
            None => self.blossom_set.increase(v, W::infinite()),
            Some(top) if cur.map_or(false, |cur| cur < top) => {
                self.blossom_set.increase(v, top)
            }
            Some(_) => {}
        }

        if self.blossom_data[vb].status == Label::Matched {
            match self.blossom_set.class_prio(vb) {
                Some(class_prio) if class_prio < W::infinite() => {
                    let prio = class_prio - self.blossom_data[vb].offset;
                    if self.delta2.get(vb).map_or(false, |cur| cur < prio) {
                        self.delta2.increase(vb, prio);
                    }
                }
                _ => {
                    self.delta2.erase(vb);
                }
            }
        }
    }

    fn odd_to_matched(&mut self, blossom: usize) {
        let data = &mut self.blossom_data[blossom];
        data.offset = data.offset - self.delta_sum;

        if let Some(class_prio) = self.blossom_set.class_prio(blossom) {
            if class_prio < W::infinite() {
                let prio = class_prio - self.blossom_data[blossom].offset;
                self.delta2.set(blossom, prio);
            }
        }

        if !self.blossom_set.trivial(blossom) {
            self.delta4.erase(blossom);
        }
    }

    fn odd_to_even(&mut self, blossom: usize, tree: usize) {
        let offset = self.blossom_data[blossom].offset;
        if !self.blossom_set.trivial(blossom) {
            self.delta4.erase(blossom);
            let data = &mut self.blossom_data[blossom];
            data.pot = data.pot - twice(twice(self.delta_sum) - offset);
        }
        self.make_even(blossom, tree, twice(self.delta_sum) - offset);
    }

    /// unwind the tree path from the even blossom up to the root, flipping the matching
    fn alternate_path(&mut self, mut even: usize, tree: usize) {
        self.even_to_matched(even, tree);
        self.blossom_data[even].status = Label::Matched;

        while let Some(pred) = self.blossom_data[even].pred {
            let odd = self.blossom_set.find(self.arcs.target(pred));
            self.blossom_data[odd].status = Label::Matched;
            self.odd_to_matched(odd);
            self.blossom_data[odd].next = self.blossom_data[odd].pred;

            let odd_pred = self.pred_arc(odd);
            even = self.blossom_set.find(self.arcs.target(odd_pred));
            self.blossom_data[even].status = Label::Matched;
            self.even_to_matched(even, tree);
            self.blossom_data[even].next = Some(odd_pred.opposite());
        }
    }

    fn destroy_tree(&mut self, tree: usize) {
        let members: Vec<_> = self.tree_set.items(tree).collect();
        for b in members {
            match self.blossom_data[b].status {
                Label::Even => {
                    self.blossom_data[b].status = Label::Matched;
                    self.even_to_matched(b, tree);
                }
                Label::Odd => {
                    self.blossom_data[b].status = Label::Matched;
                    self.odd_to_matched(b);
                }
                Label::Matched => {}
            }
        }
        self.tree_set.erase_class(tree);
    }

    fn unmatch_node(&mut self, node: usize) {
        trace!("node {node} becomes exposed");
        self.counters.unmatches += 1;

        let blossom = self.blossom_set.find(node);
        let tree = self.tree_of(blossom);
        self.alternate_path(blossom, tree);
        self.destroy_tree(tree);

        let data = &mut self.blossom_data[blossom];
        data.base = Some(node);
        data.next = None;
    }

    fn augment_on_edge(&mut self, e: usize) {
        trace!("augment on edge {} -- {}", self.arcs.u(e), self.arcs.v(e));
        self.counters.augments += 1;

        let left = self.blossom_set.find(self.arcs.u(e));
        let right = self.blossom_set.find(self.arcs.v(e));

        let left_tree = self.tree_of(left);
        self.alternate_path(left, left_tree);
        self.destroy_tree(left_tree);

        let right_tree = self.tree_of(right);
        self.alternate_path(right, right_tree);
        self.destroy_tree(right_tree);

        self.blossom_data[left].next = Some(self.arcs.direct(e, true));
        self.blossom_data[right].next = Some(self.arcs.direct(e, false));
    }

    /// augment between an exposed blossom outside the trees and the tree of the even end
    fn augment_on_arc(&mut self, a: Arc) {
        trace!(
            "augment on arc {} -> {}",
            self.arcs.source(a),
            self.arcs.target(a)
        );
        self.counters.augments += 1;

        let left = self.blossom_set.find(self.arcs.source(a));
        let right = self.blossom_set.find(self.arcs.target(a));
        self.blossom_data[left].status = Label::Matched;

        let right_tree = self.tree_of(right);
        self.alternate_path(right, right_tree);
        self.destroy_tree(right_tree);

        self.blossom_data[left].next = Some(a);
        self.blossom_data[right].next = Some(a.opposite());
    }

    /// `a` leads from a matched blossom into an even one, the matched blossom turns odd
    /// and its partner even
    fn extend_on_arc(&mut self, a: Arc) {
        trace!(
            "extend tree over arc {} -> {}",
            self.arcs.source(a),
            self.arcs.target(a)
        );
        self.counters.extends += 1;

        let base = self.blossom_set.find(self.arcs.target(a));
        let tree = self.tree_of(base);

        let odd = self.blossom_set.find(self.arcs.source(a));
        self.tree_set.insert_into(odd, tree);
        self.blossom_data[odd].status = Label::Odd;
        self.matched_to_odd(odd);
        self.blossom_data[odd].pred = Some(a);

        let even = self.blossom_set.find(self.arcs.target(self.next_arc(odd)));
        self.blossom_data[even].pred = self.blossom_data[even].next;
        self.tree_set.insert_into(even, tree);
        self.blossom_data[even].status = Label::Even;
        self.matched_to_even(even, tree);
    }

    fn shrink_on_edge(&mut self, e: usize, tree: usize) {
        trace!("shrink blossom on edge {} -- {}", self.arcs.u(e), self.arcs.v(e));
        self.counters.shrinks += 1;

        let mut left = self.blossom_set.find(self.arcs.u(e));
        let mut right = self.blossom_set.find(self.arcs.v(e));
        let mut left_path = vec![left];
        let mut right_path = vec![right];
        let mut left_set = HashSet::from([left]);
        let mut right_set = HashSet::from([right]);
        let mut nca = None;

        // climb two levels at a time on both sides in turn
        loop {
            if self.blossom_data[left].pred.is_none() {
                break;
            }
            left = self.parent(left);
            left_path.push(left);
            left = self.parent(left);
            left_path.push(left);
            left_set.insert(left);
            if right_set.contains(&left) {
                nca = Some(left);
                break;
            }

            if self.blossom_data[right].pred.is_none() {
                break;
            }
            right = self.parent(right);
            right_path.push(right);
            right = self.parent(right);
            right_path.push(right);
            right_set.insert(right);
            if left_set.contains(&right) {
                nca = Some(right);
                break;
            }
        }

        let nca = match nca {
            Some(nca) => nca,
            None if self.blossom_data[left].pred.is_none() => {
                let mut nca = right;
                while !left_set.contains(&nca) {
                    nca = self.parent(nca);
                    right_path.push(nca);
                    nca = self.parent(nca);
                    right_path.push(nca);
                }
                nca
            }
            None => {
                let mut nca = left;
                while !right_set.contains(&nca) {
                    nca = self.parent(nca);
                    left_path.push(nca);
                    nca = self.parent(nca);
                    left_path.push(nca);
                }
                nca
            }
        };

        let mut subblossoms = Vec::new();
        let mut prev = self.arcs.direct(e, true);

        let mut i = 0;
        while left_path[i] != nca {
            let even = left_path[i];
            subblossoms.push(even);
            self.blossom_data[even].next = Some(prev);
            self.tree_set.erase(even);

            let odd = left_path[i + 1];
            subblossoms.push(odd);
            self.blossom_data[odd].status = Label::Even;
            self.odd_to_even(odd, tree);
            self.tree_set.erase(odd);
            prev = self.pred_arc(odd).opposite();
            i += 2;
        }

        let Some(k) = right_path.iter().position(|&b| b == nca) else {
            unreachable!("blossom {nca} is not on the right path");
        };

        subblossoms.push(nca);
        self.blossom_data[nca].next = Some(prev);

        for i in (0..k).step_by(2).rev() {
            let odd = right_path[i + 1];
            subblossoms.push(odd);
            self.blossom_data[odd].status = Label::Even;
            self.odd_to_even(odd, tree);
            self.tree_set.erase(odd);
            self.blossom_data[odd].next = self.blossom_data[odd].pred;

            let even = right_path[i];
            subblossoms.push(even);
            self.tree_set.erase(even);
        }

        let surface = self.blossom_set.join(&subblossoms);
        self.grow_blossoms();

        for &b in &subblossoms {
            if !self.blossom_set.trivial(b) {
                let data = &mut self.blossom_data[b];
                data.pot = data.pot + twice(self.delta_sum);
            }
            self.blossom_data[b].status = Label::Matched;
        }

        let nca_pred = self.blossom_data[nca].pred;
        self.blossom_data[surface] = BlossomData {
            pot: W::default() - twice(self.delta_sum),
            pred: nca_pred,
            next: nca_pred,
            ..BlossomData::new(Label::Even)
        };

        self.tree_set.insert_into(surface, tree);
        self.tree_set.erase(nca);
    }

    /// expand an odd blossom whose dual reached zero, the sub-blossoms on the even length
    /// side of the cycle stay in the tree
    fn split_blossom(&mut self, blossom: usize) {
        trace!("split blossom {blossom}");
        self.counters.splits += 1;

        let mut next = self.next_arc(blossom);
        let mut pred = self.pred_arc(blossom);
        let tree = self.tree_of(blossom);

        self.blossom_data[blossom].status = Label::Matched;
        self.odd_to_matched(blossom);
        self.delta2.erase(blossom);

        let subblossoms = self.blossom_set.split(blossom);
        let len = subblossoms.len();
        let offset = self.blossom_data[blossom].offset;
        let b = self.blossom_set.find(self.arcs.source(pred));
        let d = self.blossom_set.find(self.arcs.source(next));

        let (mut ib, mut id) = (0, 0);
        for (i, &sb) in subblossoms.iter().enumerate() {
            if sb == b {
                ib = i;
            }
            if sb == d {
                id = i;
            }

            self.blossom_data[sb].offset = offset;
            if !self.blossom_set.trivial(sb) {
                let data = &mut self.blossom_data[sb];
                data.pot = data.pot - twice(offset);
            }
            if let Some(class_prio) = self.blossom_set.class_prio(sb) {
                if class_prio < W::infinite() {
                    self.delta2.set(sb, class_prio - offset);
                }
            }
        }

        let pred_side_even = if id > ib {
            (id - ib) % 2 == 0
        } else {
            (ib - id) % 2 == 1
        };

        if pred_side_even {
            let mut i = (id + 1) % len;
            while i != ib {
                let (sb, tb) = (subblossoms[i], subblossoms[(i + 1) % len]);
                self.blossom_data[sb].next = Some(self.next_arc(tb).opposite());
                i = (i + 2) % len;
            }

            let mut i = ib;
            while i != id {
                let sb = subblossoms[i];
                let tb = subblossoms[(i + 1) % len];
                let ub = subblossoms[(i + 2) % len];

                self.blossom_data[sb].status = Label::Odd;
                self.matched_to_odd(sb);
                self.tree_set.insert_into(sb, tree);
                self.blossom_data[sb].pred = Some(pred);
                self.blossom_data[sb].next = Some(self.next_arc(tb).opposite());

                pred = self.next_arc(ub);

                self.blossom_data[tb].status = Label::Even;
                self.matched_to_even(tb, tree);
                self.tree_set.insert_into(tb, tree);
                self.blossom_data[tb].pred = self.blossom_data[tb].next;
                i = (i + 2) % len;
            }

            let sd = subblossoms[id];
            self.blossom_data[sd].status = Label::Odd;
            self.matched_to_odd(sd);
            self.tree_set.insert_into(sd, tree);
            self.blossom_data[sd].next = Some(next);
            self.blossom_data[sd].pred = Some(pred);
        } else {
            let mut i = (ib + 1) % len;
            while i != id {
                let (sb, tb) = (subblossoms[i], subblossoms[(i + 1) % len]);
                self.blossom_data[sb].next = Some(self.next_arc(tb).opposite());
                i = (i + 2) % len;
            }

            let mut i = id;
            while i != ib {
                let sb = subblossoms[i];
                let tb = subblossoms[(i + 1) % len];
                let ub = subblossoms[(i + 2) % len];

                self.blossom_data[sb].status = Label::Odd;
                self.matched_to_odd(sb);
                self.tree_set.insert_into(sb, tree);
                self.blossom_data[sb].next = Some(next);
                self.blossom_data[sb].pred = Some(self.next_arc(tb).opposite());

                self.blossom_data[tb].status = Label::Even;
                self.matched_to_even(tb, tree);
                self.tree_set.insert_into(tb, tree);
                let back = Some(self.next_arc(ub).opposite());
                self.blossom_data[tb].pred = back;
                self.blossom_data[tb].next = back;
                next = self.next_arc(ub);
                i = (i + 2) % len;
            }

            let sb = subblossoms[ib];
            self.blossom_data[sb].status = Label::Odd;
            self.matched_to_odd(sb);
            self.tree_set.insert_into(sb, tree);
            self.blossom_data[sb].next = Some(next);
            self.blossom_data[sb].pred = Some(pred);
        }
        self.tree_set.erase(blossom);
    }

    /// unfold a top-level blossom matched through `arc` at `base`, record the node
    /// potentials and the dual of every nested blossom
    fn extract_blossom(&mut self, blossom: usize, base: usize, arc: Option<Arc>) {
        if self.blossom_set.trivial(blossom) {
            self.matching[base] = arc;
            self.blossom_node_list.push(base);
            self.node_potential[base] = self.node_data[base].pot;
            return;
        }

        let pot = self.blossom_data[blossom].pot;
        let begin = self.blossom_node_list.len();

        let subblossoms = self.blossom_set.split(blossom);
        let len = subblossoms.len();
        let b = self.blossom_set.find(base);
        let Some(ib) = subblossoms.iter().position(|&sb| sb == b) else {
            unreachable!("base {base} is not in blossom {blossom}");
        };

        for i in (1..len).step_by(2) {
            let sb = subblossoms[(ib + i) % len];
            let tb = subblossoms[(ib + i + 1) % len];

            let m = self.next_arc(tb);
            self.extract_blossom(sb, self.arcs.target(m), Some(m.opposite()));
            self.extract_blossom(tb, self.arcs.source(m), Some(m));
        }
        self.extract_blossom(subblossoms[ib], base, arc);

        self.blossom_potential.push(BlossomVariable {
            begin,
            end: self.blossom_node_list.len(),
            value: pot,
        });
    }

    fn extract_matching(&mut self) {
        for blossom in self.blossom_set.classes() {
            match self.blossom_data[blossom].next {
                Some(next) => {
                    let offset = self.blossom_data[blossom].offset;
                    let data = &mut self.blossom_data[blossom];
                    data.pot = data.pot + twice(offset);
                    for n in self.blossom_set.items(blossom) {
                        let data = &mut self.node_data[n];
                        data.pot = data.pot - offset;
                    }
                    self.extract_blossom(blossom, self.arcs.source(next), Some(next));
                }
                None => {
                    let Some(base) = self.blossom_data[blossom].base else {
                        unreachable!("exposed blossom {blossom} has no base");
                    };
                    self.extract_blossom(blossom, base, None);
                }
            }
        }
    }

    /// Process events until no exposed blossom is left in a tree. Returns false when the
    /// engine is, or turns out to be, infeasible.
    pub fn start(&mut self) -> bool {
        match self.state {
            SolveState::Infeasible => return false,
            SolveState::Complete => return true,
            SolveState::InProgress => {}
        }
        if self.matching.len() != self.arcs.node_bound() {
            self.init();
        }
        let infinite = W::infinite();

        while self.unmatched > 0 {
            let d1 = match self.variant {
                Variant::Maximum => self.delta1.prio().unwrap_or(infinite),
                Variant::Perfect => infinite,
            };
            let d2 = self.delta2.prio().unwrap_or(infinite);
            let d3 = self.delta3.prio().unwrap_or(infinite);
            let d4 = self.delta4.prio().unwrap_or(infinite);

            let (mut delta, mut event) = (d3, Event::Tight);
            if d1 < delta {
                (delta, event) = (d1, Event::Unmatch);
            }
            if d2 < delta {
                (delta, event) = (d2, Event::Grow);
            }
            if d4 < delta {
                (delta, event) = (d4, Event::Split);
            }

            if !(delta < infinite) {
                debug!(
                    "no event left with {} exposed blossoms, no perfect matching exists",
                    self.unmatched
                );
                self.state = SolveState::Infeasible;
                return false;
            }
            self.delta_sum = delta;

            match event {
                Event::Unmatch => {
                    let Some(n) = self.delta1.top() else {
                        unreachable!("delta1 is empty");
                    };
                    self.unmatch_node(n);
                    self.unmatched -= 1;
                }
                Event::Grow => {
                    let Some(blossom) = self.delta2.top() else {
                        unreachable!("delta2 is empty");
                    };
                    let Some(n) = self.blossom_set.class_top(blossom) else {
                        unreachable!("blossom {blossom} has no nodes");
                    };
                    let Some(a) = self.node_data[n].heap.top() else {
                        unreachable!("node {n} has no arc into a tree");
                    };
                    let a = Arc::from_index(a);

                    if self.variant == Variant::Maximum
                        && self.blossom_data[blossom].next.is_none()
                    {
                        self.augment_on_arc(a);
                        self.unmatched -= 1;
                    } else {
                        self.extend_on_arc(a);
                    }
                }
                Event::Tight => {
                    let Some(e) = self.delta3.top() else {
                        unreachable!("delta3 is empty");
                    };
                    let left = self.blossom_set.find(self.arcs.u(e));
                    let right = self.blossom_set.find(self.arcs.v(e));

                    if left == right {
                        self.delta3.pop();
                    } else {
                        let left_tree = self.tree_of(left);
                        let right_tree = self.tree_of(right);
                        if left_tree == right_tree {
                            self.shrink_on_edge(e, left_tree);
                        } else {
                            self.augment_on_edge(e);
                            self.unmatched -= 2;
                        }
                    }
                }
                Event::Split => {
                    let Some(blossom) = self.delta4.top() else {
                        unreachable!("delta4 is empty");
                    };
                    self.split_blossom(blossom);
                }
            }
        }

        self.extract_matching();
        self.state = SolveState::Complete;
        debug!(
            "weighted matching done, size {}, {:?}",
            self.matching_size(),
            self.counters
        );
        true
    }

    pub fn state(&self) -> SolveState {
        self.state
    }

    pub fn arcs(&self) -> &ArcGraph {
        &self.arcs
    }

    pub fn matching_weight(&self) -> W {
        let sum = self
            .arcs
            .nodes()
            .iter()
            .filter_map(|&n| self.matching[n])
            .fold(W::default(), |sum, a| sum + self.weights[a.edge_index()]);
        sum / W::two()
    }

    pub fn matching_size(&self) -> usize {
        self.arcs
            .nodes()
            .iter()
            .filter(|&&n| self.matching[n].is_some())
            .count()
            / 2
    }

    pub fn is_matching_edge(&self, e: usize) -> bool {
        self.arcs.contains_edge(e)
            && self.matching[self.arcs.u(e)].map(Arc::edge_index) == Some(e)
    }

    pub fn matching(&self, n: usize) -> Option<Arc> {
        self.matching[n]
    }

    pub fn matching_map(&self) -> &[Option<Arc>] {
        &self.matching
    }

    pub fn dual_value(&self) -> W {
        let nodes = self
            .arcs
            .nodes()
            .iter()
            .fold(W::default(), |sum, &n| sum + self.node_potential[n]);
        (0..self.blossom_num()).fold(nodes, |sum, k| {
            sum + self.blossom_value(k) * W::from_usize(self.blossom_size(k) / 2)
        })
    }

    pub fn node_value(&self, n: usize) -> W {
        self.node_potential[n]
    }

    pub fn blossom_num(&self) -> usize {
        self.blossom_potential.len()
    }

    pub fn blossom_size(&self, k: usize) -> usize {
        let b = &self.blossom_potential[k];
        b.end - b.begin
    }

    pub fn blossom_value(&self, k: usize) -> W {
        self.blossom_potential[k].value
    }

    pub fn blossom_nodes(&self, k: usize) -> &[usize] {
        let b = &self.blossom_potential[k];
        &self.blossom_node_list[b.begin..b.end]
    }
}
