use std::collections::HashSet;

use edmonds_matching::graph::algo::matching::{
    greedy_matching, maximum_matching, DensityPolicy, MatchingError, MaxMatching, Status,
};
use edmonds_matching::graph::graph_adjacency_list::Graph;
use edmonds_matching::graph::visit::{
    EdgeIndexable, IntoEdgeReferences, IntoNodeIdentifiers, NodeIndexable,
};
use edmonds_matching::graph::UnDirected;
use petgraph::graph::{NodeIndex, UnGraph};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::{collect, init_logger, random_edges};

/// every matched node is matched back, and the engine agrees with the exported matching
fn assert_valid<G>(mm: &MaxMatching<G>, g: G)
where
    G: IntoEdgeReferences + IntoNodeIdentifiers + NodeIndexable + EdgeIndexable,
    G::NodeId: PartialEq + std::fmt::Debug,
{
    let mut matched = 0;
    for n in g.node_identifiers() {
        if let Some(m) = mm.mate(n) {
            assert_eq!(mm.mate(m), Some(n));
            let a = mm.matching(n).unwrap();
            assert_eq!(mm.arc_source(a), n);
            assert_eq!(mm.arc_target(a), m);
            assert!(mm.is_matching_edge(mm.arc_edge(a)));
            matched += 1;
        }
    }
    assert_eq!(matched, 2 * mm.matching_size());
    assert_eq!(mm.to_matching().len(), mm.matching_size());
}

/// the labels are the Gallai-Edmonds decomposition certifying the size of the matching
fn assert_decomposition<G>(mm: &MaxMatching<G>, g: G)
where
    G: IntoEdgeReferences + IntoNodeIdentifiers + NodeIndexable + EdgeIndexable,
{
    for n in g.node_identifiers() {
        let status = mm.status(n);
        assert_ne!(status, Status::Unmatched);
        assert_eq!(mm.barrier(n), status == Status::A);
        if mm.mate(n).is_none() {
            assert_eq!(status, Status::D);
        }
    }
    assert_eq!(
        mm.deficiency(),
        mm.node_count() - 2 * mm.matching_size()
    );
}

#[test]
fn greedy_empty() {
    let g: Graph<(), (), _> = Graph::new_undirected();
    let m = greedy_matching(&g);
    assert_eq!(collect(m.edges()), set![]);
    assert_eq!(collect(m.nodes()), set![]);
}

#[test]
fn greedy_disjoint() {
    let g: Graph<(), (), UnDirected> = Graph::from_edges([(0, 1), (2, 3)]);
    let m = greedy_matching(&g);
    assert_eq!(collect(m.edges()), set![(0, 1), (2, 3)]);
    assert_eq!(collect(m.nodes()), set![0, 1, 2, 3]);
}

#[test]
fn greedy_odd_path() {
    let g: Graph<(), (), UnDirected> = Graph::from_edges([(0, 1), (1, 2), (2, 3)]);
    let m = greedy_matching(&g);
    assert_one_of!(collect(m.edges()), [set![(0, 1), (2, 3)], set![(1, 2)]]);
    assert_one_of!(collect(m.nodes()), [set![0, 1, 2, 3], set![1, 2]]);
}

#[test]
fn greedy_star() {
    let g: Graph<(), (), UnDirected> = Graph::from_edges([(0, 1), (0, 2), (0, 3)]);
    let m = greedy_matching(&g);
    assert_one_of!(
        collect(m.edges()),
        [set![(0, 1)], set![(0, 2)], set![(0, 3)]]
    );
    assert_one_of!(collect(m.nodes()), [set![0, 1], set![0, 2], set![0, 3]]);
}

#[test]
fn maximum_empty() {
    let g: Graph<(), (), UnDirected> = Graph::with_capacity((0, 0));
    let m = maximum_matching(&g);
    assert_eq!(collect(m.edges()), set![]);
    assert_eq!(collect(m.nodes()), set![]);
    assert!(m.is_empty());
    assert!(m.is_perfect());
}

#[test]
fn maximum_disjoint() {
    let g: Graph<(), (), UnDirected> = Graph::from_edges([(0, 1), (2, 3)]);
    let m = maximum_matching(&g);
    assert_eq!(collect(m.edges()), set![(0, 1), (2, 3)]);
    assert_eq!(collect(m.nodes()), set![0, 1, 2, 3]);
}

#[test]
fn maximum_odd_path() {
    let g: Graph<(), (), UnDirected> = Graph::from_edges([(0, 1), (1, 2), (2, 3)]);
    let m = maximum_matching(&g);
    assert_eq!(collect(m.edges()), set![(0, 1), (2, 3)]);
    assert_eq!(collect(m.nodes()), set![0, 1, 2, 3]);
    assert!(m.contains_edge(1, 0));
    assert!(!m.contains_edge(1, 2));
    assert_eq!(m.mate(3), Some(2));
}

#[test]
fn maximum_four_cycle() {
    let g: Graph<(), (), UnDirected> = Graph::from_edges([(0, 1), (1, 2), (2, 3), (3, 0)]);
    let mut mm = MaxMatching::new(&g);
    mm.run();

    assert_eq!(mm.matching_size(), 2);
    assert_one_of!(
        collect(mm.to_matching().edges()),
        [set![(0, 1), (2, 3)], set![(1, 2), (0, 3)]]
    );
    assert_valid(&mm, &g);
    assert_decomposition(&mm, &g);
    assert!(mm.status_map().iter().all(|&s| s == Status::C));
}

#[test]
fn maximum_five_cycle() {
    let g: Graph<(), (), UnDirected> =
        Graph::from_edges([(0, 1), (1, 2), (2, 3), (3, 4), (4, 0)]);
    let mut mm = MaxMatching::new(&g);
    mm.run();

    assert_eq!(mm.matching_size(), 2);
    let exposed: Vec<_> = (0..5).filter(|&n| mm.mate(n).is_none()).collect();
    assert_eq!(exposed.len(), 1);
    assert_eq!(mm.status(exposed[0]), Status::Even);
    // the cycle is factor-critical, a single D component
    assert!(mm.status_map().iter().all(|&s| s == Status::D));
    assert_eq!(mm.deficiency(), 1);
    assert_valid(&mm, &g);
}

#[test]
fn maximum_star_barrier() {
    let g: Graph<(), (), UnDirected> = Graph::from_edges([(0, 1), (0, 2), (0, 3)]);
    let mut mm = MaxMatching::new(&g);
    mm.run();

    assert_eq!(mm.matching_size(), 1);
    assert!(mm.barrier(0));
    for leaf in 1..4 {
        assert!(!mm.barrier(leaf));
        assert_eq!(mm.status(leaf), Status::D);
    }
    assert_eq!(mm.deficiency(), 2);
    assert_decomposition(&mm, &g);
}

#[test]
fn maximum_triangle_with_pendant() {
    let g: Graph<(), (), UnDirected> = Graph::from_edges([(0, 1), (1, 2), (2, 0), (2, 3)]);
    let m = maximum_matching(&g);
    assert_eq!(m.len(), 2);
    assert!(m.is_perfect());
    assert!(m.contains_edge(2, 3));
}

#[test]
fn maximum_through_blossom() {
    // 0 is exposed, the only augmenting path leaves the triangle at the far side of the
    // matched edge 1 - 2
    let g: Graph<(), (), UnDirected> = Graph::from_edges([(0, 1), (1, 2), (2, 0), (1, 3)]);
    let mut mm = MaxMatching::new(&g);
    mm.matching_init(|e| e == 1).unwrap();
    assert_eq!(mm.matching_size(), 1);
    assert_eq!(mm.mate(1), Some(2));

    mm.start_sparse();
    assert_eq!(mm.matching_size(), 2);
    assert_eq!(collect(mm.to_matching().edges()), set![(0, 2), (1, 3)]);
    assert_decomposition(&mm, &g);

    mm.matching_init(|e| e == 1).unwrap();
    mm.start_dense();
    assert_eq!(collect(mm.to_matching().edges()), set![(0, 2), (1, 3)]);
}

#[test]
fn maximum_ignores_selfloops() {
    let g: Graph<(), (), UnDirected> = Graph::from_edges([(0, 0), (0, 1), (1, 1), (2, 2)]);
    let mut mm = MaxMatching::new(&g);
    mm.run();

    assert_eq!(mm.matching_size(), 1);
    assert!(mm.is_matching_edge(1));
    assert!(!mm.is_matching_edge(0));
    assert_eq!(mm.mate(2), None);
    assert_eq!(mm.status(2), Status::Even);
    assert_decomposition(&mm, &g);
}

#[test]
fn maximum_petersen() {
    let g: Graph<(), (), UnDirected> = Graph::from_edges([
        (0, 1),
        (1, 2),
        (2, 3),
        (3, 4),
        (4, 0),
        (0, 5),
        (1, 6),
        (2, 7),
        (3, 8),
        (4, 9),
        (5, 7),
        (7, 9),
        (9, 6),
        (6, 8),
        (8, 5),
    ]);
    let m = maximum_matching(&g);
    assert_eq!(m.len(), 5);
    assert!(m.is_perfect());
}

#[test]
fn matching_init_invalid() {
    let g: Graph<(), (), UnDirected> = Graph::from_edges([(0, 1), (1, 2), (2, 3)]);
    let mut mm = MaxMatching::new(&g);
    assert_eq!(
        mm.matching_init(|e| e < 2),
        Err(MatchingError::InvalidMatching { node: 1 })
    );

    // a selfloop covers its node twice
    let g: Graph<(), (), UnDirected> = Graph::from_edges([(0, 1), (2, 2)]);
    let mut mm = MaxMatching::new(&g);
    assert_eq!(
        mm.matching_init(|e| e == 1),
        Err(MatchingError::InvalidMatching { node: 2 })
    );
}

#[test]
fn matching_init_is_completed() {
    let g: Graph<(), (), UnDirected> = Graph::from_edges([(0, 1), (1, 2), (2, 3)]);
    let mut mm = MaxMatching::new(&g);
    mm.matching_init(|e| e == 1).unwrap();
    assert_eq!(collect(mm.to_matching().edges()), set![(1, 2)]);

    mm.start_sparse();
    assert_eq!(collect(mm.to_matching().edges()), set![(0, 1), (2, 3)]);
}

#[test]
fn rerun_is_stable() {
    let g: Graph<(), (), UnDirected> =
        Graph::from_edges([(0, 1), (1, 2), (2, 3), (3, 4), (4, 0), (4, 5)]);
    let mut mm = MaxMatching::new(&g);
    mm.run();
    let first = mm.matching_map().to_vec();
    let status = mm.status_map().to_vec();

    // queries do not change the engine
    assert_eq!(mm.deficiency(), mm.deficiency());
    assert_eq!(mm.matching_map(), &first[..]);

    mm.run();
    assert_eq!(mm.matching_map(), &first[..]);
    assert_eq!(mm.status_map(), &status[..]);
    assert_eq!(mm.matching_size(), 3);
}

#[test]
fn density_policy() {
    let policy = DensityPolicy::default();
    assert_eq!(policy.dense_ratio, 2);
    assert!(policy.is_dense(4, 8));
    assert!(!policy.is_dense(4, 7));

    let g: Graph<(), (), UnDirected> = Graph::from_edges([(0, 1), (1, 2), (2, 0)]);
    let mut mm = MaxMatching::with_policy(&g, DensityPolicy { dense_ratio: 0 });
    assert_eq!(mm.policy().dense_ratio, 0);
    mm.run();
    assert_eq!(mm.matching_size(), 1);

    mm.set_policy(DensityPolicy { dense_ratio: usize::MAX });
    mm.run();
    assert_eq!(mm.matching_size(), 1);
}

fn random_ungraph(rng: &mut ChaCha8Rng, n: usize, p: f64) -> UnGraph<(), i64> {
    let mut g = UnGraph::new_undirected();
    for _ in 0..n {
        g.add_node(());
    }
    for (u, v, w) in random_edges(rng, n, p, 1..=1) {
        g.add_edge(NodeIndex::new(u), NodeIndex::new(v), w);
    }
    g
}

#[test]
fn random_against_petgraph() {
    init_logger();
    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);

    for _ in 0..200 {
        let n = rng.gen_range(1..30);
        let p = rng.gen_range(0.05..0.5);
        let g = random_ungraph(&mut rng, n, p);
        let expected = petgraph::algo::maximum_matching(&g).len();

        let mut mm = MaxMatching::new(&g);
        mm.run();
        assert_eq!(mm.matching_size(), expected);
        assert_valid(&mm, &g);
        assert_decomposition(&mm, &g);
        let status: Vec<_> = mm.status_map().to_vec();

        // every strategy and every starting point reaches the same decomposition
        for (greedy, dense) in [(false, false), (false, true), (true, false), (true, true)] {
            if greedy {
                mm.greedy_init();
            } else {
                mm.init();
            }
            if dense {
                mm.start_dense();
            } else {
                mm.start_sparse();
            }
            assert_eq!(mm.matching_size(), expected);
            assert_valid(&mm, &g);
            assert_decomposition(&mm, &g);
            assert_eq!(mm.status_map(), &status[..]);
        }
    }
}

#[test]
fn random_matching_init() {
    let mut rng = ChaCha8Rng::seed_from_u64(17);

    for _ in 0..50 {
        let n = rng.gen_range(2..20);
        let g = random_ungraph(&mut rng, n, 0.3);

        // a greedy matching as the initial one
        let greedy = greedy_matching(&g);
        let marked: HashSet<_> = greedy.edges().map(|(u, v)| (u.index(), v.index())).collect();

        let mut mm = MaxMatching::new(&g);
        mm.matching_init(|e| {
            let (u, v) = g.edge_endpoints(e).unwrap();
            marked.contains(&(u.index().min(v.index()), u.index().max(v.index())))
        })
        .unwrap();
        assert_eq!(mm.matching_size(), greedy.len());

        mm.start_sparse();
        assert_eq!(
            mm.matching_size(),
            petgraph::algo::maximum_matching(&g).len()
        );
        assert_decomposition(&mm, &g);
    }
}
