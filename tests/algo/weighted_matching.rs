use edmonds_matching::graph::algo::matching::{
    maximum_weight_matching, MaxWeightedMatching, SolveState,
};
use edmonds_matching::graph::graph_adjacency_list::Graph;
use edmonds_matching::graph::UnDirected;
use petgraph::graph::{NodeIndex, UnGraph};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::{brute_force, build_graph, collect, init_logger, random_edges};

/// run both initializations and check the optimum and its certificate
fn solve(n: usize, edges: &[(usize, usize, i64)]) -> i64 {
    let g = build_graph(n, edges);
    let expected = brute_force(n, edges, false).unwrap();

    let mut mwm = MaxWeightedMatching::new(&g, |e| *e.weight());
    mwm.init();
    assert_eq!(mwm.state(), SolveState::InProgress);
    mwm.start();
    assert_eq!(mwm.state(), SolveState::Complete);
    assert_eq!(mwm.matching_weight(), expected);
    certificate!(mwm, n, edges.len()).check(edges, false);

    mwm.fractional_init();
    mwm.start();
    assert_eq!(mwm.matching_weight(), expected);
    certificate!(mwm, n, edges.len()).check(edges, false);

    expected
}

fn one_based(edges: &[(usize, usize, i64)]) -> Vec<(usize, usize, i64)> {
    edges.iter().map(|&(u, v, w)| (u - 1, v - 1, w)).collect()
}

#[test]
fn weighted_empty() {
    let g: Graph<(), i64, UnDirected> = Graph::with_capacity((0, 0));
    let mut mwm = MaxWeightedMatching::new(&g, |e| *e.weight());
    mwm.run();
    assert_eq!(mwm.state(), SolveState::Complete);
    assert_eq!(mwm.matching_size(), 0);
    assert_eq!(mwm.matching_weight(), 0);
    assert_eq!(mwm.dual_value(), 0);
    assert_eq!(mwm.blossom_num(), 0);
}

#[test]
fn weighted_single_edge() {
    assert_eq!(solve(2, &[(0, 1, 1)]), 1);
    // a negative edge is never worth taking
    assert_eq!(solve(2, &[(0, 1, -1)]), 0);
    assert_eq!(solve(3, &[(0, 1, 0), (1, 1, 7)]), 0);
}

#[test]
fn weighted_triangle() {
    // only one edge of a triangle fits
    let g: Graph<(), i64, UnDirected> = Graph::from_edges([(0, 1, 1), (1, 2, 1), (2, 0, 3)]);
    let mut mwm = MaxWeightedMatching::new(&g, |e| *e.weight());
    mwm.run();

    assert_eq!(mwm.matching_weight(), 3);
    assert_eq!(mwm.matching_size(), 1);
    assert!(mwm.is_matching_edge(2));
    assert_eq!(mwm.mate(0), Some(2));
    assert_eq!(mwm.mate(1), None);
    assert_eq!(mwm.node_value(1), 0);
    assert_eq!(mwm.dual_scale(), 4);
    assert_eq!(mwm.dual_value(), 12);
    certificate!(mwm, 3, 3).check(&[(0, 1, 1), (1, 2, 1), (2, 0, 3)], false);
}

#[test]
fn weighted_triangle_float() {
    let g: Graph<(), f64, UnDirected> =
        Graph::from_edges([(0, 1, 1.0), (1, 2, 1.0), (2, 0, 3.0)]);
    let mut mwm = MaxWeightedMatching::new(&g, |e| *e.weight());
    mwm.run();

    assert_eq!(mwm.matching_weight(), 3.0);
    assert_eq!(mwm.dual_scale(), 1.0);
    assert_eq!(mwm.dual_value(), 3.0);
    assert_eq!(mwm.mate(2), Some(0));
}

#[test]
fn weighted_prefers_weight_over_size() {
    // one heavy middle edge beats the two light outer ones
    let edges = [(0, 1, 5), (1, 2, 11), (2, 3, 5)];
    assert_eq!(solve(4, &edges), 11);

    let g = build_graph(4, &edges);
    let m = maximum_weight_matching(&g, |e| *e.weight());
    assert_eq!(collect(m.edges()), set![(1, 2)]);
    assert!(!m.is_perfect());
}

#[test]
fn weighted_parallel_edges() {
    let edges = [(0, 1, 1), (0, 1, 5), (1, 2, 2)];
    let g = build_graph(3, &edges);
    let mut mwm = MaxWeightedMatching::new(&g, |e| *e.weight());
    mwm.run();

    assert_eq!(mwm.matching_weight(), 5);
    assert!(mwm.is_matching_edge(1));
    assert!(!mwm.is_matching_edge(0));
    certificate!(mwm, 3, 3).check(&edges, false);
}

#[test]
fn weighted_s_blossom() {
    let edges = one_based(&[(1, 2, 8), (1, 3, 9), (2, 3, 10), (3, 4, 7)]);
    assert_eq!(solve(4, &edges), 15);

    let mut edges = edges;
    edges.extend(one_based(&[(1, 6, 5), (4, 5, 6)]));
    assert_eq!(solve(6, &edges), 21);
}

#[test]
fn weighted_s_t_blossom() {
    let edges = one_based(&[
        (1, 2, 9),
        (1, 3, 8),
        (2, 3, 10),
        (1, 4, 5),
        (4, 5, 4),
        (1, 6, 3),
    ]);
    assert_eq!(solve(6, &edges), 17);
}

#[test]
fn weighted_nested_blossoms() {
    // blossoms nested in blossoms, relabeled and expanded again
    let cases = [
        vec![
            (1, 2, 19),
            (1, 3, 20),
            (1, 8, 8),
            (2, 3, 25),
            (2, 4, 18),
            (3, 5, 18),
            (4, 5, 13),
            (4, 7, 7),
            (5, 6, 7),
        ],
        vec![
            (1, 2, 10),
            (1, 7, 10),
            (2, 3, 12),
            (3, 4, 20),
            (3, 5, 20),
            (4, 5, 25),
            (5, 6, 10),
            (6, 7, 10),
            (7, 8, 8),
        ],
        vec![
            (1, 2, 8),
            (1, 3, 8),
            (2, 3, 10),
            (2, 4, 12),
            (3, 5, 12),
            (4, 5, 14),
            (4, 6, 12),
            (5, 7, 12),
            (6, 7, 14),
            (7, 8, 12),
        ],
        vec![
            (1, 2, 23),
            (1, 5, 22),
            (1, 6, 15),
            (2, 3, 25),
            (3, 4, 22),
            (4, 5, 25),
            (4, 8, 14),
            (5, 7, 13),
        ],
    ];
    for edges in cases {
        solve(8, &one_based(&edges));
    }
}

#[test]
fn weighted_nasty_expansions() {
    let cases = [
        vec![
            (1, 2, 45),
            (1, 5, 45),
            (2, 3, 50),
            (3, 4, 45),
            (4, 5, 50),
            (1, 6, 30),
            (3, 9, 35),
            (4, 8, 35),
            (5, 7, 26),
            (9, 10, 5),
        ],
        vec![
            (1, 2, 45),
            (1, 5, 45),
            (2, 3, 50),
            (3, 4, 45),
            (4, 5, 50),
            (1, 6, 30),
            (3, 9, 35),
            (4, 8, 26),
            (5, 7, 40),
            (9, 10, 5),
        ],
        vec![
            (1, 2, 45),
            (1, 5, 45),
            (2, 3, 50),
            (3, 4, 45),
            (4, 5, 50),
            (1, 6, 30),
            (3, 9, 35),
            (4, 8, 28),
            (5, 7, 26),
            (9, 10, 5),
        ],
        vec![
            (1, 2, 45),
            (1, 7, 45),
            (2, 3, 50),
            (3, 4, 45),
            (4, 5, 95),
            (4, 6, 94),
            (5, 6, 94),
            (6, 7, 50),
            (1, 8, 30),
            (3, 11, 35),
            (5, 9, 36),
            (7, 10, 26),
            (11, 12, 5),
        ],
        vec![
            (1, 2, 40),
            (1, 3, 40),
            (2, 3, 60),
            (2, 4, 55),
            (3, 5, 55),
            (4, 5, 50),
            (1, 8, 15),
            (5, 7, 30),
            (7, 6, 10),
            (8, 10, 10),
            (4, 9, 30),
        ],
    ];
    for edges in cases {
        solve(12, &one_based(&edges));
    }
}

#[test]
fn weighted_queries_are_stable() {
    let edges = one_based(&[(1, 2, 8), (1, 3, 9), (2, 3, 10), (3, 4, 7), (1, 6, 5), (4, 5, 6)]);
    let g = build_graph(6, &edges);
    let mut mwm = MaxWeightedMatching::new(&g, |e| *e.weight());
    mwm.run();

    let map = mwm.matching_map().to_vec();
    let values: Vec<_> = (0..6).map(|n| mwm.node_value(n)).collect();
    assert_eq!(mwm.dual_value(), mwm.dual_value());
    assert_eq!(mwm.matching_weight(), mwm.matching_weight());
    assert_eq!(mwm.matching_map(), &map[..]);
    assert_eq!((0..6).map(|n| mwm.node_value(n)).collect::<Vec<_>>(), values);

    // starting again does not redo the work
    mwm.start();
    assert_eq!(mwm.matching_map(), &map[..]);

    // a second run on the same engine gives the same answer
    mwm.run();
    assert_eq!(mwm.matching_weight(), 21);
    assert_eq!(mwm.to_matching().len(), 3);
}

#[test]
fn weighted_on_petgraph() {
    let mut g = UnGraph::<(), i64>::new_undirected();
    let nodes: Vec<_> = (0..4).map(|_| g.add_node(())).collect();
    g.add_edge(nodes[0], nodes[1], 1);
    g.add_edge(nodes[1], nodes[2], 2);
    g.add_edge(nodes[2], nodes[3], 1);
    g.add_edge(nodes[3], nodes[0], 2);

    let m = maximum_weight_matching(&g, |e| *e.weight());
    assert_eq!(
        collect(m.edges()),
        set![(NodeIndex::new(1), NodeIndex::new(2)), (NodeIndex::new(0), NodeIndex::new(3))]
    );
}

#[test]
fn weighted_random() {
    init_logger();
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    for _ in 0..300 {
        let n = rng.gen_range(1..=10);
        let p = rng.gen_range(0.2..0.9);
        let edges = random_edges(&mut rng, n, p, -3..=12);
        solve(n, &edges);
    }
}

#[test]
fn weighted_random_float() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    for _ in 0..100 {
        let n = rng.gen_range(1..=8);
        let edges = random_edges(&mut rng, n, 0.5, 0..=20);
        let expected = brute_force(n, &edges, false).unwrap();

        let mut g: Graph<(), f64, UnDirected> = Graph::new_undirected();
        for _ in 0..n {
            g.add_node(());
        }
        g.extends_with_edges(edges.iter().map(|&(u, v, w)| (u, v, w as f64)));

        let mut mwm = MaxWeightedMatching::new(&g, |e| *e.weight());
        mwm.run();
        assert_eq!(mwm.matching_weight(), expected as f64);
        assert_eq!(mwm.dual_value(), expected as f64);
    }
}
