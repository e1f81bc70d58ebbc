use std::collections::HashSet;
use std::hash::Hash;

macro_rules! assert_one_of {
    ($actual:expr, [$($expected:expr),+]) => {
        let expected = &[$($expected),+];
        if !expected.iter().any(|expected| expected == &$actual) {
            let expected = expected.iter().map(|e| format!("\n{:?}", e)).collect::<Vec<_>>();
            let comma_separated = expected.join(", ");
            panic!("assertion failed: `actual does not equal to any of expected`\nactual:\n{:?}\nexpected:{}", $actual, comma_separated);
        }
    };
}

macro_rules! set {
    () => {
        ::std::collections::HashSet::new()
    };
    ($(($source:expr, $target:expr)),+) => {
        {
            let mut set = ::std::collections::HashSet::new();
            $(
                set.insert(($source, $target));
            )*
            set
        }
    };
    ($($elem:expr),+) => {
        {
            let mut set = ::std::collections::HashSet::new();
            $(
                set.insert($elem);
            )*
            set
        }
    };
}

// So we don't have to type `.collect::<HashSet<_>>`.
fn collect<'a, T: Copy + Eq + Hash + 'a>(iter: impl Iterator<Item = T>) -> HashSet<T> {
    iter.collect()
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// random simple graph on `n` nodes as an edge list, weights drawn from `weights`
fn random_edges(
    rng: &mut impl rand::Rng,
    n: usize,
    p: f64,
    weights: std::ops::RangeInclusive<i64>,
) -> Vec<(usize, usize, i64)> {
    let mut edges = Vec::new();
    for u in 0..n {
        for v in u + 1..n {
            if rng.gen_bool(p) {
                edges.push((u, v, rng.gen_range(weights.clone())));
            }
        }
    }
    edges
}

/// copy the primal and dual solution out of a weighted engine run on `Graph<_, i64, _>`
macro_rules! certificate {
    ($engine:expr, $n:expr, $m:expr) => {
        $crate::Certificate {
            scale: $engine.dual_scale(),
            weight: $engine.matching_weight(),
            dual: $engine.dual_value(),
            node_value: (0..$n).map(|u| $engine.node_value(u)).collect(),
            blossoms: (0..$engine.blossom_num())
                .map(|k| {
                    assert_eq!($engine.blossom_nodes(k).count(), $engine.blossom_size(k));
                    ($engine.blossom_nodes(k).collect(), $engine.blossom_value(k))
                })
                .collect(),
            mate: (0..$n).map(|u| $engine.mate(u)).collect(),
            matched: (0..$m).map(|e| $engine.is_matching_edge(e)).collect(),
        }
    };
}

fn build_graph(
    n: usize,
    edges: &[(usize, usize, i64)],
) -> edmonds_matching::graph::graph_adjacency_list::Graph<(), i64, edmonds_matching::graph::UnDirected>
{
    let mut g = edmonds_matching::graph::graph_adjacency_list::Graph::new_undirected();
    for _ in 0..n {
        g.add_node(());
    }
    g.extends_with_edges(edges.iter().copied());
    g
}

/// optimum weight by enumeration, `None` if a perfect matching is asked for and there is
/// none
fn brute_force(n: usize, edges: &[(usize, usize, i64)], perfect: bool) -> Option<i64> {
    fn best(
        mask: usize,
        n: usize,
        edges: &[(usize, usize, i64)],
        perfect: bool,
        memo: &mut Vec<Option<Option<i64>>>,
    ) -> Option<i64> {
        if let Some(known) = memo[mask] {
            return known;
        }
        let Some(u) = (0..n).find(|&u| mask & (1 << u) == 0) else {
            return Some(0);
        };

        let mut result = if perfect {
            None
        } else {
            best(mask | 1 << u, n, edges, perfect, memo)
        };
        for &(a, b, w) in edges {
            let v = match (a == u, b == u) {
                (true, false) => b,
                (false, true) => a,
                _ => continue,
            };
            if mask & (1 << v) != 0 {
                continue;
            }
            if let Some(rest) = best(mask | 1 << u | 1 << v, n, edges, perfect, memo) {
                result = Some(result.map_or(w + rest, |r: i64| r.max(w + rest)));
            }
        }
        memo[mask] = Some(result);
        result
    }

    best(0, n, edges, perfect, &mut vec![None; 1 << n])
}

/// primal and dual solution of a weighted run
struct Certificate {
    scale: i64,
    weight: i64,
    dual: i64,
    node_value: Vec<i64>,
    blossoms: Vec<(HashSet<usize>, i64)>,
    mate: Vec<Option<usize>>,
    matched: Vec<bool>,
}

impl Certificate {
    /// the matching is valid, the duals are feasible, complementary slackness and strong
    /// duality hold
    fn check(&self, edges: &[(usize, usize, i64)], perfect: bool) {
        for (u, &m) in self.mate.iter().enumerate() {
            if let Some(v) = m {
                assert_eq!(self.mate[v], Some(u));
            } else {
                assert!(!perfect, "node {u} is exposed");
                assert_eq!(self.node_value[u], 0, "exposed node {u} has a potential");
            }
            if !perfect {
                assert!(self.node_value[u] >= 0);
            }
        }

        for (nodes, value) in &self.blossoms {
            assert_eq!(nodes.len() % 2, 1);
            assert!(nodes.len() >= 3);
            assert!(*value >= 0);
        }

        let mut weight = 0;
        let mut matched = 0;
        for (e, &(u, v, w)) in edges.iter().enumerate() {
            if u == v {
                assert!(!self.matched[e]);
                continue;
            }
            let mut rw = self.node_value[u] + self.node_value[v] - self.scale * w;
            for (nodes, value) in &self.blossoms {
                if nodes.contains(&u) && nodes.contains(&v) {
                    rw += value;
                }
            }
            assert!(rw >= 0, "edge {e} violates the dual");
            if self.matched[e] {
                assert_eq!(rw, 0, "matched edge {e} is not tight");
                assert_eq!(self.mate[u], Some(v));
                weight += w;
                matched += 1;
            }
        }

        assert_eq!(2 * matched, self.mate.iter().flatten().count());
        assert_eq!(weight, self.weight);
        assert_eq!(self.dual, self.weight * self.scale);
    }
}

// all algorithm test in this module
mod matching;
mod weighted_matching;
