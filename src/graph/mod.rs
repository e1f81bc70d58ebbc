pub mod algo;
pub mod graph_adjacency_list;
pub mod petgraph_adapter;
pub mod visit;

pub trait IntoWeightedEdge<E> {
    type NodeId;

    fn into_weighted_edge(self) -> (Self::NodeId, Self::NodeId, E);
}

impl<N, E> IntoWeightedEdge<E> for (N, N, E) {
    type NodeId = N;

    fn into_weighted_edge(self) -> (Self::NodeId, Self::NodeId, E) {
        self
    }
}

impl<N, E> IntoWeightedEdge<E> for (N, N)
where
    E: Default,
{
    type NodeId = N;

    fn into_weighted_edge(self) -> (Self::NodeId, Self::NodeId, E) {
        (self.0, self.1, E::default())
    }
}

// See: https://doc.rust-lang.org/error_codes/E0207.html
pub trait GraphType {
    fn is_directed() -> bool;
}

pub struct Directed;

impl GraphType for Directed {
    fn is_directed() -> bool {
        true
    }
}

pub struct UnDirected;

impl GraphType for UnDirected {
    fn is_directed() -> bool {
        false
    }
}

/// The two intrusive edge lists every node of the adjacency list keeps.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Direction {
    Outcoming,
    Incoming,
}

impl From<Direction> for usize {
    fn from(value: Direction) -> Self {
        match value {
            Direction::Outcoming => 0,
            Direction::Incoming => 1,
        }
    }
}
