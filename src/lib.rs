//! Matchings in general graphs: Edmonds' blossom algorithm for maximum cardinality,
//! maximum weighted and maximum weighted perfect matchings, together with the heap and
//! union-find structures the engines are built on.

pub mod binary_heap_cus;
pub mod graph;
pub mod union_find_cus;
