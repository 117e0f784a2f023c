mod compact_graph;
mod network_error;

pub use compact_graph::{CompactGraph, CompactGraphBuilder};
pub use network_error::NetworkError;
