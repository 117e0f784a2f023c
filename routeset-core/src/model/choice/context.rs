use super::{Lcg64, Route};
use crate::model::network::CompactGraph;
use crate::model::search::{walk_route, PathFinder, SearchScratch};

/// One worker thread's enumeration state: the shared graph, the selected
/// path finder, and the thread-private scratch the enumerators mutate
/// between searches (cost vector, head copy for centroid blocking, search
/// arrays, RNG).
///
/// Sized once at batch start and reused across every OD the worker
/// processes.
pub struct EnumerationContext<'g> {
    pub graph: &'g CompactGraph,
    pub finder: PathFinder,
    pub cost: Vec<f64>,
    pub head: Vec<u32>,
    pub scratch: SearchScratch,
    pub rng: Lcg64,
}

impl<'g> EnumerationContext<'g> {
    pub fn new(graph: &'g CompactGraph, finder: PathFinder, seed: u64) -> Self {
        Self {
            graph,
            finder,
            cost: graph.costs().to_vec(),
            head: graph.clone_head(),
            scratch: SearchScratch::new(graph.n_nodes()),
            rng: Lcg64::new(seed),
        }
    }

    /// run the path finder on the current scratch cost and head views and
    /// materialize the route, or `None` when the destination is
    /// unreachable in the current subgraph.
    pub fn shortest_path(&mut self, origin: u32, destination: u32) -> Option<Route> {
        let reached = self.finder.find_path(
            origin,
            destination,
            &self.cost,
            &self.head,
            self.graph,
            &mut self.scratch,
        );
        reached.then(|| walk_route(origin, destination, &self.scratch))
    }
}
