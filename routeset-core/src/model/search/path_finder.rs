use super::{a_star, dijkstra, AStarHeuristic, SearchScratch};
use crate::model::network::CompactGraph;

/// Path-finding capability selected per batch: plain Dijkstra, or A* when
/// the graph carries coordinates and the costs admit a distance bound.
#[derive(Debug, Clone)]
pub enum PathFinder {
    Dijkstra,
    AStar(AStarHeuristic),
}

impl PathFinder {
    /// compute a shortest path from `origin` to `destination` under the
    /// caller's cost and head views, returning whether the destination
    /// was reached.
    pub fn find_path(
        &self,
        origin: u32,
        destination: u32,
        cost: &[f64],
        head: &[u32],
        graph: &CompactGraph,
        scratch: &mut SearchScratch,
    ) -> bool {
        match self {
            PathFinder::Dijkstra => dijkstra(origin, destination, cost, head, graph, scratch),
            PathFinder::AStar(heuristic) => {
                a_star(origin, destination, cost, head, graph, heuristic, scratch)
            }
        }
    }
}

/// Rebuild the route as an ordered link sequence by walking the
/// predecessor and connector arrays back from the destination.
///
/// Must only be called after a successful `find_path` for the same OD;
/// walking an unreached destination is a programming error.
pub fn walk_route(origin: u32, destination: u32, scratch: &SearchScratch) -> Vec<u32> {
    let mut links = Vec::new();
    let mut node = destination;
    while node != origin {
        let link = scratch.connector[node as usize];
        debug_assert!(link >= 0, "walked into an unreached node {node}");
        links.push(link as u32);
        node = scratch.predecessor[node as usize] as u32;
    }
    links.reverse();
    links
}
