use geo::{Distance, Haversine, Point};

use super::search_scratch::{HeapItem, SearchScratch};
use crate::model::network::CompactGraph;

/// Haversine lower bound on the remaining cost to the destination, over
/// per-node lon/lat views.
///
/// The estimate is a great-circle distance in meters; it is admissible
/// when the link costs are distances in the same unit. Callers using
/// time or generalized costs should stay on Dijkstra.
#[derive(Debug, Clone)]
pub struct AStarHeuristic {
    lon: Vec<f64>,
    lat: Vec<f64>,
}

impl AStarHeuristic {
    /// `None` when the graph was built without coordinates.
    pub fn from_graph(graph: &CompactGraph) -> Option<Self> {
        graph.coordinates().map(|(lon, lat)| Self {
            lon: lon.to_vec(),
            lat: lat.to_vec(),
        })
    }

    pub fn estimate(&self, node: u32, destination: u32) -> f64 {
        let from = Point::new(self.lon[node as usize], self.lat[node as usize]);
        let to = Point::new(
            self.lon[destination as usize],
            self.lat[destination as usize],
        );
        Haversine.distance(from, to)
    }
}

/// A* from `origin` to `destination`; identical contract to
/// [`super::dijkstra`], with heap entries ordered by cost-so-far plus the
/// heuristic estimate.
pub fn a_star(
    origin: u32,
    destination: u32,
    cost: &[f64],
    head: &[u32],
    graph: &CompactGraph,
    heuristic: &AStarHeuristic,
    scratch: &mut SearchScratch,
) -> bool {
    scratch.reset();
    scratch.touch(origin);
    scratch.cost_so_far[origin as usize] = 0.0;
    scratch.heap.push(HeapItem {
        cost: heuristic.estimate(origin, destination),
        node: origin,
    });

    while let Some(item) = scratch.heap.pop() {
        if item.node == destination {
            return true;
        }
        let node_cost = scratch.cost_so_far[item.node as usize];
        if item.cost > node_cost + heuristic.estimate(item.node, destination) {
            continue; // stale entry
        }
        for &link in graph.outgoing_links(item.node) {
            let link_cost = cost[link as usize];
            if !link_cost.is_finite() {
                continue;
            }
            let next = head[link as usize];
            let next_cost = node_cost + link_cost;
            if next_cost < scratch.cost_so_far[next as usize] {
                scratch.touch(next);
                scratch.cost_so_far[next as usize] = next_cost;
                scratch.predecessor[next as usize] = item.node as i64;
                scratch.connector[next as usize] = link as i64;
                scratch.heap.push(HeapItem {
                    cost: next_cost + heuristic.estimate(next, destination),
                    node: next,
                });
            }
        }
    }

    scratch.reached(destination)
}
