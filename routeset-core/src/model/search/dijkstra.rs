use super::search_scratch::{HeapItem, SearchScratch};
use crate::model::network::CompactGraph;

/// Dijkstra's algorithm from `origin` to `destination` over the caller's
/// cost and head views.
///
/// `cost` and `head` are per-thread scratch copies: the route enumerators
/// ban links by setting their cost to `+inf` and centroid blocking rewires
/// entries of `head`, so both are taken as slices rather than read from
/// the shared graph. Only the adjacency structure comes from `graph`.
///
/// Returns `true` once the destination is settled; the path is then
/// recoverable from the predecessor and connector arrays.
pub fn dijkstra(
    origin: u32,
    destination: u32,
    cost: &[f64],
    head: &[u32],
    graph: &CompactGraph,
    scratch: &mut SearchScratch,
) -> bool {
    scratch.reset();
    scratch.touch(origin);
    scratch.cost_so_far[origin as usize] = 0.0;
    scratch.heap.push(HeapItem {
        cost: 0.0,
        node: origin,
    });

    while let Some(item) = scratch.heap.pop() {
        if item.cost > scratch.cost_so_far[item.node as usize] {
            continue; // stale entry
        }
        if item.node == destination {
            return true;
        }
        for &link in graph.outgoing_links(item.node) {
            let link_cost = cost[link as usize];
            if !link_cost.is_finite() {
                continue; // banned link
            }
            let next = head[link as usize];
            let next_cost = item.cost + link_cost;
            if next_cost < scratch.cost_so_far[next as usize] {
                scratch.touch(next);
                scratch.cost_so_far[next as usize] = next_cost;
                scratch.predecessor[next as usize] = item.node as i64;
                scratch.connector[next as usize] = link as i64;
                scratch.heap.push(HeapItem {
                    cost: next_cost,
                    node: next,
                });
            }
        }
    }

    scratch.reached(destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::network::CompactGraphBuilder;
    use crate::model::search::walk_route;

    fn triangle() -> CompactGraph {
        let mut builder = CompactGraphBuilder::new(3);
        builder.add_link(0, 1, 1.0);
        builder.add_link(1, 2, 1.0);
        builder.add_link(0, 2, 3.0);
        builder.build().unwrap()
    }

    #[test]
    fn test_shortest_path_triangle() {
        let graph = triangle();
        let mut scratch = SearchScratch::new(graph.n_nodes());
        let head = graph.clone_head();
        let reached = dijkstra(0, 2, graph.costs(), &head, &graph, &mut scratch);
        assert!(reached);
        assert_eq!(scratch.cost_so_far[2], 2.0);
        assert_eq!(walk_route(0, 2, &scratch), vec![0, 1]);
    }

    #[test]
    fn test_banned_link_reroutes() {
        let graph = triangle();
        let mut scratch = SearchScratch::new(graph.n_nodes());
        let head = graph.clone_head();
        let mut cost = graph.costs().to_vec();
        cost[1] = f64::INFINITY; // ban 1 -> 2
        let reached = dijkstra(0, 2, &cost, &head, &graph, &mut scratch);
        assert!(reached);
        assert_eq!(scratch.cost_so_far[2], 3.0);
        assert_eq!(walk_route(0, 2, &scratch), vec![2]);
    }

    #[test]
    fn test_unreachable_destination() {
        let graph = triangle();
        let mut scratch = SearchScratch::new(graph.n_nodes());
        let head = graph.clone_head();
        let reached = dijkstra(2, 0, graph.costs(), &head, &graph, &mut scratch);
        assert!(!reached);
        assert!(!scratch.reached(0));
    }

    #[test]
    fn test_scratch_reuse_across_searches() {
        let graph = triangle();
        let mut scratch = SearchScratch::new(graph.n_nodes());
        let head = graph.clone_head();
        assert!(dijkstra(0, 2, graph.costs(), &head, &graph, &mut scratch));
        assert!(!dijkstra(2, 0, graph.costs(), &head, &graph, &mut scratch));
        assert!(dijkstra(0, 1, graph.costs(), &head, &graph, &mut scratch));
        assert_eq!(walk_route(0, 1, &scratch), vec![0]);
    }
}
