use std::collections::HashSet;

use super::{ChoiceSetParams, EnumerationContext, LinkSet, RouteEnumerator, RouteSet};

/// Breadth-first search with link elimination.
///
/// Conceptually walks an infinite graph whose nodes are subgraphs of the
/// base network; what is materialized is the queue of deltas, the
/// banned-link sets, with a visited set keyed by the order-independent
/// [`LinkSet`] hash. Level zero is the empty banned set. Each accepted
/// route spawns one child subgraph per link it uses.
///
/// An optional link-penalisation overlay multiplies the cost of every
/// link seen in an accepted route at the current depth by
/// `params.penalty` for the *next* depth. Applying it within a depth
/// would bias later subgraphs toward avoiding earlier-found paths.
pub struct BfsLe {
    pub params: ChoiceSetParams,
}

impl BfsLe {
    pub fn new(params: ChoiceSetParams) -> Self {
        Self { params }
    }
}

impl RouteEnumerator for BfsLe {
    fn enumerate(
        &self,
        ctx: &mut EnumerationContext<'_>,
        origin: u32,
        destination: u32,
    ) -> RouteSet {
        let mut routes = RouteSet::new();
        if origin == destination {
            return routes;
        }

        let route_limit = self.params.route_limit();
        let depth_limit = self.params.depth_limit();
        let penalise = self.params.penalty > 1.0;

        let mut queue = vec![LinkSet::empty()];
        let mut visited: HashSet<LinkSet> = HashSet::new();
        visited.insert(LinkSet::empty());
        let mut depth_cost = ctx.graph.costs().to_vec();
        let mut misses = 0usize;
        let mut depth = 0usize;

        'levels: while !queue.is_empty() && depth < depth_limit && routes.len() < route_limit {
            // when this level could fill the route set, shuffle it so the
            // selection does not prefer insertion order
            if queue.len() > route_limit - routes.len() {
                ctx.rng.shuffle(&mut queue);
            }

            let mut next_queue = Vec::new();
            let mut penalised_links: HashSet<u32> = HashSet::new();

            for banned in queue.drain(..) {
                ctx.cost.copy_from_slice(&depth_cost);
                for link in banned.iter() {
                    ctx.cost[link as usize] = f64::INFINITY;
                }

                let Some(route) = ctx.shortest_path(origin, destination) else {
                    continue; // this subgraph disconnects the OD
                };

                if routes.insert(route.clone()) {
                    if penalise {
                        penalised_links.extend(route.iter().copied());
                    }
                    for &link in &route {
                        if let Some(child) = banned.with_link(link) {
                            if visited.insert(child.clone()) {
                                next_queue.push(child);
                            }
                        }
                    }
                    if routes.len() >= route_limit {
                        break 'levels;
                    }
                } else {
                    misses += 1;
                    if misses >= self.params.max_misses {
                        break 'levels;
                    }
                }
            }

            for link in penalised_links {
                depth_cost[link as usize] *= self.params.penalty;
            }
            queue = next_queue;
            depth += 1;
        }

        routes
    }
}
