use super::{ChoiceSetParams, EnumerationContext, RouteEnumerator, RouteSet};

/// Link-penalisation enumeration.
///
/// Repeatedly finds the shortest path on a single mutable cost vector,
/// multiplying the cost of every link on the found path by
/// `params.penalty` (> 1) so later iterations are steered away from it.
/// Stops at `max_depth` iterations, at `max_routes` distinct routes, or
/// after `max_misses` *consecutive* duplicates.
pub struct LinkPenalisation {
    pub params: ChoiceSetParams,
}

impl LinkPenalisation {
    pub fn new(params: ChoiceSetParams) -> Self {
        Self { params }
    }
}

impl RouteEnumerator for LinkPenalisation {
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

        ctx.cost.copy_from_slice(ctx.graph.costs());
        let mut misses = 0usize;
        let mut depth = 0usize;

        while depth < depth_limit && routes.len() < route_limit {
            let Some(route) = ctx.shortest_path(origin, destination) else {
                break;
            };

            if routes.insert(route.clone()) {
                misses = 0;
            } else {
                misses += 1;
                if misses >= self.params.max_misses {
                    break;
                }
            }
            for &link in &route {
                ctx.cost[link as usize] *= self.params.penalty;
            }
            depth += 1;
        }

        routes
    }
}
