use indexmap::IndexSet;

/// An ordered sequence of compact link ids from origin to destination.
pub type Route = Vec<u32>;

/// Deduplicated routes for one OD pair.
///
/// Equality of routes is order-sensitive sequence equality; storage is
/// keyed by a hash over the ordered link ids. Iteration follows insertion
/// order, which keeps downstream vectors and tables deterministic for a
/// fixed seed, thread count and OD ordering.
#[derive(Debug, Clone, Default)]
pub struct RouteSet {
    routes: IndexSet<Route>,
}

impl RouteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// insert a route; `false` when an identical link sequence is already
    /// present.
    pub fn insert(&mut self, route: Route) -> bool {
        self.routes.insert(route)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn contains(&self, route: &[u32]) -> bool {
        self.routes.contains(route)
    }

    pub fn get(&self, index: usize) -> Option<&Route> {
        self.routes.get_index(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }
}
