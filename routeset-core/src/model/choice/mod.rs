mod bfsle;
mod choice_set_params;
mod context;
mod lcg;
mod link_penalisation;
mod link_set;
mod route_set;

pub use bfsle::BfsLe;
pub use choice_set_params::ChoiceSetParams;
pub use context::EnumerationContext;
pub use lcg::Lcg64;
pub use link_penalisation::LinkPenalisation;
pub use link_set::LinkSet;
pub use route_set::{Route, RouteSet};

/// Common contract of the two route enumeration strategies: fill a
/// deduplicated route set for one OD pair using the context's scratch.
/// An OD whose origin and destination coincide yields the empty set.
pub trait RouteEnumerator: Sync {
    fn enumerate(
        &self,
        ctx: &mut EnumerationContext<'_>,
        origin: u32,
        destination: u32,
    ) -> RouteSet;
}
