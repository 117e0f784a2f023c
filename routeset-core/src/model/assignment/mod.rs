mod binary_logit;
mod link_loading;
pub mod psl_ops;
mod route_choice_set;
mod select_link;

pub use binary_logit::inverse_binary_logit;
pub use link_loading::{LinkLoadingResults, LoadingBuffers, SparseOdMatrix};
pub use route_choice_set::RouteChoiceSet;
pub use select_link::SelectLinkQuery;
