//! column names of the route-set result table.

pub const ORIGIN_ID: &str = "origin_id";
pub const DESTINATION_ID: &str = "destination_id";
pub const ROUTE_SET: &str = "route_set";
pub const COST: &str = "cost";
pub const MASK: &str = "mask";
pub const PATH_OVERLAP: &str = "path_overlap";
pub const PROBABILITY: &str = "probability";
