use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanBuilder, Float64Builder, ListBuilder, RecordBatch, UInt32Builder,
};
use routeset_core::model::{assignment::RouteChoiceSet, network::CompactGraph};

use super::{fieldname, RouteChoiceError};

/// Materialize route choice sets as a columnar table, one row per route.
///
/// Compact link ids are expanded to original network link ids, in path
/// order, before emission. Without assignment the table holds the id and
/// route-set columns only; with assignment the cost, mask, path overlap
/// and probability columns are appended.
pub fn results_to_batch<'a>(
    results: impl IntoIterator<Item = &'a RouteChoiceSet>,
    graph: &CompactGraph,
    assignment: bool,
) -> Result<RecordBatch, RouteChoiceError> {
    let mut origins = UInt32Builder::new();
    let mut destinations = UInt32Builder::new();
    let mut route_sets = ListBuilder::new(UInt32Builder::new());
    let mut costs = Float64Builder::new();
    let mut masks = BooleanBuilder::new();
    let mut overlaps = Float64Builder::new();
    let mut probabilities = Float64Builder::new();

    for choice_set in results {
        for (j, route) in choice_set.routes.iter().enumerate() {
            origins.append_value(choice_set.od.0);
            destinations.append_value(choice_set.od.1);
            for &link in route {
                for &network_link in graph.network_links(link) {
                    route_sets.values().append_value(network_link);
                }
            }
            route_sets.append(true);
            if assignment {
                costs.append_value(choice_set.cost[j]);
                masks.append_value(choice_set.mask[j]);
                overlaps.append_value(choice_set.path_overlap[j]);
                probabilities.append_value(choice_set.probability[j]);
            }
        }
    }

    let mut columns: Vec<(&str, ArrayRef)> = vec![
        (fieldname::ORIGIN_ID, Arc::new(origins.finish())),
        (fieldname::DESTINATION_ID, Arc::new(destinations.finish())),
        (fieldname::ROUTE_SET, Arc::new(route_sets.finish())),
    ];
    if assignment {
        columns.push((fieldname::COST, Arc::new(costs.finish())));
        columns.push((fieldname::MASK, Arc::new(masks.finish())));
        columns.push((fieldname::PATH_OVERLAP, Arc::new(overlaps.finish())));
        columns.push((fieldname::PROBABILITY, Arc::new(probabilities.finish())));
    }
    RecordBatch::try_from_iter(columns).map_err(RouteChoiceError::from)
}
