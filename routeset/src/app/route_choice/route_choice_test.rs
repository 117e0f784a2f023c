//! End-to-end tests of the batched orchestrator over small synthetic
//! networks.

use std::sync::Arc;

use arrow::array::{Array, Float64Array, UInt32Array};
use routeset_core::model::demand::{ColumnValues, DemandTable};
use routeset_core::model::network::{CompactGraph, CompactGraphBuilder};

use super::{BatchConfig, CheckpointDataset, RouteChoice, RouteChoiceError};

/// three nodes, links 0 (0->1, cost 1), 1 (1->2, cost 1), 2 (0->2, cost 3).
fn triangle() -> Arc<CompactGraph> {
    let mut builder = CompactGraphBuilder::new(3);
    builder.add_link(0, 1, 1.0);
    builder.add_link(1, 2, 1.0);
    builder.add_link(0, 2, 3.0);
    Arc::new(builder.build().unwrap())
}

/// four nodes, two equal-cost routes from 0 to 3.
fn diamond() -> Arc<CompactGraph> {
    let mut builder = CompactGraphBuilder::new(4);
    builder.add_link(0, 1, 1.0);
    builder.add_link(0, 2, 1.0);
    builder.add_link(1, 3, 1.0);
    builder.add_link(2, 3, 1.0);
    Arc::new(builder.build().unwrap())
}

fn single_od_demand(od: (u32, u32), value: f64) -> DemandTable {
    let mut table = DemandTable::new();
    table
        .add_frame(
            &[od],
            vec![("car".to_string(), ColumnValues::F64(vec![value]))],
        )
        .unwrap();
    table
}

fn psl_config() -> BatchConfig {
    BatchConfig {
        max_routes: 2,
        cores: 1,
        path_size_logit: true,
        ..Default::default()
    }
}

#[test]
fn test_triangle_psl_probabilities() {
    let mut rc = RouteChoice::new(triangle());
    *rc.demand_mut() = single_od_demand((0, 2), 1.0);
    rc.batched(&psl_config()).unwrap();

    let batch = rc.results_table().unwrap();
    assert_eq!(batch.num_rows(), 2);

    let costs = batch
        .column_by_name("cost")
        .unwrap()
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap();
    let probabilities = batch
        .column_by_name("probability")
        .unwrap()
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap();

    // the shortest path is enumerated first
    assert_eq!(costs.value(0), 2.0);
    assert_eq!(costs.value(1), 3.0);
    assert!((probabilities.value(0) - 0.731).abs() < 1e-3);
    assert!((probabilities.value(1) - 0.269).abs() < 1e-3);
    assert!((probabilities.value(0) + probabilities.value(1) - 1.0).abs() < 1e-12);
}

#[test]
fn test_triangle_link_penalisation() {
    let mut rc = RouteChoice::new(triangle());
    *rc.demand_mut() = single_od_demand((0, 2), 1.0);
    let config = BatchConfig {
        max_routes: 3,
        max_misses: 2,
        bfsle: false,
        penalty: 2.0,
        cores: 1,
        ..Default::default()
    };
    rc.batched(&config).unwrap();

    // only two simple routes exist; the miss limit ends the enumeration
    let batch = rc.results_table().unwrap();
    assert_eq!(batch.num_rows(), 2);
}

#[test]
fn test_diamond_equal_split() {
    let mut rc = RouteChoice::new(diamond());
    *rc.demand_mut() = single_od_demand((0, 3), 1.0);
    rc.batched(&psl_config()).unwrap();

    let batch = rc.results_table().unwrap();
    assert_eq!(batch.num_rows(), 2);
    let probabilities = batch
        .column_by_name("probability")
        .unwrap()
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap();
    assert!((probabilities.value(0) - 0.5).abs() < 1e-12);
    assert!((probabilities.value(1) - 0.5).abs() < 1e-12);

    // disjoint equal-cost routes have identical path overlap
    let overlaps = batch
        .column_by_name("path_overlap")
        .unwrap()
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap();
    assert_eq!(overlaps.value(0), overlaps.value(1));
}

#[test]
fn test_select_link_loading() {
    let mut rc = RouteChoice::new(triangle());
    *rc.demand_mut() = single_od_demand((0, 2), 10.0);
    rc.set_select_link("q1", vec![vec![0]]);
    rc.batched(&psl_config()).unwrap();

    let batch = rc.results_table().unwrap();
    let probabilities = batch
        .column_by_name("probability")
        .unwrap()
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap();
    let p1 = probabilities.value(0);

    let loads = rc.link_loading().unwrap();
    let total = loads["car"].as_f64().unwrap();
    assert!((total[0] - 10.0 * p1).abs() < 1e-9);

    // only the route through link 0 contributes to q1
    let select = rc.select_link_loading().unwrap();
    let q1 = select["q1"]["car"].as_f64().unwrap();
    assert!((q1[0] - 10.0 * p1).abs() < 1e-9);
    assert!((q1[1] - 10.0 * p1).abs() < 1e-9);
    assert_eq!(q1[2], 0.0);

    let matrices = rc.select_link_od_matrices().unwrap();
    let matrix = &matrices["q1"]["car"];
    assert_eq!(matrix.origins, vec![0]);
    assert_eq!(matrix.destinations, vec![2]);
    assert!((matrix.values.get(0) - 10.0 * p1).abs() < 1e-9);
}

#[test]
fn test_zero_cost_route_masks_od() {
    // a free edge alongside the triangle: the whole OD is masked and
    // loads nothing
    let mut builder = CompactGraphBuilder::new(3);
    builder.add_link(0, 1, 1.0);
    builder.add_link(1, 2, 1.0);
    builder.add_link(0, 2, 3.0);
    builder.add_link(0, 2, 0.0);
    let graph = Arc::new(builder.build().unwrap());

    let mut rc = RouteChoice::new(graph);
    *rc.demand_mut() = single_od_demand((0, 2), 10.0);
    let config = BatchConfig {
        max_routes: 3,
        ..psl_config()
    };
    rc.batched(&config).unwrap();

    let batch = rc.results_table().unwrap();
    let probabilities = batch
        .column_by_name("probability")
        .unwrap()
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap();
    for row in 0..batch.num_rows() {
        assert_eq!(probabilities.value(row), 0.0);
    }
    let loads = rc.link_loading().unwrap();
    assert_eq!(loads["car"].total(), 0.0);
}

#[test]
fn test_duplicate_ods_collapsed() {
    let mut rc = RouteChoice::new(triangle());
    rc.demand_mut()
        .add_frame(
            &[(0, 2), (0, 2), (1, 2)],
            vec![(
                "car".to_string(),
                ColumnValues::F64(vec![1.0, 2.0, 3.0]),
            )],
        )
        .unwrap();
    rc.batched(&psl_config()).unwrap();

    let batch = rc.results_table().unwrap();
    let origins = batch
        .column_by_name("origin_id")
        .unwrap()
        .as_any()
        .downcast_ref::<UInt32Array>()
        .unwrap();
    let destinations = batch
        .column_by_name("destination_id")
        .unwrap()
        .as_any()
        .downcast_ref::<UInt32Array>()
        .unwrap();
    let mut pairs: Vec<(u32, u32)> = (0..batch.num_rows())
        .map(|row| (origins.value(row), destinations.value(row)))
        .collect();
    pairs.dedup();
    // two unique ODs: (0, 2) with two routes, (1, 2) with one
    assert_eq!(pairs, vec![(0, 2), (1, 2)]);
}

#[test]
fn test_same_origin_destination_contributes_nothing() {
    let mut rc = RouteChoice::new(triangle());
    *rc.demand_mut() = single_od_demand((1, 1), 5.0);
    rc.batched(&psl_config()).unwrap();
    let batch = rc.results_table().unwrap();
    assert_eq!(batch.num_rows(), 0);
}

#[test]
fn test_unreachable_od_contributes_nothing() {
    let mut rc = RouteChoice::new(triangle());
    rc.demand_mut()
        .add_frame(
            &[(2, 0), (0, 2)],
            vec![("car".to_string(), ColumnValues::F64(vec![5.0, 5.0]))],
        )
        .unwrap();
    rc.batched(&psl_config()).unwrap();

    let batch = rc.results_table().unwrap();
    let origins = batch
        .column_by_name("origin_id")
        .unwrap()
        .as_any()
        .downcast_ref::<UInt32Array>()
        .unwrap();
    for row in 0..batch.num_rows() {
        assert_eq!(origins.value(row), 0);
    }
}

#[test]
fn test_invalid_node_rejected() {
    let mut rc = RouteChoice::new(triangle());
    *rc.demand_mut() = single_od_demand((0, 99), 1.0);
    assert!(matches!(
        rc.batched(&psl_config()),
        Err(RouteChoiceError::InvalidNode(99))
    ));
}

#[test]
fn test_accessors_before_batched() {
    let rc = RouteChoice::new(triangle());
    assert!(matches!(
        rc.results_table(),
        Err(RouteChoiceError::ResultsNotComputed)
    ));
    assert!(matches!(
        rc.link_loading(),
        Err(RouteChoiceError::ResultsNotComputed)
    ));
}

#[test]
fn test_store_results_false_forces_eager_loading() {
    let mut rc = RouteChoice::new(triangle());
    *rc.demand_mut() = single_od_demand((0, 2), 10.0);
    let config = BatchConfig {
        store_results: false,
        ..psl_config()
    };
    rc.batched(&config).unwrap();

    assert!(matches!(
        rc.results_table(),
        Err(RouteChoiceError::ResultsNotComputed)
    ));
    let loads = rc.link_loading().unwrap();
    assert!(loads["car"].total() > 0.0);
}

#[test]
fn test_single_core_runs_are_bitwise_identical() {
    let config = BatchConfig {
        eager_link_loading: true,
        ..psl_config()
    };

    let mut first = RouteChoice::new(diamond());
    *first.demand_mut() = single_od_demand((0, 3), 7.5);
    first.batched(&config).unwrap();

    let mut second = RouteChoice::new(diamond());
    *second.demand_mut() = single_od_demand((0, 3), 7.5);
    second.batched(&config).unwrap();

    assert_eq!(
        first.link_loading().unwrap()["car"],
        second.link_loading().unwrap()["car"]
    );
    assert_eq!(
        first.results_table().unwrap(),
        second.results_table().unwrap()
    );
}

#[test]
fn test_eager_and_lazy_loading_agree() {
    let mut eager = RouteChoice::new(triangle());
    *eager.demand_mut() = single_od_demand((0, 2), 10.0);
    eager
        .batched(&BatchConfig {
            eager_link_loading: true,
            ..psl_config()
        })
        .unwrap();

    let mut lazy = RouteChoice::new(triangle());
    *lazy.demand_mut() = single_od_demand((0, 2), 10.0);
    lazy.batched(&psl_config()).unwrap();

    assert_eq!(
        eager.link_loading().unwrap()["car"],
        lazy.link_loading().unwrap()["car"]
    );
}

#[test]
fn test_run_returns_expanded_routes() {
    let mut builder =
        CompactGraphBuilder::new(3).with_expansions(vec![vec![10, 11], vec![12], vec![13]]);
    builder.add_link(0, 1, 1.0);
    builder.add_link(1, 2, 1.0);
    builder.add_link(0, 2, 3.0);
    let graph = Arc::new(builder.build().unwrap());

    let mut rc = RouteChoice::new(graph);
    let config = BatchConfig {
        max_routes: 2,
        cores: 1,
        ..Default::default()
    };
    let routes = rc.run(0, 2, 0.0, &config).unwrap();
    assert_eq!(routes.len(), 2);
    assert!(routes.contains(&vec![10, 11, 12]));
    assert!(routes.contains(&vec![13]));
}

#[test]
fn test_checkpoint_round_trip() {
    let dir = std::env::temp_dir().join(format!(
        "routeset-batched-checkpoint-{}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);

    let mut demand = DemandTable::new();
    demand
        .add_frame(
            &[(0, 2), (1, 2)],
            vec![("car".to_string(), ColumnValues::F64(vec![10.0, 5.0]))],
        )
        .unwrap();

    let mut in_memory = RouteChoice::new(triangle());
    *in_memory.demand_mut() = demand.clone();
    in_memory.batched(&psl_config()).unwrap();
    let expected = in_memory.results_table().unwrap();

    let mut checkpointed = RouteChoice::new(triangle());
    *checkpointed.demand_mut() = demand;
    let config = BatchConfig {
        checkpoint_dir: Some(dir.clone()),
        ..psl_config()
    };
    checkpointed.batched(&config).unwrap();

    // in checkpoint mode the in-memory table is not retained
    assert!(matches!(
        checkpointed.results_table(),
        Err(RouteChoiceError::ResultsNotComputed)
    ));
    let reloaded = CheckpointDataset::read_table(&dir).unwrap();
    assert_eq!(reloaded, expected);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_centroid_blocking_removes_through_centroid_routes() {
    // nodes 0 and 1 are centroids, 2 and 3 through nodes. Without
    // blocking the cheapest path 0 -> 1 -> 3 cuts through centroid 1.
    let build = |blocked: bool| {
        let mut builder = CompactGraphBuilder::new(4).with_zones(2, blocked);
        builder.add_link(0, 1, 1.0);
        builder.add_link(1, 3, 1.0);
        builder.add_link(0, 2, 5.0);
        builder.add_link(2, 3, 5.0);
        Arc::new(builder.build().unwrap())
    };

    let config = BatchConfig {
        max_routes: 1,
        cores: 1,
        ..Default::default()
    };

    let mut unblocked = RouteChoice::new(build(false));
    let routes = unblocked.run(0, 3, 0.0, &config).unwrap();
    assert_eq!(routes, vec![vec![0, 1]]);

    let mut blocked = RouteChoice::new(build(true));
    let routes = blocked.run(0, 3, 0.0, &config).unwrap();
    assert_eq!(routes, vec![vec![2, 3]]);
}
