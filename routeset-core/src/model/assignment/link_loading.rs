use indexmap::IndexMap;

use super::{RouteChoiceSet, SelectLinkQuery};
use crate::model::demand::{ColumnValues, FinalizedDemand};
use crate::model::network::CompactGraph;

/// Sparse COO OD matrix for one (select-link query, demand column) pair:
/// one probability-weighted entry per OD whose route set sends flow
/// through the query. Values carry the demand column's dtype.
#[derive(Debug, Clone)]
pub struct SparseOdMatrix {
    pub origins: Vec<u32>,
    pub destinations: Vec<u32>,
    pub values: ColumnValues,
}

impl SparseOdMatrix {
    fn empty_like(column: &ColumnValues) -> Self {
        Self {
            origins: Vec::new(),
            destinations: Vec::new(),
            values: column.zeros_like(0),
        }
    }

    fn push(&mut self, origin: u32, destination: u32, value: f64) {
        self.origins.push(origin);
        self.destinations.push(destination);
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    fn append(&mut self, other: &SparseOdMatrix) {
        self.origins.extend_from_slice(&other.origins);
        self.destinations.extend_from_slice(&other.destinations);
        for index in 0..other.len() {
            self.values.push(other.values.get(index));
        }
    }
}

/// One worker thread's loading accumulators over *compact* link ids:
/// total loads per demand column, per-query loads, and per-query sparse
/// OD buffers. Merged pairwise in the post-parallel reduction, then
/// expanded to network link ids.
#[derive(Debug)]
pub struct LoadingBuffers {
    link_loads: IndexMap<String, ColumnValues>,
    select_loads: IndexMap<String, IndexMap<String, ColumnValues>>,
    select_od: IndexMap<String, IndexMap<String, SparseOdMatrix>>,
    // scratch for the AND-set countdown and per-route match flags
    counts: Vec<usize>,
    matched: Vec<bool>,
    od_flow: Vec<Vec<f64>>,
}

impl LoadingBuffers {
    pub fn new(
        demand: &FinalizedDemand,
        queries: &IndexMap<String, SelectLinkQuery>,
        n_links: usize,
    ) -> Self {
        let link_loads: IndexMap<String, ColumnValues> = demand
            .columns()
            .iter()
            .map(|(name, column)| (name.clone(), column.zeros_like(n_links)))
            .collect();
        let select_loads = queries
            .keys()
            .map(|query_name| {
                let per_column = demand
                    .columns()
                    .iter()
                    .map(|(name, column)| (name.clone(), column.zeros_like(n_links)))
                    .collect();
                (query_name.clone(), per_column)
            })
            .collect();
        let select_od = queries
            .keys()
            .map(|query_name| {
                let per_column = demand
                    .columns()
                    .iter()
                    .map(|(name, column)| (name.clone(), SparseOdMatrix::empty_like(column)))
                    .collect();
                (query_name.clone(), per_column)
            })
            .collect();
        let n_columns = demand.columns().len();
        Self {
            link_loads,
            select_loads,
            select_od,
            counts: Vec::new(),
            matched: Vec::new(),
            od_flow: vec![vec![0.0; n_columns]; queries.len()],
        }
    }

    /// Accumulate one OD's assigned route set: for every route with
    /// probability `p` and demand `d` in a column, add `p * d` onto every
    /// link of the route, onto the per-query buffers when the route
    /// satisfies a query, and into the query's OD buffer.
    pub fn load_route_choice(
        &mut self,
        choice_set: &RouteChoiceSet,
        demand: &FinalizedDemand,
        demand_row: usize,
        queries: &IndexMap<String, SelectLinkQuery>,
    ) {
        for flows in &mut self.od_flow {
            flows.iter_mut().for_each(|flow| *flow = 0.0);
        }

        for (j, route) in choice_set.routes.iter().enumerate() {
            let probability = choice_set.probability[j];
            if probability == 0.0 {
                continue;
            }
            self.matched.clear();
            for query in queries.values() {
                let matched = query.matches(route, &mut self.counts);
                self.matched.push(matched);
            }

            for (column, buffer) in self.link_loads.values_mut().enumerate() {
                let flow = probability * demand.value(demand_row, column);
                if flow == 0.0 {
                    continue;
                }
                for &link in route {
                    buffer.add(link as usize, flow);
                }
                for (q, per_column) in self.select_loads.values_mut().enumerate() {
                    if !self.matched[q] {
                        continue;
                    }
                    let select_buffer = &mut per_column[column];
                    for &link in route {
                        select_buffer.add(link as usize, flow);
                    }
                    self.od_flow[q][column] += flow;
                }
            }
        }

        let (origin, destination) = choice_set.od;
        for (q, per_column) in self.select_od.values_mut().enumerate() {
            for (column, matrix) in per_column.values_mut().enumerate() {
                let flow = self.od_flow[q][column];
                if flow != 0.0 {
                    matrix.push(origin, destination, flow);
                }
            }
        }
    }

    /// fold another worker's accumulators into this one.
    pub fn merge(&mut self, other: &LoadingBuffers) {
        for (buffer, other_buffer) in self.link_loads.values_mut().zip(other.link_loads.values()) {
            buffer.merge(other_buffer);
        }
        for (per_column, other_per_column) in self
            .select_loads
            .values_mut()
            .zip(other.select_loads.values())
        {
            for (buffer, other_buffer) in per_column.values_mut().zip(other_per_column.values()) {
                buffer.merge(other_buffer);
            }
        }
        for (per_column, other_per_column) in
            self.select_od.values_mut().zip(other.select_od.values())
        {
            for (matrix, other_matrix) in per_column.values_mut().zip(other_per_column.values()) {
                matrix.append(other_matrix);
            }
        }
    }

    /// expand compact-link loads onto original network link ids; every
    /// network link in a compact link's expansion receives that compact
    /// link's full load.
    pub fn into_results(self, graph: &CompactGraph) -> LinkLoadingResults {
        let expand = |compact: &ColumnValues| {
            let mut network = compact.zeros_like(graph.n_network_links());
            for link in 0..graph.n_links() as u32 {
                let load = compact.get(link as usize);
                if load == 0.0 {
                    continue;
                }
                for &network_link in graph.network_links(link) {
                    network.add(network_link as usize, load);
                }
            }
            network
        };

        let link_loads = self
            .link_loads
            .iter()
            .map(|(name, buffer)| (name.clone(), expand(buffer)))
            .collect();
        let select_link_loads = self
            .select_loads
            .iter()
            .map(|(query_name, per_column)| {
                let expanded = per_column
                    .iter()
                    .map(|(name, buffer)| (name.clone(), expand(buffer)))
                    .collect();
                (query_name.clone(), expanded)
            })
            .collect();
        LinkLoadingResults {
            link_loads,
            select_link_loads,
            select_link_od: self.select_od,
        }
    }
}

/// Final reduced loadings over original network link ids.
#[derive(Debug)]
pub struct LinkLoadingResults {
    /// demand column -> dense vector of length `n_network_links`
    pub link_loads: IndexMap<String, ColumnValues>,
    /// query -> demand column -> dense vector
    pub select_link_loads: IndexMap<String, IndexMap<String, ColumnValues>>,
    /// query -> demand column -> sparse COO OD matrix
    pub select_link_od: IndexMap<String, IndexMap<String, SparseOdMatrix>>,
}
