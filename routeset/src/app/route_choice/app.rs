use std::sync::{Arc, Mutex};

use arrow::array::RecordBatch;
use indexmap::IndexMap;
use itertools::Itertools;
use kdam::{Bar, BarExt};
use routeset_core::model::{
    assignment::{
        LinkLoadingResults, LoadingBuffers, RouteChoiceSet, SelectLinkQuery, SparseOdMatrix,
    },
    choice::{BfsLe, EnumerationContext, LinkPenalisation, RouteEnumerator, RouteSet},
    demand::{ColumnValues, DemandTable, FinalizedDemand},
    network::CompactGraph,
    search::{AStarHeuristic, PathFinder},
};

use super::{checkpoint::CheckpointWriter, table, BatchConfig, RouteChoiceError};

/// OD pairs per checkpoint chunk, rounded up to whole origins.
const CHECKPOINT_CHUNK_TARGET: usize = 10_000;

/// One OD pair resolved against the compact graph.
#[derive(Debug, Clone, Copy)]
struct OdTask {
    demand_row: usize,
    origin: u32,
    destination: u32,
    origin_id: u32,
    destination_id: u32,
}

/// Everything a `batched` call leaves behind.
struct BatchResults {
    assignment: bool,
    stored: bool,
    choice_sets: Vec<RouteChoiceSet>,
    loading: Option<LinkLoadingResults>,
}

/// Route choice set generation and path-size-logit assignment over a
/// compact graph.
///
/// Demand rows are keyed by external network node ids and resolved at
/// the batch boundary; all validation happens there, before any parallel
/// work starts. Inside the parallel region each OD pair is processed by
/// exactly one worker thread against thread-private scratch, and the
/// per-thread loading accumulators are reduced in a single-threaded fold
/// afterwards.
pub struct RouteChoice {
    graph: Arc<CompactGraph>,
    demand: DemandTable,
    select_links: IndexMap<String, Vec<Vec<u32>>>,
    results: Option<BatchResults>,
}

impl RouteChoice {
    pub fn new(graph: Arc<CompactGraph>) -> Self {
        Self {
            graph,
            demand: DemandTable::new(),
            select_links: IndexMap::new(),
            results: None,
        }
    }

    pub fn graph(&self) -> &CompactGraph {
        &self.graph
    }

    /// the demand table the next `batched` call will run against.
    pub fn demand_mut(&mut self) -> &mut DemandTable {
        &mut self.demand
    }

    /// register a named select-link query as an OR of AND-sets over
    /// compact link ids. Replaces any query with the same name.
    pub fn set_select_link(&mut self, name: impl Into<String>, and_sets: Vec<Vec<u32>>) {
        self.select_links.insert(name.into(), and_sets);
    }

    /// Single-OD convenience wrapper around [`Self::batched`]: replaces
    /// the demand table with one `(origin, destination)` pair carrying
    /// `demand`, runs the batch in memory, and returns that pair's
    /// routes as expanded network link ids.
    pub fn run(
        &mut self,
        origin: u32,
        destination: u32,
        demand: f64,
        config: &BatchConfig,
    ) -> Result<Vec<Vec<u32>>, RouteChoiceError> {
        let mut table = DemandTable::new();
        table.add_frame(
            &[(origin, destination)],
            vec![("demand".to_string(), ColumnValues::F64(vec![demand]))],
        )?;
        self.demand = table;

        let mut config = config.clone();
        config.store_results = true;
        config.checkpoint_dir = None;
        self.batched(&config)?;

        let results = self
            .results
            .as_ref()
            .ok_or(RouteChoiceError::ResultsNotComputed)?;
        let routes = results
            .choice_sets
            .first()
            .map(|choice_set| {
                choice_set
                    .routes
                    .iter()
                    .map(|route| self.expand_route(route))
                    .collect()
            })
            .unwrap_or_default();
        Ok(routes)
    }

    /// Enumerate route sets (and optionally assign and load them) for
    /// every OD pair of the demand table.
    pub fn batched(&mut self, config: &BatchConfig) -> Result<(), RouteChoiceError> {
        config.validate()?;
        self.results = None;

        let demand = self.demand.finalize();
        if demand.is_empty() {
            return Err(RouteChoiceError::InvalidParameters(
                "demand table holds no OD pairs".to_string(),
            ));
        }
        let queries = self.compile_queries()?;
        let tasks = self.resolve_tasks(&demand)?;

        let cores = effective_cores(config.cores);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(cores)
            .build()
            .map_err(|e| RouteChoiceError::ThreadPool(e.to_string()))?;

        let finder = self.finder(config);
        let enumerator: Box<dyn RouteEnumerator> = if config.bfsle {
            Box::new(BfsLe::new(config.choice_params()))
        } else {
            Box::new(LinkPenalisation::new(config.choice_params()))
        };

        let loading_enabled = config.path_size_logit && !demand.no_demand();
        // without stored results there is no state for a lazy pass
        let eager = config.eager_link_loading || !config.store_results;
        let writer = match &config.checkpoint_dir {
            Some(dir) => Some(CheckpointWriter::new(dir)?),
            None => None,
        };

        log::info!(
            "running route choice over {} OD pairs on {} cores ({})",
            tasks.len(),
            cores,
            if config.bfsle { "bfsle" } else { "lp" }
        );
        let bar = Bar::builder()
            .total(tasks.len())
            .desc("route choice")
            .build()
            .ok()
            .map(|bar| Arc::new(Mutex::new(bar)));

        let mut total_loading = loading_enabled
            .then(|| LoadingBuffers::new(&demand, &queries, self.graph.n_links()));
        let mut stored: Vec<RouteChoiceSet> = Vec::new();

        for chunk in chunk_tasks(&tasks, writer.is_some()) {
            let mut slots: Vec<Option<RouteChoiceSet>> = (0..chunk.len()).map(|_| None).collect();
            let per_worker = chunk.len().div_ceil(cores).max(1);
            let n_partitions = chunk.len().div_ceil(per_worker);
            let mut partials: Vec<Option<LoadingBuffers>> = (0..n_partitions)
                .map(|_| {
                    (loading_enabled && eager)
                        .then(|| LoadingBuffers::new(&demand, &queries, self.graph.n_links()))
                })
                .collect();

            let graph = self.graph.as_ref();
            let demand_ref = &demand;
            let queries_ref = &queries;
            let enumerator_ref = enumerator.as_ref();
            pool.scope(|scope| {
                for (worker, ((task_range, slot_range), partial)) in chunk
                    .chunks(per_worker)
                    .zip(slots.chunks_mut(per_worker))
                    .zip(partials.iter_mut())
                    .enumerate()
                {
                    let finder = finder.clone();
                    let bar = bar.clone();
                    scope.spawn(move |_| {
                        let seed = config
                            .seed
                            .wrapping_add((worker as u64).wrapping_mul(0x9e3779b97f4a7c15));
                        let mut ctx = EnumerationContext::new(graph, finder, seed);
                        for (task, slot) in task_range.iter().zip(slot_range.iter_mut()) {
                            let choice_set = process_od(
                                task,
                                &mut ctx,
                                enumerator_ref,
                                graph,
                                config,
                            );
                            if let Some(partial) = partial {
                                if choice_set.has_assignment() {
                                    partial.load_route_choice(
                                        &choice_set,
                                        demand_ref,
                                        task.demand_row,
                                        queries_ref,
                                    );
                                }
                            }
                            *slot = Some(choice_set);
                            if let Some(bar) = &bar {
                                if let Ok(mut bar) = bar.lock() {
                                    let _ = bar.update(1);
                                }
                            }
                        }
                    });
                }
            });

            // single-threaded reduction of this chunk
            if let Some(total) = &mut total_loading {
                if eager {
                    for partial in partials.iter().flatten() {
                        total.merge(partial);
                    }
                } else {
                    for (task, slot) in chunk.iter().zip(slots.iter()) {
                        if let Some(choice_set) = slot {
                            if choice_set.has_assignment() {
                                total.load_route_choice(
                                    choice_set,
                                    &demand,
                                    task.demand_row,
                                    &queries,
                                );
                            }
                        }
                    }
                }
            }

            match &writer {
                Some(writer) => {
                    self.flush_chunk(writer, chunk, &slots, config.path_size_logit)?;
                }
                None if config.store_results => {
                    stored.extend(slots.into_iter().flatten());
                }
                None => {}
            }
        }
        eprintln!(); // end progress bar

        let loading = total_loading.map(|buffers| buffers.into_results(&self.graph));
        self.results = Some(BatchResults {
            assignment: config.path_size_logit,
            stored: config.store_results && writer.is_none(),
            choice_sets: stored,
            loading,
        });
        log::info!("route choice batch complete");
        Ok(())
    }

    /// the in-memory result table; one row per route, ordered by
    /// (origin, destination). Unavailable when the batch ran with
    /// `store_results = false` or wrote to a checkpoint dataset.
    pub fn results_table(&self) -> Result<RecordBatch, RouteChoiceError> {
        let results = self
            .results
            .as_ref()
            .ok_or(RouteChoiceError::ResultsNotComputed)?;
        if !results.stored {
            return Err(RouteChoiceError::ResultsNotComputed);
        }
        table::results_to_batch(results.choice_sets.iter(), &self.graph, results.assignment)
    }

    /// total link loads per demand column, over network link ids.
    pub fn link_loading(&self) -> Result<&IndexMap<String, ColumnValues>, RouteChoiceError> {
        self.loading_results().map(|loading| &loading.link_loads)
    }

    /// per select-link-query link loads per demand column.
    pub fn select_link_loading(
        &self,
    ) -> Result<&IndexMap<String, IndexMap<String, ColumnValues>>, RouteChoiceError> {
        self.loading_results()
            .map(|loading| &loading.select_link_loads)
    }

    /// per select-link-query sparse OD matrices per demand column.
    pub fn select_link_od_matrices(
        &self,
    ) -> Result<&IndexMap<String, IndexMap<String, SparseOdMatrix>>, RouteChoiceError> {
        self.loading_results()
            .map(|loading| &loading.select_link_od)
    }

    fn loading_results(&self) -> Result<&LinkLoadingResults, RouteChoiceError> {
        self.results
            .as_ref()
            .and_then(|results| results.loading.as_ref())
            .ok_or(RouteChoiceError::ResultsNotComputed)
    }

    fn expand_route(&self, route: &[u32]) -> Vec<u32> {
        route
            .iter()
            .flat_map(|&link| self.graph.network_links(link).iter().copied())
            .collect()
    }

    fn compile_queries(&self) -> Result<IndexMap<String, SelectLinkQuery>, RouteChoiceError> {
        let queries: IndexMap<String, SelectLinkQuery> = self
            .select_links
            .iter()
            .map(|(name, and_sets)| (name.clone(), SelectLinkQuery::new(and_sets.clone())))
            .collect();
        for (name, query) in &queries {
            if let Some(max_link) = query.max_link() {
                if max_link as usize >= self.graph.n_links() {
                    return Err(RouteChoiceError::InvalidParameters(format!(
                        "select link query '{name}' references compact link {max_link}, \
                         but the graph has {} links",
                        self.graph.n_links()
                    )));
                }
            }
        }
        Ok(queries)
    }

    /// resolve demand node ids to compact indices, failing fast on any
    /// id absent from the graph.
    fn resolve_tasks(&self, demand: &FinalizedDemand) -> Result<Vec<OdTask>, RouteChoiceError> {
        demand
            .ods()
            .iter()
            .enumerate()
            .map(|(demand_row, &(origin_id, destination_id))| {
                let origin = self
                    .graph
                    .node_index(origin_id)
                    .ok_or(RouteChoiceError::InvalidNode(origin_id))?;
                let destination = self
                    .graph
                    .node_index(destination_id)
                    .ok_or(RouteChoiceError::InvalidNode(destination_id))?;
                Ok(OdTask {
                    demand_row,
                    origin,
                    destination,
                    origin_id,
                    destination_id,
                })
            })
            .collect()
    }

    fn finder(&self, config: &BatchConfig) -> PathFinder {
        if config.a_star {
            match AStarHeuristic::from_graph(&self.graph) {
                Some(heuristic) => return PathFinder::AStar(heuristic),
                None => log::warn!(
                    "a_star requested but the graph has no coordinates; using Dijkstra"
                ),
            }
        }
        PathFinder::Dijkstra
    }

    /// write one chunk's rows to the dataset, one partition per origin.
    fn flush_chunk(
        &self,
        writer: &CheckpointWriter,
        chunk: &[OdTask],
        slots: &[Option<RouteChoiceSet>],
        assignment: bool,
    ) -> Result<(), RouteChoiceError> {
        let groups = chunk
            .iter()
            .zip(slots)
            .chunk_by(|(task, _)| task.origin_id);
        for (origin_id, group) in &groups {
            let choice_sets = group.filter_map(|(_, slot)| slot.as_ref());
            let batch = table::results_to_batch(choice_sets, &self.graph, assignment)?;
            writer.write_origin(origin_id, &batch)?;
        }
        Ok(())
    }
}

/// enumerate, and optionally assign, a single OD pair.
fn process_od(
    task: &OdTask,
    ctx: &mut EnumerationContext<'_>,
    enumerator: &dyn RouteEnumerator,
    graph: &CompactGraph,
    config: &BatchConfig,
) -> RouteChoiceSet {
    let mut choice_set =
        RouteChoiceSet::new((task.origin_id, task.destination_id), RouteSet::new());
    if task.origin == task.destination {
        return choice_set;
    }

    graph.block_centroid_flows(&mut ctx.head, task.origin, task.destination);
    let routes = enumerator.enumerate(ctx, task.origin, task.destination);
    graph.unblock_centroid_flows(&mut ctx.head, task.origin, task.destination);

    if routes.is_empty() {
        log::warn!(
            "destination {} is unreachable from origin {}; OD contributes nothing",
            task.destination_id,
            task.origin_id
        );
    }
    choice_set.routes = routes;
    if config.path_size_logit && !choice_set.routes.is_empty() {
        choice_set.assign(graph.costs(), config.beta, config.cutoff_prob);
    }
    choice_set
}

fn effective_cores(cores: usize) -> usize {
    if cores > 0 {
        cores
    } else {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

/// Split the task list into checkpoint chunks aligned to whole origins,
/// or a single chunk when nothing is being written to disk. Tasks are
/// sorted by (origin, destination), so origin runs are contiguous.
fn chunk_tasks(tasks: &[OdTask], checkpointing: bool) -> Vec<&[OdTask]> {
    if !checkpointing || tasks.is_empty() {
        return vec![tasks];
    }
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < tasks.len() {
        let mut end = (start + CHECKPOINT_CHUNK_TARGET).min(tasks.len());
        while end < tasks.len() && tasks[end].origin_id == tasks[end - 1].origin_id {
            end += 1;
        }
        chunks.push(&tasks[start..end]);
        start = end;
    }
    chunks
}
