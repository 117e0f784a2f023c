use std::path::PathBuf;

use routeset_core::model::choice::ChoiceSetParams;
use serde::{Deserialize, Serialize};

use super::RouteChoiceError;

/// Parameters of one `batched` call. Field defaults match the library
/// defaults, so a config deserialized from a partial JSON/TOML document
/// only needs the fields it overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// maximum routes per OD pair; 0 means unbounded.
    pub max_routes: usize,
    /// maximum enumeration depth; 0 means unbounded. At least one of
    /// `max_routes` and `max_depth` must be positive.
    pub max_depth: usize,
    /// duplicate-route tolerance before an OD's enumeration stops.
    pub max_misses: usize,
    /// RNG seed for the BFS-LE queue shuffle.
    pub seed: u64,
    /// worker threads; 0 uses the hardware parallelism.
    pub cores: usize,
    /// BFS with link elimination when `true`, link penalisation when
    /// `false`.
    pub bfsle: bool,
    /// cost multiplier for link penalisation; must be > 1.0 for LP and
    /// exactly 1.0 for BFS-LE.
    pub penalty: f64,
    /// use the A* back-end when the graph carries coordinates.
    pub a_star: bool,
    /// write each batch to a partitioned parquet dataset instead of
    /// keeping the result table in memory.
    pub checkpoint_dir: Option<PathBuf>,
    /// keep per-OD route sets for the result table.
    pub store_results: bool,
    /// run the path-size-logit assignment after enumeration.
    pub path_size_logit: bool,
    /// accumulate link loadings per OD inside the parallel region rather
    /// than in a pass over stored results.
    pub eager_link_loading: bool,
    /// path-size exponent of the PSL model.
    pub beta: f64,
    /// binary-logit cutoff probability in [0, 1]; 0 disables the cutoff.
    pub cutoff_prob: f64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_routes: 0,
            max_depth: 0,
            max_misses: 100,
            seed: 0,
            cores: 0,
            bfsle: true,
            penalty: 1.0,
            a_star: true,
            checkpoint_dir: None,
            store_results: true,
            path_size_logit: false,
            eager_link_loading: false,
            beta: 1.0,
            cutoff_prob: 0.0,
        }
    }
}

impl BatchConfig {
    /// batch-boundary validation: every failure here surfaces before any
    /// parallel work starts.
    pub fn validate(&self) -> Result<(), RouteChoiceError> {
        if self.max_routes == 0 && self.max_depth == 0 {
            return Err(RouteChoiceError::InvalidParameters(
                "at least one of max_routes and max_depth must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.cutoff_prob) {
            return Err(RouteChoiceError::InvalidParameters(format!(
                "cutoff_prob must lie in [0, 1], got {}",
                self.cutoff_prob
            )));
        }
        if self.path_size_logit && self.beta < 0.0 {
            return Err(RouteChoiceError::InvalidParameters(format!(
                "beta must be non-negative, got {}",
                self.beta
            )));
        }
        if !self.bfsle && self.penalty <= 1.0 {
            return Err(RouteChoiceError::InvalidParameters(format!(
                "link penalisation requires penalty > 1.0, got {}",
                self.penalty
            )));
        }
        if self.bfsle && self.penalty != 1.0 {
            return Err(RouteChoiceError::InvalidParameters(
                "BFS-LE does not combine with link penalisation; set penalty = 1.0".to_string(),
            ));
        }
        Ok(())
    }

    pub(super) fn choice_params(&self) -> ChoiceSetParams {
        ChoiceSetParams {
            max_routes: self.max_routes,
            max_depth: self.max_depth,
            max_misses: self.max_misses,
            penalty: self.penalty,
            seed: self.seed,
        }
    }
}
