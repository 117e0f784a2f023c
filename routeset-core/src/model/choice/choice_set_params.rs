use serde::{Deserialize, Serialize};

/// Termination and perturbation parameters shared by both enumeration
/// strategies. `max_routes` and `max_depth` of zero mean "unbounded",
/// but at least one of the two must be positive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChoiceSetParams {
    pub max_routes: usize,
    pub max_depth: usize,
    pub max_misses: usize,
    pub penalty: f64,
    pub seed: u64,
}

impl Default for ChoiceSetParams {
    fn default() -> Self {
        Self {
            max_routes: 0,
            max_depth: 0,
            max_misses: 100,
            penalty: 1.0,
            seed: 0,
        }
    }
}

impl ChoiceSetParams {
    pub(super) fn route_limit(&self) -> usize {
        if self.max_routes == 0 {
            usize::MAX
        } else {
            self.max_routes
        }
    }

    pub(super) fn depth_limit(&self) -> usize {
        if self.max_depth == 0 {
            usize::MAX
        } else {
            self.max_depth
        }
    }
}
