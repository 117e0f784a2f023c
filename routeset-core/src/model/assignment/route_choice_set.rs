use super::psl_ops;
use crate::model::choice::RouteSet;

/// One OD pair's enumerated routes and, once assignment has run, the
/// parallel per-route vectors of the path-size-logit model.
///
/// Invariants after [`Self::assign`]: probabilities over unmasked routes
/// sum to one (or all probabilities are zero when every route is
/// masked), and masked routes have zero probability and overlap.
#[derive(Debug, Clone)]
pub struct RouteChoiceSet {
    /// external (network) node ids of the pair
    pub od: (u32, u32),
    pub routes: RouteSet,
    pub cost: Vec<f64>,
    pub mask: Vec<bool>,
    pub path_overlap: Vec<f64>,
    pub probability: Vec<f64>,
}

impl RouteChoiceSet {
    pub fn new(od: (u32, u32), routes: RouteSet) -> Self {
        Self {
            od,
            routes,
            cost: Vec::new(),
            mask: Vec::new(),
            path_overlap: Vec::new(),
            probability: Vec::new(),
        }
    }

    /// run the path-size-logit pipeline: costs, binary-logit cutoff mask,
    /// link frequencies, path overlap, probabilities.
    pub fn assign(&mut self, link_cost: &[f64], beta: f64, cutoff_prob: f64) {
        self.cost = psl_ops::route_costs(&self.routes, link_cost);
        self.mask = psl_ops::cutoff_mask(self.od, &self.cost, cutoff_prob);
        let frequency = psl_ops::link_frequency(&self.routes, &self.mask);
        self.path_overlap =
            psl_ops::path_overlap(&self.routes, &self.cost, &self.mask, link_cost, &frequency);
        self.probability = psl_ops::path_probability(&self.cost, &self.path_overlap, &self.mask, beta);
    }

    pub fn has_assignment(&self) -> bool {
        self.cost.len() == self.routes.len() && !self.routes.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
