//! Path-size-logit math over one OD's route set: costs, the binary-logit
//! cutoff mask, link frequencies, path overlap and choice probabilities.

use itertools::Itertools;

use super::inverse_binary_logit;
use crate::model::choice::RouteSet;

/// base-cost total of every route.
pub fn route_costs(routes: &RouteSet, link_cost: &[f64]) -> Vec<f64> {
    routes
        .iter()
        .map(|route| route.iter().map(|&link| link_cost[link as usize]).sum())
        .collect()
}

/// Binary-logit cutoff mask: a route stays in the choice set iff its cost
/// is within `inverse_binary_logit(scaled, 0, 1)` of the minimum, where
/// the caller-facing `cutoff_prob` is rescaled onto `[0.5, 1.0]` to keep
/// the inverse logit non-negative. The minimum-cost route always stays.
///
/// A zero-cost route poisons the overlap and probability math, so such a
/// set is masked out entirely with a warning.
pub fn cutoff_mask(od: (u32, u32), costs: &[f64], cutoff_prob: f64) -> Vec<bool> {
    if costs.iter().any(|&cost| cost == 0.0) {
        log::warn!(
            "route set for OD ({}, {}) contains a zero-cost route; masking all {} routes",
            od.0,
            od.1,
            costs.len()
        );
        return vec![false; costs.len()];
    }
    let minimum = costs.iter().copied().fold(f64::INFINITY, f64::min);
    let scaled = 0.5 + (1.0 - cutoff_prob) * 0.5;
    let cutoff = minimum + inverse_binary_logit(scaled, 0.0, 1.0);
    costs.iter().map(|&cost| cost <= cutoff).collect()
}

/// `(link, count)` pairs over the unmasked routes, sorted by link id,
/// produced by sorting the concatenated link ids and run-length counting.
pub fn link_frequency(routes: &RouteSet, mask: &[bool]) -> (Vec<u32>, Vec<u32>) {
    let counted = routes
        .iter()
        .zip(mask)
        .filter(|(_, &unmasked)| unmasked)
        .flat_map(|(route, _)| route.iter().copied())
        .sorted_unstable()
        .dedup_with_count();
    let mut links = Vec::new();
    let mut counts = Vec::new();
    for (count, link) in counted {
        links.push(link);
        counts.push(count as u32);
    }
    (links, counts)
}

/// Path overlap of route `j`:
/// `gamma_j = (1 / cost_j) * sum over links a of cost_a / freq_a`,
/// with `freq_a` the number of unmasked routes containing `a`.
/// Masked routes get zero.
pub fn path_overlap(
    routes: &RouteSet,
    costs: &[f64],
    mask: &[bool],
    link_cost: &[f64],
    frequency: &(Vec<u32>, Vec<u32>),
) -> Vec<f64> {
    let (links, counts) = frequency;
    routes
        .iter()
        .enumerate()
        .map(|(j, route)| {
            if !mask[j] {
                return 0.0;
            }
            let total: f64 = route
                .iter()
                .map(|&link| {
                    let freq = match links.binary_search(&link) {
                        Ok(position) => counts[position] as f64,
                        // unmasked routes only contribute their own links;
                        // reaching here is a programming error
                        Err(_) => unreachable!("link {link} missing from frequency table"),
                    };
                    link_cost[link as usize] / freq
                })
                .sum();
            total / costs[j]
        })
        .collect()
}

/// Path-size-logit probability of route `j` (θ = 1):
/// `P_j = 1 / sum over k of (gamma_k / gamma_j)^beta * exp(cost_j - cost_k)`,
/// summed over unmasked routes. Masked routes get zero.
pub fn path_probability(costs: &[f64], overlap: &[f64], mask: &[bool], beta: f64) -> Vec<f64> {
    (0..costs.len())
        .map(|j| {
            if !mask[j] {
                return 0.0;
            }
            let denominator: f64 = (0..costs.len())
                .filter(|&k| mask[k])
                .map(|k| (overlap[k] / overlap[j]).powf(beta) * (costs[j] - costs[k]).exp())
                .sum();
            1.0 / denominator
        })
        .collect()
}
