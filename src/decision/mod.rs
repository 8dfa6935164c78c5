//! The broker's candidate-selection algorithm.
//!
//! Pure with respect to its inputs: it operates on a snapshot of
//! advertisements and never touches the store itself. Racing updates are
//! handled by the locking step (`locking.rs`), not here — mirroring how this
//! codebase already keeps its scheduling comparators (`comparator/`) as
//! small, standalone, snapshot-only functions rather than folding store
//! access into them.

use thiserror::Error;

use crate::domain::{ClusterAdvertisement, ResourceQuantities};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecisionError {
    #[error("no cluster has sufficient available resources for the request")]
    NoSuitableCluster,
}

/// The headroom coefficient that equalises CPU and memory's contribution to
/// `score`. Kept as a named constant rather than hardcoded so a future
/// configuration knob has an obvious place to plug in, without disturbing
/// the tie-break behaviour.
pub const HEADROOM_WEIGHT: f64 = 0.5;

/// Epsilon below which two scores are considered tied for the purposes of
/// the deterministic clusterID tie-break.
const SCORE_EPSILON: f64 = 1e-9;

/// Chooses the best-fit provider cluster for `requested` out of
/// `candidates`, excluding `requester_id` itself. `priority` is accepted for
/// forward compatibility with the reservation request DTO but does not
/// currently weight the score (see DESIGN.md).
pub fn choose_provider(
    candidates: &[ClusterAdvertisement],
    requester_id: &str,
    requested: &ResourceQuantities,
    _priority: Option<i32>,
) -> Result<ClusterAdvertisement, DecisionError> {
    let mut scored: Vec<(f64, &ClusterAdvertisement)> = candidates
        .iter()
        .filter(|candidate| fits_filter(candidate, requester_id, requested))
        .filter_map(|candidate| score(candidate, requested).map(|s| (s, candidate)))
        .collect();

    if scored.is_empty() {
        return Err(DecisionError::NoSuitableCluster);
    }

    scored.sort_by(|(score_a, candidate_a), (score_b, candidate_b)| {
        if (score_a - score_b).abs() < SCORE_EPSILON {
            candidate_a.cluster_id.cmp(&candidate_b.cluster_id)
        } else {
            // Higher score first.
            score_b.partial_cmp(score_a).unwrap_or(std::cmp::Ordering::Equal)
        }
    });

    Ok(scored[0].1.clone())
}

/// Discards candidates that can't possibly host the request.
fn fits_filter(candidate: &ClusterAdvertisement, requester_id: &str, requested: &ResourceQuantities) -> bool {
    if candidate.cluster_id == requester_id {
        return false;
    }
    if !candidate.active {
        return false;
    }
    candidate.resources.available.fits(requested)
}

/// The post-reservation headroom score. Returns `None`
/// if `allocatable` is zero or missing on a requested component — such a
/// candidate is supposed to have already been filtered out by
/// [`fits_filter`], but `score` stays defensive so it is safe to call in
/// isolation (as the unit tests below do).
pub fn score(candidate: &ClusterAdvertisement, requested: &ResourceQuantities) -> Option<f64> {
    let metrics = &candidate.resources;

    let cpu_after = utilisation_after(metrics.available.cpu.0, requested.cpu.0, metrics.allocatable.cpu.0)?;
    let mem_after = utilisation_after(metrics.available.memory.0, requested.memory.0, metrics.allocatable.memory.0)?;

    Some((1.0 - HEADROOM_WEIGHT * cpu_after) + (1.0 - HEADROOM_WEIGHT * mem_after))
}

/// `utilisation_after(X) = 1 - (available(X) - requested(X)) / allocatable(X)`,
/// requiring `allocatable(X) > 0`.
fn utilisation_after(available: u64, requested: u64, allocatable: u64) -> Option<f64> {
    if allocatable == 0 {
        return None;
    }
    let available = available as f64;
    let requested = requested as f64;
    let allocatable = allocatable as f64;
    Some(1.0 - (available - requested) / allocatable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::quantity::Quantity;
    use crate::domain::resource_metrics::ResourceMetrics;

    fn candidate(id: &str, allocatable_cpu: u64, allocatable_mem: u64, allocated_cpu: u64, allocated_mem: u64, active: bool) -> ClusterAdvertisement {
        ClusterAdvertisement::new(
            id,
            format!("{id}-name"),
            ResourceMetrics::new(
                ResourceQuantities::new(Quantity(allocatable_cpu), Quantity(allocatable_mem)),
                ResourceQuantities::new(Quantity(allocatable_cpu), Quantity(allocatable_mem)),
                ResourceQuantities::new(Quantity(allocated_cpu), Quantity(allocated_mem)),
            ),
        )
        .with_active(active)
    }

    impl ClusterAdvertisement {
        fn with_active(mut self, active: bool) -> Self {
            self.active = active;
            self
        }
    }

    const GI: u64 = 1024 * 1024 * 1024;

    #[test]
    fn scenario_a_single_fit_picks_higher_headroom() {
        let c1 = candidate("c1", 4000, 8 * GI, 1000, 2 * GI, true);
        let c2 = candidate("c2", 8000, 16 * GI, 4000, 8 * GI, true);
        let requested = ResourceQuantities::new(Quantity(500), Quantity(GI));

        let chosen = choose_provider(&[c1, c2], "c0", &requested, None).unwrap();
        assert_eq!(chosen.cluster_id, "c2");
        assert_eq!(chosen.resources.available.cpu, Quantity(3500));
    }

    #[test]
    fn scenario_b_higher_ratio_wins_at_equal_availability() {
        let c1 = candidate("c1", 4000, 8 * GI, 2000, 6 * GI, true);
        let c2 = candidate("c2", 8000, 8 * GI, 6000, 6 * GI, true);
        let requested = ResourceQuantities::new(Quantity(500), Quantity(GI));

        let chosen = choose_provider(&[c1, c2], "c0", &requested, None).unwrap();
        assert_eq!(chosen.cluster_id, "c1");
    }

    #[test]
    fn scenario_c_skips_own_cluster() {
        let c1 = candidate("c1", 8000, 16 * GI, 2000, 4 * GI, true);
        let c2 = candidate("c2", 4000, 8 * GI, 2000, 4 * GI, true);
        let requested = ResourceQuantities::new(Quantity(500), Quantity(GI));

        let chosen = choose_provider(&[c1, c2], "c1", &requested, None).unwrap();
        assert_eq!(chosen.cluster_id, "c2");
    }

    #[test]
    fn scenario_d_skips_inactive() {
        let c1 = candidate("c1", 8000, 16 * GI, 2000, 4 * GI, false);
        let c2 = candidate("c2", 4000, 8 * GI, 2000, 4 * GI, true);
        let requested = ResourceQuantities::new(Quantity(500), Quantity(GI));

        let chosen = choose_provider(&[c1, c2], "c0", &requested, None).unwrap();
        assert_eq!(chosen.cluster_id, "c2");
    }

    #[test]
    fn scenario_e_no_fit_returns_error() {
        let c1 = candidate("c1", 2000, 4 * GI, 1000, 3 * GI, true);
        let c2 = candidate("c2", 4000, 8 * GI, 2000, 6 * GI, true);
        let requested = ResourceQuantities::new(Quantity(10_000), Quantity(GI));

        let err = choose_provider(&[c1, c2], "c0", &requested, None).unwrap_err();
        assert_eq!(err, DecisionError::NoSuitableCluster);
    }

    #[test]
    fn exact_fit_boundary_is_accepted() {
        let c1 = candidate("c1", 1000, 2 * GI, 500, GI, true);
        let requested = ResourceQuantities::new(Quantity(500), Quantity(GI));
        let chosen = choose_provider(&[c1], "c0", &requested, None).unwrap();
        assert_eq!(chosen.cluster_id, "c1");
    }

    #[test]
    fn tie_break_prefers_lexicographically_smaller_cluster_id() {
        let c_b = candidate("c-b", 4000, 8 * GI, 2000, 4 * GI, true);
        let c_a = candidate("c-a", 4000, 8 * GI, 2000, 4 * GI, true);
        let requested = ResourceQuantities::new(Quantity(500), Quantity(GI));

        let chosen = choose_provider(&[c_b, c_a], "c0", &requested, None).unwrap();
        assert_eq!(chosen.cluster_id, "c-a");
    }
}
