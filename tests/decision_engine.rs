//! Integration coverage for `decision::choose_provider` beyond the lettered
//! scenarios already exercised inline in `src/decision/mod.rs`.

use federation_broker::decision::choose_provider;
use federation_broker::domain::quantity::{Quantity, ResourceQuantities};
use federation_broker::domain::resource_metrics::ResourceMetrics;
use federation_broker::domain::ClusterAdvertisement;

const GI: u64 = 1024 * 1024 * 1024;

fn cluster(id: &str, allocatable_cpu: u64, allocated_cpu: u64) -> ClusterAdvertisement {
    ClusterAdvertisement::new(
        id,
        format!("{id}-name"),
        ResourceMetrics::new(
            ResourceQuantities::new(Quantity(allocatable_cpu), Quantity(allocatable_cpu)),
            ResourceQuantities::new(Quantity(allocatable_cpu), Quantity(allocatable_cpu)),
            ResourceQuantities::new(Quantity(allocated_cpu), Quantity(allocated_cpu)),
        ),
    )
}

#[test]
fn no_candidates_at_all_is_still_no_suitable_cluster() {
    let requested = ResourceQuantities::new(Quantity(500), Quantity(GI));
    let err = choose_provider(&[], "c0", &requested, None).unwrap_err();
    assert_eq!(err.to_string(), "no cluster has sufficient available resources for the request");
}

#[test]
fn requester_as_sole_candidate_has_nothing_to_choose_from() {
    let c0 = cluster("c0", 8000, 1000);
    let requested = ResourceQuantities::new(Quantity(500), Quantity(GI));
    assert!(choose_provider(&[c0], "c0", &requested, None).is_err());
}

#[test]
fn a_gpu_request_filters_out_clusters_advertising_no_gpu() {
    let mut with_gpu = cluster("c1", 4000, 1000);
    with_gpu.resources.allocatable.gpu = Some(Quantity(4));
    with_gpu.resources.available.gpu = Some(Quantity(4));

    let without_gpu = cluster("c2", 8000, 1000);

    let requested = ResourceQuantities { gpu: Some(Quantity(1)), ..ResourceQuantities::new(Quantity(500), Quantity(0)) };

    let chosen = choose_provider(&[with_gpu, without_gpu], "c0", &requested, None).unwrap();
    assert_eq!(chosen.cluster_id, "c1");
}

#[test]
fn priority_does_not_perturb_the_headroom_score() {
    let c1 = cluster("c1", 4000, 1000);
    let c2 = cluster("c2", 8000, 4000);
    let requested = ResourceQuantities::new(Quantity(500), Quantity(0));

    let low_priority = choose_provider(&[c1.clone(), c2.clone()], "c0", &requested, Some(0)).unwrap();
    let high_priority = choose_provider(&[c1, c2], "c0", &requested, Some(100)).unwrap();
    assert_eq!(low_priority.cluster_id, high_priority.cluster_id);
}
