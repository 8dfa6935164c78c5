//! Lettered end-to-end scenarios, driven through the broker's handler
//! functions end to end (publish -> dispatch -> verify), rather than
//! through the decision engine in isolation.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use pretty_assertions::assert_eq;

use federation_broker::api::{AdvertisementDto, ReservationPhaseDto, ReservationRequestDto, ResourceMetricsDto, ResourceQuantitiesDto};
use federation_broker::broker::advertisements::publish;
use federation_broker::broker::identity::CallerIdentity;
use federation_broker::broker::reservations::create;
use federation_broker::broker::state::AppState;

fn quantities(cpu: &str, memory: &str) -> ResourceQuantitiesDto {
    ResourceQuantitiesDto { cpu: cpu.to_string(), memory: memory.to_string(), gpu: None, storage: None }
}

fn advertisement(cluster_id: &str, allocatable_cpu: u64, allocated_cpu: u64, active: bool) -> AdvertisementDto {
    AdvertisementDto {
        cluster_id: cluster_id.to_string(),
        cluster_name: format!("{cluster_id}-name"),
        timestamp: Utc::now(),
        resources: ResourceMetricsDto {
            capacity: quantities(&allocatable_cpu.to_string(), "17179869184"),
            allocatable: quantities(&allocatable_cpu.to_string(), "17179869184"),
            allocated: quantities(&allocated_cpu.to_string(), "0"),
            available: quantities(&(allocatable_cpu - allocated_cpu).to_string(), "17179869184"),
            reserved: None,
        },
        active,
    }
}

async fn seed(state: &Arc<AppState>, cluster_id: &str, allocatable_cpu: u64, allocated_cpu: u64, active: bool) {
    publish(State(state.clone()), CallerIdentity(cluster_id.to_string()), Json(advertisement(cluster_id, allocatable_cpu, allocated_cpu, active))).await.unwrap();
}

async fn dispatch(state: &Arc<AppState>, requester: &str, cpu: u64) -> (StatusCode, federation_broker::api::ReservationDto) {
    let request = ReservationRequestDto { requested_resources: quantities(&cpu.to_string(), "0"), priority: None, duration: None };
    let (status, body) = create(State(state.clone()), CallerIdentity(requester.to_string()), Json(request)).await.unwrap();
    (status, body.0)
}

#[tokio::test]
async fn scenario_a_picks_the_cluster_with_more_post_reservation_headroom() {
    let state = Arc::new(AppState::new(5));
    seed(&state, "c1", 4000, 1000, true).await;
    seed(&state, "c2", 8000, 4000, true).await;

    let (status, reservation) = dispatch(&state, "c0", 500).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reservation.target_cluster_id, "c2");
}

#[tokio::test]
async fn scenario_b_higher_ratio_wins_at_equal_post_reservation_availability() {
    const GI: u64 = 1024 * 1024 * 1024;
    let state = Arc::new(AppState::new(5));

    // Both clusters have identical post-reservation available CPU (2000 -
    // 500 = 1500) and identical memory ratios; only the CPU allocatable
    // differs, so the tighter-ratio cluster (c1) must win over the
    // larger-but-proportionally-looser one (c2).
    let c1 = AdvertisementDto {
        cluster_id: "c1".to_string(),
        cluster_name: "c1-name".to_string(),
        timestamp: Utc::now(),
        resources: ResourceMetricsDto {
            capacity: quantities("4000", &(8 * GI).to_string()),
            allocatable: quantities("4000", &(8 * GI).to_string()),
            allocated: quantities("2000", &(6 * GI).to_string()),
            available: quantities("2000", &(2 * GI).to_string()),
            reserved: None,
        },
        active: true,
    };
    let c2 = AdvertisementDto {
        cluster_id: "c2".to_string(),
        cluster_name: "c2-name".to_string(),
        timestamp: Utc::now(),
        resources: ResourceMetricsDto {
            capacity: quantities("8000", &(8 * GI).to_string()),
            allocatable: quantities("8000", &(8 * GI).to_string()),
            allocated: quantities("6000", &(6 * GI).to_string()),
            available: quantities("2000", &(2 * GI).to_string()),
            reserved: None,
        },
        active: true,
    };
    publish(State(state.clone()), CallerIdentity("c1".to_string()), Json(c1)).await.unwrap();
    publish(State(state.clone()), CallerIdentity("c2".to_string()), Json(c2)).await.unwrap();

    let request = ReservationRequestDto { requested_resources: quantities("500", &GI.to_string()), priority: None, duration: None };
    let (status, body) = create(State(state.clone()), CallerIdentity("c0".to_string()), Json(request)).await.unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body.target_cluster_id, "c1");
}

#[tokio::test]
async fn scenario_c_never_routes_a_reservation_to_its_own_requester() {
    let state = Arc::new(AppState::new(5));
    seed(&state, "c1", 8000, 2000, true).await;
    seed(&state, "c2", 4000, 2000, true).await;

    let (_, reservation) = dispatch(&state, "c1", 500).await;
    assert_eq!(reservation.target_cluster_id, "c2");
}

#[tokio::test]
async fn scenario_d_never_routes_to_an_inactive_cluster() {
    let state = Arc::new(AppState::new(5));
    seed(&state, "c1", 8000, 2000, false).await;
    seed(&state, "c2", 4000, 2000, true).await;

    let (_, reservation) = dispatch(&state, "c0", 500).await;
    assert_eq!(reservation.target_cluster_id, "c2");
}

#[tokio::test]
async fn scenario_e_records_a_failed_reservation_when_nothing_fits() {
    let state = Arc::new(AppState::new(5));
    seed(&state, "c1", 1000, 900, true).await;

    let (status, reservation) = dispatch(&state, "c0", 10_000).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(matches!(reservation.status.phase, ReservationPhaseDto::Failed));
}

#[tokio::test]
async fn scenario_f_a_republish_mid_reservation_does_not_erase_the_lock() {
    let state = Arc::new(AppState::new(5));
    seed(&state, "c1", 8000, 1000, true).await;

    let (_, reservation) = dispatch(&state, "c0", 500).await;
    assert!(matches!(reservation.status.phase, ReservationPhaseDto::Reserved));

    // c1's agent republishes without any knowledge of the broker-side lock.
    seed(&state, "c1", 8000, 1200, true).await;

    let name = federation_broker::domain::advertisement::advertisement_name("c1");
    let after = state.advertisements.fetch_by_name(&name).await.unwrap().unwrap();
    assert_eq!(after.value.resources.reserved_or_zero().cpu.0, 500);
    assert_eq!(after.value.resources.available.cpu.0, 8000 - 1200 - 500);
}
