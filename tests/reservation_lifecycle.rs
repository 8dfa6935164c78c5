//! Integration coverage for `broker::reservations::create` and
//! `broker::lifecycle`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;

use federation_broker::api::{AdvertisementDto, ReservationPhaseDto, ReservationRequestDto, ResourceMetricsDto, ResourceQuantitiesDto};
use federation_broker::broker::advertisements::publish;
use federation_broker::broker::identity::CallerIdentity;
use federation_broker::broker::lifecycle::tick;
use federation_broker::broker::reservations::create;
use federation_broker::broker::state::AppState;
use federation_broker::domain::advertisement::advertisement_name;

fn quantities(cpu: &str, memory: &str) -> ResourceQuantitiesDto {
    ResourceQuantitiesDto { cpu: cpu.to_string(), memory: memory.to_string(), gpu: None, storage: None }
}

fn advertisement(cluster_id: &str, allocatable_cpu: &str) -> AdvertisementDto {
    AdvertisementDto {
        cluster_id: cluster_id.to_string(),
        cluster_name: format!("{cluster_id}-name"),
        timestamp: Utc::now(),
        resources: ResourceMetricsDto {
            capacity: quantities(allocatable_cpu, "17179869184"),
            allocatable: quantities(allocatable_cpu, "17179869184"),
            allocated: quantities("0", "0"),
            available: quantities(allocatable_cpu, "17179869184"),
            reserved: None,
        },
        active: true,
    }
}

async fn seed(state: &Arc<AppState>, cluster_id: &str, allocatable_cpu: &str) {
    publish(State(state.clone()), CallerIdentity(cluster_id.to_string()), Json(advertisement(cluster_id, allocatable_cpu))).await.unwrap();
}

#[tokio::test]
async fn successful_reservation_reaches_reserved_and_locks_the_target() {
    let state = Arc::new(AppState::new(5));
    seed(&state, "c1", "8000").await;

    let request = ReservationRequestDto { requested_resources: quantities("500", "1073741824"), priority: None, duration: Some("1h".to_string()) };
    let (status, body) = create(State(state.clone()), CallerIdentity("c0".to_string()), Json(request)).await.unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert!(matches!(body.0.status.phase, ReservationPhaseDto::Reserved));
    assert_eq!(body.0.target_cluster_id, "c1");
    assert!(body.0.status.expires_at.is_some());

    let name = advertisement_name("c1");
    let advertisement = state.advertisements.fetch_by_name(&name).await.unwrap().unwrap();
    assert_eq!(advertisement.value.resources.reserved_or_zero().cpu.0, 500);
}

#[tokio::test]
async fn reservation_with_no_fitting_cluster_is_recorded_as_failed() {
    let state = Arc::new(AppState::new(5));
    seed(&state, "c1", "100").await;

    let request = ReservationRequestDto { requested_resources: quantities("500", "1073741824"), priority: None, duration: None };
    let (status, body) = create(State(state), CallerIdentity("c0".to_string()), Json(request)).await.unwrap();

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(matches!(body.0.status.phase, ReservationPhaseDto::Failed));
    assert!(!body.0.status.message.is_empty());
}

#[tokio::test]
async fn lifecycle_tick_expires_and_releases_past_due_reservations() {
    let state = Arc::new(AppState::new(5));
    seed(&state, "c1", "8000").await;

    let request = ReservationRequestDto { requested_resources: quantities("500", "0"), priority: None, duration: Some("1ms".to_string()) };
    let (_, body) = create(State(state.clone()), CallerIdentity("c0".to_string()), Json(request)).await.unwrap();
    let reservation_id = body.0.id.clone();

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    tick(&state).await.unwrap();

    let reservation = state.reservations.fetch_by_name(&reservation_id).await.unwrap().unwrap();
    assert!(matches!(reservation.value.status.phase, federation_broker::domain::ReservationPhase::Released));
    assert!(!reservation.value.pinned);

    let name = advertisement_name("c1");
    let advertisement = state.advertisements.fetch_by_name(&name).await.unwrap().unwrap();
    assert_eq!(advertisement.value.resources.reserved_or_zero().cpu.0, 0);
}

#[tokio::test]
async fn lifecycle_tick_corrects_reserved_drift_against_live_reservations() {
    let state = Arc::new(AppState::new(5));
    seed(&state, "c1", "8000").await;

    // Manually desynchronize the advertisement's `reserved` from reality,
    // simulating an observer restart after a crash mid-dispatch.
    let name = advertisement_name("c1");
    let versioned = state.advertisements.fetch_by_name(&name).await.unwrap().unwrap();
    let mut drifted = versioned.value.clone();
    drifted.resources.reserved = Some(federation_broker::domain::quantity::ResourceQuantities::new(
        federation_broker::domain::quantity::Quantity(9999),
        federation_broker::domain::quantity::Quantity(0),
    ));
    drifted.resources.recompute_available();
    state.advertisements.update_with_version(&name, &versioned.version, drifted).await.unwrap();

    tick(&state).await.unwrap();

    let corrected = state.advertisements.fetch_by_name(&name).await.unwrap().unwrap();
    // No live reservations target c1, so reserved should reconcile to zero.
    assert_eq!(corrected.value.resources.reserved_or_zero().cpu.0, 0);
}
