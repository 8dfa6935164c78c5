//! The synchronous reservation dispatcher: `POST /api/v1/reservations`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::api::{ReservationDto, ReservationRequestDto};
use crate::decision::choose_provider;
use crate::domain::advertisement::advertisement_name;
use crate::domain::Reservation;
use crate::locking::{reserve_on, LockingError};

use super::advertisements::list_active;
use super::error::ApiError;
use super::identity::CallerIdentity;
use super::state::AppState;

/// `POST /api/v1/reservations`: the nine-step synchronous dispatcher.
/// Returns `201` with phase `Reserved`, or `409` with phase `Failed` — the
/// reservation record is always in the response body, since a failed lock
/// must never fail silently.
pub async fn create(
    State(state): State<Arc<AppState>>,
    identity: CallerIdentity,
    Json(request): Json<ReservationRequestDto>,
) -> Result<(StatusCode, Json<ReservationDto>), ApiError> {
    // Steps 1-3: caller identity is `identity.0`; parse and validate the
    // requested quantities before any record is written.
    let requester_id = identity.0.clone();
    let requested = request.requested_resources.to_domain()?;
    if !requested.cpu.is_positive() || !requested.memory.is_positive() {
        return Err(ApiError::NonPositiveRequest);
    }
    let priority = request.priority.unwrap_or(0);
    let duration = parse_duration(request.duration.as_deref())?;

    // Step 4: decision engine over a snapshot of advertisements.
    let candidates = list_active(&state).await?;
    let chosen = match choose_provider(&candidates, &requester_id, &requested, request.priority) {
        Ok(chosen) => chosen,
        Err(err) => {
            // No cluster was chosen, so there is nothing to pin a normal
            // record against; still persist a `Failed` reservation so the
            // failure is diagnosable.
            let id = state.next_reservation_id(&requester_id);
            let mut reservation = Reservation::new_unrouted(id, requester_id, requested, priority, duration);
            reservation.mark_failed(format!("no-fit: {err}"));
            let stored = state.reservations.create_if_absent(&reservation.id, reservation).await?;
            return Ok((StatusCode::CONFLICT, Json(ReservationDto::from_domain(&stored.value))));
        }
    };

    // Step 5: create the reservation record in phase Pending.
    let id = state.next_reservation_id(&requester_id);
    let mut reservation = Reservation::new(id, requester_id, chosen.cluster_id.clone(), requested.clone(), priority, duration)?;

    // Step 6: attach the finalizer-equivalent pin before attempting the
    // lock, so a crash between "lock succeeded" and "reservation persisted"
    // still leaves a record the lifecycle observer can reconcile.
    reservation.pinned = true;
    let created = state.reservations.create_if_absent(&reservation.id, reservation.clone()).await?;
    let mut version = created.version;

    // Step 7: lock the target's Reserved field.
    let lock_result = reserve_on(&*state.advertisements, &advertisement_name(&chosen.cluster_id), &requested, state.lock_retries).await;

    let status_code = match &lock_result {
        Ok(_) => StatusCode::CREATED,
        Err(_) => StatusCode::CONFLICT,
    };
    match lock_result {
        Ok(_updated_advertisement) => reservation.mark_reserved(), // step 9
        Err(err) => reservation.mark_failed(describe_lock_failure(&err)), // step 8
    }

    loop {
        match state.reservations.update_with_version(&reservation.id, &version, reservation.clone()).await {
            Ok(updated) => return Ok((status_code, Json(ReservationDto::from_domain(&updated.value)))),
            Err(crate::store::StoreError::VersionConflict { .. }) => {
                // Another writer (e.g. the lifecycle observer) touched this
                // record between our create and our status update; refetch
                // and reapply our phase transition on top of the latest
                // version rather than clobbering it.
                let latest = state.reservations.fetch_by_name(&reservation.id).await?.ok_or_else(|| ApiError::ReservationVanished(reservation.id.clone()))?;
                version = latest.version;
            }
            Err(other) => return Err(other.into()),
        }
    }
}

fn parse_duration(raw: Option<&str>) -> Result<Option<chrono::Duration>, ApiError> {
    raw.map(|value| {
        humantime::parse_duration(value)
            .map_err(|_| ApiError::InvalidDuration(value.to_string()))
            .map(|std_duration| chrono::Duration::from_std(std_duration).unwrap_or(chrono::Duration::zero()))
    })
    .transpose()
}

fn describe_lock_failure(err: &LockingError) -> String {
    match err {
        LockingError::InsufficientResources => "fit was lost before the lock could be applied".to_string(),
        LockingError::LockContended => "lock retries exhausted; the target cluster is contended".to_string(),
        LockingError::Store(store_err) => format!("state store error while locking: {store_err}"),
    }
}
