//! The reservation lifecycle observer: a background
//! task that expires due reservations and reconciles `reserved` drift
//! between reservation records and the advertisements they target.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::domain::advertisement::advertisement_name;
use crate::domain::quantity::ResourceQuantities;
use crate::domain::{Reservation, ReservationPhase};
use crate::locking::release_on;
use crate::store::StateStore;

use super::state::AppState;

/// Runs the observer loop until the process exits. One instance per broker
/// process, independent of request handlers.
pub async fn run(state: Arc<AppState>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        if let Err(err) = tick(&state).await {
            log::warn!("lifecycle observer tick failed: {err}");
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    #[error(transparent)]
    Store(#[from] crate::store::StoreError),
}

/// A single reconciliation pass:
/// 1. Release any `Reserved`/`Active` reservation past its `expires_at`.
/// 2. Recompute each advertisement's expected `reserved` from the union of
///    still-`Reserved`/`Active` reservations targeting it, and correct any
///    drift — covers both "Reserved on advertisement but no Reserved-phase
///    record" and the reverse.
pub async fn tick(state: &AppState) -> Result<(), ObserverError> {
    let now = Utc::now();
    let reservations = state.reservations.list_all().await?;

    for versioned in &reservations {
        let reservation = &versioned.value;
        if reservation.status.phase.holds_reservation() && reservation.is_expired(now) {
            expire(state, reservation).await?;
        }
    }

    reconcile_reserved_drift(state).await?;

    Ok(())
}

async fn expire(state: &AppState, reservation: &Reservation) -> Result<(), ObserverError> {
    log::info!("reservation '{}' expired, releasing target '{}'", reservation.id, reservation.target_cluster_id);

    if !reservation.target_cluster_id.is_empty() {
        let name = advertisement_name(&reservation.target_cluster_id);
        if let Err(err) = release_on(&*state.advertisements, &name, &reservation.requested_resources, state.lock_retries).await {
            log::warn!("failed to release expired reservation '{}': {err}", reservation.id);
            return Ok(());
        }
    }

    let mut released = reservation.clone();
    released.status.phase = ReservationPhase::Released;
    released.pinned = false;
    if let Some(versioned) = state.reservations.fetch_by_name(&reservation.id).await? {
        let _ = state.reservations.update_with_version(&reservation.id, &versioned.version, released).await;
    }

    Ok(())
}

async fn reconcile_reserved_drift(state: &AppState) -> Result<(), ObserverError> {
    let reservations = state.reservations.list_all().await?;
    let advertisements = state.advertisements.list_all().await?;

    for versioned_ad in advertisements {
        let advertisement = &versioned_ad.value;
        let expected: ResourceQuantities = reservations
            .iter()
            .map(|v| &v.value)
            .filter(|r| r.status.phase.holds_reservation() && r.target_cluster_id == advertisement.cluster_id)
            .fold(ResourceQuantities::default(), |acc, r| acc.add(&r.requested_resources));

        let actual = advertisement.resources.reserved_or_zero();
        if actual != expected {
            log::warn!(
                "reconciling drift on '{}': stored reserved={:?} expected={:?} from live reservations",
                advertisement.cluster_id,
                actual,
                expected
            );
            let mut corrected = advertisement.clone();
            corrected.resources.reserved = Some(expected);
            corrected.resources.recompute_available();
            let name = advertisement_name(&advertisement.cluster_id);
            let _ = state.advertisements.update_with_version(&name, &versioned_ad.version, corrected).await;
        }
    }

    Ok(())
}
