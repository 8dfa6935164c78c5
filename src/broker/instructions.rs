//! Instruction fanout: the piggyback path (`advertisements::publish`) and
//! the pull path (`GET /api/v1/instructions`) both funnel through
//! [`provider_instructions_for`] so they can never disagree about which
//! reservations qualify.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::api::ReservationDto;
use crate::domain::ReservationPhase;

use super::error::ApiError;
use super::identity::CallerIdentity;
use super::state::AppState;

/// All `Reserved`-phase reservations targeting `cluster_id`, as the
/// `ReservationDto`s they're delivered to the provider as.
pub async fn provider_instructions_for(state: &AppState, cluster_id: &str) -> Result<Vec<ReservationDto>, ApiError> {
    let all = state.reservations.list_all().await?;
    Ok(all
        .into_iter()
        .map(|v| v.value)
        .filter(|reservation| reservation.status.phase == ReservationPhase::Reserved && reservation.target_cluster_id == cluster_id)
        .map(|reservation| ReservationDto::from_domain(&reservation))
        .collect())
}

/// `GET /api/v1/instructions`: the pull path.
pub async fn list(State(state): State<Arc<AppState>>, identity: CallerIdentity) -> Result<Json<Vec<ReservationDto>>, ApiError> {
    let instructions = provider_instructions_for(&state, &identity.0).await?;
    Ok(Json(instructions))
}
