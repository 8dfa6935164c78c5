//! Advertisement intake: `POST /api/v1/advertisements` and
//! `GET /api/v1/advertisements/{clusterID}`.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use crate::api::{AdvertisementDto, AdvertisementResponseDto};
use crate::domain::advertisement::advertisement_name;
use crate::domain::ClusterAdvertisement;
use crate::store::StoreError;

use super::error::ApiError;
use super::identity::CallerIdentity;
use super::instructions::provider_instructions_for;
use super::state::AppState;

/// `POST /api/v1/advertisements`.
pub async fn publish(
    State(state): State<Arc<AppState>>,
    identity: CallerIdentity,
    Json(payload): Json<AdvertisementDto>,
) -> Result<Json<AdvertisementResponseDto>, ApiError> {
    identity.require_match(&payload.cluster_id)?;

    let incoming_resources = payload.resources.to_domain()?;
    let name = advertisement_name(&payload.cluster_id);

    let stored = match state.advertisements.fetch_by_name(&name).await? {
        None => {
            let advertisement = ClusterAdvertisement {
                cluster_id: payload.cluster_id.clone(),
                cluster_name: payload.cluster_name.clone(),
                last_updated: payload.timestamp,
                resources: incoming_resources,
                active: payload.active,
                labels: Default::default(),
            };
            // A concurrent first-time create can race another create with
            // no version token to conflict on. Treat that as retryable by
            // refetching instead of failing the publish outright.
            match state.advertisements.create_if_absent(&name, advertisement.clone()).await {
                Ok(versioned) => versioned.value,
                Err(StoreError::AlreadyExists(_)) => {
                    overlay_and_store(&state, &name, &payload, incoming_resources).await?
                }
                Err(other) => return Err(other.into()),
            }
        }
        Some(_) => overlay_and_store(&state, &name, &payload, incoming_resources).await?,
    };

    let provider_instructions = provider_instructions_for(&state, &payload.cluster_id).await?;

    Ok(Json(AdvertisementResponseDto {
        advertisement: AdvertisementDto::from_domain(&stored),
        provider_instructions,
    }))
}

/// Overlays agent-owned fields onto the existing record while preserving
/// the broker-owned `reserved` field, then writes with the held version,
/// retrying on conflict.
async fn overlay_and_store(
    state: &AppState,
    name: &str,
    payload: &AdvertisementDto,
    incoming_resources: crate::domain::ResourceMetrics,
) -> Result<ClusterAdvertisement, ApiError> {
    let mut attempt = 0;
    loop {
        let versioned = state
            .advertisements
            .fetch_by_name(name)
            .await?
            .ok_or_else(|| ApiError::AdvertisementNotFound(payload.cluster_id.clone()))?;

        let mut candidate = versioned.value.clone();
        candidate.cluster_name = payload.cluster_name.clone();
        candidate.last_updated = payload.timestamp;
        candidate.active = payload.active;
        candidate.resources.overlay_agent_owned_fields(&incoming_resources);

        match state.advertisements.update_with_version(name, &versioned.version, candidate.clone()).await {
            Ok(updated) => return Ok(updated.value),
            Err(StoreError::VersionConflict { .. }) => {
                attempt += 1;
                if attempt >= 5 {
                    return Err(StoreError::VersionConflict { name: name.to_string() }.into());
                }
                continue;
            }
            Err(other) => return Err(other.into()),
        }
    }
}

/// `GET /api/v1/advertisements/{clusterID}`.
pub async fn get(
    State(state): State<Arc<AppState>>,
    _identity: CallerIdentity,
    Path(cluster_id): Path<String>,
) -> Result<Json<AdvertisementDto>, ApiError> {
    let name = advertisement_name(&cluster_id);
    let versioned = state.advertisements.fetch_by_name(&name).await?.ok_or(ApiError::AdvertisementNotFound(cluster_id))?;
    Ok(Json(AdvertisementDto::from_domain(&versioned.value)))
}

/// Also used by the reservation dispatcher to build the `no-fit`-independent
/// decision-engine snapshot.
pub async fn list_active(state: &AppState) -> Result<Vec<ClusterAdvertisement>, ApiError> {
    let all = state.advertisements.list_all().await?;
    Ok(all.into_iter().map(|v| v.value).collect())
}
