//! The user-created `ResourceRequest` and the synchronous flow it triggers
//! on a requester agent.

use serde::{Deserialize, Serialize};

use crate::api::{ReservationRequestDto, ResourceQuantitiesDto};
use crate::domain::quantity::ResourceQuantities;

use super::client::FederationClient;
use super::records::AgentRecords;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum RequestPhase {
    Pending,
    Reserved,
    Failed,
}

/// A user-created request for compute on another cluster. Exists purely on
/// the requester agent; the broker never sees this type, only the
/// `ReservationRequestDto` derived from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRequest {
    pub id: String,
    pub requested_resources: ResourceQuantities,
    pub priority: Option<i32>,
    pub duration: Option<String>,
    pub phase: RequestPhase,
    pub message: String,
    pub target_cluster_id: Option<String>,
    pub reservation_id: Option<String>,
}

impl ResourceRequest {
    pub fn new(id: impl Into<String>, requested_resources: ResourceQuantities, priority: Option<i32>, duration: Option<String>) -> Self {
        Self {
            id: id.into(),
            requested_resources,
            priority,
            duration,
            phase: RequestPhase::Pending,
            message: String::new(),
            target_cluster_id: None,
            reservation_id: None,
        }
    }
}

/// Executes the synchronous reservation flow for a single request: exactly
/// one HTTP call, no automatic retry on failure.
pub async fn submit(request: &mut ResourceRequest, client: &FederationClient, records: &AgentRecords) {
    request.phase = RequestPhase::Pending; // step 1

    let dto = ReservationRequestDto {
        requested_resources: ResourceQuantitiesDto::from_domain(&request.requested_resources),
        priority: request.priority,
        duration: request.duration.clone(),
    };

    match client.create_reservation(&dto).await {
        // step 2
        Ok(reservation) => {
            // step 3: materialise the local instruction and advance phase.
            records.materialize_reservation_instruction(&reservation);
            request.reservation_id = Some(reservation.id);
            request.target_cluster_id = Some(reservation.target_cluster_id);
            request.phase = RequestPhase::Reserved;
            request.message.clear();
        }
        Err(err) => {
            // step 4: no automatic retry; an operator may create a new
            // request (idempotency is not guaranteed for resubmission).
            request.phase = RequestPhase::Failed;
            request.message = err.to_string();
        }
    }
}
