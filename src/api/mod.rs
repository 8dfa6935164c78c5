//! Wire DTOs for the broker's HTTP surface.
//!
//! DTOs are kept separate from the `domain` types they're converted to/from:
//! the wire contract is versioned and field-renamed independently of how the
//! broker chooses to represent things internally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::quantity::{format_quantity, parse_quantity, QuantityError, ResourceQuantities};
use crate::domain::{ClusterAdvertisement, Reservation, ReservationPhase, ResourceMetrics};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceQuantitiesDto {
    pub cpu: String,
    pub memory: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,
}

impl ResourceQuantitiesDto {
    pub fn to_domain(&self) -> Result<ResourceQuantities, QuantityError> {
        Ok(ResourceQuantities {
            cpu: parse_quantity(&self.cpu)?,
            memory: parse_quantity(&self.memory)?,
            gpu: self.gpu.as_deref().map(parse_quantity).transpose()?,
            storage: self.storage.as_deref().map(parse_quantity).transpose()?,
        })
    }

    pub fn from_domain(q: &ResourceQuantities) -> Self {
        Self {
            cpu: format_quantity(q.cpu),
            memory: format_quantity(q.memory),
            gpu: q.gpu.map(format_quantity),
            storage: q.storage.map(format_quantity),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceMetricsDto {
    pub capacity: ResourceQuantitiesDto,
    pub allocatable: ResourceQuantitiesDto,
    pub allocated: ResourceQuantitiesDto,
    pub available: ResourceQuantitiesDto,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserved: Option<ResourceQuantitiesDto>,
}

impl ResourceMetricsDto {
    pub fn to_domain(&self) -> Result<ResourceMetrics, QuantityError> {
        let mut metrics = ResourceMetrics::new(self.capacity.to_domain()?, self.allocatable.to_domain()?, self.allocated.to_domain()?);
        // `available` is always re-derived; the
        // incoming value, if present, is informational only.
        metrics.recompute_available();
        Ok(metrics)
    }

    pub fn from_domain(metrics: &ResourceMetrics) -> Self {
        Self {
            capacity: ResourceQuantitiesDto::from_domain(&metrics.capacity),
            allocatable: ResourceQuantitiesDto::from_domain(&metrics.allocatable),
            allocated: ResourceQuantitiesDto::from_domain(&metrics.allocated),
            available: ResourceQuantitiesDto::from_domain(&metrics.available),
            reserved: metrics.reserved.as_ref().map(ResourceQuantitiesDto::from_domain),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvertisementDto {
    #[serde(rename = "clusterID")]
    pub cluster_id: String,
    pub cluster_name: String,
    pub timestamp: DateTime<Utc>,
    pub resources: ResourceMetricsDto,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

impl AdvertisementDto {
    pub fn from_domain(advertisement: &ClusterAdvertisement) -> Self {
        Self {
            cluster_id: advertisement.cluster_id.clone(),
            cluster_name: advertisement.cluster_name.clone(),
            timestamp: advertisement.last_updated,
            resources: ResourceMetricsDto::from_domain(&advertisement.resources),
            active: advertisement.active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvertisementResponseDto {
    pub advertisement: AdvertisementDto,
    pub provider_instructions: Vec<ReservationDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRequestDto {
    pub requested_resources: ResourceQuantitiesDto,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    /// Human-readable span, e.g. `"1h"`, `"30m"`, parsed with
    /// `humantime`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ReservationPhaseDto {
    Pending,
    Reserved,
    Active,
    Released,
    Failed,
}

impl From<ReservationPhase> for ReservationPhaseDto {
    fn from(phase: ReservationPhase) -> Self {
        match phase {
            ReservationPhase::Pending => Self::Pending,
            ReservationPhase::Reserved => Self::Reserved,
            ReservationPhase::Active => Self::Active,
            ReservationPhase::Released => Self::Released,
            ReservationPhase::Failed => Self::Failed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationStatusDto {
    pub phase: ReservationPhaseDto,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationDto {
    pub id: String,
    #[serde(rename = "requesterID")]
    pub requester_id: String,
    #[serde(rename = "targetClusterID")]
    pub target_cluster_id: String,
    pub requested_resources: ResourceQuantitiesDto,
    pub status: ReservationStatusDto,
    pub created_at: DateTime<Utc>,
}

impl ReservationDto {
    pub fn from_domain(reservation: &Reservation) -> Self {
        Self {
            id: reservation.id.clone(),
            requester_id: reservation.requester_id.clone(),
            target_cluster_id: reservation.target_cluster_id.clone(),
            requested_resources: ResourceQuantitiesDto::from_domain(&reservation.requested_resources),
            status: ReservationStatusDto {
                phase: reservation.status.phase.into(),
                message: reservation.status.message.clone(),
                reserved_at: reservation.status.reserved_at,
                expires_at: reservation.status.expires_at,
            },
            created_at: reservation.created_at,
        }
    }
}
