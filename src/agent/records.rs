//! Local, cluster-side materialised records.
//!
//! Guards two `HashMap<String, _>`s behind one `RwLock` each, the same
//! "one lock around one inner struct" shape `store::memory::MemoryStore`
//! already uses — these are in-process, per-agent records, not something a
//! real deployment would swap out the way it would the broker's store.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::api::ReservationDto;
use crate::domain::quantity::ResourceQuantities;

/// The requester-side materialised view of a reservation this cluster made.
#[derive(Debug, Clone)]
pub struct ReservationInstructionRecord {
    pub reservation_id: String,
    pub target_cluster_id: String,
    pub resources: ResourceQuantities,
    pub expires_at: Option<DateTime<Utc>>,
}

/// The provider-side materialised view of a reservation this cluster is
/// hosting.
#[derive(Debug, Clone)]
pub struct ProviderInstructionRecord {
    pub reservation_id: String,
    pub requester_id: String,
    pub resources: ResourceQuantities,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
pub struct AgentRecords {
    requester_side: RwLock<HashMap<String, ReservationInstructionRecord>>,
    provider_side: RwLock<HashMap<String, ProviderInstructionRecord>>,
}

impl AgentRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the requester-side record, keyed by reservation id.
    pub fn materialize_reservation_instruction(&self, dto: &ReservationDto) {
        let record = ReservationInstructionRecord {
            reservation_id: dto.id.clone(),
            target_cluster_id: dto.target_cluster_id.clone(),
            resources: dto.requested_resources.to_domain().unwrap_or_default(),
            expires_at: dto.status.expires_at,
        };
        self.requester_side.write().expect("lock poisoned").insert(dto.id.clone(), record);
    }

    /// Creates the provider-side record only if absent, so delivering the
    /// same instruction via piggyback and poll produces exactly one local
    /// record.
    ///
    /// Returns `true` if this call actually created a new record.
    pub fn materialize_provider_instruction(&self, dto: &ReservationDto) -> bool {
        let mut guard = self.provider_side.write().expect("lock poisoned");
        if guard.contains_key(&dto.id) {
            return false;
        }
        guard.insert(
            dto.id.clone(),
            ProviderInstructionRecord {
                reservation_id: dto.id.clone(),
                requester_id: dto.requester_id.clone(),
                resources: dto.requested_resources.to_domain().unwrap_or_default(),
                expires_at: dto.status.expires_at,
            },
        );
        true
    }

    pub fn requester_side_count(&self) -> usize {
        self.requester_side.read().expect("lock poisoned").len()
    }

    pub fn provider_side_count(&self) -> usize {
        self.provider_side.read().expect("lock poisoned").len()
    }

    pub fn provider_record(&self, reservation_id: &str) -> Option<ProviderInstructionRecord> {
        self.provider_side.read().expect("lock poisoned").get(reservation_id).cloned()
    }

    pub fn reservation_instruction(&self, reservation_id: &str) -> Option<ReservationInstructionRecord> {
        self.requester_side.read().expect("lock poisoned").get(reservation_id).cloned()
    }
}
