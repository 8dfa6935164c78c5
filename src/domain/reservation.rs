//! The broker-managed reservation record and its lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::quantity::ResourceQuantities;

/// Reservation lifecycle phase.
///
/// ```text
/// Pending --(lock succeeds)--> Reserved --(peering ready)--> Active
///    \--(lock/persist fails)--> Failed
/// Reserved | Active --(release, expiry, or delete)--> Released
/// ```
/// `Released` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ReservationPhase {
    Pending,
    Reserved,
    Active,
    Released,
    Failed,
}

impl ReservationPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, ReservationPhase::Released | ReservationPhase::Failed)
    }

    /// Phases for which the target cluster's `reserved` must include this
    /// reservation's resources.
    pub fn holds_reservation(self) -> bool {
        matches!(self, ReservationPhase::Reserved | ReservationPhase::Active)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationStatus {
    pub phase: ReservationPhase,
    pub message: String,
    pub reserved_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl ReservationStatus {
    pub fn pending() -> Self {
        Self { phase: ReservationPhase::Pending, message: String::new(), reserved_at: None, expires_at: None }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { phase: ReservationPhase::Failed, message: message.into(), reserved_at: None, expires_at: None }
    }
}

/// A broker-managed claim on a provider cluster's resources.
///
/// The `pinned` field is the finalizer-equivalent sentinel described in
/// DESIGN.md: while `true`, the lifecycle observer refuses to let the
/// record disappear, because doing so while the target's `reserved`
/// still reflects it would silently leak capacity. The release flow is
/// required to clear it before the record can be deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub requester_id: String,
    pub target_cluster_id: String,
    pub requested_resources: ResourceQuantities,
    #[serde(default)]
    pub priority: i32,
    pub duration: Option<chrono::Duration>,
    pub created_at: DateTime<Utc>,
    pub status: ReservationStatus,
    #[serde(default)]
    pub pinned: bool,
}

impl Reservation {
    /// A reservation never chooses its own requester as target. Checked at
    /// construction so it can never be represented, not just validated once
    /// at the handler boundary.
    pub fn new(
        id: String,
        requester_id: String,
        target_cluster_id: String,
        requested_resources: ResourceQuantities,
        priority: i32,
        duration: Option<chrono::Duration>,
    ) -> Result<Self, SelfTargetingError> {
        if requester_id == target_cluster_id {
            return Err(SelfTargetingError { requester_id });
        }
        Ok(Self {
            id,
            requester_id,
            target_cluster_id,
            requested_resources,
            priority,
            duration,
            created_at: Utc::now(),
            status: ReservationStatus::pending(),
            pinned: false,
        })
    }

    /// Builds a record for the case the decision engine itself fails: there
    /// is no target to pin against yet, so `target_cluster_id` is left empty
    /// and the
    /// caller is expected to call [`Reservation::mark_failed`] immediately.
    /// This bypasses the self-targeting check in [`Reservation::new`]
    /// because an empty target can never equal a real requester id.
    pub fn new_unrouted(id: String, requester_id: String, requested_resources: ResourceQuantities, priority: i32, duration: Option<chrono::Duration>) -> Self {
        Self {
            id,
            requester_id,
            target_cluster_id: String::new(),
            requested_resources,
            priority,
            duration,
            created_at: Utc::now(),
            status: ReservationStatus::pending(),
            pinned: false,
        }
    }

    pub fn mark_reserved(&mut self) {
        let now = Utc::now();
        self.status.phase = ReservationPhase::Reserved;
        self.status.message.clear();
        self.status.reserved_at = Some(now);
        self.status.expires_at = self.duration.map(|d| now + d);
        self.pinned = true;
    }

    pub fn mark_failed(&mut self, message: impl Into<String>) {
        self.status = ReservationStatus::failed(message);
        self.pinned = false;
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status.expires_at.map(|expiry| now >= expiry).unwrap_or(false)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("reservation requester '{requester_id}' cannot target itself")]
pub struct SelfTargetingError {
    pub requester_id: String,
}
