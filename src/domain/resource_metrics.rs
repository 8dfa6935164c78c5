//! Per-cluster resource snapshot, as advertised by an agent or stored by the
//! broker.

use serde::{Deserialize, Serialize};

use crate::domain::quantity::ResourceQuantities;

/// A cluster's capacity/allocation snapshot.
///
/// Invariant: for every component present in
/// `allocatable`, `available == allocatable - allocated - (reserved or
/// zero)`. [`ResourceMetrics::recompute_available`] is the single place that
/// invariant is re-established after `allocatable`/`allocated`/`reserved`
/// change; nothing else should construct `available` by hand.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceMetrics {
    pub capacity: ResourceQuantities,
    pub allocatable: ResourceQuantities,
    pub allocated: ResourceQuantities,
    pub available: ResourceQuantities,
    /// Broker-owned. `None` means "no reservations outstanding", equivalent
    /// to all-zero for arithmetic purposes.
    pub reserved: Option<ResourceQuantities>,
}

impl ResourceMetrics {
    pub fn new(capacity: ResourceQuantities, allocatable: ResourceQuantities, allocated: ResourceQuantities) -> Self {
        let mut metrics = Self { capacity, allocatable, allocated, available: ResourceQuantities::default(), reserved: None };
        metrics.recompute_available();
        metrics
    }

    pub fn reserved_or_zero(&self) -> ResourceQuantities {
        self.reserved.unwrap_or_default()
    }

    /// Re-derives `available` from `allocatable`, `allocated`, and
    /// `reserved`. Call this any time one of those three changes.
    pub fn recompute_available(&mut self) {
        let reserved = self.reserved_or_zero();
        self.available = self.allocatable.saturating_sub(&self.allocated).saturating_sub(&reserved);
    }

    /// Overlays the agent-owned fields (`capacity`, `allocatable`,
    /// `allocated`) from a freshly published advertisement onto `self`,
    /// preserving `self.reserved` untouched. `available` is then recomputed against the *preserved*
    /// `reserved`, never the incoming one.
    pub fn overlay_agent_owned_fields(&mut self, incoming: &ResourceMetrics) {
        self.capacity = incoming.capacity;
        self.allocatable = incoming.allocatable;
        self.allocated = incoming.allocated;
        self.recompute_available();
    }
}
