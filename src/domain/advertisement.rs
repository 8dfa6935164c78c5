//! A per-cluster advertisement record, as stored by the broker.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::resource_metrics::ResourceMetrics;

/// Canonical store key for a cluster's advertisement: `<clusterID>-adv`.
pub fn advertisement_name(cluster_id: &str) -> String {
    format!("{}-adv", cluster_id)
}

/// A cluster's published resources plus broker bookkeeping.
///
/// Ownership split: `cluster_id`, `cluster_name`,
/// `last_updated`, and the agent-owned fields of `resources` are replaced on
/// every publish; `resources.reserved` is mutated only by the broker's
/// locking step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterAdvertisement {
    pub cluster_id: String,
    pub cluster_name: String,
    pub last_updated: DateTime<Utc>,
    pub resources: ResourceMetrics,
    pub active: bool,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl ClusterAdvertisement {
    pub fn new(cluster_id: impl Into<String>, cluster_name: impl Into<String>, resources: ResourceMetrics) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            cluster_name: cluster_name.into(),
            last_updated: Utc::now(),
            resources,
            active: true,
            labels: BTreeMap::new(),
        }
    }

    pub fn store_name(&self) -> String {
        advertisement_name(&self.cluster_id)
    }
}
