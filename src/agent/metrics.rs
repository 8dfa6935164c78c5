//! The contract this core consumes from the per-cluster metrics collector.

use crate::domain::ResourceMetrics;

/// Supplies the agent with its cluster's current capacity/allocation
/// snapshot on demand. A real deployment implements this against whatever
/// node/pod metrics source the cluster runs (e.g. a scheduler's allocatable
/// API); this crate ships only the trait and a fixed-snapshot stand-in for
/// tests and local runs.
pub trait MetricsSource: Send + Sync {
    fn current_metrics(&self) -> ResourceMetrics;
}

/// Returns the same snapshot every call. Useful for tests and for running
/// the agent against a cluster whose capacity genuinely doesn't change.
pub struct StaticMetricsSource(pub ResourceMetrics);

impl MetricsSource for StaticMetricsSource {
    fn current_metrics(&self) -> ResourceMetrics {
        self.0.clone()
    }
}

/// Reads a `ResourceMetricsDto` JSON file into a [`StaticMetricsSource`]
/// (`config::AgentConfig::metrics_file`).
pub fn load_static_source(path: &std::path::Path) -> anyhow::Result<StaticMetricsSource> {
    let raw = std::fs::read_to_string(path)?;
    let dto: crate::api::ResourceMetricsDto = serde_json::from_str(&raw)?;
    Ok(StaticMetricsSource(dto.to_domain()?))
}
