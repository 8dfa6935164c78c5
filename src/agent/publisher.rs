//! The agent's advertisement publish loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::api::{AdvertisementDto, ResourceMetricsDto};

use super::client::FederationClient;
use super::metrics::MetricsSource;
use super::records::AgentRecords;

/// Runs the publish loop until the process exits. Each tick piggybacks the
/// broker's `providerInstructions` onto the publish response and
/// materialises any new ones.
pub async fn run(
    client: FederationClient,
    metrics: Arc<dyn MetricsSource>,
    records: Arc<AgentRecords>,
    cluster_id: String,
    cluster_name: String,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        if let Err(err) = tick(&client, &*metrics, &records, &cluster_id, &cluster_name).await {
            log::warn!("advertisement publish failed: {err}");
        }
    }
}

async fn tick(
    client: &FederationClient,
    metrics: &dyn MetricsSource,
    records: &AgentRecords,
    cluster_id: &str,
    cluster_name: &str,
) -> Result<(), super::client::ClientError> {
    let advertisement = AdvertisementDto {
        cluster_id: cluster_id.to_string(),
        cluster_name: cluster_name.to_string(),
        timestamp: Utc::now(),
        resources: ResourceMetricsDto::from_domain(&metrics.current_metrics()),
        active: true,
    };

    let response = client.publish_advertisement(&advertisement).await?;

    let mut created = 0;
    for instruction in &response.provider_instructions {
        if records.materialize_provider_instruction(instruction) {
            created += 1;
        }
    }
    if created > 0 {
        log::info!("advertisement response piggybacked {created} new provider instruction(s)");
    }

    Ok(())
}
