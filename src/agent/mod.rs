//! The per-cluster agent: advertisement publishing, the synchronous
//! reservation flow, and instruction polling.

pub mod client;
pub mod metrics;
pub mod poller;
pub mod publisher;
pub mod records;
pub mod request;

use std::sync::Arc;

use crate::config::AgentConfig;

use client::FederationClient;
use metrics::MetricsSource;
use records::AgentRecords;

/// Wires up and runs the agent's two background loops (advertisement
/// publish, instruction poll) against `metrics` until the process exits.
/// The synchronous reservation flow (`request::submit`) is triggered
/// out-of-band, by whatever creates `ResourceRequest` records (a CLI, an
/// API the binary exposes, a controller loop) — it is not itself a
/// background loop.
pub async fn run(config: AgentConfig, metrics: Arc<dyn MetricsSource>) -> anyhow::Result<()> {
    let client = FederationClient::new(config.broker_url.clone(), &config.cert_paths())?;
    let records = Arc::new(AgentRecords::new());

    let publish_handle = tokio::spawn(publisher::run(
        FederationClient::new(config.broker_url.clone(), &config.cert_paths())?,
        metrics,
        records.clone(),
        config.cluster_id.clone(),
        config.cluster_name.clone(),
        config.advertisement_interval,
    ));

    let poll_handle = tokio::spawn(poller::run(client, records, config.instruction_poll_interval));

    tokio::select! {
        result = publish_handle => result.map_err(anyhow::Error::from)?,
        result = poll_handle => result.map_err(anyhow::Error::from)?,
    }

    Ok(())
}
