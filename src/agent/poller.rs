//! The provider-side instruction poller: a periodic pull
//! that materialises one local record per instruction, independent of the
//! piggyback path.

use std::time::Duration;

use super::client::FederationClient;
use super::records::AgentRecords;

/// Runs the poll loop until the process exits, at `interval` cadence
/// (default 5s). Errors are logged and the loop continues on the next
/// tick — there is no backoff escalation because the cadence is already
/// bounded.
pub async fn run(client: FederationClient, records: std::sync::Arc<AgentRecords>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        if let Err(err) = tick(&client, &records).await {
            log::warn!("instruction poll failed: {err}");
        }
    }
}

async fn tick(client: &FederationClient, records: &AgentRecords) -> Result<(), super::client::ClientError> {
    let instructions = client.list_instructions().await?;
    let mut created = 0;
    for dto in &instructions {
        if records.materialize_provider_instruction(dto) {
            created += 1;
        }
    }
    if created > 0 {
        log::info!("poller materialised {created} new provider instruction(s)");
    }
    Ok(())
}
