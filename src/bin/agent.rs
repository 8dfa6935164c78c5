use std::sync::Arc;

use clap::Parser;

use federation_broker::agent::metrics::{load_static_source, MetricsSource, StaticMetricsSource};
use federation_broker::config::AgentConfig;
use federation_broker::domain::ResourceMetrics;
use federation_broker::{agent, logger};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let config = AgentConfig::parse();
    logger::init("agent");

    let metrics: Arc<dyn MetricsSource> = match &config.metrics_file {
        Some(path) => Arc::new(load_static_source(path)?),
        None => Arc::new(StaticMetricsSource(ResourceMetrics::default())),
    };

    log::info!("starting federation agent for cluster '{}' against broker '{}'", config.cluster_id, config.broker_url);
    agent::run(config, metrics).await
}
