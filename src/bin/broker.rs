use clap::Parser;

use federation_broker::config::BrokerConfig;
use federation_broker::{broker, logger};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let config = BrokerConfig::parse();
    logger::init("broker");

    log::info!("starting federation broker on {}:{}", config.interface, config.port);
    broker::serve(config).await
}
