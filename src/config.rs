//! CLI + environment configuration for both binaries.
//!
//! Both structs are `clap::Parser` derives with `env` fallbacks, the same
//! pattern the rest of this ecosystem uses for services that run under a
//! process supervisor without a wrapper script.

use std::path::PathBuf;

use clap::Parser;

/// Directory expected to contain `tls.crt`, `tls.key`, `ca.crt`.
#[derive(Debug, Clone)]
pub struct CertPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
    pub ca: PathBuf,
}

impl CertPaths {
    pub fn from_dir(dir: &PathBuf) -> Self {
        Self { cert: dir.join("tls.crt"), key: dir.join("tls.key"), ca: dir.join("ca.crt") }
    }
}

/// Broker process configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "federation-broker", about = "Compute federation reservation broker")]
pub struct BrokerConfig {
    /// Network interface the broker listens on.
    #[arg(long, env = "FEDERATION_INTERFACE", default_value = "0.0.0.0")]
    pub interface: String,

    /// Port the broker listens on.
    #[arg(long, env = "FEDERATION_PORT", default_value_t = 8443)]
    pub port: u16,

    /// Directory containing `tls.crt`/`tls.key`/`ca.crt` for mutual TLS.
    #[arg(long, env = "FEDERATION_CERT_PATH")]
    pub cert_path: PathBuf,

    /// Namespace/bucket qualifier passed through to the state store backend.
    #[arg(long, env = "FEDERATION_NAMESPACE", default_value = "federation")]
    pub namespace: String,

    /// Maximum reserved-field lock retries before giving up with
    /// `LockContended`.
    #[arg(long, env = "FEDERATION_LOCK_RETRIES", default_value_t = 5)]
    pub lock_retries: u32,

    /// Lifecycle observer reconciliation interval.
    #[arg(long, env = "FEDERATION_OBSERVER_INTERVAL", value_parser = humantime::parse_duration, default_value = "30s")]
    pub observer_interval: std::time::Duration,

    /// Plain-HTTP port serving only `/healthz`. The mTLS listener requires a
    /// verified client certificate at the handshake layer for every
    /// connection, so an unauthenticated liveness check cannot be mounted on
    /// it; this listener is the one and only unauthenticated endpoint and is
    /// always on, not optional.
    #[arg(long, env = "FEDERATION_HEALTH_PORT", default_value_t = 8080)]
    pub health_port: u16,
}

impl BrokerConfig {
    pub fn cert_paths(&self) -> CertPaths {
        CertPaths::from_dir(&self.cert_path)
    }
}

/// Agent process configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "federation-agent", about = "Per-cluster federation agent")]
pub struct AgentConfig {
    /// This cluster's identifier, advertised to the broker and used as the
    /// mTLS client certificate's subject.
    #[arg(long, env = "FEDERATION_CLUSTER_ID")]
    pub cluster_id: String,

    /// Human-readable cluster name included in advertisements.
    #[arg(long, env = "FEDERATION_CLUSTER_NAME")]
    pub cluster_name: String,

    /// Broker base URL, e.g. `https://broker.federation.example:8443`.
    #[arg(long, env = "FEDERATION_BROKER_URL")]
    pub broker_url: String,

    /// Directory containing `tls.crt`/`tls.key`/`ca.crt` for mutual TLS.
    #[arg(long, env = "FEDERATION_CERT_PATH")]
    pub cert_path: PathBuf,

    /// Cadence at which this agent republishes its advertisement.
    #[arg(long, env = "FEDERATION_ADVERTISEMENT_INTERVAL", value_parser = humantime::parse_duration, default_value = "10s")]
    pub advertisement_interval: std::time::Duration,

    /// Cadence at which this agent polls for provider instructions.
    #[arg(long, env = "FEDERATION_INSTRUCTION_POLL_INTERVAL", value_parser = humantime::parse_duration, default_value = "5s")]
    pub instruction_poll_interval: std::time::Duration,

    /// Path to a JSON `ResourceMetricsDto` snapshot this agent advertises.
    /// Node/pod metrics collection is out of this core's scope; this flag is
    /// the stand-in a real deployment replaces with its own `MetricsSource`
    /// (`agent::metrics`).
    #[arg(long, env = "FEDERATION_METRICS_FILE")]
    pub metrics_file: Option<PathBuf>,
}

impl AgentConfig {
    pub fn cert_paths(&self) -> CertPaths {
        CertPaths::from_dir(&self.cert_path)
    }
}
