//! The broker binary's HTTP surface: mTLS-authenticated advertisement
//! intake, reservation dispatch, and instruction fanout, served on a
//! listener that requires a verified client certificate for every
//! connection. The unauthenticated liveness endpoint cannot live on that
//! listener, so it is served separately, on its own plain-HTTP port.

pub mod advertisements;
pub mod error;
pub mod identity;
pub mod instructions;
pub mod lifecycle;
pub mod reservations;
pub mod state;
pub mod tls;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::BrokerConfig;
use state::AppState;

/// Builds the mTLS-only router. Every route here runs behind a listener
/// whose rustls config refuses the handshake itself for any connection that
/// doesn't present a verified client certificate, so there is no in-code
/// exemption to get wrong.
pub fn api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/advertisements", post(advertisements::publish))
        .route("/api/v1/advertisements/:clusterID", get(advertisements::get))
        .route("/api/v1/reservations", post(reservations::create))
        .route("/api/v1/instructions", get(instructions::list))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

/// Runs the broker: mTLS listener on `config.port`, the always-on plain
/// liveness listener on `config.health_port`, and the background lifecycle
/// observer, until the process is killed.
pub async fn serve(config: BrokerConfig) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(config.lock_retries));

    let observer_state = state.clone();
    let observer_interval = config.observer_interval;
    tokio::spawn(async move {
        lifecycle::run(observer_state, observer_interval).await;
    });

    let health_app = Router::new().route("/healthz", get(healthz));
    let health_addr = SocketAddr::new(config.interface.parse()?, config.health_port);
    log::info!("liveness listener bound on {health_addr}");
    let health_listener = tokio::net::TcpListener::bind(health_addr).await?;
    tokio::spawn(async move {
        if let Err(err) = axum::serve(health_listener, health_app.into_make_service()).await {
            log::error!("liveness listener failed: {err}");
        }
    });

    let rustls_config = tls::load_server_config(&config.cert_paths())?;
    let addr = SocketAddr::new(config.interface.parse()?, config.port);
    log::info!("mTLS listener bound on {addr}");

    let app = api_router(state);
    axum_server::bind_rustls(addr, rustls_config)
        .serve(app.into_make_service_with_connect_info::<tls::PeerIdentity>())
        .await?;

    Ok(())
}
