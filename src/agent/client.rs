//! Agent-side HTTP client: one synchronous reservation call per request
//!, one publish call per advertisement cycle, one pull per
//! poll cycle, all over the same mTLS-configured `reqwest::Client`.

use reqwest::{Certificate, Client, Identity};

use crate::api::{AdvertisementDto, AdvertisementResponseDto, ReservationDto, ReservationRequestDto};
use crate::config::CertPaths;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to load client identity from '{path}': {source}")]
    Identity { path: String, source: std::io::Error },

    #[error(transparent)]
    Request(#[from] reqwest::Error),

    #[error("broker returned {status}: {body}")]
    Broker { status: reqwest::StatusCode, body: String },
}

/// Thin wrapper over `reqwest::Client` carrying the broker's base URL and
/// the agent's mTLS client identity.
pub struct FederationClient {
    http: Client,
    broker_url: String,
}

impl FederationClient {
    pub fn new(broker_url: String, certs: &CertPaths) -> Result<Self, ClientError> {
        let identity_pem = read_identity_pem(certs)?;
        let ca_pem = std::fs::read(&certs.ca).map_err(|source| ClientError::Identity { path: certs.ca.display().to_string(), source })?;

        let identity = Identity::from_pem(&identity_pem)?;
        let ca_cert = Certificate::from_pem(&ca_pem)?;

        let http = Client::builder()
            .identity(identity)
            .add_root_certificate(ca_cert)
            .use_rustls_tls()
            .build()?;

        Ok(Self { http, broker_url })
    }

    /// `POST /api/v1/advertisements`.
    pub async fn publish_advertisement(&self, advertisement: &AdvertisementDto) -> Result<AdvertisementResponseDto, ClientError> {
        let response = self.http.post(format!("{}/api/v1/advertisements", self.broker_url)).json(advertisement).send().await?;
        into_json(response).await
    }

    /// `GET /api/v1/advertisements/{clusterID}`.
    pub async fn get_advertisement(&self, cluster_id: &str) -> Result<AdvertisementDto, ClientError> {
        let response = self.http.get(format!("{}/api/v1/advertisements/{cluster_id}", self.broker_url)).send().await?;
        into_json(response).await
    }

    /// `POST /api/v1/reservations` — the single synchronous reservation
    /// call a request triggers.
    pub async fn create_reservation(&self, request: &ReservationRequestDto) -> Result<ReservationDto, ClientError> {
        let response = self.http.post(format!("{}/api/v1/reservations", self.broker_url)).json(request).send().await?;
        into_json(response).await
    }

    /// `GET /api/v1/instructions` — the poller's pull path.
    pub async fn list_instructions(&self) -> Result<Vec<ReservationDto>, ClientError> {
        let response = self.http.get(format!("{}/api/v1/instructions", self.broker_url)).send().await?;
        into_json(response).await
    }
}

async fn into_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Broker { status, body });
    }
    Ok(response.json::<T>().await?)
}

/// `reqwest::Identity::from_pem` wants the certificate and private key
/// concatenated in one PEM blob.
fn read_identity_pem(certs: &CertPaths) -> Result<Vec<u8>, ClientError> {
    let mut pem = std::fs::read(&certs.cert).map_err(|source| ClientError::Identity { path: certs.cert.display().to_string(), source })?;
    let key = std::fs::read(&certs.key).map_err(|source| ClientError::Identity { path: certs.key.display().to_string(), source })?;
    pem.extend_from_slice(b"\n");
    pem.extend_from_slice(&key);
    Ok(pem)
}
