//! Mutual-TLS listener setup: loads the broker's server identity and the
//! federation CA bundle, and extracts the connecting agent's identity from
//! its client certificate's subject common name.

use std::fs::File;
use std::io::BufReader;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::connect_info::Connected;
use axum_server::tls_rustls::RustlsConfig;
use rustls::server::WebPkiClientVerifier;
use rustls::RootCertStore;
use tokio::net::TcpStream;
use tokio_rustls::server::TlsStream;

use crate::config::CertPaths;

#[derive(Debug, thiserror::Error)]
pub enum TlsConfigError {
    #[error("failed to read '{path}': {source}")]
    Read { path: String, source: std::io::Error },

    #[error("'{path}' contains no usable certificate/key material")]
    Empty { path: String },

    #[error(transparent)]
    Rustls(#[from] rustls::Error),
}

/// Builds the server-side `rustls::ServerConfig` that requires and verifies
/// a client certificate against `certs.ca`, for the mutual-TLS transport
/// requirement.
pub fn load_server_config(certs: &CertPaths) -> Result<RustlsConfig, TlsConfigError> {
    let server_chain = read_cert_chain(&certs.cert)?;
    let server_key = read_private_key(&certs.key)?;
    let ca_store = read_root_store(&certs.ca)?;

    let client_verifier = WebPkiClientVerifier::builder(Arc::new(ca_store))
        .build()
        .map_err(|err| rustls::Error::General(err.to_string()))?;

    let mut config = rustls::ServerConfig::builder()
        .with_client_cert_verifier(client_verifier)
        .with_single_cert(server_chain, server_key)?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(RustlsConfig::from_config(Arc::new(config)))
}

fn read_cert_chain(path: &std::path::Path) -> Result<Vec<rustls::pki_types::CertificateDer<'static>>, TlsConfigError> {
    let file = File::open(path).map_err(|source| TlsConfigError::Read { path: path.display().to_string(), source })?;
    let certs: Vec<_> = rustls_pemfile::certs(&mut BufReader::new(file)).filter_map(Result::ok).collect();
    if certs.is_empty() {
        return Err(TlsConfigError::Empty { path: path.display().to_string() });
    }
    Ok(certs)
}

fn read_private_key(path: &std::path::Path) -> Result<rustls::pki_types::PrivateKeyDer<'static>, TlsConfigError> {
    let file = File::open(path).map_err(|source| TlsConfigError::Read { path: path.display().to_string(), source })?;
    rustls_pemfile::private_key(&mut BufReader::new(file))
        .map_err(|source| TlsConfigError::Read { path: path.display().to_string(), source })?
        .ok_or_else(|| TlsConfigError::Empty { path: path.display().to_string() })
}

fn read_root_store(path: &std::path::Path) -> Result<RootCertStore, TlsConfigError> {
    let mut store = RootCertStore::empty();
    for cert in read_cert_chain(path)? {
        store.add(cert)?;
    }
    Ok(store)
}

/// The authenticated peer's identity, extracted from the client
/// certificate's subject common name. Axum populates
/// this per-connection via [`Connected`] when the router is served with
/// [`axum::extract::connect_info::IntoMakeServiceWithConnectInfo`].
#[derive(Debug, Clone, Default)]
pub struct PeerIdentity(pub String);

impl Connected<&TlsStream<TcpStream>> for PeerIdentity {
    fn connect_info(stream: &TlsStream<TcpStream>) -> Self {
        let (_, session) = stream.get_ref();
        let identity = session
            .peer_certificates()
            .and_then(|chain| chain.first())
            .and_then(|cert| subject_common_name(cert.as_ref()))
            .unwrap_or_default();
        PeerIdentity(identity)
    }
}

/// The liveness-only plain HTTP listener has
/// no TLS session to pull an identity from; it never calls into an
/// identity-bound handler, but axum still needs *some*
/// `Connected<IncomingStream>` when serving with connect-info.
impl Connected<SocketAddr> for PeerIdentity {
    fn connect_info(_stream: SocketAddr) -> Self {
        PeerIdentity::default()
    }
}

fn subject_common_name(der: &[u8]) -> Option<String> {
    let (_, cert) = x509_parser::parse_x509_certificate(der).ok()?;
    cert.subject().iter_common_name().next()?.as_str().ok().map(|s| s.to_string())
}
