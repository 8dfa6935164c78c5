//! The `CallerIdentity` extractor: every handler that acts
//! on behalf of a cluster pulls the caller's identity from here, never from
//! the request body, so a cluster cannot spoof another cluster's identity
//! by simply putting a different `clusterID` in its payload.

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;

use super::error::ApiError;
use super::tls::PeerIdentity;

/// The authenticated caller's cluster id, bound once per connection by the
/// mTLS accept layer (`broker::tls`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity(pub String);

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ConnectInfo(peer) = ConnectInfo::<PeerIdentity>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Unauthenticated)?;

        if peer.0.trim().is_empty() {
            return Err(ApiError::Unauthenticated);
        }

        Ok(CallerIdentity(peer.0))
    }
}

impl CallerIdentity {
    /// Rejects when the identity named in a request body doesn't match the
    /// authenticated connection.
    pub fn require_match(&self, claimed: &str) -> Result<(), ApiError> {
        if claimed.trim().is_empty() || claimed != self.0 {
            return Err(ApiError::IdentityMismatch);
        }
        Ok(())
    }
}
