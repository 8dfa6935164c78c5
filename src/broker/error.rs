//! Maps every error the broker's handlers can produce onto an HTTP status
//! code, in exactly one place.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

use crate::decision::DecisionError;
use crate::domain::quantity::QuantityError;
use crate::domain::reservation::SelfTargetingError;
use crate::locking::LockingError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    InvalidQuantity(#[from] QuantityError),

    #[error("requested CPU and memory must both be strictly positive")]
    NonPositiveRequest,

    #[error("no authenticated caller identity")]
    Unauthenticated,

    #[error("claimed identity does not match the authenticated connection")]
    IdentityMismatch,

    #[error("advertisement not found for cluster '{0}'")]
    AdvertisementNotFound(String),

    #[error("reservation '{0}' vanished mid-dispatch")]
    ReservationVanished(String),

    #[error(transparent)]
    NoSuitableCluster(#[from] DecisionError),

    #[error(transparent)]
    Locking(#[from] LockingError),

    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    #[error(transparent)]
    SelfTargeting(#[from] SelfTargetingError),

    #[error("state store unavailable: {0}")]
    Store(#[from] StoreError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::MissingField(_) | ApiError::InvalidQuantity(_) | ApiError::NonPositiveRequest | ApiError::InvalidDuration(_) | ApiError::SelfTargeting(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::IdentityMismatch => StatusCode::FORBIDDEN,
            ApiError::AdvertisementNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ReservationVanished(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NoSuitableCluster(_) => StatusCode::CONFLICT,
            ApiError::Locking(LockingError::InsufficientResources) | ApiError::Locking(LockingError::LockContended) => StatusCode::CONFLICT,
            ApiError::Locking(LockingError::Store(_)) | ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}
