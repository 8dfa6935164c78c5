use thiserror::Error;

/// Errors the state store abstraction can surface.
///
/// `VersionConflict` is kept distinct from `NotFound` and `Backend` because
/// the locking retry loop (`locking.rs`) needs to tell "someone else wrote
/// first, retry" apart from "this record doesn't exist" and "the store is
/// unavailable, don't retry in a tight loop".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("record '{0}' not found")]
    NotFound(String),

    #[error("write to '{name}' rejected: version token is stale")]
    VersionConflict { name: String },

    #[error("record '{0}' already exists")]
    AlreadyExists(String),

    #[error("state store backend failure: {0}")]
    Backend(String),
}
