//! Reserved-field locking: increments a chosen provider's `Reserved` under
//! compare-and-swap, with bounded retry.

use std::time::Duration;

use thiserror::Error;

use crate::domain::{ClusterAdvertisement, ResourceQuantities};
use crate::store::{StateStore, StoreError, Version};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LockingError {
    #[error("fit was lost on refetch: requested resources no longer available")]
    InsufficientResources,

    #[error("lock contended: retries exhausted")]
    LockContended,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Bounded read-modify-write retry against `store` for the advertisement
/// named `name`: adds `requested` to its `reserved` field, recomputes
/// `available`, and writes back with a fresh version token.
///
/// On a version conflict, refetches, re-verifies fit, and retries — up to
/// `max_retries` times, with a small linear backoff between attempts.
/// If fit is lost on refetch, aborts with `InsufficientResources`; if
/// retries are exhausted, aborts with `LockContended`.
pub async fn reserve_on<S>(store: &S, name: &str, requested: &ResourceQuantities, max_retries: u32) -> Result<ClusterAdvertisement, LockingError>
where
    S: StateStore<ClusterAdvertisement>,
{
    let mut attempt = 0;
    loop {
        let versioned = store.fetch_by_name(name).await?.ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        let mut candidate = versioned.value.clone();

        if !candidate.resources.available.fits(requested) {
            return Err(LockingError::InsufficientResources);
        }

        apply_reservation(&mut candidate, requested);

        match store.update_with_version(name, &versioned.version, candidate.clone()).await {
            Ok(updated) => return Ok(updated.value),
            Err(StoreError::VersionConflict { .. }) => {
                attempt += 1;
                if attempt >= max_retries {
                    return Err(LockingError::LockContended);
                }
                tokio::time::sleep(Duration::from_millis(20 * attempt as u64)).await;
                continue;
            }
            Err(other) => return Err(other.into()),
        }
    }
}

/// Mutates `candidate` in place: `reserved += requested`, `available`
/// recomputed. `allocatable`/`allocated`/`capacity` are untouched.
fn apply_reservation(candidate: &mut ClusterAdvertisement, requested: &ResourceQuantities) {
    let current_reserved = candidate.resources.reserved_or_zero();
    candidate.resources.reserved = Some(current_reserved.add(requested));
    candidate.resources.recompute_available();
}

/// The inverse of [`reserve_on`]: releases a previously-locked `requested`
/// amount back off of `name`'s `reserved` field, used by the lifecycle
/// observer when a reservation is released, expires, or is found orphaned.
/// Subtraction saturates at zero rather than erroring, since an observer
/// correcting drift should never itself panic or wedge.
pub async fn release_on<S>(store: &S, name: &str, requested: &ResourceQuantities, max_retries: u32) -> Result<ClusterAdvertisement, LockingError>
where
    S: StateStore<ClusterAdvertisement>,
{
    let mut attempt = 0;
    loop {
        let versioned = store.fetch_by_name(name).await?.ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        let mut candidate = versioned.value.clone();

        let current_reserved = candidate.resources.reserved_or_zero();
        candidate.resources.reserved = Some(current_reserved.saturating_sub(requested));
        candidate.resources.recompute_available();

        match store.update_with_version(name, &versioned.version, candidate.clone()).await {
            Ok(updated) => return Ok(updated.value),
            Err(StoreError::VersionConflict { .. }) => {
                attempt += 1;
                if attempt >= max_retries {
                    return Err(LockingError::LockContended);
                }
                tokio::time::sleep(Duration::from_millis(20 * attempt as u64)).await;
                continue;
            }
            Err(other) => return Err(other.into()),
        }
    }
}
