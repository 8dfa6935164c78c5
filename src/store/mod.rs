//! The state store abstraction the core consumes.
//!
//! The core never talks to a concrete database; it only calls three write
//! operations (`fetch_by_name`, `create_if_absent`, `update_with_version`)
//! plus two list operations, all against the [`StateStore`] trait.
//! [`memory::MemoryStore`] is the reference, in-process implementation used
//! by the binaries' default configuration and by the test suite; a real
//! deployment swaps in whatever backend supports compare-and-swap writes
//! keyed by an opaque version token.

pub mod error;
pub mod memory;

pub use error::StoreError;

use async_trait::async_trait;

/// An opaque, monotonically-advancing version token. Two records compare
/// equal only if they were read from the same write; the store is free to
/// choose any internal representation as long as a stale token is
/// distinguishable from the current one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Version(pub u64);

/// A record paired with the version token it was read at.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub value: T,
    pub version: Version,
}

impl<T> Versioned<T> {
    pub fn new(value: T, version: Version) -> Self {
        Self { value, version }
    }
}

/// The three write-path operations plus two read-path list operations any
/// backing store must support.
///
/// No operation here spans more than one record: the core assumes no
/// multi-record transaction, and every multi-record
/// effect built on top of this trait (e.g. the reservation dispatcher's
/// "create reservation, then lock the target") is ordered and idempotent by
/// construction rather than atomic.
#[async_trait]
pub trait StateStore<T>: Send + Sync
where
    T: Clone + Send + Sync + 'static,
{
    async fn fetch_by_name(&self, name: &str) -> Result<Option<Versioned<T>>, StoreError>;

    /// Creates `value` under `name` iff no record exists there yet. A
    /// concurrent create racing another concurrent create is expected to
    /// surface as [`StoreError::AlreadyExists`] — treated as retryable by
    /// callers, not as a hard failure, since there was no version token to
    /// conflict on.
    async fn create_if_absent(&self, name: &str, value: T) -> Result<Versioned<T>, StoreError>;

    /// Writes `value` under `name` iff the stored version still matches
    /// `expected_version`. Returns [`StoreError::VersionConflict`] if
    /// another writer won the race, [`StoreError::NotFound`] if the record
    /// was deleted out from under the caller.
    async fn update_with_version(&self, name: &str, expected_version: &Version, value: T) -> Result<Versioned<T>, StoreError>;

    async fn list_all(&self) -> Result<Vec<Versioned<T>>, StoreError>;

    /// Lists every record whose label map contains `key == value`.
    async fn list_by_label(&self, key: &str, value: &str) -> Result<Vec<Versioned<T>>, StoreError>;
}

/// Implemented by record types that carry a label map, so the generic store
/// can filter `list_by_label` without knowing the record's shape.
pub trait Labeled {
    fn labels(&self) -> &std::collections::BTreeMap<String, String>;
}

impl Labeled for crate::domain::ClusterAdvertisement {
    fn labels(&self) -> &std::collections::BTreeMap<String, String> {
        &self.labels
    }
}

impl Labeled for crate::domain::Reservation {
    fn labels(&self) -> &std::collections::BTreeMap<String, String> {
        static EMPTY: std::sync::OnceLock<std::collections::BTreeMap<String, String>> = std::sync::OnceLock::new();
        EMPTY.get_or_init(std::collections::BTreeMap::new)
    }
}
