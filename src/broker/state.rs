//! Shared broker state: the two record stores plus the knobs every handler
//! needs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::domain::{ClusterAdvertisement, Reservation};
use crate::store::memory::MemoryStore;
use crate::store::StateStore;

pub struct AppState {
    pub advertisements: Arc<dyn StateStore<ClusterAdvertisement>>,
    pub reservations: Arc<dyn StateStore<Reservation>>,
    pub lock_retries: u32,
    id_sequence: AtomicU64,
}

impl AppState {
    pub fn new(lock_retries: u32) -> Self {
        Self {
            advertisements: Arc::new(MemoryStore::<ClusterAdvertisement>::new()),
            reservations: Arc::new(MemoryStore::<Reservation>::new()),
            lock_retries,
            id_sequence: AtomicU64::new(0),
        }
    }

    /// Generates a reservation id unique within this process:
    /// `<requesterID>-<monotonic counter>-<random suffix>`.
    ///
    /// A raw "requester + millisecond timestamp" scheme is collision-prone
    /// for two requests in the same millisecond; the monotonic counter
    /// removes that race entirely, and the random suffix (rather than, say,
    /// the counter alone) keeps ids non-guessable across broker restarts
    /// where the counter resets (see DESIGN.md).
    pub fn next_reservation_id(&self, requester_id: &str) -> String {
        let sequence = self.id_sequence.fetch_add(1, Ordering::Relaxed);
        let suffix = uuid::Uuid::new_v4().simple();
        format!("{requester_id}-{sequence:016x}-{suffix}")
    }
}
