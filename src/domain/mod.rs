//! Core data model: resource quantities, cluster advertisements,
//! reservations, and the instructions derived from them.

pub mod advertisement;
pub mod quantity;
pub mod reservation;
pub mod resource_metrics;

pub use advertisement::ClusterAdvertisement;
pub use quantity::{Quantity, ResourceQuantities};
pub use reservation::{Reservation, ReservationPhase, ReservationStatus};
pub use resource_metrics::ResourceMetrics;
