//! Reservation use cases: the orchestrated booking pipeline, cancellation
//! and read-only queries.

mod request;
mod service;

#[cfg(test)]
mod tests;

pub use request::{ReservationRequest, ValidReservation};
pub use service::{ReservationService, ReservationSettings, BIKE_NOT_AVAILABLE};
