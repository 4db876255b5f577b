//! Reservation aggregate

pub mod model;
pub mod repository;

pub use model::{Reservation, ReservationOutcome, ReservationStatus};
pub use repository::ReservationRepository;
