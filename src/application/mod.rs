//! Application layer: use cases composed from domain ports.

pub mod availability;
pub mod bikes;
pub mod customers;
pub mod discount;
pub mod reservations;

pub use bikes::BikeService;
pub use discount::DiscountEngine;
pub use reservations::{ReservationRequest, ReservationService, ReservationSettings};
