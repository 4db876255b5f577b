//! Reservation module - booking, cancellation and availability queries

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
