//! Bike catalogue module - CRUD

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
