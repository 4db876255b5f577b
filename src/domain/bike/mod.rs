//! Bike aggregate

pub mod model;
pub mod repository;

pub use model::{Bike, NewBike};
pub use repository::BikeRepository;
