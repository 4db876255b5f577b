//! Customer aggregate

pub mod model;
pub mod repository;

pub use model::{Customer, CustomerData, CustomerInput, CustomerProfile, CustomerRef, CustomerType};
pub use repository::CustomerRepository;
