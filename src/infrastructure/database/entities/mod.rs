//! Database entities module

pub mod bike;
pub mod customer;
pub mod reservation;

pub use bike::Entity as Bike;
pub use customer::Entity as Customer;
pub use reservation::Entity as Reservation;
