//! Domain layer: entities, value objects and the ports the application
//! layer talks to.

pub mod bike;
pub mod customer;
pub mod discount;
pub mod ledger;
pub mod reservation;
pub mod signals;

pub use bike::{Bike, BikeRepository, NewBike};
pub use customer::{
    Customer, CustomerData, CustomerInput, CustomerProfile, CustomerRef, CustomerRepository,
    CustomerType,
};
pub use discount::{DiscountRequest, DiscountResponse, Location};
pub use ledger::{IsolationLevel, Ledger, LedgerTransaction, SharedLedger};
pub use reservation::{Reservation, ReservationOutcome, ReservationRepository, ReservationStatus};
pub use signals::{IncidentProvider, IncidentsInfo, IncidentsRequest, Weather, WeatherProvider};

pub use crate::shared::errors::{DomainError, DomainResult};
