//! Infrastructure layer - external concerns

pub mod database;
pub mod memory;
pub mod signals;

pub use database::{init_database, DatabaseConfig, SeaOrmLedger};
pub use memory::InMemoryLedger;
pub use signals::{
    HttpIncidentProvider, HttpWeatherProvider, StaticIncidentProvider, StaticWeatherProvider,
};
