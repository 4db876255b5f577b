//! # Bike Rental Service
//!
//! Reserves bikes for time windows without double booking and prices each
//! reservation with a rule-based discount fed by weather and incident
//! signals.
//!
//! ## Architecture
//!
//! - **domain**: entities, repository traits, ledger and signal ports
//! - **application**: booking orchestration, availability, customer
//!   resolution, discount engine, bike catalogue
//! - **infrastructure**: SeaORM database, in-memory ledger, HTTP signal
//!   providers
//! - **interfaces**: REST API with Swagger documentation
//! - **shared**: errors, time ranges, shutdown coordination

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};
pub use infrastructure::{init_database, DatabaseConfig, InMemoryLedger, SeaOrmLedger};
pub use interfaces::http::create_api_router;
