//! Signal provider adapters for the discount engine.

mod fixed;
mod http;

pub use fixed::{StaticIncidentProvider, StaticWeatherProvider};
pub use http::{HttpIncidentProvider, HttpWeatherProvider};
