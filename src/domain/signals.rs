//! Ports for the external signals the discount engine consults.

use async_trait::async_trait;

use super::discount::Location;
use crate::shared::errors::ProviderError;

/// Current weather at a location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weather {
    /// Degrees Celsius
    pub temperature: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncidentsRequest {
    pub location: Location,
    pub proximity_km: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncidentsInfo {
    pub number_of_incidents: u32,
    pub proximity_km: f64,
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// `Ok(None)` when the provider has no reading for the location.
    async fn get_weather(&self, location: &Location) -> Result<Option<Weather>, ProviderError>;
}

#[async_trait]
pub trait IncidentProvider: Send + Sync {
    /// `Ok(None)` when the provider has no history for the area.
    async fn get_incidents(
        &self,
        request: &IncidentsRequest,
    ) -> Result<Option<IncidentsInfo>, ProviderError>;
}
