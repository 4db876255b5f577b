//! Providers with fixed answers, for local runs without the external
//! services and for tests.

use async_trait::async_trait;

use crate::domain::{
    IncidentProvider, IncidentsInfo, IncidentsRequest, Location, Weather, WeatherProvider,
};
use crate::shared::errors::ProviderError;

#[derive(Debug, Clone, Copy, Default)]
pub struct StaticWeatherProvider {
    temperature: Option<f64>,
}

impl StaticWeatherProvider {
    pub fn new(temperature: Option<f64>) -> Self {
        Self { temperature }
    }
}

#[async_trait]
impl WeatherProvider for StaticWeatherProvider {
    async fn get_weather(&self, _location: &Location) -> Result<Option<Weather>, ProviderError> {
        Ok(self.temperature.map(|temperature| Weather { temperature }))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StaticIncidentProvider {
    number_of_incidents: Option<u32>,
}

impl StaticIncidentProvider {
    pub fn new(number_of_incidents: Option<u32>) -> Self {
        Self {
            number_of_incidents,
        }
    }
}

#[async_trait]
impl IncidentProvider for StaticIncidentProvider {
    async fn get_incidents(
        &self,
        request: &IncidentsRequest,
    ) -> Result<Option<IncidentsInfo>, ProviderError> {
        Ok(self
            .number_of_incidents
            .map(|number_of_incidents| IncidentsInfo {
                number_of_incidents,
                proximity_km: request.proximity_km,
            }))
    }
}
