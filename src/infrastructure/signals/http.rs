//! Reqwest-backed weather and incident-history providers.
//!
//! Transport details only: query encoding, timeout, status mapping and JSON
//! decoding. A `404` means the provider has no data for the location.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::domain::{
    IncidentProvider, IncidentsInfo, IncidentsRequest, Location, Weather, WeatherProvider,
};
use crate::shared::errors::ProviderError;

const WEATHER: &str = "weather";
const INCIDENTS: &str = "incidents";

#[derive(Debug, Deserialize)]
struct WeatherDto {
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct IncidentsDto {
    number_of_incidents: u32,
    proximity_km: f64,
}

/// One JSON endpoint family under a base URL.
struct SignalClient {
    client: Client,
    base_url: String,
    provider: &'static str,
    timeout: Duration,
}

impl SignalClient {
    fn new(provider: &'static str, base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            provider,
            timeout,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, ProviderError> {
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, path))
            .header(reqwest::header::ACCEPT, "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ProviderError::Status {
                provider: self.provider,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        serde_json::from_slice(&body)
            .map(Some)
            .map_err(|e| ProviderError::Decode {
                provider: self.provider,
                message: e.to_string(),
            })
    }

    fn map_transport_error(&self, error: reqwest::Error) -> ProviderError {
        if error.is_timeout() {
            ProviderError::Timeout {
                provider: self.provider,
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            ProviderError::Transport {
                provider: self.provider,
                message: error.to_string(),
            }
        }
    }
}

fn coordinates(location: &Location) -> Vec<(&'static str, String)> {
    vec![
        ("lat", location.lat.to_string()),
        ("lon", location.long.to_string()),
    ]
}

/// `GET {base}/weather?lat=..&lon=..` returning `{"temperature": f64}`.
pub struct HttpWeatherProvider {
    inner: SignalClient,
}

impl HttpWeatherProvider {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            inner: SignalClient::new(WEATHER, base_url, timeout)?,
        })
    }
}

#[async_trait]
impl WeatherProvider for HttpWeatherProvider {
    async fn get_weather(&self, location: &Location) -> Result<Option<Weather>, ProviderError> {
        let dto: Option<WeatherDto> = self
            .inner
            .get_json("weather", &coordinates(location))
            .await?;
        Ok(dto.map(|d| Weather {
            temperature: d.temperature,
        }))
    }
}

/// `GET {base}/incidents?lat=..&lon=..&proximity_km=..` returning
/// `{"number_of_incidents": u32, "proximity_km": f64}`.
pub struct HttpIncidentProvider {
    inner: SignalClient,
}

impl HttpIncidentProvider {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            inner: SignalClient::new(INCIDENTS, base_url, timeout)?,
        })
    }
}

#[async_trait]
impl IncidentProvider for HttpIncidentProvider {
    async fn get_incidents(
        &self,
        request: &IncidentsRequest,
    ) -> Result<Option<IncidentsInfo>, ProviderError> {
        let mut query = coordinates(&request.location);
        query.push(("proximity_km", request.proximity_km.to_string()));

        let dto: Option<IncidentsDto> = self.inner.get_json("incidents", &query).await?;
        Ok(dto.map(|d| IncidentsInfo {
            number_of_incidents: d.number_of_incidents,
            proximity_km: d.proximity_km,
        }))
    }
}
