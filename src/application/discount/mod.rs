//! Discount engine
//!
//! Collects the weather and incident signals for the pickup location and
//! runs the rule table over them. The engine holds no state of its own.

pub mod rules;

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::domain::{
    CustomerType, DiscountRequest, DiscountResponse, IncidentProvider, IncidentsInfo,
    IncidentsRequest, Weather, WeatherProvider,
};
use crate::shared::errors::{DomainError, DomainResult, ProviderError};

pub use rules::{DiscountRule, Signals, DEFAULT_RULES, INCIDENT_PROXIMITY_KM};

pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(2);

pub struct DiscountEngine {
    weather: Arc<dyn WeatherProvider>,
    incidents: Arc<dyn IncidentProvider>,
    provider_timeout: Duration,
}

impl DiscountEngine {
    pub fn new(weather: Arc<dyn WeatherProvider>, incidents: Arc<dyn IncidentProvider>) -> Self {
        Self {
            weather,
            incidents,
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    pub async fn calculate_discount(
        &self,
        request: &DiscountRequest,
    ) -> DomainResult<DiscountResponse> {
        request.validate()?;

        let signals = self
            .collect_signals(request)
            .await
            .map_err(DomainError::infra("calculating discount"))?;

        let amount = rules::apply_rules(DEFAULT_RULES, request, &signals);
        debug!(
            customer_id = %request.customer.id,
            bike_id = %request.bike.id,
            reservation_value = request.reservation_value,
            amount,
            "discount calculated"
        );
        Ok(DiscountResponse { amount })
    }

    /// Business rules never look at signals, so those requests skip the
    /// providers entirely. Individual requests ask both at once.
    async fn collect_signals(&self, request: &DiscountRequest) -> Result<Signals, ProviderError> {
        if request.customer.customer_type != CustomerType::Individual {
            return Ok(Signals::default());
        }

        let incidents_request = IncidentsRequest {
            location: request.location,
            proximity_km: INCIDENT_PROXIMITY_KM,
        };

        let (weather, incidents) = tokio::try_join!(
            self.fetch_weather(request),
            self.fetch_incidents(&incidents_request),
        )?;

        Ok(Signals { weather, incidents })
    }

    async fn fetch_weather(&self, request: &DiscountRequest) -> Result<Option<Weather>, ProviderError> {
        timed(
            "weather",
            self.provider_timeout,
            self.weather.get_weather(&request.location),
        )
        .await
    }

    async fn fetch_incidents(
        &self,
        request: &IncidentsRequest,
    ) -> Result<Option<IncidentsInfo>, ProviderError> {
        timed(
            "incidents",
            self.provider_timeout,
            self.incidents.get_incidents(request),
        )
        .await
    }
}

async fn timed<T, F>(provider: &'static str, limit: Duration, call: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    let started = Instant::now();
    let result = tokio::time::timeout(limit, call).await;
    metrics::histogram!("signal_provider_duration_seconds", "provider" => provider)
        .record(started.elapsed().as_secs_f64());

    result.unwrap_or(Err(ProviderError::Timeout {
        provider,
        timeout_ms: limit.as_millis() as u64,
    }))
}
