//! Raw reservation request and its validated form

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{CustomerInput, CustomerRef, Location};
use crate::shared::errors::{DomainError, DomainResult};
use crate::shared::time::TimeRange;

/// A reservation request exactly as the caller sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationRequest {
    pub bike_id: String,
    pub customer: CustomerInput,
    pub location: Option<Location>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Output of [`ReservationRequest::validate`]; every field is known good.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidReservation {
    pub bike_id: String,
    pub customer: CustomerRef,
    pub location: Location,
    pub period: TimeRange,
}

impl ReservationRequest {
    /// Pure shape check. Touches no storage.
    pub fn validate(&self) -> DomainResult<ValidReservation> {
        let bike_id = self.bike_id.trim();
        if bike_id.is_empty() {
            return Err(DomainError::validation("empty bike id"));
        }

        let customer = self.customer.validate()?;

        let location = self
            .location
            .ok_or_else(|| DomainError::validation("empty location"))?;
        location.validate()?;

        let period = TimeRange::new(self.start_time, self.end_time)?;

        Ok(ValidReservation {
            bike_id: bike_id.to_string(),
            customer,
            location,
            period,
        })
    }
}
