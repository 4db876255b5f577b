//! Reservation DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::application::ReservationRequest;
use crate::domain::{CustomerData, CustomerInput, Location, Reservation, ReservationOutcome};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct LocationDto {
    pub lat: f64,
    pub long: f64,
}

/// Inline customer profile
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CustomerDataDto {
    /// `individual` or `business`
    pub customer_type: String,
    #[validate(length(max = 100))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub surname: String,
    #[validate(length(max = 254))]
    pub email: String,
}

/// Either an existing customer id or an inline profile. The id wins when
/// both are sent.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct CustomerDto {
    pub id: Option<String>,
    #[validate(nested)]
    pub data: Option<CustomerDataDto>,
}

/// Request to book a bike
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReservationRequest {
    pub bike_id: String,
    #[validate(nested)]
    pub customer: CustomerDto,
    pub location: Option<LocationDto>,
    /// Inclusive, RFC 3339
    pub start_time: DateTime<Utc>,
    /// Exclusive, RFC 3339
    pub end_time: DateTime<Utc>,
}

impl From<CreateReservationRequest> for ReservationRequest {
    fn from(r: CreateReservationRequest) -> Self {
        Self {
            bike_id: r.bike_id,
            customer: CustomerInput {
                id: r.customer.id,
                data: r.customer.data.map(|d| CustomerData {
                    customer_type: d.customer_type,
                    first_name: d.first_name,
                    surname: d.surname,
                    email: d.email,
                }),
            },
            location: r.location.map(|l| Location {
                lat: l.lat,
                long: l.long,
            }),
            start_time: r.start_time,
            end_time: r.end_time,
        }
    }
}

/// Reservation details in API responses
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReservationDto {
    pub id: String,
    pub bike_id: String,
    pub customer_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// `approved` or `canceled`
    pub status: String,
    /// Cents, after discount
    pub total_value: i64,
    /// Cents
    pub applied_discount: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Reservation> for ReservationDto {
    fn from(r: Reservation) -> Self {
        Self {
            id: r.id,
            bike_id: r.bike_id,
            customer_id: r.customer_id,
            start_time: r.start_time,
            end_time: r.end_time,
            status: r.status.to_string(),
            total_value: r.total_value,
            applied_discount: r.applied_discount,
            created_at: r.created_at,
        }
    }
}

/// Result of a booking attempt. A rejection is a normal answer, not an error.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReservationOutcomeDto {
    /// `approved` or `rejected`
    pub status: String,
    pub reservation: Option<ReservationDto>,
    pub applied_discount: Option<i64>,
    pub reason: Option<String>,
}

impl From<ReservationOutcome> for ReservationOutcomeDto {
    fn from(outcome: ReservationOutcome) -> Self {
        let status = outcome.label().to_string();
        match outcome {
            ReservationOutcome::Approved {
                reservation,
                applied_discount,
            } => Self {
                status,
                reservation: Some(reservation.into()),
                applied_discount: Some(applied_discount),
                reason: None,
            },
            ReservationOutcome::Rejected { reason } => Self {
                status,
                reservation: None,
                applied_discount: None,
                reason: Some(reason),
            },
        }
    }
}

/// Time window query, `[start_time, end_time)`
#[derive(Debug, Deserialize, IntoParams)]
pub struct PeriodQuery {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AvailabilityDto {
    pub bike_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub available: bool,
}
