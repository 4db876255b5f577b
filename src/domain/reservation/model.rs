//! Reservation domain entity

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::errors::DomainError;
use crate::shared::time::TimeRange;

/// Reservation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    /// Holds the bike for its interval
    Approved,
    /// Kept for history, no longer blocks the bike
    Canceled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Canceled => "canceled",
        }
    }
}

impl FromStr for ReservationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approved" => Ok(Self::Approved),
            "canceled" => Ok(Self::Canceled),
            other => Err(DomainError::validation(format!(
                "unknown reservation status '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bike reservation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub bike_id: String,
    pub customer_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: ReservationStatus,
    /// Price after discount, in cents
    pub total_value: i64,
    /// Discount granted, in cents
    pub applied_discount: i64,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    pub fn approved(
        bike_id: impl Into<String>,
        customer_id: impl Into<String>,
        period: TimeRange,
        total_value: i64,
        applied_discount: i64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            bike_id: bike_id.into(),
            customer_id: customer_id.into(),
            start_time: period.start,
            end_time: period.end,
            status: ReservationStatus::Approved,
            total_value,
            applied_discount,
            created_at: Utc::now(),
        }
    }

    pub fn period(&self) -> TimeRange {
        TimeRange {
            start: self.start_time,
            end: self.end_time,
        }
    }

    pub fn is_approved(&self) -> bool {
        self.status == ReservationStatus::Approved
    }

    /// Whether this reservation blocks `period` for its bike.
    pub fn blocks(&self, period: &TimeRange) -> bool {
        self.is_approved() && self.period().overlaps(period)
    }

    pub fn cancel(&mut self) {
        self.status = ReservationStatus::Canceled;
    }
}

/// Result of an orchestrated reservation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ReservationOutcome {
    Approved {
        reservation: Reservation,
        applied_discount: i64,
    },
    Rejected {
        reason: String,
    },
}

impl ReservationOutcome {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Approved { .. } => "approved",
            Self::Rejected { .. } => "rejected",
        }
    }
}
