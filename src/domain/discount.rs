//! Discount request and response value objects

use serde::{Deserialize, Serialize};

use super::bike::Bike;
use super::customer::Customer;
use crate::shared::errors::{DomainError, DomainResult};

/// Geographic point of the pickup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub long: f64,
}

impl Location {
    /// Zero is treated as "not provided" for either coordinate.
    pub fn validate(&self) -> DomainResult<()> {
        let in_range = (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.long);
        if self.lat == 0.0 || self.long == 0.0 || !in_range {
            return Err(DomainError::validation("invalid location"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiscountRequest {
    pub customer: Customer,
    pub bike: Bike,
    pub location: Location,
    /// Undiscounted reservation value in cents
    pub reservation_value: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiscountResponse {
    /// Discount in cents, never above the configured cap
    pub amount: i64,
}

impl DiscountRequest {
    pub fn validate(&self) -> DomainResult<()> {
        self.location.validate()?;
        if self.reservation_value <= 0 {
            return Err(DomainError::validation("empty reservation value"));
        }
        if self.bike.weight_kg <= 0.0 {
            return Err(DomainError::validation("empty bike weight"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_coordinates_are_invalid() {
        assert!(Location { lat: 0.0, long: 19.9 }.validate().is_err());
        assert!(Location { lat: 50.06, long: 0.0 }.validate().is_err());
        assert!(Location { lat: 95.0, long: 19.9 }.validate().is_err());
        assert!(Location { lat: 50.06, long: 19.94 }.validate().is_ok());
    }
}
