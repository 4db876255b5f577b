//! Bike domain entity

use serde::{Deserialize, Serialize};

use crate::shared::errors::{DomainError, DomainResult};

/// A bike available for rent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bike {
    pub id: String,
    pub model_name: String,
    /// Weight in kilograms
    pub weight_kg: f64,
    /// Price per hour in cents
    pub price_per_hour: i64,
}

/// Bike data without identity, used for create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBike {
    pub model_name: String,
    pub weight_kg: f64,
    pub price_per_hour: i64,
}

impl NewBike {
    pub fn validate(&self) -> DomainResult<()> {
        if self.model_name.trim().is_empty() {
            return Err(DomainError::validation("empty model name"));
        }
        if !self.weight_kg.is_finite() || self.weight_kg <= 0.0 {
            return Err(DomainError::validation("bike weight must be positive"));
        }
        if self.price_per_hour <= 0 {
            return Err(DomainError::validation("price per hour must be positive"));
        }
        Ok(())
    }

    pub fn into_bike(self, id: impl Into<String>) -> Bike {
        Bike {
            id: id.into(),
            model_name: self.model_name,
            weight_kg: self.weight_kg,
            price_per_hour: self.price_per_hour,
        }
    }
}
