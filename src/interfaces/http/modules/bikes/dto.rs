//! Bike DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::{Bike, NewBike};

/// Bike details in API responses
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BikeDto {
    pub id: String,
    pub model_name: String,
    /// Kilograms
    pub weight_kg: f64,
    /// Cents per hour
    pub price_per_hour: i64,
}

impl From<Bike> for BikeDto {
    fn from(b: Bike) -> Self {
        Self {
            id: b.id,
            model_name: b.model_name,
            weight_kg: b.weight_kg,
            price_per_hour: b.price_per_hour,
        }
    }
}

/// Body of create and update requests
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BikeRequest {
    #[validate(length(min = 1, max = 100))]
    pub model_name: String,
    #[validate(range(exclusive_min = 0.0, max = 500.0))]
    pub weight_kg: f64,
    #[validate(range(min = 1))]
    pub price_per_hour: i64,
}

impl From<BikeRequest> for NewBike {
    fn from(r: BikeRequest) -> Self {
        Self {
            model_name: r.model_name,
            weight_kg: r.weight_kg,
            price_per_hour: r.price_per_hour,
        }
    }
}
