//! Bike catalogue use cases

use log::info;

use crate::domain::{Bike, NewBike, SharedLedger};
use crate::shared::errors::{DomainError, DomainResult};

pub struct BikeService {
    ledger: SharedLedger,
}

impl BikeService {
    pub fn new(ledger: SharedLedger) -> Self {
        Self { ledger }
    }

    pub async fn list(&self) -> DomainResult<Vec<Bike>> {
        self.ledger.bikes().list().await
    }

    pub async fn get(&self, id: &str) -> DomainResult<Bike> {
        self.ledger
            .bikes()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Bike", "id", id))
    }

    pub async fn add(&self, bike: NewBike) -> DomainResult<Bike> {
        bike.validate()?;
        let bike = bike.into_bike(uuid::Uuid::new_v4().to_string());
        self.ledger.bikes().save(bike.clone()).await?;
        info!("Bike {} ({}) added", bike.id, bike.model_name);
        Ok(bike)
    }

    pub async fn update(&self, id: &str, bike: NewBike) -> DomainResult<Bike> {
        if id.trim().is_empty() {
            return Err(DomainError::validation("empty bike id"));
        }
        bike.validate()?;
        let bike = bike.into_bike(id);
        self.ledger.bikes().update(bike.clone()).await?;
        info!("Bike {} updated", id);
        Ok(bike)
    }

    /// Deleting a bike that does not exist is not an error.
    pub async fn delete(&self, id: &str) -> DomainResult<()> {
        match self.ledger.bikes().delete(id).await {
            Ok(()) => {
                info!("Bike {} deleted", id);
                Ok(())
            }
            Err(DomainError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
