//! Bike repository interface

use async_trait::async_trait;

use super::model::Bike;
use crate::shared::errors::DomainResult;

#[async_trait]
pub trait BikeRepository: Send + Sync {
    /// All bikes, ordered by model name
    async fn list(&self) -> DomainResult<Vec<Bike>>;

    /// Plain non-locking read
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Bike>>;

    async fn save(&self, bike: Bike) -> DomainResult<()>;

    /// Fails with `NotFound` if the bike does not exist
    async fn update(&self, bike: Bike) -> DomainResult<()>;

    /// Fails with `NotFound` if the bike does not exist
    async fn delete(&self, id: &str) -> DomainResult<()>;
}
