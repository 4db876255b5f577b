//! Reservation repository interface
//!
//! Plain reads and status updates. Creating reservations happens only
//! inside a [`LedgerTransaction`](crate::domain::LedgerTransaction).

use async_trait::async_trait;

use super::model::{Reservation, ReservationStatus};
use crate::shared::errors::DomainResult;
use crate::shared::time::TimeRange;

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Reservation>>;

    /// Reservations of any status on `bike_id` overlapping `period`,
    /// ordered by start time.
    async fn list_overlapping(
        &self,
        bike_id: &str,
        period: &TimeRange,
    ) -> DomainResult<Vec<Reservation>>;

    /// Fails with `NotFound` if the reservation does not exist
    async fn update_status(&self, id: &str, status: ReservationStatus) -> DomainResult<()>;
}
