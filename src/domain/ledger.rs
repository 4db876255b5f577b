//! Transactional store port.
//!
//! The reservation pipeline runs its overlap check, customer creation and
//! reservation insert inside one [`LedgerTransaction`]. An adapter must make
//! sure two transactions never both commit overlapping approved reservations
//! for the same bike; when it detects a clash at write or commit time, or
//! aborts the transaction because of a concurrent one, it returns
//! [`DomainError::Conflict`](crate::shared::errors::DomainError::Conflict).
//! A conflict alone does not mean the bike is taken.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::bike::BikeRepository;
use super::customer::{Customer, CustomerProfile, CustomerRepository};
use super::reservation::{Reservation, ReservationRepository};
use crate::shared::errors::{DomainError, DomainResult};
use crate::shared::time::TimeRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    ReadCommitted,
    RepeatableRead,
    #[default]
    Serializable,
}

impl FromStr for IsolationLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "read_committed" => Ok(Self::ReadCommitted),
            "repeatable_read" => Ok(Self::RepeatableRead),
            "serializable" => Ok(Self::Serializable),
            other => Err(DomainError::validation(format!(
                "unknown isolation level '{other}'"
            ))),
        }
    }
}

#[async_trait]
pub trait LedgerTransaction: Send {
    /// Claim `bike_id` for writing before its reservations are read, so
    /// concurrent bookings of the same bike queue up instead of failing.
    async fn lock_bike(&mut self, bike_id: &str) -> DomainResult<()>;

    /// Whether an approved reservation on `bike_id` overlaps `period`.
    async fn has_overlap(&mut self, bike_id: &str, period: &TimeRange) -> DomainResult<bool>;

    async fn find_customer(&mut self, id: &str) -> DomainResult<Option<Customer>>;

    /// Persist a new customer and return its generated id.
    async fn create_customer(&mut self, profile: &CustomerProfile) -> DomainResult<String>;

    async fn insert_reservation(&mut self, reservation: &Reservation) -> DomainResult<()>;

    async fn commit(self: Box<Self>) -> DomainResult<()>;

    /// Dropping a transaction without committing also rolls it back.
    async fn rollback(self: Box<Self>) -> DomainResult<()>;
}

/// Entry point to everything persisted by the service.
#[async_trait]
pub trait Ledger: Send + Sync {
    fn bikes(&self) -> &dyn BikeRepository;

    fn customers(&self) -> &dyn CustomerRepository;

    fn reservations(&self) -> &dyn ReservationRepository;

    async fn begin(&self, isolation: IsolationLevel) -> DomainResult<Box<dyn LedgerTransaction>>;
}

pub type SharedLedger = Arc<dyn Ledger>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isolation_level_parses_common_spellings() {
        assert_eq!(
            "Read-Committed".parse::<IsolationLevel>().unwrap(),
            IsolationLevel::ReadCommitted
        );
        assert_eq!(
            "repeatable read".parse::<IsolationLevel>().unwrap(),
            IsolationLevel::RepeatableRead
        );
        assert_eq!(IsolationLevel::default(), IsolationLevel::Serializable);
        assert!("snapshot".parse::<IsolationLevel>().is_err());
    }
}
