//! `dashmap`-backed ledger with optimistic transactions.
//!
//! A transaction remembers every availability check it made and stages its
//! writes locally. Commit runs under a single lock, fails with `Conflict`
//! if any of those checks would now answer differently (skipped under
//! `ReadCommitted`), re-checks the staged reservations against committed
//! approved ones, then applies the writes. Bookings of disjoint intervals
//! on the same bike therefore never conflict.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use log::debug;
use tokio::sync::Mutex;

use crate::domain::{
    Bike, BikeRepository, Customer, CustomerProfile, CustomerRepository, IsolationLevel, Ledger,
    LedgerTransaction, Reservation, ReservationRepository, ReservationStatus,
};
use crate::shared::errors::{DomainError, DomainResult};
use crate::shared::time::TimeRange;

#[derive(Default)]
struct Tables {
    bikes: DashMap<String, Bike>,
    customers: DashMap<String, Customer>,
    reservations: DashMap<String, Reservation>,
    commit_lock: Mutex<()>,
    open_transactions: AtomicUsize,
}

impl Tables {
    fn committed_overlap(&self, bike_id: &str, period: &TimeRange) -> bool {
        self.reservations
            .iter()
            .any(|r| r.bike_id == bike_id && r.blocks(period))
    }

    fn first_blocking(&self, reservation: &Reservation) -> Option<String> {
        let period = reservation.period();
        self.reservations
            .iter()
            .find(|r| r.bike_id == reservation.bike_id && r.id != reservation.id && r.blocks(&period))
            .map(|r| r.id.clone())
    }
}

/// Cheap to clone; clones share the same tables.
#[derive(Clone, Default)]
pub struct InMemoryLedger {
    tables: Arc<Tables>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a reservation directly, bypassing transactions.
    pub fn seed_reservation(&self, reservation: Reservation) {
        self.tables
            .reservations
            .insert(reservation.id.clone(), reservation);
    }

    pub fn customer_count(&self) -> usize {
        self.tables.customers.len()
    }

    pub fn reservation_count(&self) -> usize {
        self.tables.reservations.len()
    }

    /// Transactions begun and neither committed, rolled back nor dropped.
    pub fn open_transactions(&self) -> usize {
        self.tables.open_transactions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    fn bikes(&self) -> &dyn BikeRepository {
        self.tables.as_ref()
    }

    fn customers(&self) -> &dyn CustomerRepository {
        self.tables.as_ref()
    }

    fn reservations(&self) -> &dyn ReservationRepository {
        self.tables.as_ref()
    }

    async fn begin(&self, isolation: IsolationLevel) -> DomainResult<Box<dyn LedgerTransaction>> {
        self.tables.open_transactions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(InMemoryTransaction {
            tables: Arc::clone(&self.tables),
            isolation,
            reads: Vec::new(),
            customers: Vec::new(),
            reservations: Vec::new(),
        }))
    }
}

#[async_trait]
impl BikeRepository for Tables {
    async fn list(&self) -> DomainResult<Vec<Bike>> {
        let mut bikes: Vec<Bike> = self.bikes.iter().map(|e| e.value().clone()).collect();
        bikes.sort_by(|a, b| a.model_name.cmp(&b.model_name).then_with(|| a.id.cmp(&b.id)));
        Ok(bikes)
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Bike>> {
        Ok(self.bikes.get(id).map(|b| b.clone()))
    }

    async fn save(&self, bike: Bike) -> DomainResult<()> {
        if self.bikes.contains_key(&bike.id) {
            return Err(DomainError::Conflict(format!("bike {} already exists", bike.id)));
        }
        self.bikes.insert(bike.id.clone(), bike);
        Ok(())
    }

    async fn update(&self, bike: Bike) -> DomainResult<()> {
        match self.bikes.get_mut(&bike.id) {
            Some(mut stored) => {
                *stored = bike;
                Ok(())
            }
            None => Err(DomainError::not_found("Bike", "id", bike.id)),
        }
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        self.bikes
            .remove(id)
            .ok_or_else(|| DomainError::not_found("Bike", "id", id))?;
        Ok(())
    }
}

#[async_trait]
impl CustomerRepository for Tables {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Customer>> {
        Ok(self.customers.get(id).map(|c| c.clone()))
    }

    async fn save(&self, customer: Customer) -> DomainResult<()> {
        self.customers.insert(customer.id.clone(), customer);
        Ok(())
    }
}

#[async_trait]
impl ReservationRepository for Tables {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Reservation>> {
        Ok(self.reservations.get(id).map(|r| r.clone()))
    }

    async fn list_overlapping(
        &self,
        bike_id: &str,
        period: &TimeRange,
    ) -> DomainResult<Vec<Reservation>> {
        let mut found: Vec<Reservation> = self
            .reservations
            .iter()
            .filter(|r| r.bike_id == bike_id && r.period().overlaps(period))
            .map(|r| r.value().clone())
            .collect();
        found.sort_by_key(|r| r.start_time);
        Ok(found)
    }

    async fn update_status(&self, id: &str, status: ReservationStatus) -> DomainResult<()> {
        let _guard = self.commit_lock.lock().await;
        match self.reservations.get_mut(id) {
            Some(mut reservation) => {
                reservation.status = status;
                Ok(())
            }
            None => Err(DomainError::not_found("Reservation", "id", id)),
        }
    }
}

/// One availability check and its answer.
struct AvailabilityRead {
    bike_id: String,
    period: TimeRange,
    blocked: bool,
}

pub struct InMemoryTransaction {
    tables: Arc<Tables>,
    isolation: IsolationLevel,
    reads: Vec<AvailabilityRead>,
    customers: Vec<Customer>,
    reservations: Vec<Reservation>,
}

impl InMemoryTransaction {
    fn validate_reads(&self) -> DomainResult<()> {
        if self.isolation == IsolationLevel::ReadCommitted {
            return Ok(());
        }
        for read in &self.reads {
            if self.tables.committed_overlap(&read.bike_id, &read.period) != read.blocked {
                return Err(DomainError::Conflict(format!(
                    "availability of bike {} changed since it was read",
                    read.bike_id
                )));
            }
        }
        Ok(())
    }

    fn check_exclusion(&self) -> DomainResult<()> {
        for staged in self.reservations.iter().filter(|r| r.is_approved()) {
            if let Some(existing) = self.tables.first_blocking(staged) {
                return Err(DomainError::Conflict(format!(
                    "reservation {} overlaps reservation {existing} on bike {}",
                    staged.id, staged.bike_id
                )));
            }
        }
        Ok(())
    }
}

impl Drop for InMemoryTransaction {
    fn drop(&mut self) {
        self.tables.open_transactions.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl LedgerTransaction for InMemoryTransaction {
    /// Nothing to take; commit-time validation catches concurrent writers.
    async fn lock_bike(&mut self, _bike_id: &str) -> DomainResult<()> {
        Ok(())
    }

    async fn has_overlap(&mut self, bike_id: &str, period: &TimeRange) -> DomainResult<bool> {
        let committed = self.tables.committed_overlap(bike_id, period);
        self.reads.push(AvailabilityRead {
            bike_id: bike_id.to_string(),
            period: *period,
            blocked: committed,
        });

        let staged = self
            .reservations
            .iter()
            .any(|r| r.bike_id == bike_id && r.blocks(period));
        Ok(committed || staged)
    }

    async fn find_customer(&mut self, id: &str) -> DomainResult<Option<Customer>> {
        if let Some(staged) = self.customers.iter().find(|c| c.id == id) {
            return Ok(Some(staged.clone()));
        }
        Ok(self.tables.customers.get(id).map(|c| c.clone()))
    }

    async fn create_customer(&mut self, profile: &CustomerProfile) -> DomainResult<String> {
        let customer = profile.clone().into_customer(uuid::Uuid::new_v4().to_string());
        let id = customer.id.clone();
        self.customers.push(customer);
        Ok(id)
    }

    async fn insert_reservation(&mut self, reservation: &Reservation) -> DomainResult<()> {
        if self.reservations.iter().any(|r| r.id == reservation.id)
            || self.tables.reservations.contains_key(&reservation.id)
        {
            return Err(DomainError::Conflict(format!(
                "reservation {} already exists",
                reservation.id
            )));
        }
        self.reservations.push(reservation.clone());
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> DomainResult<()> {
        let tables = Arc::clone(&self.tables);
        let _guard = tables.commit_lock.lock().await;

        self.validate_reads()?;
        self.check_exclusion()?;

        for customer in self.customers.drain(..) {
            tables.customers.insert(customer.id.clone(), customer);
        }
        for reservation in self.reservations.drain(..) {
            debug!("Committed reservation {} for bike {}", reservation.id, reservation.bike_id);
            tables.reservations.insert(reservation.id.clone(), reservation);
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> DomainResult<()> {
        debug!(
            "Rolled back transaction with {} staged reservation(s)",
            self.reservations.len()
        );
        Ok(())
    }
}
