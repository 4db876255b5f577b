//! SeaORM-backed [`Ledger`].
//!
//! Holds one connection pool and exposes the per-aggregate repositories plus
//! transactions for the reservation pipeline.
//!
//! ```ignore
//! let ledger = SeaOrmLedger::new(db.clone());
//! let bike = ledger.bikes().find_by_id("b-1").await?;
//! let mut tx = ledger.begin(IsolationLevel::Serializable).await?;
//! ```

use async_trait::async_trait;
use log::{debug, warn};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend,
    IsolationLevel as SqlIsolation, TransactionTrait,
};

use super::db_err;
use super::repositories::{
    bike_repository, customer_repository, reservation_repository, SeaOrmBikeRepository, SeaOrmCustomerRepository,
    SeaOrmReservationRepository,
};
use crate::domain::{
    BikeRepository, Customer, CustomerProfile, CustomerRepository, IsolationLevel, Ledger,
    LedgerTransaction, Reservation, ReservationRepository,
};
use crate::shared::errors::DomainResult;
use crate::shared::time::TimeRange;

pub struct SeaOrmLedger {
    db: DatabaseConnection,
    bikes: SeaOrmBikeRepository,
    customers: SeaOrmCustomerRepository,
    reservations: SeaOrmReservationRepository,
}

impl SeaOrmLedger {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            bikes: SeaOrmBikeRepository::new(db.clone()),
            customers: SeaOrmCustomerRepository::new(db.clone()),
            reservations: SeaOrmReservationRepository::new(db.clone()),
            db,
        }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// SQLite has no per-transaction isolation levels; writers are serialized
    /// by its database-wide write lock, taken in [`LedgerTransaction::lock_bike`].
    fn isolation_for_backend(&self, isolation: IsolationLevel) -> Option<SqlIsolation> {
        if self.db.get_database_backend() == DbBackend::Sqlite {
            return None;
        }
        Some(match isolation {
            IsolationLevel::ReadCommitted => SqlIsolation::ReadCommitted,
            IsolationLevel::RepeatableRead => SqlIsolation::RepeatableRead,
            IsolationLevel::Serializable => SqlIsolation::Serializable,
        })
    }
}

#[async_trait]
impl Ledger for SeaOrmLedger {
    fn bikes(&self) -> &dyn BikeRepository {
        &self.bikes
    }

    fn customers(&self) -> &dyn CustomerRepository {
        &self.customers
    }

    fn reservations(&self) -> &dyn ReservationRepository {
        &self.reservations
    }

    async fn begin(&self, isolation: IsolationLevel) -> DomainResult<Box<dyn LedgerTransaction>> {
        let tx = self
            .db
            .begin_with_config(self.isolation_for_backend(isolation), None)
            .await
            .map_err(db_err("opening reservation transaction"))?;
        debug!("Opened {:?} reservation transaction", isolation);
        Ok(Box::new(SeaOrmTransaction { tx }))
    }
}

/// Dropping it without commit rolls the database transaction back.
pub struct SeaOrmTransaction {
    tx: DatabaseTransaction,
}

#[async_trait]
impl LedgerTransaction for SeaOrmTransaction {
    async fn lock_bike(&mut self, bike_id: &str) -> DomainResult<()> {
        bike_repository::lock_for_booking(&self.tx, bike_id).await
    }

    async fn has_overlap(&mut self, bike_id: &str, period: &TimeRange) -> DomainResult<bool> {
        reservation_repository::has_approved_overlap(&self.tx, bike_id, period).await
    }

    async fn find_customer(&mut self, id: &str) -> DomainResult<Option<Customer>> {
        customer_repository::find(&self.tx, id).await
    }

    async fn create_customer(&mut self, profile: &CustomerProfile) -> DomainResult<String> {
        let id = uuid::Uuid::new_v4().to_string();
        customer_repository::insert(&self.tx, id.clone(), profile).await?;
        Ok(id)
    }

    async fn insert_reservation(&mut self, reservation: &Reservation) -> DomainResult<()> {
        reservation_repository::insert(&self.tx, reservation).await
    }

    async fn commit(self: Box<Self>) -> DomainResult<()> {
        self.tx
            .commit()
            .await
            .map_err(db_err("committing reservation transaction"))
    }

    async fn rollback(self: Box<Self>) -> DomainResult<()> {
        self.tx.rollback().await.map_err(|e| {
            warn!("Rollback failed: {}", e);
            db_err("rolling back reservation transaction")(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bike, CustomerType, ReservationStatus};
    use crate::infrastructure::database::migrator::Migrator;
    use crate::infrastructure::database::{init_database, DatabaseConfig};
    use chrono::{DateTime, TimeZone, Utc};
    use sea_orm_migration::MigratorTrait;

    async fn ledger() -> SeaOrmLedger {
        let db = init_database(&DatabaseConfig::sqlite_memory()).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        let ledger = SeaOrmLedger::new(db);
        ledger
            .bikes()
            .save(Bike {
                id: "b-1".into(),
                model_name: "Cargo".into(),
                weight_kg: 32.0,
                price_per_hour: 2500,
            })
            .await
            .unwrap();
        ledger
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 9, 1, hour, 0, 0).unwrap()
    }

    fn period(from: u32, to: u32) -> TimeRange {
        TimeRange::new(at(from), at(to)).unwrap()
    }

    fn profile() -> CustomerProfile {
        CustomerProfile {
            customer_type: CustomerType::Business,
            first_name: "Courier Co".into(),
            surname: String::new(),
            email: "ops@courier.test".into(),
        }
    }

    #[tokio::test]
    async fn committed_reservation_blocks_overlaps_only() {
        let ledger = ledger().await;

        let mut tx = ledger.begin(IsolationLevel::Serializable).await.unwrap();
        let customer_id = tx.create_customer(&profile()).await.unwrap();
        let reservation = Reservation::approved("b-1", &customer_id, period(10, 11), 2500, 0);
        tx.insert_reservation(&reservation).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = ledger.begin(IsolationLevel::Serializable).await.unwrap();
        assert!(tx.has_overlap("b-1", &period(10, 12)).await.unwrap());
        assert!(!tx.has_overlap("b-1", &period(11, 12)).await.unwrap());
        assert!(!tx.has_overlap("b-1", &period(9, 10)).await.unwrap());
        tx.rollback().await.unwrap();

        let stored = ledger
            .reservations()
            .find_by_id(&reservation.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.customer_id, customer_id);
        assert_eq!(stored.status, ReservationStatus::Approved);
        assert_eq!(stored.period(), period(10, 11));
    }

    #[tokio::test]
    async fn rollback_discards_customer_and_reservation() {
        let ledger = ledger().await;

        let mut tx = ledger.begin(IsolationLevel::Serializable).await.unwrap();
        let customer_id = tx.create_customer(&profile()).await.unwrap();
        assert!(tx.find_customer(&customer_id).await.unwrap().is_some());
        let reservation = Reservation::approved("b-1", &customer_id, period(8, 9), 2500, 0);
        tx.insert_reservation(&reservation).await.unwrap();
        drop(tx);

        assert!(ledger.customers().find_by_id(&customer_id).await.unwrap().is_none());
        assert!(ledger
            .reservations()
            .find_by_id(&reservation.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn canceled_reservations_are_listed_but_do_not_block() {
        let ledger = ledger().await;
        let mut tx = ledger.begin(IsolationLevel::Serializable).await.unwrap();
        let customer_id = tx.create_customer(&profile()).await.unwrap();
        let reservation = Reservation::approved("b-1", &customer_id, period(14, 16), 5000, 0);
        tx.insert_reservation(&reservation).await.unwrap();
        tx.commit().await.unwrap();

        ledger
            .reservations()
            .update_status(&reservation.id, ReservationStatus::Canceled)
            .await
            .unwrap();

        let listed = ledger
            .reservations()
            .list_overlapping("b-1", &period(15, 17))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, ReservationStatus::Canceled);

        let mut tx = ledger.begin(IsolationLevel::Serializable).await.unwrap();
        assert!(!tx.has_overlap("b-1", &period(15, 17)).await.unwrap());
    }

    #[tokio::test]
    async fn bike_lock_leaves_row_untouched() {
        let ledger = ledger().await;

        let mut tx = ledger.begin(IsolationLevel::Serializable).await.unwrap();
        tx.lock_bike("b-1").await.unwrap();
        tx.lock_bike("missing").await.unwrap();
        assert!(!tx.has_overlap("b-1", &period(10, 11)).await.unwrap());
        tx.commit().await.unwrap();

        let bike = ledger.bikes().find_by_id("b-1").await.unwrap().unwrap();
        assert_eq!(bike.price_per_hour, 2500);
        assert_eq!(bike.model_name, "Cargo");
    }

    #[tokio::test]
    async fn missing_rows_are_not_found() {
        let ledger = ledger().await;
        assert!(ledger
            .reservations()
            .update_status("missing", ReservationStatus::Canceled)
            .await
            .is_err());
        assert!(ledger.bikes().delete("missing").await.is_err());
        assert!(ledger.bikes().find_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn bike_update_changes_stored_fields() {
        let ledger = ledger().await;
        ledger
            .bikes()
            .update(Bike {
                id: "b-1".into(),
                model_name: "Cargo XL".into(),
                weight_kg: 35.5,
                price_per_hour: 2900,
            })
            .await
            .unwrap();

        let bike = ledger.bikes().find_by_id("b-1").await.unwrap().unwrap();
        assert_eq!(bike.model_name, "Cargo XL");
        assert_eq!(bike.price_per_hour, 2900);
        assert_eq!(ledger.bikes().list().await.unwrap().len(), 1);
    }
}
