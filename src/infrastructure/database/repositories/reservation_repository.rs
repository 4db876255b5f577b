//! SeaORM implementation of ReservationRepository

use async_trait::async_trait;
use log::debug;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::domain::reservation::{Reservation, ReservationRepository, ReservationStatus};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::db_err;
use crate::infrastructure::database::entities::reservation;
use crate::shared::time::TimeRange;

pub struct SeaOrmReservationRepository {
    db: DatabaseConnection,
}

impl SeaOrmReservationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

pub(crate) fn model_to_domain(m: reservation::Model) -> DomainResult<Reservation> {
    Ok(Reservation {
        id: m.id,
        bike_id: m.bike_id,
        customer_id: m.customer_id,
        start_time: m.start_time,
        end_time: m.end_time,
        status: m.status.parse::<ReservationStatus>()?,
        total_value: m.total_value,
        applied_discount: m.applied_discount,
        created_at: m.created_at,
    })
}

fn domain_to_model(r: &Reservation) -> reservation::ActiveModel {
    reservation::ActiveModel {
        id: Set(r.id.clone()),
        bike_id: Set(r.bike_id.clone()),
        customer_id: Set(r.customer_id.clone()),
        start_time: Set(r.start_time),
        end_time: Set(r.end_time),
        status: Set(r.status.as_str().to_string()),
        total_value: Set(r.total_value),
        applied_discount: Set(r.applied_discount),
        created_at: Set(r.created_at),
    }
}

/// `[start, end)` overlaps `period` iff `start < period.end && period.start < end`.
fn overlapping(bike_id: &str, period: &TimeRange) -> sea_orm::Select<reservation::Entity> {
    reservation::Entity::find()
        .filter(reservation::Column::BikeId.eq(bike_id))
        .filter(reservation::Column::StartTime.lt(period.end))
        .filter(reservation::Column::EndTime.gt(period.start))
}

pub(crate) async fn has_approved_overlap<C: ConnectionTrait>(
    conn: &C,
    bike_id: &str,
    period: &TimeRange,
) -> DomainResult<bool> {
    let count = overlapping(bike_id, period)
        .filter(reservation::Column::Status.eq(ReservationStatus::Approved.as_str()))
        .count(conn)
        .await
        .map_err(db_err("checking bike availability"))?;
    Ok(count > 0)
}

pub(crate) async fn insert<C: ConnectionTrait>(conn: &C, r: &Reservation) -> DomainResult<()> {
    debug!("Inserting reservation {} for bike {}", r.id, r.bike_id);
    reservation::Entity::insert(domain_to_model(r))
        .exec_without_returning(conn)
        .await
        .map_err(db_err("inserting reservation"))?;
    Ok(())
}

// ── ReservationRepository impl ──────────────────────────────────

#[async_trait]
impl ReservationRepository for SeaOrmReservationRepository {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Reservation>> {
        reservation::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err("fetching reservation"))?
            .map(model_to_domain)
            .transpose()
    }

    async fn list_overlapping(
        &self,
        bike_id: &str,
        period: &TimeRange,
    ) -> DomainResult<Vec<Reservation>> {
        overlapping(bike_id, period)
            .order_by_asc(reservation::Column::StartTime)
            .all(&self.db)
            .await
            .map_err(db_err("listing reservations"))?
            .into_iter()
            .map(model_to_domain)
            .collect()
    }

    async fn update_status(&self, id: &str, status: ReservationStatus) -> DomainResult<()> {
        debug!("Setting reservation {} status to {}", id, status);

        let result = reservation::Entity::update_many()
            .col_expr(reservation::Column::Status, Expr::value(status.as_str()))
            .filter(reservation::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_err("updating reservation status"))?;

        if result.rows_affected == 0 {
            return Err(DomainError::not_found("Reservation", "id", id));
        }
        Ok(())
    }
}
