//! SeaORM implementation of BikeRepository

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set,
};

use crate::domain::bike::{Bike, BikeRepository};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::db_err;
use crate::infrastructure::database::entities::bike;

pub struct SeaOrmBikeRepository {
    db: DatabaseConnection,
}

impl SeaOrmBikeRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn model_to_domain(m: bike::Model) -> Bike {
    Bike {
        id: m.id,
        model_name: m.model_name,
        weight_kg: m.weight_kg,
        price_per_hour: m.price_per_hour,
    }
}

/// No-op write on the bike row. PostgreSQL holds the row lock until the
/// transaction ends. On SQLite, as the first statement of a deferred
/// transaction, it takes the database write lock through the busy handler
/// instead of failing a later read-to-write upgrade with `SQLITE_BUSY`.
pub(crate) async fn lock_for_booking<C: ConnectionTrait>(
    conn: &C,
    bike_id: &str,
) -> DomainResult<()> {
    bike::Entity::update_many()
        .col_expr(
            bike::Column::PricePerHour,
            Expr::col(bike::Column::PricePerHour).into(),
        )
        .filter(bike::Column::Id.eq(bike_id))
        .exec(conn)
        .await
        .map_err(db_err("locking bike"))?;
    Ok(())
}

#[async_trait]
impl BikeRepository for SeaOrmBikeRepository {
    async fn list(&self) -> DomainResult<Vec<Bike>> {
        let models = bike::Entity::find()
            .order_by_asc(bike::Column::ModelName)
            .order_by_asc(bike::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err("listing bikes"))?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Bike>> {
        let model = bike::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err("fetching bike"))?;
        Ok(model.map(model_to_domain))
    }

    async fn save(&self, b: Bike) -> DomainResult<()> {
        debug!("Saving bike: {}", b.id);

        let model = bike::ActiveModel {
            id: Set(b.id),
            model_name: Set(b.model_name),
            weight_kg: Set(b.weight_kg),
            price_per_hour: Set(b.price_per_hour),
            created_at: Set(Utc::now()),
        };
        bike::Entity::insert(model)
            .exec_without_returning(&self.db)
            .await
            .map_err(db_err("saving bike"))?;
        Ok(())
    }

    async fn update(&self, b: Bike) -> DomainResult<()> {
        debug!("Updating bike: {}", b.id);

        let existing = bike::Entity::find_by_id(b.id.clone())
            .one(&self.db)
            .await
            .map_err(db_err("fetching bike"))?
            .ok_or_else(|| DomainError::not_found("Bike", "id", b.id.clone()))?;

        let mut model = existing.into_active_model();
        model.model_name = Set(b.model_name);
        model.weight_kg = Set(b.weight_kg);
        model.price_per_hour = Set(b.price_per_hour);
        model.update(&self.db).await.map_err(db_err("updating bike"))?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        let result = bike::Entity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await
            .map_err(db_err("deleting bike"))?;

        if result.rows_affected == 0 {
            return Err(DomainError::not_found("Bike", "id", id));
        }
        Ok(())
    }
}
