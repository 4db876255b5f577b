//! Forbid overlapping approved reservations of one bike at the storage level.
//!
//! PostgreSQL only; other backends rely on transaction isolation alone.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{ConnectionTrait, DbBackend};

#[derive(DeriveMigrationName)]
pub struct Migration;

const CONSTRAINT: &str = "reservations_no_overlap";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if manager.get_database_backend() != DbBackend::Postgres {
            return Ok(());
        }

        let db = manager.get_connection();
        db.execute_unprepared("CREATE EXTENSION IF NOT EXISTS btree_gist")
            .await?;
        db.execute_unprepared(&format!(
            "ALTER TABLE reservations ADD CONSTRAINT {CONSTRAINT} \
             EXCLUDE USING gist (bike_id WITH =, tstzrange(start_time, end_time, '[)') WITH &&) \
             WHERE (status = 'approved')"
        ))
        .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if manager.get_database_backend() != DbBackend::Postgres {
            return Ok(());
        }

        manager
            .get_connection()
            .execute_unprepared(&format!(
                "ALTER TABLE reservations DROP CONSTRAINT IF EXISTS {CONSTRAINT}"
            ))
            .await?;
        Ok(())
    }
}
