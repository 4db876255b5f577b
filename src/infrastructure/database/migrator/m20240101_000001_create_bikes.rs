//! Create bikes table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bikes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bikes::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bikes::ModelName).string().not_null())
                    .col(ColumnDef::new(Bikes::WeightKg).double().not_null())
                    .col(ColumnDef::new(Bikes::PricePerHour).big_integer().not_null())
                    .col(
                        ColumnDef::new(Bikes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bikes::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Bikes {
    Table,
    Id,
    ModelName,
    WeightKg,
    PricePerHour,
    CreatedAt,
}
