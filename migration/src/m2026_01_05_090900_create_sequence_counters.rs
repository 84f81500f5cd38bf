//! Migration to create the sequence_counters table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SequenceCounters::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(SequenceCounters::TenantId).uuid().not_null())
                    .col(ColumnDef::new(SequenceCounters::Scope).text().not_null())
                    .col(ColumnDef::new(SequenceCounters::Year).integer().not_null())
                    .col(
                        ColumnDef::new(SequenceCounters::LastValue)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SequenceCounters::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(SequenceCounters::TenantId)
                            .col(SequenceCounters::Scope)
                            .col(SequenceCounters::Year),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-sequence_counters-tenant_id")
                            .from(SequenceCounters::Table, SequenceCounters::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SequenceCounters::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SequenceCounters {
    Table,
    TenantId,
    Scope,
    Year,
    LastValue,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}
