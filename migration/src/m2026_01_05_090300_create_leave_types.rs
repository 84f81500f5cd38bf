//! Migration to create the leave_types table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LeaveTypes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(LeaveTypes::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(LeaveTypes::TenantId).uuid().not_null())
                    .col(ColumnDef::new(LeaveTypes::Name).text().not_null())
                    .col(ColumnDef::new(LeaveTypes::Code).string_len(10).not_null())
                    .col(ColumnDef::new(LeaveTypes::Category).text().not_null())
                    .col(
                        ColumnDef::new(LeaveTypes::IsPaid)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(LeaveTypes::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(LeaveTypes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(LeaveTypes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-leave_types-tenant_id")
                            .from(LeaveTypes::Table, LeaveTypes::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq-leave_types-tenant_id-code")
                    .table(LeaveTypes::Table)
                    .col(LeaveTypes::TenantId)
                    .col(LeaveTypes::Code)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LeaveTypes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum LeaveTypes {
    Table,
    Id,
    TenantId,
    Name,
    Code,
    Category,
    IsPaid,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}
