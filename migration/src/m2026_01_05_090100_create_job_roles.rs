//! Migration to create the job_roles table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(JobRoles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(JobRoles::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(JobRoles::TenantId).uuid().not_null())
                    .col(ColumnDef::new(JobRoles::Title).text().not_null())
                    .col(
                        ColumnDef::new(JobRoles::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(JobRoles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(JobRoles::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-job_roles-tenant_id")
                            .from(JobRoles::Table, JobRoles::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq-job_roles-tenant_id-title")
                    .table(JobRoles::Table)
                    .col(JobRoles::TenantId)
                    .col(JobRoles::Title)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(JobRoles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum JobRoles {
    Table,
    Id,
    TenantId,
    Title,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}
