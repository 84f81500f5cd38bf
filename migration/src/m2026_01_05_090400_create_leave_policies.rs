//! Migration to create the leave_policies table.
//!
//! One policy per (tenant, job role, leave type); writes go through an upsert
//! on that key.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LeavePolicies::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LeavePolicies::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LeavePolicies::TenantId).uuid().not_null())
                    .col(ColumnDef::new(LeavePolicies::JobRoleId).uuid().not_null())
                    .col(ColumnDef::new(LeavePolicies::LeaveTypeId).uuid().not_null())
                    .col(
                        ColumnDef::new(LeavePolicies::AnnualQuota)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(LeavePolicies::CarryForwardLimit)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(LeavePolicies::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(LeavePolicies::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(LeavePolicies::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-leave_policies-tenant_id")
                            .from(LeavePolicies::Table, LeavePolicies::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-leave_policies-job_role_id")
                            .from(LeavePolicies::Table, LeavePolicies::JobRoleId)
                            .to(JobRoles::Table, JobRoles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-leave_policies-leave_type_id")
                            .from(LeavePolicies::Table, LeavePolicies::LeaveTypeId)
                            .to(LeaveTypes::Table, LeaveTypes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq-leave_policies-tenant_role_type")
                    .table(LeavePolicies::Table)
                    .col(LeavePolicies::TenantId)
                    .col(LeavePolicies::JobRoleId)
                    .col(LeavePolicies::LeaveTypeId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LeavePolicies::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum LeavePolicies {
    Table,
    Id,
    TenantId,
    JobRoleId,
    LeaveTypeId,
    AnnualQuota,
    CarryForwardLimit,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum JobRoles {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum LeaveTypes {
    Table,
    Id,
}
