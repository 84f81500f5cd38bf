//! Migration to create the leave_balances table.
//!
//! Balances are derived rows; the unique index on (member, leave type, year)
//! backs the insert-or-get used by lazy initialization.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LeaveBalances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LeaveBalances::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LeaveBalances::TenantId).uuid().not_null())
                    .col(ColumnDef::new(LeaveBalances::TeamMemberId).uuid().not_null())
                    .col(ColumnDef::new(LeaveBalances::LeaveTypeId).uuid().not_null())
                    .col(ColumnDef::new(LeaveBalances::Year).integer().not_null())
                    .col(
                        ColumnDef::new(LeaveBalances::TotalQuota)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(LeaveBalances::Used)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(LeaveBalances::Pending)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(LeaveBalances::Available)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(LeaveBalances::CarryForward)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(LeaveBalances::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(LeaveBalances::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-leave_balances-tenant_id")
                            .from(LeaveBalances::Table, LeaveBalances::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-leave_balances-team_member_id")
                            .from(LeaveBalances::Table, LeaveBalances::TeamMemberId)
                            .to(TeamMembers::Table, TeamMembers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-leave_balances-leave_type_id")
                            .from(LeaveBalances::Table, LeaveBalances::LeaveTypeId)
                            .to(LeaveTypes::Table, LeaveTypes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq-leave_balances-member_type_year")
                    .table(LeaveBalances::Table)
                    .col(LeaveBalances::TeamMemberId)
                    .col(LeaveBalances::LeaveTypeId)
                    .col(LeaveBalances::Year)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-leave_balances-tenant_id-year")
                    .table(LeaveBalances::Table)
                    .col(LeaveBalances::TenantId)
                    .col(LeaveBalances::Year)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LeaveBalances::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum LeaveBalances {
    Table,
    Id,
    TenantId,
    TeamMemberId,
    LeaveTypeId,
    Year,
    TotalQuota,
    Used,
    Pending,
    Available,
    CarryForward,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum TeamMembers {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum LeaveTypes {
    Table,
    Id,
}
