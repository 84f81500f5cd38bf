//! Migration to create the leave_requests table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LeaveRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LeaveRequests::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LeaveRequests::TenantId).uuid().not_null())
                    .col(ColumnDef::new(LeaveRequests::Reference).text().not_null())
                    .col(ColumnDef::new(LeaveRequests::TeamMemberId).uuid().not_null())
                    .col(ColumnDef::new(LeaveRequests::LeaveTypeId).uuid().not_null())
                    .col(ColumnDef::new(LeaveRequests::StartDate).date().not_null())
                    .col(ColumnDef::new(LeaveRequests::EndDate).date().not_null())
                    .col(ColumnDef::new(LeaveRequests::TotalDays).double().not_null())
                    .col(ColumnDef::new(LeaveRequests::Reason).text().null())
                    .col(
                        ColumnDef::new(LeaveRequests::Status)
                            .text()
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(ColumnDef::new(LeaveRequests::ApprovedBy).uuid().null())
                    .col(
                        ColumnDef::new(LeaveRequests::ApprovedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(LeaveRequests::RejectionReason).text().null())
                    .col(
                        ColumnDef::new(LeaveRequests::CancelledAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LeaveRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(LeaveRequests::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-leave_requests-tenant_id")
                            .from(LeaveRequests::Table, LeaveRequests::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-leave_requests-team_member_id")
                            .from(LeaveRequests::Table, LeaveRequests::TeamMemberId)
                            .to(TeamMembers::Table, TeamMembers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-leave_requests-leave_type_id")
                            .from(LeaveRequests::Table, LeaveRequests::LeaveTypeId)
                            .to(LeaveTypes::Table, LeaveTypes::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq-leave_requests-tenant_id-reference")
                    .table(LeaveRequests::Table)
                    .col(LeaveRequests::TenantId)
                    .col(LeaveRequests::Reference)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Ledger recomputation scans by (member, type) and a start_date range.
        manager
            .create_index(
                Index::create()
                    .name("idx-leave_requests-member_type_start")
                    .table(LeaveRequests::Table)
                    .col(LeaveRequests::TeamMemberId)
                    .col(LeaveRequests::LeaveTypeId)
                    .col(LeaveRequests::StartDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LeaveRequests::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum LeaveRequests {
    Table,
    Id,
    TenantId,
    Reference,
    TeamMemberId,
    LeaveTypeId,
    StartDate,
    EndDate,
    TotalDays,
    Reason,
    Status,
    ApprovedBy,
    ApprovedAt,
    RejectionReason,
    CancelledAt,
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
