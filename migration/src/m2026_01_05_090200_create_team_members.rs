//! Migration to create the team_members table.
//!
//! `slack_user_id` is unique per tenant so an inbound chat message resolves
//! to at most one member.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TeamMembers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TeamMembers::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TeamMembers::TenantId).uuid().not_null())
                    .col(ColumnDef::new(TeamMembers::FullName).text().not_null())
                    .col(ColumnDef::new(TeamMembers::Email).text().null())
                    .col(ColumnDef::new(TeamMembers::JobTitle).text().not_null())
                    .col(ColumnDef::new(TeamMembers::JoinedDate).date().not_null())
                    .col(ColumnDef::new(TeamMembers::SlackUserId).text().null())
                    .col(
                        ColumnDef::new(TeamMembers::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(TeamMembers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(TeamMembers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-team_members-tenant_id")
                            .from(TeamMembers::Table, TeamMembers::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq-team_members-tenant_id-slack_user_id")
                    .table(TeamMembers::Table)
                    .col(TeamMembers::TenantId)
                    .col(TeamMembers::SlackUserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-team_members-tenant_id-job_title")
                    .table(TeamMembers::Table)
                    .col(TeamMembers::TenantId)
                    .col(TeamMembers::JobTitle)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TeamMembers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TeamMembers {
    Table,
    Id,
    TenantId,
    FullName,
    Email,
    JobTitle,
    JoinedDate,
    SlackUserId,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}
