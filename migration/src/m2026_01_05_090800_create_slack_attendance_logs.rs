//! Migration to create the slack_attendance_logs table.
//!
//! The unique (tenant_id, slack_message_ts) index is the exactly-once guard for
//! inbound Slack messages.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SlackAttendanceLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SlackAttendanceLogs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SlackAttendanceLogs::TenantId).uuid().not_null())
                    .col(
                        ColumnDef::new(SlackAttendanceLogs::TeamMemberId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SlackAttendanceLogs::SlackUserId)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SlackAttendanceLogs::SlackMessageTs)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SlackAttendanceLogs::ChannelId).text().not_null())
                    .col(
                        ColumnDef::new(SlackAttendanceLogs::MessageText)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SlackAttendanceLogs::EventType).text().not_null())
                    .col(
                        ColumnDef::new(SlackAttendanceLogs::DetectedKeyword)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SlackAttendanceLogs::Outcome).text().null())
                    .col(
                        ColumnDef::new(SlackAttendanceLogs::EventTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SlackAttendanceLogs::AttendanceId).uuid().null())
                    .col(
                        ColumnDef::new(SlackAttendanceLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-slack_attendance_logs-tenant_id")
                            .from(SlackAttendanceLogs::Table, SlackAttendanceLogs::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq-slack_attendance_logs-tenant_id-message_ts")
                    .table(SlackAttendanceLogs::Table)
                    .col(SlackAttendanceLogs::TenantId)
                    .col(SlackAttendanceLogs::SlackMessageTs)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SlackAttendanceLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SlackAttendanceLogs {
    Table,
    Id,
    TenantId,
    TeamMemberId,
    SlackUserId,
    SlackMessageTs,
    ChannelId,
    MessageText,
    EventType,
    DetectedKeyword,
    Outcome,
    EventTime,
    AttendanceId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}
