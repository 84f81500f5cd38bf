//! Slack attendance log repository.
//!
//! The (tenant_id, slack_message_ts) unique index makes
//! [`SlackAttendanceLogRepository::claim`] the idempotency gate for inbound
//! messages: exactly one caller wins the insert for a given message.

use chrono::Utc;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
    prelude::DateTimeWithTimeZone, sea_query::OnConflict,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::slack_attendance_log::{
    self, Entity as SlackAttendanceLog, SlackAttendanceEventType, SlackAttendanceOutcome,
};

/// A classified message about to be processed
#[derive(Debug, Clone)]
pub struct NewSlackAttendanceLog {
    pub tenant_id: Uuid,
    pub team_member_id: Uuid,
    pub slack_user_id: String,
    pub slack_message_ts: String,
    pub channel_id: String,
    pub message_text: String,
    pub event_type: SlackAttendanceEventType,
    pub detected_keyword: String,
    pub event_time: DateTimeWithTimeZone,
}

/// Repository for Slack attendance log operations
pub struct SlackAttendanceLogRepository<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> SlackAttendanceLogRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn exists_for_ts(&self, tenant_id: Uuid, ts: &str) -> Result<bool, RepositoryError> {
        let count = SlackAttendanceLog::find()
            .filter(slack_attendance_log::Column::TenantId.eq(tenant_id))
            .filter(slack_attendance_log::Column::SlackMessageTs.eq(ts))
            .count(self.db)
            .await?;

        Ok(count > 0)
    }

    pub async fn find_by_ts(
        &self,
        tenant_id: Uuid,
        ts: &str,
    ) -> Result<Option<slack_attendance_log::Model>, RepositoryError> {
        Ok(SlackAttendanceLog::find()
            .filter(slack_attendance_log::Column::TenantId.eq(tenant_id))
            .filter(slack_attendance_log::Column::SlackMessageTs.eq(ts))
            .one(self.db)
            .await?)
    }

    /// Records the message without an outcome.
    ///
    /// Returns the new log id, or `None` when the message was already claimed.
    pub async fn claim(&self, new: NewSlackAttendanceLog) -> Result<Option<Uuid>, RepositoryError> {
        let id = Uuid::new_v4();
        let model = slack_attendance_log::ActiveModel {
            id: Set(id),
            tenant_id: Set(new.tenant_id),
            team_member_id: Set(new.team_member_id),
            slack_user_id: Set(new.slack_user_id),
            slack_message_ts: Set(new.slack_message_ts),
            channel_id: Set(new.channel_id),
            message_text: Set(new.message_text),
            event_type: Set(new.event_type),
            detected_keyword: Set(new.detected_keyword),
            outcome: Set(None),
            event_time: Set(new.event_time),
            attendance_id: Set(None),
            created_at: Set(Utc::now().into()),
        };

        let inserted = SlackAttendanceLog::insert(model)
            .on_conflict(
                OnConflict::columns([
                    slack_attendance_log::Column::TenantId,
                    slack_attendance_log::Column::SlackMessageTs,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.db)
            .await?;

        Ok((inserted > 0).then_some(id))
    }

    pub async fn record_outcome(
        &self,
        id: Uuid,
        outcome: SlackAttendanceOutcome,
        attendance_id: Option<Uuid>,
    ) -> Result<(), RepositoryError> {
        let changes = slack_attendance_log::ActiveModel {
            outcome: Set(Some(outcome)),
            attendance_id: Set(attendance_id),
            ..Default::default()
        };

        let result = SlackAttendanceLog::update_many()
            .set(changes)
            .filter(slack_attendance_log::Column::Id.eq(id))
            .exec(self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound("Slack attendance log".to_string()));
        }

        Ok(())
    }
}
