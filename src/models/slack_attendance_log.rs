//! # Slack Attendance Log Model
//!
//! Audit and idempotency record for inbound Slack messages that classified as
//! a check-in or check-out. The (tenant_id, slack_message_ts) pair is unique.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "slack_attendance_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub team_member_id: Uuid,
    pub slack_user_id: String,
    pub slack_message_ts: String,
    pub channel_id: String,
    pub message_text: String,
    pub event_type: SlackAttendanceEventType,
    pub detected_keyword: String,
    /// Which branch fired; `None` only while the claiming transaction is open
    pub outcome: Option<SlackAttendanceOutcome>,
    pub event_time: DateTimeWithTimeZone,
    pub attendance_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlackAttendanceEventType {
    #[sea_orm(string_value = "CHECK_IN")]
    CheckIn,
    #[sea_orm(string_value = "CHECK_OUT")]
    CheckOut,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlackAttendanceOutcome {
    #[sea_orm(string_value = "CHECKED_IN")]
    CheckedIn,
    #[sea_orm(string_value = "ALREADY_CHECKED_IN")]
    AlreadyCheckedIn,
    #[sea_orm(string_value = "CHECKED_OUT")]
    CheckedOut,
    #[sea_orm(string_value = "CHECK_OUT_WITHOUT_CHECK_IN")]
    CheckOutWithoutCheckIn,
}

impl SlackAttendanceOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlackAttendanceOutcome::CheckedIn => "checked_in",
            SlackAttendanceOutcome::AlreadyCheckedIn => "already_checked_in",
            SlackAttendanceOutcome::CheckedOut => "checked_out",
            SlackAttendanceOutcome::CheckOutWithoutCheckIn => "check_out_without_check_in",
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
