//! # Slack Attendance Bridge
//!
//! Classifies channel messages as check-ins or check-outs and applies them to
//! the attendance store. Each message is processed at most once: the log row
//! keyed by (tenant, message ts) is claimed in the same transaction that
//! touches the attendance record.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate};
use metrics::counter;
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Deserialize;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::slack_client::SlackApi;
use super::{AttendanceError, AttendanceService};
use crate::config::{AttendanceConfig, SlackConfig};
use crate::models::slack_attendance_log::{SlackAttendanceEventType, SlackAttendanceOutcome};
use crate::repositories::slack_attendance_log::NewSlackAttendanceLog;
use crate::repositories::{SlackAttendanceLogRepository, TeamMemberRepository};

/// Outer Events API payload
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlackEnvelope {
    UrlVerification {
        challenge: String,
    },
    EventCallback {
        event: SlackMessageEvent,
    },
    #[serde(other)]
    Other,
}

/// Inner event; only `message` events carry attendance signals
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlackMessageEvent {
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub bot_id: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub ts: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
}

/// Why a message produced no attendance change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NotAMessage,
    BotMessage,
    Subtype,
    MissingFields,
    OtherChannel,
    Duplicate,
    UnknownUser,
    NoKeyword,
    InvalidTimestamp,
}

impl IgnoreReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            IgnoreReason::NotAMessage => "not_a_message",
            IgnoreReason::BotMessage => "bot_message",
            IgnoreReason::Subtype => "subtype",
            IgnoreReason::MissingFields => "missing_fields",
            IgnoreReason::OtherChannel => "other_channel",
            IgnoreReason::Duplicate => "duplicate",
            IgnoreReason::UnknownUser => "unknown_user",
            IgnoreReason::NoKeyword => "no_keyword",
            IgnoreReason::InvalidTimestamp => "invalid_timestamp",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeOutcome {
    Ignored(IgnoreReason),
    Processed {
        log_id: Uuid,
        outcome: SlackAttendanceOutcome,
        attendance_id: Option<Uuid>,
    },
}

impl BridgeOutcome {
    fn label(&self) -> &'static str {
        match self {
            BridgeOutcome::Ignored(reason) => reason.as_str(),
            BridgeOutcome::Processed { outcome, .. } => outcome.as_str(),
        }
    }
}

/// Matches `text` against the keyword lists, check-out first.
///
/// Matching is a case-insensitive substring test; the first keyword that
/// matches wins and is returned alongside the event type.
pub fn classify(
    text: &str,
    check_in_keywords: &[String],
    check_out_keywords: &[String],
) -> Option<(SlackAttendanceEventType, String)> {
    let text = text.to_lowercase();
    let find = |keywords: &[String]| {
        keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .find(|k| !k.is_empty() && text.contains(k.as_str()))
    };

    if let Some(keyword) = find(check_out_keywords) {
        return Some((SlackAttendanceEventType::CheckOut, keyword));
    }
    find(check_in_keywords).map(|keyword| (SlackAttendanceEventType::CheckIn, keyword))
}

/// Local time of a message: its `ts` (Unix seconds with a fractional part)
/// shifted by `utc_offset_minutes`.
pub fn event_time(ts: &str, utc_offset_minutes: i32) -> Option<DateTime<FixedOffset>> {
    let seconds: i64 = ts.split('.').next()?.parse().ok()?;
    let offset = FixedOffset::east_opt(utc_offset_minutes.checked_mul(60)?)?;
    DateTime::from_timestamp(seconds, 0).map(|utc| utc.with_timezone(&offset))
}

fn day_and_time(time: &DateTime<FixedOffset>) -> (NaiveDate, String) {
    (time.date_naive(), time.format("%H:%M").to_string())
}

fn reaction_for(outcome: SlackAttendanceOutcome) -> &'static str {
    match outcome {
        SlackAttendanceOutcome::CheckedIn => "white_check_mark",
        SlackAttendanceOutcome::AlreadyCheckedIn => "ballot_box_with_check",
        SlackAttendanceOutcome::CheckedOut => "wave",
        SlackAttendanceOutcome::CheckOutWithoutCheckIn => "warning",
    }
}

/// Applies Slack messages to the attendance store for one tenant
pub struct SlackAttendanceBridge<'a> {
    db: &'a DatabaseConnection,
    slack: &'a SlackConfig,
    attendance: &'a AttendanceConfig,
    client: Arc<dyn SlackApi>,
}

impl<'a> SlackAttendanceBridge<'a> {
    pub fn new(
        db: &'a DatabaseConnection,
        slack: &'a SlackConfig,
        attendance: &'a AttendanceConfig,
        client: Arc<dyn SlackApi>,
    ) -> Self {
        Self {
            db,
            slack,
            attendance,
            client,
        }
    }

    /// Processes one message event and acknowledges it in the background.
    pub async fn handle_event(
        &self,
        tenant_id: Uuid,
        event: &SlackMessageEvent,
    ) -> Result<BridgeOutcome, AttendanceError> {
        let outcome = self.process(tenant_id, event).await?;

        counter!("slack_attendance_events_total", "outcome" => outcome.label()).increment(1);

        if let (BridgeOutcome::Processed { outcome: result, .. }, Some(channel), Some(ts)) =
            (&outcome, event.channel.clone(), event.ts.clone())
        {
            let client = Arc::clone(&self.client);
            let result = *result;
            tokio::spawn(async move {
                acknowledge(client.as_ref(), &channel, &ts, result).await;
            });
        }

        Ok(outcome)
    }

    async fn process(
        &self,
        tenant_id: Uuid,
        event: &SlackMessageEvent,
    ) -> Result<BridgeOutcome, AttendanceError> {
        if event.event_type != "message" {
            return Ok(BridgeOutcome::Ignored(IgnoreReason::NotAMessage));
        }
        if event.bot_id.is_some() || event.subtype.as_deref() == Some("bot_message") {
            return Ok(BridgeOutcome::Ignored(IgnoreReason::BotMessage));
        }
        if event.subtype.is_some() {
            return Ok(BridgeOutcome::Ignored(IgnoreReason::Subtype));
        }

        let (Some(user), Some(text), Some(ts), Some(channel)) = (
            event.user.as_deref(),
            event.text.as_deref(),
            event.ts.as_deref(),
            event.channel.as_deref(),
        ) else {
            return Ok(BridgeOutcome::Ignored(IgnoreReason::MissingFields));
        };

        if let Some(expected) = self.slack.attendance_channel_id.as_deref()
            && expected != channel
        {
            debug!(tenant_id = %tenant_id, channel, "Ignoring message outside the attendance channel");
            return Ok(BridgeOutcome::Ignored(IgnoreReason::OtherChannel));
        }

        let logs = SlackAttendanceLogRepository::new(self.db);
        if logs.exists_for_ts(tenant_id, ts).await? {
            debug!(tenant_id = %tenant_id, ts, "Slack message already processed");
            return Ok(BridgeOutcome::Ignored(IgnoreReason::Duplicate));
        }

        let Some(member) = TeamMemberRepository::new(self.db)
            .find_active_by_slack_user_id(tenant_id, user)
            .await?
        else {
            debug!(tenant_id = %tenant_id, slack_user_id = user, "No team member linked to Slack user");
            return Ok(BridgeOutcome::Ignored(IgnoreReason::UnknownUser));
        };

        let Some((event_type, keyword)) =
            classify(text, &self.slack.check_in_keywords, &self.slack.check_out_keywords)
        else {
            return Ok(BridgeOutcome::Ignored(IgnoreReason::NoKeyword));
        };

        let Some(time) = event_time(ts, self.attendance.utc_offset_minutes) else {
            return Ok(BridgeOutcome::Ignored(IgnoreReason::InvalidTimestamp));
        };
        let (date, clock) = day_and_time(&time);

        let txn = self.db.begin().await?;

        let Some(log_id) = SlackAttendanceLogRepository::new(&txn)
            .claim(NewSlackAttendanceLog {
                tenant_id,
                team_member_id: member.id,
                slack_user_id: user.to_string(),
                slack_message_ts: ts.to_string(),
                channel_id: channel.to_string(),
                message_text: text.to_string(),
                event_type,
                detected_keyword: keyword.clone(),
                event_time: time,
            })
            .await?
        else {
            txn.rollback().await?;
            return Ok(BridgeOutcome::Ignored(IgnoreReason::Duplicate));
        };

        let service = AttendanceService::new(&txn, self.attendance.standard_hours);
        let (outcome, attendance_id) = match event_type {
            SlackAttendanceEventType::CheckIn => {
                let (record, created) = service
                    .record_check_in(tenant_id, member.id, date, &clock)
                    .await?;
                let outcome = if created {
                    SlackAttendanceOutcome::CheckedIn
                } else {
                    SlackAttendanceOutcome::AlreadyCheckedIn
                };
                (outcome, Some(record.id))
            }
            SlackAttendanceEventType::CheckOut => {
                match service.record_check_out(member.id, date, &clock).await? {
                    Some(record) => (SlackAttendanceOutcome::CheckedOut, Some(record.id)),
                    None => (SlackAttendanceOutcome::CheckOutWithoutCheckIn, None),
                }
            }
        };

        SlackAttendanceLogRepository::new(&txn)
            .record_outcome(log_id, outcome, attendance_id)
            .await?;

        txn.commit().await?;

        info!(
            tenant_id = %tenant_id,
            team_member_id = %member.id,
            slack_message_ts = ts,
            keyword = %keyword,
            outcome = outcome.as_str(),
            date = %date,
            time = %clock,
            "Slack attendance message processed"
        );

        Ok(BridgeOutcome::Processed {
            log_id,
            outcome,
            attendance_id,
        })
    }
}

/// Reacts to the source message and, for a check-out with no check-in,
/// explains in a thread reply. Failures are only logged.
pub async fn acknowledge(
    client: &dyn SlackApi,
    channel: &str,
    ts: &str,
    outcome: SlackAttendanceOutcome,
) {
    if let Err(e) = client.add_reaction(channel, ts, reaction_for(outcome)).await {
        error!(channel, ts, error = %e, "Failed to add attendance reaction");
    }

    if outcome == SlackAttendanceOutcome::CheckOutWithoutCheckIn
        && let Err(e) = client
            .post_message(
                channel,
                "No check-in found for today, so this check-out was not recorded.",
                Some(ts),
            )
            .await
    {
        error!(channel, ts, error = %e, "Failed to post check-out reply");
    }
}
