//! # Attendance
//!
//! Daily check-in/check-out records and the hours arithmetic behind them.
//! [`slack`] turns channel messages into the same records.

pub mod slack;
pub mod slack_client;

use std::sync::LazyLock;

use axum::http::StatusCode;
use chrono::NaiveDate;
use regex::Regex;
use sea_orm::{ConnectionTrait, IntoActiveModel, Set};
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, RepositoryError, validation_error};
use crate::leave::quota::round2;
use crate::models::attendance::{self, AttendanceStatus};
use crate::repositories::attendance::NewAttendance;
use crate::repositories::{AttendanceRepository, TeamMemberRepository};

pub use slack::{BridgeOutcome, SlackAttendanceBridge};
pub use slack_client::{NoopSlackClient, SlackApi, SlackClientError, SlackWebClient};

/// Regular hours per day unless configured otherwise
pub const DEFAULT_STANDARD_HOURS: f64 = 8.0;

const MAX_NOTES_LEN: usize = 500;

static TIME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$").expect("valid HH:mm pattern"));

#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{field} must be a time in HH:mm format, got '{value}'")]
    InvalidTime { field: &'static str, value: String },

    #[error("{message}")]
    Validation { field: &'static str, message: String },
}

impl From<sea_orm::DbErr> for AttendanceError {
    fn from(error: sea_orm::DbErr) -> Self {
        Self::Repository(RepositoryError::Database(error))
    }
}

impl From<AttendanceError> for ApiError {
    fn from(error: AttendanceError) -> Self {
        match error {
            AttendanceError::Repository(err) => err.into(),
            AttendanceError::NotFound(entity) => ApiError::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{} not found", entity),
            ),
            AttendanceError::InvalidTime { field, .. } => {
                let message = format!("{field} must be a time in HH:mm format");
                validation_error(&message, serde_json::json!({ field: message.clone() }))
            }
            AttendanceError::Validation { field, message } => {
                validation_error(&message, serde_json::json!({ field: message.clone() }))
            }
        }
    }
}

/// Regular and overtime hours for one day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct WorkingHours {
    pub working_hours: f64,
    pub overtime_hours: f64,
}

impl WorkingHours {
    pub const ZERO: WorkingHours = WorkingHours {
        working_hours: 0.0,
        overtime_hours: 0.0,
    };
}

/// Minutes since midnight for an `HH:mm` string.
pub fn parse_time(field: &'static str, value: &str) -> Result<u32, AttendanceError> {
    let captures = TIME_PATTERN
        .captures(value)
        .ok_or_else(|| AttendanceError::InvalidTime {
            field,
            value: value.to_string(),
        })?;

    let hours: u32 = captures[1].parse().map_err(|_| AttendanceError::InvalidTime {
        field,
        value: value.to_string(),
    })?;
    let minutes: u32 = captures[2].parse().map_err(|_| AttendanceError::InvalidTime {
        field,
        value: value.to_string(),
    })?;

    Ok(hours * 60 + minutes)
}

/// Hours between two `HH:mm` times with an eight hour regular day.
pub fn calculate_working_hours(
    check_in: &str,
    check_out: &str,
) -> Result<WorkingHours, AttendanceError> {
    calculate_working_hours_with(check_in, check_out, DEFAULT_STANDARD_HOURS)
}

/// Hours between two `HH:mm` times.
///
/// Regular hours are capped at `standard_hours` and the remainder is overtime.
/// A check-out before the check-in yields zero for both; shifts crossing
/// midnight are not supported.
pub fn calculate_working_hours_with(
    check_in: &str,
    check_out: &str,
    standard_hours: f64,
) -> Result<WorkingHours, AttendanceError> {
    let start = parse_time("check_in", check_in)?;
    let end = parse_time("check_out", check_out)?;

    if end < start {
        return Ok(WorkingHours::ZERO);
    }

    let elapsed = f64::from(end - start) / 60.0;
    Ok(WorkingHours {
        working_hours: round2(elapsed.min(standard_hours)),
        overtime_hours: round2((elapsed - standard_hours).max(0.0)),
    })
}

/// Operator input for a new attendance record
#[derive(Debug, Clone)]
pub struct CreateAttendance {
    pub team_member_id: Uuid,
    pub date: NaiveDate,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
}

/// Partial update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateAttendance {
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub status: Option<AttendanceStatus>,
    pub notes: Option<String>,
}

/// Attendance record operations
pub struct AttendanceService<'a, C> {
    db: &'a C,
    standard_hours: f64,
}

impl<'a, C: ConnectionTrait> AttendanceService<'a, C> {
    pub fn new(db: &'a C, standard_hours: f64) -> Self {
        Self { db, standard_hours }
    }

    /// Creates a record. A second record for the same member and day is a conflict.
    pub async fn create(
        &self,
        tenant_id: Uuid,
        input: CreateAttendance,
    ) -> Result<attendance::Model, AttendanceError> {
        if let Some(time) = &input.check_in {
            parse_time("check_in", time)?;
        }
        if let Some(time) = &input.check_out {
            parse_time("check_out", time)?;
        }
        let notes = normalize_notes(input.notes)?;

        self.member(tenant_id, input.team_member_id).await?;

        let hours = self.hours_for(input.check_in.as_deref(), input.check_out.as_deref())?;

        let record = AttendanceRepository::new(self.db)
            .insert(NewAttendance {
                tenant_id,
                team_member_id: input.team_member_id,
                date: input.date,
                check_in: input.check_in,
                check_out: input.check_out,
                status: input.status,
                working_hours: hours.working_hours,
                overtime_hours: hours.overtime_hours,
                notes,
            })
            .await?;

        info!(
            tenant_id = %tenant_id,
            attendance_id = %record.id,
            team_member_id = %record.team_member_id,
            date = %record.date,
            "Attendance recorded"
        );

        Ok(record)
    }

    /// Applies the given fields and recomputes hours when both times are set afterwards.
    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        changes: UpdateAttendance,
    ) -> Result<attendance::Model, AttendanceError> {
        let repo = AttendanceRepository::new(self.db);
        let existing = repo
            .find_by_id(tenant_id, id)
            .await?
            .ok_or(AttendanceError::NotFound("Attendance"))?;

        if let Some(time) = &changes.check_in {
            parse_time("check_in", time)?;
        }
        if let Some(time) = &changes.check_out {
            parse_time("check_out", time)?;
        }

        let check_in = changes.check_in.or_else(|| existing.check_in.clone());
        let check_out = changes.check_out.or_else(|| existing.check_out.clone());

        let mut model = existing.clone().into_active_model();
        model.check_in = Set(check_in.clone());
        model.check_out = Set(check_out.clone());
        if let Some(status) = changes.status {
            model.status = Set(status);
        }
        if changes.notes.is_some() {
            model.notes = Set(normalize_notes(changes.notes)?);
        }
        if let (Some(check_in), Some(check_out)) = (check_in.as_deref(), check_out.as_deref()) {
            let hours = calculate_working_hours_with(check_in, check_out, self.standard_hours)?;
            model.working_hours = Set(hours.working_hours);
            model.overtime_hours = Set(hours.overtime_hours);
        }

        Ok(repo.update(model).await?)
    }

    /// Returns the member's record for `date`, creating an empty PRESENT one if needed.
    pub async fn get_or_create_for_day(
        &self,
        tenant_id: Uuid,
        team_member_id: Uuid,
        date: NaiveDate,
    ) -> Result<(attendance::Model, bool), AttendanceError> {
        self.member(tenant_id, team_member_id).await?;

        Ok(AttendanceRepository::new(self.db)
            .insert_if_missing(NewAttendance {
                tenant_id,
                team_member_id,
                date,
                check_in: None,
                check_out: None,
                status: AttendanceStatus::Present,
                working_hours: 0.0,
                overtime_hours: 0.0,
                notes: None,
            })
            .await?)
    }

    /// Records of one member between two dates, both inclusive.
    pub async fn list(
        &self,
        tenant_id: Uuid,
        team_member_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<attendance::Model>, AttendanceError> {
        if from > to {
            return Err(AttendanceError::Validation {
                field: "to",
                message: "to must not be before from".to_string(),
            });
        }

        Ok(AttendanceRepository::new(self.db)
            .list_for_member(tenant_id, team_member_id, from, to)
            .await?)
    }

    /// Inserts the day's PRESENT row with `check_in`, or returns the existing row untouched.
    ///
    /// The flag is `true` when this call created the row.
    pub async fn record_check_in(
        &self,
        tenant_id: Uuid,
        team_member_id: Uuid,
        date: NaiveDate,
        time: &str,
    ) -> Result<(attendance::Model, bool), AttendanceError> {
        parse_time("check_in", time)?;

        Ok(AttendanceRepository::new(self.db)
            .insert_if_missing(NewAttendance {
                tenant_id,
                team_member_id,
                date,
                check_in: Some(time.to_string()),
                check_out: None,
                status: AttendanceStatus::Present,
                working_hours: 0.0,
                overtime_hours: 0.0,
                notes: None,
            })
            .await?)
    }

    /// Sets `check_out` on a day that has a check-in and recomputes the hours.
    ///
    /// Returns `None` when there is nothing to check out of.
    pub async fn record_check_out(
        &self,
        team_member_id: Uuid,
        date: NaiveDate,
        time: &str,
    ) -> Result<Option<attendance::Model>, AttendanceError> {
        parse_time("check_out", time)?;

        let repo = AttendanceRepository::new(self.db);
        let Some(existing) = repo.find_for_day(team_member_id, date).await? else {
            return Ok(None);
        };
        let Some(check_in) = existing.check_in.clone() else {
            return Ok(None);
        };

        let hours = calculate_working_hours_with(&check_in, time, self.standard_hours)?;
        let mut model = existing.into_active_model();
        model.check_out = Set(Some(time.to_string()));
        model.working_hours = Set(hours.working_hours);
        model.overtime_hours = Set(hours.overtime_hours);

        Ok(Some(repo.update(model).await?))
    }

    fn hours_for(
        &self,
        check_in: Option<&str>,
        check_out: Option<&str>,
    ) -> Result<WorkingHours, AttendanceError> {
        match (check_in, check_out) {
            (Some(check_in), Some(check_out)) => {
                calculate_working_hours_with(check_in, check_out, self.standard_hours)
            }
            _ => Ok(WorkingHours::ZERO),
        }
    }

    async fn member(&self, tenant_id: Uuid, team_member_id: Uuid) -> Result<(), AttendanceError> {
        TeamMemberRepository::new(self.db)
            .find_by_id(tenant_id, team_member_id)
            .await?
            .ok_or(AttendanceError::NotFound("Team member"))?;
        Ok(())
    }
}

fn normalize_notes(notes: Option<String>) -> Result<Option<String>, AttendanceError> {
    let notes = notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
    if let Some(notes) = &notes
        && notes.chars().count() > MAX_NOTES_LEN
    {
        return Err(AttendanceError::Validation {
            field: "notes",
            message: format!("notes cannot exceed {MAX_NOTES_LEN} characters"),
        });
    }
    Ok(notes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nine_hour_day_has_one_hour_overtime() {
        assert_eq!(
            calculate_working_hours("09:00", "18:00").unwrap(),
            WorkingHours {
                working_hours: 8.0,
                overtime_hours: 1.0
            }
        );
    }

    #[test]
    fn eight_hour_day_has_no_overtime() {
        assert_eq!(
            calculate_working_hours("09:00", "17:00").unwrap(),
            WorkingHours {
                working_hours: 8.0,
                overtime_hours: 0.0
            }
        );
    }

    #[test]
    fn short_day_is_rounded_to_two_decimals() {
        // 4h20m
        let hours = calculate_working_hours("09:10", "13:30").unwrap();
        assert_eq!(hours.working_hours, 4.33);
        assert_eq!(hours.overtime_hours, 0.0);
    }

    #[test]
    fn check_out_before_check_in_is_zero() {
        assert_eq!(
            calculate_working_hours("09:00", "08:00").unwrap(),
            WorkingHours::ZERO
        );
    }

    #[test]
    fn standard_hours_are_configurable() {
        let hours = calculate_working_hours_with("08:00", "16:30", 7.5).unwrap();
        assert_eq!(hours.working_hours, 7.5);
        assert_eq!(hours.overtime_hours, 1.0);
    }

    #[test]
    fn malformed_times_are_rejected() {
        for bad in ["9:00", "24:00", "12:60", "noon", "12:00:00", ""] {
            let err = calculate_working_hours(bad, "18:00").unwrap_err();
            assert!(
                matches!(err, AttendanceError::InvalidTime { field: "check_in", .. }),
                "{bad} should be rejected"
            );
        }
        assert!(matches!(
            calculate_working_hours("09:00", "7pm").unwrap_err(),
            AttendanceError::InvalidTime {
                field: "check_out",
                ..
            }
        ));
    }

    #[test]
    fn invalid_time_maps_to_field_level_validation() {
        let api: ApiError = AttendanceError::InvalidTime {
            field: "check_in",
            value: "25:00".to_string(),
        }
        .into();

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(&*api.code, "VALIDATION_FAILED");
        assert_eq!(
            api.details.unwrap()["check_in"],
            "check_in must be a time in HH:mm format"
        );
    }

    #[test]
    fn long_notes_are_rejected() {
        assert!(normalize_notes(Some("n".repeat(MAX_NOTES_LEN + 1))).is_err());
        assert_eq!(normalize_notes(Some("  ".to_string())).unwrap(), None);
    }
}
