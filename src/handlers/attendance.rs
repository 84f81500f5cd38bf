//! # Attendance API Handlers
//!
//! Operator access to daily attendance records. Slack check-ins land in the
//! same table through the webhook.

use crate::attendance::{AttendanceService, CreateAttendance, UpdateAttendance};
use crate::auth::{OperatorAuth, TenantExtension, TenantHeader};
use crate::error::ApiError;
use crate::models::attendance::{self, AttendanceStatus};
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State, rejection::JsonRejection, rejection::QueryRejection},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateAttendanceRequest {
    pub team_member_id: Uuid,
    #[schema(value_type = String, format = Date, example = "2026-03-02")]
    pub date: NaiveDate,
    #[schema(example = "09:00")]
    pub check_in: Option<String>,
    #[schema(example = "18:30")]
    pub check_out: Option<String>,
    #[serde(default)]
    pub status: AttendanceStatus,
    pub notes: Option<String>,
}

/// Fields left out are not changed
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateAttendanceRequest {
    #[schema(example = "09:15")]
    pub check_in: Option<String>,
    #[schema(example = "17:45")]
    pub check_out: Option<String>,
    pub status: Option<AttendanceStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AttendanceResponse {
    pub id: Uuid,
    pub team_member_id: Uuid,
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub status: AttendanceStatus,
    pub working_hours: f64,
    pub overtime_hours: f64,
    pub notes: Option<String>,
}

impl From<attendance::Model> for AttendanceResponse {
    fn from(model: attendance::Model) -> Self {
        Self {
            id: model.id,
            team_member_id: model.team_member_id,
            date: model.date,
            check_in: model.check_in,
            check_out: model.check_out,
            status: model.status,
            working_hours: model.working_hours,
            overtime_hours: model.overtime_hours,
            notes: model.notes,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListAttendanceQuery {
    pub team_member_id: Uuid,
    /// First day, inclusive
    #[param(value_type = String, format = Date)]
    pub from: NaiveDate,
    /// Last day, inclusive
    #[param(value_type = String, format = Date)]
    pub to: NaiveDate,
}

/// Record a day of attendance
#[utoipa::path(
    post,
    path = "/api/v1/attendance",
    security(("bearer_auth" = [])),
    params(TenantHeader),
    request_body = CreateAttendanceRequest,
    responses(
        (status = 201, description = "Attendance recorded", body = AttendanceResponse),
        (status = 400, description = "Malformed time or notes", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Team member not found", body = ApiError),
        (status = 409, description = "A record already exists for this day", body = ApiError)
    ),
    tag = "attendance"
)]
pub async fn create_attendance(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    payload: Result<Json<CreateAttendanceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AttendanceResponse>), ApiError> {
    let Json(request) = payload?;

    let record = AttendanceService::new(&state.db, state.config.attendance.standard_hours)
        .create(
            tenant.0,
            CreateAttendance {
                team_member_id: request.team_member_id,
                date: request.date,
                check_in: request.check_in,
                check_out: request.check_out,
                status: request.status,
                notes: request.notes,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(record.into())))
}

/// List a member's attendance over a date range
#[utoipa::path(
    get,
    path = "/api/v1/attendance",
    security(("bearer_auth" = [])),
    params(TenantHeader, ListAttendanceQuery),
    responses(
        (status = 200, description = "Records ordered by date", body = Vec<AttendanceResponse>),
        (status = 400, description = "Invalid range", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Team member not found", body = ApiError)
    ),
    tag = "attendance"
)]
pub async fn list_attendance(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    query: Result<Query<ListAttendanceQuery>, QueryRejection>,
) -> Result<Json<Vec<AttendanceResponse>>, ApiError> {
    let Query(query) = query?;

    let records = AttendanceService::new(&state.db, state.config.attendance.standard_hours)
        .list(tenant.0, query.team_member_id, query.from, query.to)
        .await?;

    Ok(Json(records.into_iter().map(Into::into).collect()))
}

/// Update times, status or notes of a record
#[utoipa::path(
    patch,
    path = "/api/v1/attendance/{id}",
    security(("bearer_auth" = [])),
    params(
        TenantHeader,
        ("id" = Uuid, Path, description = "Attendance record UUID")
    ),
    request_body = UpdateAttendanceRequest,
    responses(
        (status = 200, description = "Updated record with recomputed hours", body = AttendanceResponse),
        (status = 400, description = "Malformed time or notes", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Attendance record not found", body = ApiError)
    ),
    tag = "attendance"
)]
pub async fn update_attendance(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateAttendanceRequest>, JsonRejection>,
) -> Result<Json<AttendanceResponse>, ApiError> {
    let Json(request) = payload?;

    let record = AttendanceService::new(&state.db, state.config.attendance.standard_hours)
        .update(
            tenant.0,
            id,
            UpdateAttendance {
                check_in: request.check_in,
                check_out: request.check_out,
                status: request.status,
                notes: request.notes,
            },
        )
        .await?;

    Ok(Json(record.into()))
}
