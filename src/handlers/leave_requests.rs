//! # Leave Request API Handlers
//!
//! Submission, review and withdrawal of leave requests. Every transition
//! updates the member's balance for the year of `start_date`.

use crate::auth::{OperatorAuth, TenantExtension, TenantHeader};
use crate::error::ApiError;
use crate::handlers::types::{Page, PaginatedResponse};
use crate::leave::{CreateLeaveRequest, LeaveWorkflow};
use crate::models::leave_request::{self, LeaveRequestStatus};
use crate::repositories::leave_request::LeaveRequestFilter;
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

/// Request payload for submitting leave
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateLeaveRequestDto {
    pub team_member_id: Uuid,
    pub leave_type_id: Uuid,
    #[schema(value_type = String, format = Date, example = "2026-03-09")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = Date, example = "2026-03-10")]
    pub end_date: NaiveDate,
    /// Multiple of 0.5, at most the number of calendar days in the range
    #[schema(example = 2.0)]
    pub total_days: f64,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApproveLeaveRequestDto {
    /// Team member recorded as the approver
    pub approver_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RejectLeaveRequestDto {
    #[schema(example = "Release week")]
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LeaveRequestResponse {
    pub id: Uuid,
    #[schema(example = "LR-2026-000001")]
    pub reference: String,
    pub team_member_id: Uuid,
    pub leave_type_id: Uuid,
    #[schema(value_type = String, format = Date)]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = Date)]
    pub end_date: NaiveDate,
    pub total_days: f64,
    pub reason: Option<String>,
    pub status: LeaveRequestStatus,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<String>,
    pub rejection_reason: Option<String>,
    pub cancelled_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<leave_request::Model> for LeaveRequestResponse {
    fn from(model: leave_request::Model) -> Self {
        Self {
            id: model.id,
            reference: model.reference,
            team_member_id: model.team_member_id,
            leave_type_id: model.leave_type_id,
            start_date: model.start_date,
            end_date: model.end_date,
            total_days: model.total_days,
            reason: model.reason,
            status: model.status,
            approved_by: model.approved_by,
            approved_at: model.approved_at.map(|at| at.to_rfc3339()),
            rejection_reason: model.rejection_reason,
            cancelled_at: model.cancelled_at.map(|at| at.to_rfc3339()),
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListLeaveRequestsQuery {
    pub team_member_id: Option<Uuid>,
    pub status: Option<LeaveRequestStatus>,
    /// Only requests starting in this year
    pub year: Option<i32>,
    /// Page number, starting at 1
    pub page: Option<u64>,
    /// Items per page (max 100)
    pub per_page: Option<u64>,
}

/// Submit a leave request
#[utoipa::path(
    post,
    path = "/api/v1/leave-requests",
    security(("bearer_auth" = [])),
    params(TenantHeader),
    request_body = CreateLeaveRequestDto,
    responses(
        (status = 201, description = "Request stored as PENDING", body = LeaveRequestResponse),
        (status = 400, description = "Invalid dates or day count", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Team member or leave type not found", body = ApiError),
        (status = 422, description = "Insufficient leave balance", body = ApiError)
    ),
    tag = "leave"
)]
pub async fn create_leave_request(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    payload: Result<Json<CreateLeaveRequestDto>, JsonRejection>,
) -> Result<(StatusCode, Json<LeaveRequestResponse>), ApiError> {
    let Json(request) = payload?;

    let created = LeaveWorkflow::new(&state.db)
        .create(
            tenant.0,
            CreateLeaveRequest {
                team_member_id: request.team_member_id,
                leave_type_id: request.leave_type_id,
                start_date: request.start_date,
                end_date: request.end_date,
                total_days: request.total_days,
                reason: request.reason,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// List leave requests, newest first
#[utoipa::path(
    get,
    path = "/api/v1/leave-requests",
    security(("bearer_auth" = [])),
    params(TenantHeader, ListLeaveRequestsQuery),
    responses(
        (status = 200, description = "Page of leave requests", body = PaginatedResponse<LeaveRequestResponse>),
        (status = 400, description = "Invalid query parameters", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "leave"
)]
pub async fn list_leave_requests(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    query: Result<Query<ListLeaveRequestsQuery>, QueryRejection>,
) -> Result<Json<PaginatedResponse<LeaveRequestResponse>>, ApiError> {
    let Query(query) = query?;
    let page = Page::from_query(query.page, query.per_page);

    let filter = LeaveRequestFilter {
        team_member_id: query.team_member_id,
        status: query.status,
        year: query.year,
    };

    let (requests, total) = LeaveWorkflow::new(&state.db)
        .list(tenant.0, filter, page.index(), page.per_page)
        .await?;

    Ok(Json(PaginatedResponse::new(
        requests.into_iter().map(Into::into).collect(),
        page,
        total,
    )))
}

/// Get a leave request
#[utoipa::path(
    get,
    path = "/api/v1/leave-requests/{id}",
    security(("bearer_auth" = [])),
    params(
        TenantHeader,
        ("id" = Uuid, Path, description = "Leave request UUID")
    ),
    responses(
        (status = 200, description = "Leave request", body = LeaveRequestResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Leave request not found", body = ApiError)
    ),
    tag = "leave"
)]
pub async fn get_leave_request(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
) -> Result<Json<LeaveRequestResponse>, ApiError> {
    let request = LeaveWorkflow::new(&state.db).get(tenant.0, id).await?;
    Ok(Json(request.into()))
}

/// Delete a leave request and give its days back to the balance
#[utoipa::path(
    delete,
    path = "/api/v1/leave-requests/{id}",
    security(("bearer_auth" = [])),
    params(
        TenantHeader,
        ("id" = Uuid, Path, description = "Leave request UUID")
    ),
    responses(
        (status = 204, description = "Leave request deleted"),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Leave request not found", body = ApiError)
    ),
    tag = "leave"
)]
pub async fn delete_leave_request(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    LeaveWorkflow::new(&state.db).delete(tenant.0, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Approve a pending request
#[utoipa::path(
    post,
    path = "/api/v1/leave-requests/{id}/approve",
    security(("bearer_auth" = [])),
    params(
        TenantHeader,
        ("id" = Uuid, Path, description = "Leave request UUID")
    ),
    request_body = ApproveLeaveRequestDto,
    responses(
        (status = 200, description = "Request approved", body = LeaveRequestResponse),
        (status = 400, description = "Approver is not a team member", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Leave request not found", body = ApiError),
        (status = 409, description = "Request is not pending", body = ApiError)
    ),
    tag = "leave"
)]
pub async fn approve_leave_request(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
    payload: Result<Json<ApproveLeaveRequestDto>, JsonRejection>,
) -> Result<Json<LeaveRequestResponse>, ApiError> {
    let Json(request) = payload?;

    let approved = LeaveWorkflow::new(&state.db)
        .approve(tenant.0, id, request.approver_id)
        .await?;

    Ok(Json(approved.into()))
}

/// Reject a pending request
#[utoipa::path(
    post,
    path = "/api/v1/leave-requests/{id}/reject",
    security(("bearer_auth" = [])),
    params(
        TenantHeader,
        ("id" = Uuid, Path, description = "Leave request UUID")
    ),
    request_body = RejectLeaveRequestDto,
    responses(
        (status = 200, description = "Request rejected", body = LeaveRequestResponse),
        (status = 400, description = "Missing rejection reason", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Leave request not found", body = ApiError),
        (status = 409, description = "Request is not pending", body = ApiError)
    ),
    tag = "leave"
)]
pub async fn reject_leave_request(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
    payload: Result<Json<RejectLeaveRequestDto>, JsonRejection>,
) -> Result<Json<LeaveRequestResponse>, ApiError> {
    let Json(request) = payload?;

    let rejected = LeaveWorkflow::new(&state.db)
        .reject(tenant.0, id, &request.reason)
        .await?;

    Ok(Json(rejected.into()))
}

/// Cancel a pending or approved request
#[utoipa::path(
    post,
    path = "/api/v1/leave-requests/{id}/cancel",
    security(("bearer_auth" = [])),
    params(
        TenantHeader,
        ("id" = Uuid, Path, description = "Leave request UUID")
    ),
    responses(
        (status = 200, description = "Request cancelled", body = LeaveRequestResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Leave request not found", body = ApiError),
        (status = 409, description = "Request is already rejected or cancelled", body = ApiError)
    ),
    tag = "leave"
)]
pub async fn cancel_leave_request(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
) -> Result<Json<LeaveRequestResponse>, ApiError> {
    let cancelled = LeaveWorkflow::new(&state.db).cancel(tenant.0, id).await?;
    Ok(Json(cancelled.into()))
}
