//! # Leave Balance API Handlers
//!
//! Read access to a member's ledger plus the manual recalculation and
//! carry-forward entry points.

use crate::auth::{OperatorAuth, TenantExtension, TenantHeader};
use crate::error::ApiError;
use crate::leave::{AvailabilityCheck, LeaveLedger, LeaveWorkflow};
use crate::models::leave_balance;
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State, rejection::JsonRejection, rejection::QueryRejection},
    response::Json,
};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// One (member, leave type, year) ledger row
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LeaveBalanceResponse {
    pub id: Uuid,
    pub team_member_id: Uuid,
    pub leave_type_id: Uuid,
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 12.0)]
    pub total_quota: f64,
    pub used: f64,
    pub pending: f64,
    /// `max(0, total_quota + carry_forward - used - pending)`
    pub available: f64,
    pub carry_forward: f64,
}

impl From<leave_balance::Model> for LeaveBalanceResponse {
    fn from(model: leave_balance::Model) -> Self {
        Self {
            id: model.id,
            team_member_id: model.team_member_id,
            leave_type_id: model.leave_type_id,
            year: model.year,
            total_quota: model.total_quota,
            used: model.used,
            pending: model.pending,
            available: model.available,
            carry_forward: model.carry_forward,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BalanceYearQuery {
    /// Ledger year, defaults to the current year
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AvailabilityQuery {
    pub leave_type_id: Uuid,
    /// Requested number of days
    pub days: f64,
    /// Ledger year, defaults to the current year
    pub year: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecalculateRequest {
    pub leave_type_id: Uuid,
    /// Defaults to the current year
    pub year: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CarryForwardRequest {
    pub leave_type_id: Uuid,
    /// Year whose unused days roll into `from_year + 1`
    #[schema(example = 2025)]
    pub from_year: i32,
}

fn current_year() -> i32 {
    Utc::now().year()
}

/// List a member's balances for a year, opening missing ones
#[utoipa::path(
    get,
    path = "/api/v1/team-members/{id}/leave-balances",
    security(("bearer_auth" = [])),
    params(
        TenantHeader,
        ("id" = Uuid, Path, description = "Team member UUID"),
        BalanceYearQuery
    ),
    responses(
        (status = 200, description = "Balances per leave type", body = Vec<LeaveBalanceResponse>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Team member not found", body = ApiError)
    ),
    tag = "leave"
)]
pub async fn list_leave_balances(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
    query: Result<Query<BalanceYearQuery>, QueryRejection>,
) -> Result<Json<Vec<LeaveBalanceResponse>>, ApiError> {
    let Query(query) = query?;
    let year = query.year.unwrap_or_else(current_year);

    let balances = LeaveLedger::new(&state.db)
        .balances_for_member(tenant.0, id, year)
        .await?;

    Ok(Json(balances.into_iter().map(Into::into).collect()))
}

/// Rebuild one balance from the member's leave requests
#[utoipa::path(
    post,
    path = "/api/v1/team-members/{id}/leave-balances/recalculate",
    security(("bearer_auth" = [])),
    params(
        TenantHeader,
        ("id" = Uuid, Path, description = "Team member UUID")
    ),
    request_body = RecalculateRequest,
    responses(
        (status = 200, description = "Recomputed balance", body = LeaveBalanceResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Team member or leave type not found", body = ApiError)
    ),
    tag = "leave"
)]
pub async fn recalculate_leave_balance(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
    payload: Result<Json<RecalculateRequest>, JsonRejection>,
) -> Result<Json<LeaveBalanceResponse>, ApiError> {
    let Json(request) = payload?;
    let year = request.year.unwrap_or_else(current_year);

    let balance = LeaveWorkflow::new(&state.db)
        .recalculate_balance(tenant.0, id, request.leave_type_id, year)
        .await?;

    Ok(Json(balance.into()))
}

/// Roll unused days of `from_year` into the next year
#[utoipa::path(
    post,
    path = "/api/v1/team-members/{id}/leave-balances/carry-forward",
    security(("bearer_auth" = [])),
    params(
        TenantHeader,
        ("id" = Uuid, Path, description = "Team member UUID")
    ),
    request_body = CarryForwardRequest,
    responses(
        (status = 200, description = "Opening balance of the next year", body = LeaveBalanceResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Team member or leave type not found", body = ApiError)
    ),
    tag = "leave"
)]
pub async fn apply_carry_forward(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
    payload: Result<Json<CarryForwardRequest>, JsonRejection>,
) -> Result<Json<LeaveBalanceResponse>, ApiError> {
    let Json(request) = payload?;

    let balance = LeaveWorkflow::new(&state.db)
        .apply_carry_forward(tenant.0, id, request.leave_type_id, request.from_year)
        .await?;

    Ok(Json(balance.into()))
}

/// Check whether a member can take a number of days
#[utoipa::path(
    get,
    path = "/api/v1/team-members/{id}/leave-availability",
    security(("bearer_auth" = [])),
    params(
        TenantHeader,
        ("id" = Uuid, Path, description = "Team member UUID"),
        AvailabilityQuery
    ),
    responses(
        (status = 200, description = "Availability, including the shortfall when insufficient", body = AvailabilityCheck),
        (status = 400, description = "Invalid day count", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Team member or leave type not found", body = ApiError)
    ),
    tag = "leave"
)]
pub async fn check_leave_availability(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
    query: Result<Query<AvailabilityQuery>, QueryRejection>,
) -> Result<Json<AvailabilityCheck>, ApiError> {
    let Query(query) = query?;

    let check = LeaveLedger::new(&state.db)
        .check_availability(tenant.0, id, query.leave_type_id, query.days, query.year)
        .await?;

    Ok(Json(check))
}
