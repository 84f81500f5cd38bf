//! # Team Directory API Handlers
//!
//! Job roles, team members and the Slack user mapping used by the attendance bridge.

use crate::auth::{OperatorAuth, TenantExtension, TenantHeader};
use crate::error::{ApiError, not_found};
use crate::handlers::leave_balances::LeaveBalanceResponse;
use crate::leave::LeaveLedger;
use crate::models::{job_role, team_member};
use crate::repositories::team_member::NewTeamMember;
use crate::repositories::{JobRoleRepository, TeamMemberRepository};
use crate::server::AppState;
use axum::{
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::TransactionTrait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateJobRoleRequest {
    #[schema(example = "Software Engineer")]
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JobRoleResponse {
    pub id: Uuid,
    #[schema(example = "Software Engineer")]
    pub title: String,
    pub is_active: bool,
}

impl From<job_role::Model> for JobRoleResponse {
    fn from(model: job_role::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            is_active: model.is_active,
        }
    }
}

/// Request payload for onboarding a team member
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTeamMemberRequest {
    #[schema(example = "Ada Lovelace")]
    pub full_name: String,
    #[schema(example = "ada@example.com")]
    pub email: Option<String>,
    /// Matched against job role titles to find the member's leave policies
    #[schema(example = "Software Engineer")]
    pub job_title: String,
    #[schema(value_type = String, format = Date, example = "2026-07-01")]
    pub joined_date: NaiveDate,
    /// Slack user id (e.g. `U012AB3CD`) for the attendance bridge
    pub slack_user_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TeamMemberResponse {
    pub id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub job_title: String,
    #[schema(value_type = String, format = Date)]
    pub joined_date: NaiveDate,
    pub slack_user_id: Option<String>,
    pub is_active: bool,
    /// Opening balances, only present on creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leave_balances: Option<Vec<LeaveBalanceResponse>>,
}

impl From<team_member::Model> for TeamMemberResponse {
    fn from(model: team_member::Model) -> Self {
        Self {
            id: model.id,
            full_name: model.full_name,
            email: model.email,
            job_title: model.job_title,
            joined_date: model.joined_date,
            slack_user_id: model.slack_user_id,
            is_active: model.is_active,
            leave_balances: None,
        }
    }
}

/// Links, replaces or clears (`null`) a member's Slack user id
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LinkSlackUserRequest {
    #[schema(example = "U012AB3CD")]
    pub slack_user_id: Option<String>,
}

/// Create a job role
#[utoipa::path(
    post,
    path = "/api/v1/job-roles",
    security(("bearer_auth" = [])),
    params(TenantHeader),
    request_body = CreateJobRoleRequest,
    responses(
        (status = 201, description = "Job role created", body = JobRoleResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 409, description = "A role with this title already exists", body = ApiError)
    ),
    tag = "directory"
)]
pub async fn create_job_role(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    payload: Result<Json<CreateJobRoleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<JobRoleResponse>), ApiError> {
    let Json(request) = payload?;

    let role = JobRoleRepository::new(&state.db)
        .create(tenant.0, &request.title)
        .await?;

    Ok((StatusCode::CREATED, Json(role.into())))
}

/// List job roles of the tenant
#[utoipa::path(
    get,
    path = "/api/v1/job-roles",
    security(("bearer_auth" = [])),
    params(TenantHeader),
    responses(
        (status = 200, description = "Job roles", body = Vec<JobRoleResponse>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "directory"
)]
pub async fn list_job_roles(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
) -> Result<Json<Vec<JobRoleResponse>>, ApiError> {
    let roles = JobRoleRepository::new(&state.db).list(tenant.0).await?;
    Ok(Json(roles.into_iter().map(Into::into).collect()))
}

/// Onboard a team member and open their leave balances for the current year
#[utoipa::path(
    post,
    path = "/api/v1/team-members",
    security(("bearer_auth" = [])),
    params(TenantHeader),
    request_body = CreateTeamMemberRequest,
    responses(
        (status = 201, description = "Team member created with opening balances", body = TeamMemberResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 409, description = "Slack user id already linked to another member", body = ApiError)
    ),
    tag = "directory"
)]
pub async fn create_team_member(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    payload: Result<Json<CreateTeamMemberRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TeamMemberResponse>), ApiError> {
    let Json(request) = payload?;
    let tenant_id = tenant.0;

    let txn = state.db.begin().await?;

    let member = TeamMemberRepository::new(&txn)
        .create(
            tenant_id,
            NewTeamMember {
                full_name: request.full_name,
                email: request.email,
                job_title: request.job_title,
                joined_date: request.joined_date,
                slack_user_id: request.slack_user_id,
            },
        )
        .await?;

    let balances = LeaveLedger::new(&txn)
        .initialize_for_member(tenant_id, member.id, member.joined_date, Utc::now().year())
        .await?;

    txn.commit().await?;

    tracing::info!(
        tenant_id = %tenant_id,
        team_member_id = %member.id,
        balances = balances.len(),
        "Team member onboarded"
    );

    let mut response = TeamMemberResponse::from(member);
    response.leave_balances = Some(balances.into_iter().map(Into::into).collect());

    Ok((StatusCode::CREATED, Json(response)))
}

/// List team members of the tenant
#[utoipa::path(
    get,
    path = "/api/v1/team-members",
    security(("bearer_auth" = [])),
    params(TenantHeader),
    responses(
        (status = 200, description = "Team members ordered by name", body = Vec<TeamMemberResponse>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "directory"
)]
pub async fn list_team_members(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
) -> Result<Json<Vec<TeamMemberResponse>>, ApiError> {
    let members = TeamMemberRepository::new(&state.db).list(tenant.0).await?;
    Ok(Json(members.into_iter().map(Into::into).collect()))
}

/// Get a team member
#[utoipa::path(
    get,
    path = "/api/v1/team-members/{id}",
    security(("bearer_auth" = [])),
    params(
        TenantHeader,
        ("id" = Uuid, Path, description = "Team member UUID")
    ),
    responses(
        (status = 200, description = "Team member", body = TeamMemberResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Team member not found", body = ApiError)
    ),
    tag = "directory"
)]
pub async fn get_team_member(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
) -> Result<Json<TeamMemberResponse>, ApiError> {
    let member = TeamMemberRepository::new(&state.db)
        .find_by_id(tenant.0, id)
        .await?
        .ok_or_else(|| not_found("Team member", id))?;

    Ok(Json(member.into()))
}

/// Link or replace the member's Slack user id
#[utoipa::path(
    put,
    path = "/api/v1/team-members/{id}/slack-user",
    security(("bearer_auth" = [])),
    params(
        TenantHeader,
        ("id" = Uuid, Path, description = "Team member UUID")
    ),
    request_body = LinkSlackUserRequest,
    responses(
        (status = 200, description = "Updated team member", body = TeamMemberResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Team member not found", body = ApiError),
        (status = 409, description = "Slack user id already linked to another member", body = ApiError)
    ),
    tag = "directory"
)]
pub async fn link_slack_user(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
    payload: Result<Json<LinkSlackUserRequest>, JsonRejection>,
) -> Result<Json<TeamMemberResponse>, ApiError> {
    let Json(request) = payload?;

    let member = TeamMemberRepository::new(&state.db)
        .set_slack_user_id(tenant.0, id, request.slack_user_id)
        .await?;

    tracing::info!(
        tenant_id = %tenant.0,
        team_member_id = %member.id,
        linked = member.slack_user_id.is_some(),
        "Slack user mapping updated"
    );

    Ok(Json(member.into()))
}
