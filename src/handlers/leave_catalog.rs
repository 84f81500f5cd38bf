//! # Leave Catalog API Handlers
//!
//! Leave types and the per-role leave policies that set their quotas.

use crate::auth::{OperatorAuth, TenantExtension, TenantHeader};
use crate::error::{ApiError, not_found};
use crate::models::leave_type::LeaveCategory;
use crate::models::{leave_policy, leave_type};
use crate::repositories::leave_policy::PolicyValues;
use crate::repositories::leave_type::NewLeaveType;
use crate::repositories::{JobRoleRepository, LeavePolicyRepository, LeaveTypeRepository};
use crate::server::AppState;
use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateLeaveTypeRequest {
    #[schema(example = "Casual Leave")]
    pub name: String,
    /// 1 to 10 letters, digits or underscores; stored upper-cased
    #[schema(example = "CL")]
    pub code: String,
    pub category: LeaveCategory,
    #[serde(default = "default_is_paid")]
    pub is_paid: bool,
}

fn default_is_paid() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LeaveTypeResponse {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub category: LeaveCategory,
    pub is_paid: bool,
    pub is_active: bool,
}

impl From<leave_type::Model> for LeaveTypeResponse {
    fn from(model: leave_type::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            code: model.code,
            category: model.category,
            is_paid: model.is_paid,
            is_active: model.is_active,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpsertLeavePolicyRequest {
    pub job_role_id: Uuid,
    pub leave_type_id: Uuid,
    #[schema(example = 12.0)]
    pub annual_quota: f64,
    #[serde(default)]
    #[schema(example = 0.0)]
    pub carry_forward_limit: f64,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
}

fn default_is_active() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LeavePolicyResponse {
    pub id: Uuid,
    pub job_role_id: Uuid,
    pub leave_type_id: Uuid,
    pub annual_quota: f64,
    pub carry_forward_limit: f64,
    pub is_active: bool,
}

impl From<leave_policy::Model> for LeavePolicyResponse {
    fn from(model: leave_policy::Model) -> Self {
        Self {
            id: model.id,
            job_role_id: model.job_role_id,
            leave_type_id: model.leave_type_id,
            annual_quota: model.annual_quota,
            carry_forward_limit: model.carry_forward_limit,
            is_active: model.is_active,
        }
    }
}

/// Register a leave type
#[utoipa::path(
    post,
    path = "/api/v1/leave-types",
    security(("bearer_auth" = [])),
    params(TenantHeader),
    request_body = CreateLeaveTypeRequest,
    responses(
        (status = 201, description = "Leave type created", body = LeaveTypeResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 409, description = "Code already registered", body = ApiError)
    ),
    tag = "leave"
)]
pub async fn create_leave_type(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    payload: Result<Json<CreateLeaveTypeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LeaveTypeResponse>), ApiError> {
    let Json(request) = payload?;

    let leave_type = LeaveTypeRepository::new(&state.db)
        .create(
            tenant.0,
            NewLeaveType {
                name: request.name,
                code: request.code,
                category: request.category,
                is_paid: request.is_paid,
            },
        )
        .await?;

    tracing::info!(tenant_id = %tenant.0, code = %leave_type.code, "Leave type registered");

    Ok((StatusCode::CREATED, Json(leave_type.into())))
}

/// List leave types ordered by code
#[utoipa::path(
    get,
    path = "/api/v1/leave-types",
    security(("bearer_auth" = [])),
    params(TenantHeader),
    responses(
        (status = 200, description = "Leave types", body = Vec<LeaveTypeResponse>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "leave"
)]
pub async fn list_leave_types(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
) -> Result<Json<Vec<LeaveTypeResponse>>, ApiError> {
    let leave_types = LeaveTypeRepository::new(&state.db).list(tenant.0).await?;
    Ok(Json(leave_types.into_iter().map(Into::into).collect()))
}

/// Create or overwrite the policy of a (job role, leave type) pair
///
/// Existing balances keep their quota; the policy applies to balances opened afterwards.
#[utoipa::path(
    put,
    path = "/api/v1/leave-policies",
    security(("bearer_auth" = [])),
    params(TenantHeader),
    request_body = UpsertLeavePolicyRequest,
    responses(
        (status = 200, description = "Stored policy", body = LeavePolicyResponse),
        (status = 400, description = "Negative quota or limit", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Job role or leave type not found", body = ApiError)
    ),
    tag = "leave"
)]
pub async fn upsert_leave_policy(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    payload: Result<Json<UpsertLeavePolicyRequest>, JsonRejection>,
) -> Result<Json<LeavePolicyResponse>, ApiError> {
    let Json(request) = payload?;
    let tenant_id = tenant.0;

    JobRoleRepository::new(&state.db)
        .find_by_id(tenant_id, request.job_role_id)
        .await?
        .ok_or_else(|| not_found("Job role", request.job_role_id))?;
    LeaveTypeRepository::new(&state.db)
        .find_by_id(tenant_id, request.leave_type_id)
        .await?
        .ok_or_else(|| not_found("Leave type", request.leave_type_id))?;

    let policy = LeavePolicyRepository::new(&state.db)
        .upsert(
            tenant_id,
            PolicyValues {
                job_role_id: request.job_role_id,
                leave_type_id: request.leave_type_id,
                annual_quota: request.annual_quota,
                carry_forward_limit: request.carry_forward_limit,
                is_active: request.is_active,
            },
        )
        .await?;

    tracing::info!(
        tenant_id = %tenant_id,
        job_role_id = %policy.job_role_id,
        leave_type_id = %policy.leave_type_id,
        annual_quota = policy.annual_quota,
        "Leave policy upserted"
    );

    Ok(Json(policy.into()))
}

/// List leave policies
#[utoipa::path(
    get,
    path = "/api/v1/leave-policies",
    security(("bearer_auth" = [])),
    params(TenantHeader),
    responses(
        (status = 200, description = "Leave policies", body = Vec<LeavePolicyResponse>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "leave"
)]
pub async fn list_leave_policies(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
) -> Result<Json<Vec<LeavePolicyResponse>>, ApiError> {
    let policies = LeavePolicyRepository::new(&state.db).list(tenant.0).await?;
    Ok(Json(policies.into_iter().map(Into::into).collect()))
}
