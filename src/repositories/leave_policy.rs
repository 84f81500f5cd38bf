//! Leave policy repository.
//!
//! Policies are unique per (tenant, job role, leave type). Writes go through
//! an explicit `INSERT .. ON CONFLICT` so concurrent upserts never duplicate.

use chrono::Utc;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set, sea_query::OnConflict};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::leave_policy::{self, Entity as LeavePolicy};

/// Quota settings for one (job role, leave type) pair
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyValues {
    pub job_role_id: Uuid,
    pub leave_type_id: Uuid,
    pub annual_quota: f64,
    pub carry_forward_limit: f64,
    pub is_active: bool,
}

/// Repository for leave policy database operations
pub struct LeavePolicyRepository<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> LeavePolicyRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Creates the policy or overwrites quota, limit and active flag of the existing one.
    pub async fn upsert(
        &self,
        tenant_id: Uuid,
        values: PolicyValues,
    ) -> Result<leave_policy::Model, RepositoryError> {
        validate(&values)?;
        let (job_role_id, leave_type_id) = (values.job_role_id, values.leave_type_id);

        LeavePolicy::insert(active_model(tenant_id, values))
            .on_conflict(
                OnConflict::columns(unique_columns())
                    .update_columns([
                        leave_policy::Column::AnnualQuota,
                        leave_policy::Column::CarryForwardLimit,
                        leave_policy::Column::IsActive,
                        leave_policy::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(self.db)
            .await?;

        self.find(tenant_id, job_role_id, leave_type_id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("Leave policy".to_string()))
    }

    /// Inserts the policy only when the pair has none yet. Returns whether a row was added.
    pub async fn insert_if_missing(
        &self,
        tenant_id: Uuid,
        values: PolicyValues,
    ) -> Result<bool, RepositoryError> {
        validate(&values)?;

        let inserted = LeavePolicy::insert(active_model(tenant_id, values))
            .on_conflict(OnConflict::columns(unique_columns()).do_nothing().to_owned())
            .exec_without_returning(self.db)
            .await?;

        Ok(inserted > 0)
    }

    pub async fn find(
        &self,
        tenant_id: Uuid,
        job_role_id: Uuid,
        leave_type_id: Uuid,
    ) -> Result<Option<leave_policy::Model>, RepositoryError> {
        Ok(LeavePolicy::find()
            .filter(leave_policy::Column::TenantId.eq(tenant_id))
            .filter(leave_policy::Column::JobRoleId.eq(job_role_id))
            .filter(leave_policy::Column::LeaveTypeId.eq(leave_type_id))
            .one(self.db)
            .await?)
    }

    /// The policy that applies to a role and leave type, ignoring inactive ones.
    pub async fn find_active(
        &self,
        tenant_id: Uuid,
        job_role_id: Uuid,
        leave_type_id: Uuid,
    ) -> Result<Option<leave_policy::Model>, RepositoryError> {
        Ok(self
            .find(tenant_id, job_role_id, leave_type_id)
            .await?
            .filter(|policy| policy.is_active))
    }

    pub async fn list(&self, tenant_id: Uuid) -> Result<Vec<leave_policy::Model>, RepositoryError> {
        Ok(LeavePolicy::find()
            .filter(leave_policy::Column::TenantId.eq(tenant_id))
            .order_by_asc(leave_policy::Column::JobRoleId)
            .order_by_asc(leave_policy::Column::LeaveTypeId)
            .all(self.db)
            .await?)
    }
}

fn unique_columns() -> [leave_policy::Column; 3] {
    [
        leave_policy::Column::TenantId,
        leave_policy::Column::JobRoleId,
        leave_policy::Column::LeaveTypeId,
    ]
}

fn active_model(tenant_id: Uuid, values: PolicyValues) -> leave_policy::ActiveModel {
    let now = Utc::now();
    leave_policy::ActiveModel {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(tenant_id),
        job_role_id: Set(values.job_role_id),
        leave_type_id: Set(values.leave_type_id),
        annual_quota: Set(values.annual_quota),
        carry_forward_limit: Set(values.carry_forward_limit),
        is_active: Set(values.is_active),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
}

fn validate(values: &PolicyValues) -> Result<(), RepositoryError> {
    if !values.annual_quota.is_finite() || values.annual_quota < 0.0 {
        return Err(RepositoryError::validation_error(
            "annual_quota must be a non-negative number",
        ));
    }
    if !values.carry_forward_limit.is_finite() || values.carry_forward_limit < 0.0 {
        return Err(RepositoryError::validation_error(
            "carry_forward_limit must be a non-negative number",
        ));
    }
    Ok(())
}
