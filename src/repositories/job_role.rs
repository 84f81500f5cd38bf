//! Job role repository.
//!
//! Roles are matched to team members by exact (trimmed) title.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::job_role::{self, Entity as JobRole};

const MAX_TITLE_LEN: usize = 120;

/// Repository for job role database operations
pub struct JobRoleRepository<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> JobRoleRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Creates an active job role. Duplicate titles surface as a unique violation.
    pub async fn create(&self, tenant_id: Uuid, title: &str) -> Result<job_role::Model, RepositoryError> {
        let title = normalize_title(title)?;
        let now = Utc::now();

        let role = job_role::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            title: Set(title),
            is_active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        Ok(role.insert(self.db).await?)
    }

    pub async fn find_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<job_role::Model>, RepositoryError> {
        Ok(JobRole::find_by_id(id)
            .filter(job_role::Column::TenantId.eq(tenant_id))
            .one(self.db)
            .await?)
    }

    /// Resolves a member's free-form job title to an active role.
    pub async fn find_active_by_title(
        &self,
        tenant_id: Uuid,
        title: &str,
    ) -> Result<Option<job_role::Model>, RepositoryError> {
        Ok(JobRole::find()
            .filter(job_role::Column::TenantId.eq(tenant_id))
            .filter(job_role::Column::Title.eq(title.trim()))
            .filter(job_role::Column::IsActive.eq(true))
            .one(self.db)
            .await?)
    }

    pub async fn list(&self, tenant_id: Uuid) -> Result<Vec<job_role::Model>, RepositoryError> {
        Ok(JobRole::find()
            .filter(job_role::Column::TenantId.eq(tenant_id))
            .order_by_asc(job_role::Column::Title)
            .all(self.db)
            .await?)
    }

    pub async fn list_active(&self, tenant_id: Uuid) -> Result<Vec<job_role::Model>, RepositoryError> {
        Ok(JobRole::find()
            .filter(job_role::Column::TenantId.eq(tenant_id))
            .filter(job_role::Column::IsActive.eq(true))
            .order_by_asc(job_role::Column::Title)
            .all(self.db)
            .await?)
    }
}

fn normalize_title(title: &str) -> Result<String, RepositoryError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(RepositoryError::validation_error("Job title cannot be empty"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(RepositoryError::validation_error(format!(
            "Job title cannot exceed {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(title.to_string())
}
