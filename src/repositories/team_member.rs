//! Team member repository.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::team_member::{self, Entity as TeamMember};

/// Fields required to add a member to the directory
#[derive(Debug, Clone)]
pub struct NewTeamMember {
    pub full_name: String,
    pub email: Option<String>,
    pub job_title: String,
    pub joined_date: NaiveDate,
    pub slack_user_id: Option<String>,
}

/// Repository for team member database operations
pub struct TeamMemberRepository<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> TeamMemberRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        tenant_id: Uuid,
        member: NewTeamMember,
    ) -> Result<team_member::Model, RepositoryError> {
        let full_name = member.full_name.trim();
        if full_name.is_empty() {
            return Err(RepositoryError::validation_error("full_name cannot be empty"));
        }
        let job_title = member.job_title.trim();
        if job_title.is_empty() {
            return Err(RepositoryError::validation_error("job_title cannot be empty"));
        }

        let now = Utc::now();
        let model = team_member::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            full_name: Set(full_name.to_string()),
            email: Set(member.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty())),
            job_title: Set(job_title.to_string()),
            joined_date: Set(member.joined_date),
            slack_user_id: Set(normalize_slack_user_id(member.slack_user_id)),
            is_active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        Ok(model.insert(self.db).await?)
    }

    pub async fn find_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<team_member::Model>, RepositoryError> {
        Ok(TeamMember::find_by_id(id)
            .filter(team_member::Column::TenantId.eq(tenant_id))
            .one(self.db)
            .await?)
    }

    /// Same as [`Self::find_by_id`] but a missing member is an error.
    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<team_member::Model, RepositoryError> {
        self.find_by_id(tenant_id, id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("Team member".to_string()))
    }

    /// Maps a Slack user to an active member of the tenant.
    pub async fn find_active_by_slack_user_id(
        &self,
        tenant_id: Uuid,
        slack_user_id: &str,
    ) -> Result<Option<team_member::Model>, RepositoryError> {
        Ok(TeamMember::find()
            .filter(team_member::Column::TenantId.eq(tenant_id))
            .filter(team_member::Column::SlackUserId.eq(slack_user_id))
            .filter(team_member::Column::IsActive.eq(true))
            .one(self.db)
            .await?)
    }

    /// Links, replaces or (with `None`) clears the member's Slack user id.
    pub async fn set_slack_user_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        slack_user_id: Option<String>,
    ) -> Result<team_member::Model, RepositoryError> {
        let member = self.get(tenant_id, id).await?;

        let mut active = member.into_active_model();
        active.slack_user_id = Set(normalize_slack_user_id(slack_user_id));
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(self.db).await?)
    }

    pub async fn list(&self, tenant_id: Uuid) -> Result<Vec<team_member::Model>, RepositoryError> {
        Ok(TeamMember::find()
            .filter(team_member::Column::TenantId.eq(tenant_id))
            .order_by_asc(team_member::Column::FullName)
            .all(self.db)
            .await?)
    }
}

fn normalize_slack_user_id(slack_user_id: Option<String>) -> Option<String> {
    slack_user_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
}
