//! Leave type repository.
//!
//! Codes are stored upper-cased and must be 1..=10 alphanumeric characters.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::OnConflict,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::leave_type::{self, Entity as LeaveType, LeaveCategory, MAX_CODE_LEN};

/// Fields for registering a leave type
#[derive(Debug, Clone)]
pub struct NewLeaveType {
    pub name: String,
    pub code: String,
    pub category: LeaveCategory,
    pub is_paid: bool,
}

/// Repository for leave type database operations
pub struct LeaveTypeRepository<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> LeaveTypeRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        tenant_id: Uuid,
        new: NewLeaveType,
    ) -> Result<leave_type::Model, RepositoryError> {
        Ok(build_active_model(tenant_id, new)?.insert(self.db).await?)
    }

    /// Inserts the leave type unless its code is already registered.
    ///
    /// Returns the stored row and whether this call created it.
    pub async fn insert_if_missing(
        &self,
        tenant_id: Uuid,
        new: NewLeaveType,
    ) -> Result<(leave_type::Model, bool), RepositoryError> {
        let code = normalize_code(&new.code)?;
        let model = build_active_model(tenant_id, new)?;

        let inserted = LeaveType::insert(model)
            .on_conflict(
                OnConflict::columns([leave_type::Column::TenantId, leave_type::Column::Code])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db)
            .await?;

        let stored = self
            .find_by_code(tenant_id, &code)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("Leave type {code}")))?;

        Ok((stored, inserted > 0))
    }

    pub async fn find_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<leave_type::Model>, RepositoryError> {
        Ok(LeaveType::find_by_id(id)
            .filter(leave_type::Column::TenantId.eq(tenant_id))
            .one(self.db)
            .await?)
    }

    pub async fn find_by_code(
        &self,
        tenant_id: Uuid,
        code: &str,
    ) -> Result<Option<leave_type::Model>, RepositoryError> {
        Ok(LeaveType::find()
            .filter(leave_type::Column::TenantId.eq(tenant_id))
            .filter(leave_type::Column::Code.eq(code.trim().to_ascii_uppercase()))
            .one(self.db)
            .await?)
    }

    pub async fn list(&self, tenant_id: Uuid) -> Result<Vec<leave_type::Model>, RepositoryError> {
        Ok(LeaveType::find()
            .filter(leave_type::Column::TenantId.eq(tenant_id))
            .order_by_asc(leave_type::Column::Code)
            .all(self.db)
            .await?)
    }

    pub async fn list_active(&self, tenant_id: Uuid) -> Result<Vec<leave_type::Model>, RepositoryError> {
        Ok(LeaveType::find()
            .filter(leave_type::Column::TenantId.eq(tenant_id))
            .filter(leave_type::Column::IsActive.eq(true))
            .order_by_asc(leave_type::Column::Code)
            .all(self.db)
            .await?)
    }
}

fn build_active_model(
    tenant_id: Uuid,
    new: NewLeaveType,
) -> Result<leave_type::ActiveModel, RepositoryError> {
    let code = normalize_code(&new.code)?;
    let name = new.name.trim();
    if name.is_empty() {
        return Err(RepositoryError::validation_error("Leave type name cannot be empty"));
    }

    let now = Utc::now();
    Ok(leave_type::ActiveModel {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(tenant_id),
        name: Set(name.to_string()),
        code: Set(code),
        category: Set(new.category),
        is_paid: Set(new.is_paid),
        is_active: Set(true),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    })
}

/// Upper-cases and validates a leave type code.
pub fn normalize_code(code: &str) -> Result<String, RepositoryError> {
    let code = code.trim();
    if code.is_empty() || code.chars().count() > MAX_CODE_LEN {
        return Err(RepositoryError::validation_error(format!(
            "Leave type code must be 1 to {MAX_CODE_LEN} characters"
        )));
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(RepositoryError::validation_error(
            "Leave type code can only contain letters, digits and underscores",
        ));
    }
    Ok(code.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_upper_cased() {
        assert_eq!(normalize_code(" cl ").unwrap(), "CL");
        assert_eq!(normalize_code("comp_off").unwrap(), "COMP_OFF");
    }

    #[test]
    fn codes_outside_length_bounds_are_rejected() {
        assert!(normalize_code("").is_err());
        assert!(normalize_code("   ").is_err());
        assert!(normalize_code("ABCDEFGHIJ").is_ok());
        assert!(normalize_code("ABCDEFGHIJK").is_err());
    }

    #[test]
    fn codes_with_punctuation_are_rejected() {
        assert!(normalize_code("C-L").is_err());
    }
}
