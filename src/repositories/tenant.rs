//! # Tenant Repository
//!
//! CRUD operations for tenants, the isolation boundary of every other table.

use crate::error::RepositoryError;
use crate::models::tenant::{
    ActiveModel as TenantActiveModel, Entity as Tenant, Model as TenantModel,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, PaginatorTrait, Set};
use uuid::Uuid;

/// Request data for creating a new tenant
#[derive(Debug, Clone)]
pub struct CreateTenantRequest {
    /// Display name for the tenant
    pub name: String,
}

/// Repository for Tenant database operations
pub struct TenantRepository<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> TenantRepository<'a, C> {
    /// Create a new TenantRepository over a connection or transaction
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Create a new tenant
    pub async fn create_tenant(
        &self,
        request: CreateTenantRequest,
    ) -> Result<TenantModel, RepositoryError> {
        validate_tenant_name(&request.name)?;

        let tenant = TenantActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(Some(request.name.trim().to_string())),
            created_at: Set(Utc::now().into()),
        };

        let result = tenant
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(result)
    }

    /// Get tenant by ID
    pub async fn get_tenant_by_id(
        &self,
        tenant_id: Uuid,
    ) -> Result<Option<TenantModel>, RepositoryError> {
        let tenant = Tenant::find_by_id(tenant_id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(tenant)
    }

    /// Check if a tenant exists
    pub async fn tenant_exists(&self, tenant_id: Uuid) -> Result<bool, RepositoryError> {
        let count = Tenant::find_by_id(tenant_id)
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(count > 0)
    }
}

fn validate_tenant_name(name: &str) -> Result<(), RepositoryError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(RepositoryError::validation_error("Tenant name cannot be empty"));
    }
    if trimmed.chars().count() > 255 {
        return Err(RepositoryError::validation_error(
            "Tenant name cannot exceed 255 characters",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::db::{init_pool, run_migrations};
    use sea_orm::DatabaseConnection;

    async fn setup_test_db() -> DatabaseConnection {
        let config = AppConfig {
            database_url: "sqlite::memory:".to_string(),
            db_max_connections: 1,
            ..Default::default()
        };

        let db = init_pool(&config).await.expect("Failed to init test DB");
        run_migrations(&db).await.expect("Failed to migrate test DB");
        db
    }

    #[tokio::test]
    async fn test_create_tenant_success() {
        let db = setup_test_db().await;
        let repo = TenantRepository::new(&db);

        let tenant = repo
            .create_tenant(CreateTenantRequest {
                name: "  Acme People Ops, Inc. ".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(tenant.name.as_deref(), Some("Acme People Ops, Inc."));
        assert!(tenant.created_at.timestamp() > 0);
        assert!(repo.tenant_exists(tenant.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_tenant_validation() {
        let db = setup_test_db().await;
        let repo = TenantRepository::new(&db);

        for name in ["   ".to_string(), "a".repeat(256)] {
            let result = repo.create_tenant(CreateTenantRequest { name }).await;
            assert!(matches!(result, Err(RepositoryError::Validation(_))));
        }
    }

    #[tokio::test]
    async fn test_get_unknown_tenant_returns_none() {
        let db = setup_test_db().await;
        let repo = TenantRepository::new(&db);

        assert!(repo.get_tenant_by_id(Uuid::new_v4()).await.unwrap().is_none());
        assert!(!repo.tenant_exists(Uuid::new_v4()).await.unwrap());
    }
}
