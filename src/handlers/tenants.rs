//! # Tenants API Handlers
//!
//! Handlers for tenant creation and lookup.

use crate::auth::{OperatorAuth, TenantExtension, TenantHeader};
use crate::error::{ApiError, not_found};
use crate::models::tenant;
use crate::repositories::{CreateTenantRequest, TenantRepository};
use crate::seeds::seed_leave_types;
use crate::server::AppState;
use axum::{
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header::LOCATION},
    response::Json,
};
use sea_orm::TransactionTrait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Request payload for creating a new tenant
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTenantRequestDto {
    /// Display name for the tenant (required, max 255 characters)
    #[schema(example = "Acme Corp")]
    pub name: String,
}

/// Tenant as returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TenantResponseDto {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    #[schema(example = "Acme Corp")]
    pub name: String,
    /// Creation timestamp (RFC 3339)
    #[schema(example = "2026-01-15T10:30:00Z")]
    pub created_at: String,
}

impl From<tenant::Model> for TenantResponseDto {
    fn from(model: tenant::Model) -> Self {
        Self {
            id: model.id,
            name: model.name.unwrap_or_default(),
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

/// Create a new tenant with the default leave types
#[utoipa::path(
    post,
    path = "/api/v1/tenants",
    security(("bearer_auth" = [])),
    params(TenantHeader),
    request_body = CreateTenantRequestDto,
    responses(
        (status = 201, description = "Tenant created successfully", body = TenantResponseDto, headers(
            ("Location", description = "URL of the created tenant")
        )),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "tenants"
)]
pub async fn create_tenant(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(_tenant): TenantExtension,
    payload: Result<Json<CreateTenantRequestDto>, JsonRejection>,
) -> Result<(StatusCode, HeaderMap, Json<TenantResponseDto>), ApiError> {
    let Json(request) = payload?;

    let txn = state.db.begin().await?;
    let tenant = TenantRepository::new(&txn)
        .create_tenant(CreateTenantRequest { name: request.name })
        .await?;
    let leave_types = seed_leave_types(&txn, tenant.id).await?;
    txn.commit().await?;

    tracing::info!(tenant_id = %tenant.id, leave_types = leave_types.len(), "Tenant created");

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/v1/tenants/{}", tenant.id)) {
        headers.insert(LOCATION, location);
    }

    Ok((StatusCode::CREATED, headers, Json(tenant.into())))
}

/// Get a tenant by ID
#[utoipa::path(
    get,
    path = "/api/v1/tenants/{id}",
    security(("bearer_auth" = [])),
    params(
        TenantHeader,
        ("id" = Uuid, Path, description = "Tenant UUID")
    ),
    responses(
        (status = 200, description = "Tenant retrieved successfully", body = TenantResponseDto),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Tenant not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "tenants"
)]
pub async fn get_tenant(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(_tenant): TenantExtension,
    Path(tenant_id): Path<Uuid>,
) -> Result<Json<TenantResponseDto>, ApiError> {
    let tenant = TenantRepository::new(&state.db)
        .get_tenant_by_id(tenant_id)
        .await?
        .ok_or_else(|| not_found("Tenant", tenant_id))?;

    Ok(Json(tenant.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::db::{init_pool, run_migrations};
    use axum::{body::Body, http::Request};
    use serde_json::json;
    use tower::ServiceExt;

    async fn setup_test_app() -> (AppState, axum::Router) {
        let config = AppConfig {
            profile: "test".to_string(),
            database_url: "sqlite::memory:".to_string(),
            db_max_connections: 1,
            operator_tokens: vec!["test-token".to_string()],
            ..Default::default()
        };

        let db = init_pool(&config).await.expect("Failed to init test DB");
        run_migrations(&db).await.expect("Failed to run migrations");
        let state = crate::server::create_test_app_state(config, db);

        let app = crate::server::create_app(state.clone());
        (state, app)
    }

    fn request(method: &str, uri: &str, body: Body) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("Authorization", "Bearer test-token")
            .header("X-Tenant-Id", "550e8400-e29b-41d4-a716-446655440000")
            .header("Content-Type", "application/json")
            .body(body)
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_tenant_success() {
        let (_state, app) = setup_test_app().await;

        let response = app
            .oneshot(request(
                "POST",
                "/api/v1/tenants",
                Body::from(json!({ "name": "Test Tenant" }).to_string()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let location = response.headers().get("Location").unwrap();
        assert!(location.to_str().unwrap().starts_with("/api/v1/tenants/"));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let tenant: TenantResponseDto = serde_json::from_slice(&body).unwrap();
        assert_eq!(tenant.name, "Test Tenant");
        assert!(!tenant.created_at.is_empty());
    }

    #[tokio::test]
    async fn test_create_tenant_validation_error() {
        let (_state, app) = setup_test_app().await;

        let response = app
            .oneshot(request(
                "POST",
                "/api/v1/tenants",
                Body::from(json!({ "name": "  " }).to_string()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error_json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(error_json["code"], "VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn test_get_tenant_success() {
        let (state, app) = setup_test_app().await;

        let tenant = TenantRepository::new(&state.db)
            .create_tenant(CreateTenantRequest {
                name: "Test Tenant for Get".to_string(),
            })
            .await
            .unwrap();

        let response = app
            .oneshot(request(
                "GET",
                &format!("/api/v1/tenants/{}", tenant.id),
                Body::empty(),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let fetched: TenantResponseDto = serde_json::from_slice(&body).unwrap();
        assert_eq!(fetched.id, tenant.id);
        assert_eq!(fetched.name, "Test Tenant for Get");
    }

    #[tokio::test]
    async fn test_create_tenant_seeds_leave_types() {
        let (state, app) = setup_test_app().await;

        let response = app
            .oneshot(request(
                "POST",
                "/api/v1/tenants",
                Body::from(json!({ "name": "Seeded" }).to_string()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let tenant: TenantResponseDto = serde_json::from_slice(&body).unwrap();

        let codes: Vec<String> = crate::repositories::LeaveTypeRepository::new(&state.db)
            .list(tenant.id)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.code)
            .collect();
        assert_eq!(codes, vec!["CL", "EL", "SL"]);
    }

    #[tokio::test]
    async fn test_get_tenant_not_found() {
        let (_state, app) = setup_test_app().await;

        let response = app
            .oneshot(request(
                "GET",
                &format!("/api/v1/tenants/{}", Uuid::new_v4()),
                Body::empty(),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error_json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(error_json["code"], "NOT_FOUND");
    }
}
