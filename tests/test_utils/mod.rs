//! Test utilities for database and HTTP testing.
//!
//! In-memory SQLite databases with migrations applied, directory fixtures and
//! helpers for driving the router with `oneshot`.

#![allow(dead_code)]

use anyhow::Result;
use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use chrono::NaiveDate;
use migration::{Migrator, MigratorTrait};
use peopleops::{
    config::{AppConfig, SlackConfig},
    models::{leave_type, team_member},
    repositories::{
        CreateTenantRequest, JobRoleRepository, LeaveTypeRepository, TeamMemberRepository,
        TenantRepository, team_member::NewTeamMember,
    },
    seeds::seed_leave_types,
    server::{create_app, create_test_app_state},
};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use uuid::Uuid;

pub const OPERATOR_TOKEN: &str = "test-operator-token";
pub const SIGNING_SECRET: &str = "test-signing-secret";

/// Sets up an in-memory SQLite database with all migrations applied.
///
/// A single pooled connection keeps every query on the same in-memory database.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(options).await?;
    Migrator::up(&db, None).await?;

    Ok(db)
}

/// Creates a tenant with the default leave types (CL, SL, EL).
pub async fn create_test_tenant(db: &DatabaseConnection) -> Result<Uuid> {
    let tenant = TenantRepository::new(db)
        .create_tenant(CreateTenantRequest {
            name: "Test Tenant".to_string(),
        })
        .await?;
    seed_leave_types(db, tenant.id).await?;
    Ok(tenant.id)
}

pub async fn create_job_role(db: &DatabaseConnection, tenant_id: Uuid, title: &str) -> Result<Uuid> {
    Ok(JobRoleRepository::new(db).create(tenant_id, title).await?.id)
}

/// Adds an active team member without opening balances.
pub async fn create_team_member(
    db: &DatabaseConnection,
    tenant_id: Uuid,
    full_name: &str,
    job_title: &str,
    joined_date: NaiveDate,
    slack_user_id: Option<&str>,
) -> Result<team_member::Model> {
    Ok(TeamMemberRepository::new(db)
        .create(
            tenant_id,
            NewTeamMember {
                full_name: full_name.to_string(),
                email: None,
                job_title: job_title.to_string(),
                joined_date,
                slack_user_id: slack_user_id.map(str::to_string),
            },
        )
        .await?)
}

pub async fn leave_type_by_code(
    db: &DatabaseConnection,
    tenant_id: Uuid,
    code: &str,
) -> Result<leave_type::Model> {
    LeaveTypeRepository::new(db)
        .find_by_code(tenant_id, code)
        .await?
        .ok_or_else(|| anyhow::anyhow!("leave type {code} not seeded"))
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// Config with an operator token and a Slack signing secret.
pub fn test_config() -> AppConfig {
    AppConfig {
        profile: "test".to_string(),
        database_url: "sqlite::memory:".to_string(),
        db_max_connections: 1,
        operator_tokens: vec![OPERATOR_TOKEN.to_string()],
        slack: SlackConfig {
            signing_secret: Some(SIGNING_SECRET.to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn test_app(db: DatabaseConnection, config: AppConfig) -> Router {
    create_app(create_test_app_state(config, db))
}

/// Authenticated JSON request for the operator API.
pub fn api_request(method: &str, uri: &str, tenant_id: Uuid, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {OPERATOR_TOKEN}"))
        .header("X-Tenant-Id", tenant_id.to_string());

    match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .expect("valid request"),
        None => builder.body(Body::empty()).expect("valid request"),
    }
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    serde_json::from_slice(&bytes).expect("JSON body")
}
