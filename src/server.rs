//! # Server Configuration
//!
//! Router assembly, shared state and the OpenAPI document for the PeopleOps API.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, patch, post, put},
};
use sea_orm::DatabaseConnection;
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::attendance::slack_client::{NoopSlackClient, SlackApi, client_from_config};
use crate::auth::auth_middleware;
use crate::config::AppConfig;
use crate::handlers;
use crate::telemetry::trace_context_middleware;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    /// Outbound Slack Web API client used to acknowledge attendance messages
    pub slack: Arc<dyn SlackApi>,
}

/// State for tests: the given config and database with a no-op Slack client.
pub fn create_test_app_state(config: AppConfig, db: DatabaseConnection) -> AppState {
    AppState {
        config: Arc::new(config),
        db,
        slack: Arc::new(NoopSlackClient),
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let operator_routes = Router::new()
        .route("/api/v1/tenants", post(handlers::tenants::create_tenant))
        .route("/api/v1/tenants/{id}", get(handlers::tenants::get_tenant))
        .route(
            "/api/v1/job-roles",
            post(handlers::team_members::create_job_role).get(handlers::team_members::list_job_roles),
        )
        .route(
            "/api/v1/team-members",
            post(handlers::team_members::create_team_member)
                .get(handlers::team_members::list_team_members),
        )
        .route(
            "/api/v1/team-members/{id}",
            get(handlers::team_members::get_team_member),
        )
        .route(
            "/api/v1/team-members/{id}/slack-user",
            put(handlers::team_members::link_slack_user),
        )
        .route(
            "/api/v1/team-members/{id}/leave-balances",
            get(handlers::leave_balances::list_leave_balances),
        )
        .route(
            "/api/v1/team-members/{id}/leave-balances/recalculate",
            post(handlers::leave_balances::recalculate_leave_balance),
        )
        .route(
            "/api/v1/team-members/{id}/leave-balances/carry-forward",
            post(handlers::leave_balances::apply_carry_forward),
        )
        .route(
            "/api/v1/team-members/{id}/leave-availability",
            get(handlers::leave_balances::check_leave_availability),
        )
        .route(
            "/api/v1/leave-types",
            post(handlers::leave_catalog::create_leave_type)
                .get(handlers::leave_catalog::list_leave_types),
        )
        .route(
            "/api/v1/leave-policies",
            put(handlers::leave_catalog::upsert_leave_policy)
                .get(handlers::leave_catalog::list_leave_policies),
        )
        .route(
            "/api/v1/leave-requests",
            post(handlers::leave_requests::create_leave_request)
                .get(handlers::leave_requests::list_leave_requests),
        )
        .route(
            "/api/v1/leave-requests/{id}",
            get(handlers::leave_requests::get_leave_request)
                .delete(handlers::leave_requests::delete_leave_request),
        )
        .route(
            "/api/v1/leave-requests/{id}/approve",
            post(handlers::leave_requests::approve_leave_request),
        )
        .route(
            "/api/v1/leave-requests/{id}/reject",
            post(handlers::leave_requests::reject_leave_request),
        )
        .route(
            "/api/v1/leave-requests/{id}/cancel",
            post(handlers::leave_requests::cancel_leave_request),
        )
        .route(
            "/api/v1/attendance",
            post(handlers::attendance::create_attendance).get(handlers::attendance::list_attendance),
        )
        .route(
            "/api/v1/attendance/{id}",
            patch(handlers::attendance::update_attendance),
        )
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state.config),
            auth_middleware,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .route(
            "/webhooks/slack/{tenant_id}/events",
            post(handlers::slack::slack_events),
        )
        .merge(operator_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(trace_context_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error>> {
    let slack = if config.slack.bot_token.is_some() {
        client_from_config(&config.slack)?
    } else {
        info!("SLACK_BOT_TOKEN not set; attendance acknowledgments are disabled");
        Arc::new(NoopSlackClient)
    };

    // Resolve the configured bind address
    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;

    let profile = config.profile.clone();
    let state = AppState {
        config: Arc::new(config),
        db,
        slack,
    };
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, profile = %profile, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Registers the operator bearer token scheme referenced by protected paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::readyz,
        crate::handlers::tenants::create_tenant,
        crate::handlers::tenants::get_tenant,
        crate::handlers::team_members::create_job_role,
        crate::handlers::team_members::list_job_roles,
        crate::handlers::team_members::create_team_member,
        crate::handlers::team_members::list_team_members,
        crate::handlers::team_members::get_team_member,
        crate::handlers::team_members::link_slack_user,
        crate::handlers::leave_catalog::create_leave_type,
        crate::handlers::leave_catalog::list_leave_types,
        crate::handlers::leave_catalog::upsert_leave_policy,
        crate::handlers::leave_catalog::list_leave_policies,
        crate::handlers::leave_balances::list_leave_balances,
        crate::handlers::leave_balances::recalculate_leave_balance,
        crate::handlers::leave_balances::apply_carry_forward,
        crate::handlers::leave_balances::check_leave_availability,
        crate::handlers::leave_requests::create_leave_request,
        crate::handlers::leave_requests::list_leave_requests,
        crate::handlers::leave_requests::get_leave_request,
        crate::handlers::leave_requests::delete_leave_request,
        crate::handlers::leave_requests::approve_leave_request,
        crate::handlers::leave_requests::reject_leave_request,
        crate::handlers::leave_requests::cancel_leave_request,
        crate::handlers::attendance::create_attendance,
        crate::handlers::attendance::list_attendance,
        crate::handlers::attendance::update_attendance,
        crate::handlers::slack::slack_events,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::handlers::HealthResponse,
            crate::error::ApiError,
            crate::handlers::tenants::CreateTenantRequestDto,
            crate::handlers::tenants::TenantResponseDto,
            crate::handlers::team_members::CreateJobRoleRequest,
            crate::handlers::team_members::JobRoleResponse,
            crate::handlers::team_members::CreateTeamMemberRequest,
            crate::handlers::team_members::TeamMemberResponse,
            crate::handlers::team_members::LinkSlackUserRequest,
            crate::handlers::leave_catalog::CreateLeaveTypeRequest,
            crate::handlers::leave_catalog::LeaveTypeResponse,
            crate::handlers::leave_catalog::UpsertLeavePolicyRequest,
            crate::handlers::leave_catalog::LeavePolicyResponse,
            crate::handlers::leave_balances::LeaveBalanceResponse,
            crate::handlers::leave_balances::RecalculateRequest,
            crate::handlers::leave_balances::CarryForwardRequest,
            crate::handlers::leave_requests::CreateLeaveRequestDto,
            crate::handlers::leave_requests::ApproveLeaveRequestDto,
            crate::handlers::leave_requests::RejectLeaveRequestDto,
            crate::handlers::leave_requests::LeaveRequestResponse,
            crate::handlers::attendance::CreateAttendanceRequest,
            crate::handlers::attendance::UpdateAttendanceRequest,
            crate::handlers::attendance::AttendanceResponse,
            crate::leave::AvailabilityCheck,
            crate::attendance::WorkingHours,
            crate::models::attendance::AttendanceStatus,
            crate::models::leave_type::LeaveCategory,
            crate::models::leave_request::LeaveRequestStatus,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "root", description = "Service information and probes"),
        (name = "tenants", description = "Tenant administration"),
        (name = "directory", description = "Job roles and team members"),
        (name = "leave", description = "Leave catalog, balances and requests"),
        (name = "attendance", description = "Daily attendance records"),
        (name = "webhooks", description = "Inbound Slack events"),
    ),
    info(
        title = "PeopleOps API",
        description = "Leave balances, leave requests and attendance for multi-tenant teams",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
