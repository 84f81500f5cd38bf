//! # Slack Events Webhook
//!
//! Public endpoint for the Slack Events API. Requests are authenticated by
//! their signature, not by operator tokens. Once a request is verified the
//! endpoint always answers 200 so Slack does not retry; processing failures
//! are only logged.

use crate::attendance::slack::{SlackEnvelope, SlackAttendanceBridge};
use crate::error::ApiError;
use crate::server::AppState;
use crate::webhook_verification::verify_slack_request;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// Body returned to Slack
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct SlackEventResponse {
    /// Echo of the `url_verification` challenge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
}

impl SlackEventResponse {
    fn ok() -> Self {
        Self {
            ok: Some(true),
            ..Default::default()
        }
    }
}

/// Receive a Slack Events API callback
///
/// Verifies `X-Slack-Signature` over `v0:{timestamp}:{body}`, answers
/// `url_verification` challenges and feeds message events to the attendance bridge.
#[utoipa::path(
    post,
    path = "/webhooks/slack/{tenant_id}/events",
    params(
        ("tenant_id" = Uuid, Path, description = "Tenant UUID"),
        ("X-Slack-Signature" = String, Header, description = "Slack HMAC-SHA256 signature, `v0=<hex>`"),
        ("X-Slack-Request-Timestamp" = String, Header, description = "Unix timestamp the signature was computed for")
    ),
    request_body(content = Object, description = "Raw Events API payload", content_type = "application/json"),
    responses(
        (status = 200, description = "Event accepted or challenge answered", body = SlackEventResponse),
        (status = 400, description = "Invalid tenant ID", body = ApiError),
        (status = 401, description = "Missing or invalid signature", body = ApiError),
        (status = 503, description = "Signing secret not configured", body = ApiError)
    ),
    tag = "webhooks"
)]
pub async fn slack_events(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SlackEventResponse>, ApiError> {
    let tenant_id = tenant_id.parse::<Uuid>().map_err(|_| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "Invalid tenant ID format - must be a valid UUID",
        )
    })?;

    if let Err(e) = verify_slack_request(&headers, &body, &state.config.slack) {
        warn!(tenant_id = %tenant_id, error = %e, "Slack request verification failed");
        let status = e.status_code();
        let code = if status == StatusCode::SERVICE_UNAVAILABLE {
            "SERVICE_UNAVAILABLE"
        } else {
            "UNAUTHORIZED"
        };
        return Err(ApiError::new(status, code, e.to_string()));
    }

    let envelope: SlackEnvelope = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            error!(tenant_id = %tenant_id, error = %e, "Failed to parse Slack payload");
            return Ok(Json(SlackEventResponse::ok()));
        }
    };

    match envelope {
        SlackEnvelope::UrlVerification { challenge } => {
            debug!(tenant_id = %tenant_id, "Answering Slack url_verification");
            Ok(Json(SlackEventResponse {
                challenge: Some(challenge),
                ok: None,
            }))
        }
        SlackEnvelope::EventCallback { event } => {
            let bridge = SlackAttendanceBridge::new(
                &state.db,
                &state.config.slack,
                &state.config.attendance,
                state.slack.clone(),
            );

            match bridge.handle_event(tenant_id, &event).await {
                Ok(outcome) => {
                    debug!(tenant_id = %tenant_id, ?outcome, "Slack event handled");
                }
                Err(e) => {
                    error!(
                        tenant_id = %tenant_id,
                        ts = event.ts.as_deref().unwrap_or_default(),
                        error = %e,
                        "Failed to process Slack attendance event"
                    );
                }
            }

            Ok(Json(SlackEventResponse::ok()))
        }
        SlackEnvelope::Other => Ok(Json(SlackEventResponse::ok())),
    }
}
