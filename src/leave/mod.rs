//! # Leave Management
//!
//! The balance ledger ([`ledger`]), the request workflow ([`workflow`]) and
//! the quota arithmetic they share ([`quota`]).

pub mod ledger;
pub mod quota;
pub mod workflow;

use axum::http::StatusCode;
use thiserror::Error;

use crate::error::{ApiError, RepositoryError, validation_error};
use crate::models::leave_request::LeaveRequestStatus;

pub use ledger::{AvailabilityCheck, BalanceDrift, LeaveLedger, ReconcileReport};
pub use workflow::{CreateLeaveRequest, LeaveWorkflow};

/// Errors raised by the ledger and the request workflow
#[derive(Debug, Error)]
pub enum LeaveError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{message}")]
    Validation { message: String, field: &'static str },

    #[error("insufficient leave balance, short by {} day(s)", .0.shortfall)]
    InsufficientBalance(Box<AvailabilityCheck>),

    #[error("cannot move leave request from {from} to {to}")]
    InvalidTransition {
        from: LeaveRequestStatus,
        to: LeaveRequestStatus,
    },
}

impl LeaveError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field,
        }
    }
}

impl From<sea_orm::DbErr> for LeaveError {
    fn from(error: sea_orm::DbErr) -> Self {
        Self::Repository(RepositoryError::Database(error))
    }
}

impl From<quota::RequestRuleViolation> for LeaveError {
    fn from(violation: quota::RequestRuleViolation) -> Self {
        Self::Validation {
            message: violation.message,
            field: violation.field,
        }
    }
}

impl From<LeaveError> for ApiError {
    fn from(error: LeaveError) -> Self {
        match error {
            LeaveError::Repository(err) => err.into(),
            LeaveError::NotFound(entity) => ApiError::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{} not found", entity),
            ),
            LeaveError::Validation { message, field } => {
                validation_error(&message, serde_json::json!({ field: message.clone() }))
            }
            LeaveError::InsufficientBalance(check) => {
                let message = check.message.clone();
                let details = serde_json::to_value(&*check).unwrap_or_default();
                ApiError::new(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "INSUFFICIENT_LEAVE_BALANCE",
                    message,
                )
                .with_details(details)
            }
            LeaveError::InvalidTransition { from, to } => ApiError::new(
                StatusCode::CONFLICT,
                "INVALID_STATE_TRANSITION",
                format!("Leave request cannot move from {} to {}", from, to),
            )
            .with_details(serde_json::json!({ "from": from, "to": to })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_maps_to_conflict() {
        let api: ApiError = LeaveError::InvalidTransition {
            from: LeaveRequestStatus::Rejected,
            to: LeaveRequestStatus::Approved,
        }
        .into();

        assert_eq!(api.status, StatusCode::CONFLICT);
        assert_eq!(&*api.code, "INVALID_STATE_TRANSITION");
        let details = api.details.unwrap();
        assert_eq!(details["from"], "REJECTED");
        assert_eq!(details["to"], "APPROVED");
    }

    #[test]
    fn validation_error_names_the_field() {
        let api: ApiError = LeaveError::validation("total_days", "total_days must be at least 0.5").into();

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(&*api.code, "VALIDATION_FAILED");
        assert_eq!(
            api.details.unwrap()["total_days"],
            "total_days must be at least 0.5"
        );
    }

    #[test]
    fn missing_entities_map_to_not_found() {
        let api: ApiError = LeaveError::NotFound("Leave request").into();
        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert_eq!(&*api.message, "Leave request not found");
    }
}
