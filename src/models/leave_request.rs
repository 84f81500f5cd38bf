//! # Leave Request Model
//!
//! A request for `total_days` of leave between two dates. Its status drives
//! the ledger: PENDING days count as `pending`, APPROVED days as `used`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "leave_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// Human-readable reference, e.g. `LR-2026-000042`
    pub reference: String,
    pub team_member_id: Uuid,
    pub leave_type_id: Uuid,
    pub start_date: Date,
    pub end_date: Date,
    pub total_days: f64,
    pub reason: Option<String>,
    pub status: LeaveRequestStatus,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTimeWithTimeZone>,
    pub rejection_reason: Option<String>,
    pub cancelled_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveRequestStatus {
    #[sea_orm(string_value = "PENDING")]
    #[default]
    Pending,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl LeaveRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveRequestStatus::Pending => "PENDING",
            LeaveRequestStatus::Approved => "APPROVED",
            LeaveRequestStatus::Rejected => "REJECTED",
            LeaveRequestStatus::Cancelled => "CANCELLED",
        }
    }

    /// Whether a request in this state may move to `next`.
    ///
    /// Approval and rejection only leave PENDING. Cancellation also
    /// withdraws an already approved request. REJECTED and CANCELLED are final.
    pub fn can_transition_to(&self, next: LeaveRequestStatus) -> bool {
        matches!(
            (self, next),
            (LeaveRequestStatus::Pending, LeaveRequestStatus::Approved)
                | (LeaveRequestStatus::Pending, LeaveRequestStatus::Rejected)
                | (LeaveRequestStatus::Pending, LeaveRequestStatus::Cancelled)
                | (LeaveRequestStatus::Approved, LeaveRequestStatus::Cancelled)
        )
    }
}

impl std::fmt::Display for LeaveRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::team_member::Entity",
        from = "Column::TeamMemberId",
        to = "super::team_member::Column::Id"
    )]
    TeamMember,
    #[sea_orm(
        belongs_to = "super::leave_type::Entity",
        from = "Column::LeaveTypeId",
        to = "super::leave_type::Column::Id"
    )]
    LeaveType,
}

impl Related<super::team_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TeamMember.def()
    }
}

impl Related<super::leave_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeaveType.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_can_move_to_every_other_state() {
        let pending = LeaveRequestStatus::Pending;
        assert!(pending.can_transition_to(LeaveRequestStatus::Approved));
        assert!(pending.can_transition_to(LeaveRequestStatus::Rejected));
        assert!(pending.can_transition_to(LeaveRequestStatus::Cancelled));
        assert!(!pending.can_transition_to(LeaveRequestStatus::Pending));
    }

    #[test]
    fn approved_requests_can_only_be_withdrawn() {
        let approved = LeaveRequestStatus::Approved;
        assert!(approved.can_transition_to(LeaveRequestStatus::Cancelled));
        assert!(!approved.can_transition_to(LeaveRequestStatus::Rejected));
        assert!(!approved.can_transition_to(LeaveRequestStatus::Approved));
    }

    #[test]
    fn rejected_and_cancelled_are_final() {
        for terminal in [LeaveRequestStatus::Rejected, LeaveRequestStatus::Cancelled] {
            for next in [
                LeaveRequestStatus::Pending,
                LeaveRequestStatus::Approved,
                LeaveRequestStatus::Rejected,
                LeaveRequestStatus::Cancelled,
            ] {
                assert!(!terminal.can_transition_to(next), "{terminal} -> {next}");
            }
        }
    }

    #[test]
    fn status_serializes_in_upper_case() {
        let json = serde_json::to_string(&LeaveRequestStatus::Cancelled).unwrap();
        assert_eq!(json, "\"CANCELLED\"");
    }
}
