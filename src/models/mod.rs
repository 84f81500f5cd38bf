//! # Data Models
//!
//! SeaORM entities for the leave ledger, attendance store and Slack bridge.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod attendance;
pub mod job_role;
pub mod leave_balance;
pub mod leave_policy;
pub mod leave_request;
pub mod leave_type;
pub mod sequence_counter;
pub mod slack_attendance_log;
pub mod team_member;
pub mod tenant;

pub use attendance::Entity as Attendance;
pub use job_role::Entity as JobRole;
pub use leave_balance::Entity as LeaveBalance;
pub use leave_policy::Entity as LeavePolicy;
pub use leave_request::Entity as LeaveRequest;
pub use leave_type::Entity as LeaveType;
pub use sequence_counter::Entity as SequenceCounter;
pub use slack_attendance_log::Entity as SlackAttendanceLog;
pub use team_member::Entity as TeamMember;
pub use tenant::Entity as Tenant;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "peopleops".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
