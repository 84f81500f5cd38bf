//! # Repository Layer
//!
//! Repositories encapsulate SeaORM operations with tenant-aware methods. Each
//! one borrows any [`sea_orm::ConnectionTrait`], so the same code runs against
//! the pool or inside a `DatabaseTransaction`.

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

pub use attendance::AttendanceRepository;
pub use job_role::JobRoleRepository;
pub use leave_balance::LeaveBalanceRepository;
pub use leave_policy::LeavePolicyRepository;
pub use leave_request::LeaveRequestRepository;
pub use leave_type::LeaveTypeRepository;
pub use sequence_counter::SequenceCounterRepository;
pub use slack_attendance_log::SlackAttendanceLogRepository;
pub use team_member::TeamMemberRepository;
pub use tenant::{CreateTenantRequest, TenantRepository};
