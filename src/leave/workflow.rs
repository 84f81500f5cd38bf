//! # Leave Request Workflow
//!
//! State machine: PENDING → APPROVED | REJECTED | CANCELLED, plus withdrawal
//! of APPROVED requests (→ CANCELLED). Every mutation runs in one database
//! transaction that ends with a ledger recalculation, and callers touching the
//! same (member, leave type) pair are serialized by an in-process lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use chrono::{Datelike, NaiveDate, Utc};
use metrics::counter;
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::{info, warn};
use uuid::Uuid;

use super::LeaveError;
use super::ledger::LeaveLedger;
use super::quota::validate_request_days;
use crate::models::leave_balance;
use crate::models::leave_request::{self, LeaveRequestStatus};
use crate::repositories::leave_request::{LeaveRequestFilter, NewLeaveRequest, StatusUpdate};
use crate::repositories::sequence_counter::{LEAVE_REQUEST_SCOPE, format_leave_reference};
use crate::repositories::{
    LeaveRequestRepository, LeaveTypeRepository, SequenceCounterRepository, TeamMemberRepository,
};

const MAX_REASON_LEN: usize = 1000;

type LockKey = (Uuid, Uuid);

static LEDGER_LOCKS: OnceLock<Mutex<HashMap<LockKey, Arc<tokio::sync::Mutex<()>>>>> =
    OnceLock::new();

/// Lock serializing ledger mutations of one (member, leave type) pair
fn ledger_lock(team_member_id: Uuid, leave_type_id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
    let locks = LEDGER_LOCKS.get_or_init(|| Mutex::new(HashMap::new()));
    let mut guard = locks
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    // Drop locks nobody holds or waits on.
    guard.retain(|_, lock| Arc::strong_count(lock) > 1);

    Arc::clone(
        guard
            .entry((team_member_id, leave_type_id))
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
    )
}

/// Input for a new leave request
#[derive(Debug, Clone)]
pub struct CreateLeaveRequest {
    pub team_member_id: Uuid,
    pub leave_type_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_days: f64,
    pub reason: Option<String>,
}

/// Leave request lifecycle operations
pub struct LeaveWorkflow<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> LeaveWorkflow<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Validates, checks availability and stores a PENDING request in one transaction.
    pub async fn create(
        &self,
        tenant_id: Uuid,
        input: CreateLeaveRequest,
    ) -> Result<leave_request::Model, LeaveError> {
        validate_request_days(input.start_date, input.end_date, input.total_days)?;
        let reason = normalize_reason(input.reason)?;

        let lock = ledger_lock(input.team_member_id, input.leave_type_id);
        let _guard = lock.lock().await;

        let txn = self.db.begin().await?;

        let member = TeamMemberRepository::new(&txn)
            .find_by_id(tenant_id, input.team_member_id)
            .await?
            .ok_or(LeaveError::NotFound("Team member"))?;
        if !member.is_active {
            return Err(LeaveError::validation(
                "team_member_id",
                "team member is not active",
            ));
        }

        let leave_type = LeaveTypeRepository::new(&txn)
            .find_by_id(tenant_id, input.leave_type_id)
            .await?
            .ok_or(LeaveError::NotFound("Leave type"))?;
        if !leave_type.is_active {
            return Err(LeaveError::validation(
                "leave_type_id",
                "leave type is not active",
            ));
        }

        let year = input.start_date.year();
        let ledger = LeaveLedger::new(&txn);
        let check = ledger
            .check_availability(tenant_id, member.id, leave_type.id, input.total_days, Some(year))
            .await?;
        if !check.available {
            counter!("leave_request_transitions_total", "transition" => "rejected_insufficient_balance")
                .increment(1);
            warn!(
                tenant_id = %tenant_id,
                team_member_id = %member.id,
                leave_type_id = %leave_type.id,
                requested_days = input.total_days,
                shortfall = check.shortfall,
                "Leave request exceeds available balance"
            );
            return Err(LeaveError::InsufficientBalance(Box::new(check)));
        }

        let reference_year = Utc::now().year();
        let sequence = SequenceCounterRepository::new(&txn)
            .next_value(tenant_id, LEAVE_REQUEST_SCOPE, reference_year)
            .await?;

        let request = LeaveRequestRepository::new(&txn)
            .insert(NewLeaveRequest {
                tenant_id,
                reference: format_leave_reference(reference_year, sequence),
                team_member_id: member.id,
                leave_type_id: leave_type.id,
                start_date: input.start_date,
                end_date: input.end_date,
                total_days: input.total_days,
                reason,
            })
            .await?;

        ledger
            .recalculate(tenant_id, member.id, leave_type.id, year)
            .await?;

        txn.commit().await?;

        counter!("leave_request_transitions_total", "transition" => "created").increment(1);
        info!(
            tenant_id = %tenant_id,
            leave_request_id = %request.id,
            reference = %request.reference,
            total_days = request.total_days,
            "Leave request created"
        );

        Ok(request)
    }

    /// PENDING → APPROVED. The days move from `pending` to `used`.
    ///
    /// The approver must be a team member of the same tenant.
    pub async fn approve(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        approver_id: Uuid,
    ) -> Result<leave_request::Model, LeaveError> {
        if TeamMemberRepository::new(self.db)
            .find_by_id(tenant_id, approver_id)
            .await?
            .is_none()
        {
            return Err(LeaveError::validation(
                "approver_id",
                "approver must be a team member of the tenant",
            ));
        }

        self.transition(
            tenant_id,
            id,
            LeaveRequestStatus::Approved,
            StatusUpdate {
                approved_by: Some(approver_id),
                ..Default::default()
            },
        )
        .await
    }

    /// PENDING → REJECTED. The days leave `pending` without becoming `used`.
    pub async fn reject(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        reason: &str,
    ) -> Result<leave_request::Model, LeaveError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(LeaveError::validation("reason", "a rejection reason is required"));
        }
        if reason.chars().count() > MAX_REASON_LEN {
            return Err(LeaveError::validation(
                "reason",
                format!("reason cannot exceed {MAX_REASON_LEN} characters"),
            ));
        }

        self.transition(
            tenant_id,
            id,
            LeaveRequestStatus::Rejected,
            StatusUpdate {
                rejection_reason: Some(reason.to_string()),
                ..Default::default()
            },
        )
        .await
    }

    /// PENDING or APPROVED → CANCELLED.
    pub async fn cancel(&self, tenant_id: Uuid, id: Uuid) -> Result<leave_request::Model, LeaveError> {
        self.transition(tenant_id, id, LeaveRequestStatus::Cancelled, StatusUpdate::default())
            .await
    }

    /// Removes the request and recomputes the balance as if it never existed.
    pub async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<(), LeaveError> {
        let existing = self.get(tenant_id, id).await?;

        let lock = ledger_lock(existing.team_member_id, existing.leave_type_id);
        let _guard = lock.lock().await;

        let txn = self.db.begin().await?;
        let requests = LeaveRequestRepository::new(&txn);

        if !requests.delete(tenant_id, id).await? {
            return Err(LeaveError::NotFound("Leave request"));
        }

        LeaveLedger::new(&txn)
            .recalculate(
                tenant_id,
                existing.team_member_id,
                existing.leave_type_id,
                existing.start_date.year(),
            )
            .await?;

        txn.commit().await?;

        counter!("leave_request_transitions_total", "transition" => "deleted").increment(1);
        info!(tenant_id = %tenant_id, leave_request_id = %id, "Leave request deleted");

        Ok(())
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<leave_request::Model, LeaveError> {
        LeaveRequestRepository::new(self.db)
            .find_by_id(tenant_id, id)
            .await?
            .ok_or(LeaveError::NotFound("Leave request"))
    }

    /// Lists requests newest first; `page` is zero-based.
    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: LeaveRequestFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<leave_request::Model>, u64), LeaveError> {
        Ok(LeaveRequestRepository::new(self.db)
            .list(tenant_id, filter, page, per_page)
            .await?)
    }

    /// Recomputes one balance under the pair lock.
    pub async fn recalculate_balance(
        &self,
        tenant_id: Uuid,
        team_member_id: Uuid,
        leave_type_id: Uuid,
        year: i32,
    ) -> Result<leave_balance::Model, LeaveError> {
        let lock = ledger_lock(team_member_id, leave_type_id);
        let _guard = lock.lock().await;

        let txn = self.db.begin().await?;
        let balance = LeaveLedger::new(&txn)
            .recalculate(tenant_id, team_member_id, leave_type_id, year)
            .await?;
        txn.commit().await?;

        Ok(balance)
    }

    /// Rolls `from_year` into the next year under the pair lock.
    pub async fn apply_carry_forward(
        &self,
        tenant_id: Uuid,
        team_member_id: Uuid,
        leave_type_id: Uuid,
        from_year: i32,
    ) -> Result<leave_balance::Model, LeaveError> {
        let lock = ledger_lock(team_member_id, leave_type_id);
        let _guard = lock.lock().await;

        let txn = self.db.begin().await?;
        let balance = LeaveLedger::new(&txn)
            .apply_carry_forward(tenant_id, team_member_id, leave_type_id, from_year)
            .await?;
        txn.commit().await?;

        Ok(balance)
    }

    async fn transition(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        to: LeaveRequestStatus,
        update: StatusUpdate,
    ) -> Result<leave_request::Model, LeaveError> {
        let existing = self.get(tenant_id, id).await?;

        let lock = ledger_lock(existing.team_member_id, existing.leave_type_id);
        let _guard = lock.lock().await;

        let txn = self.db.begin().await?;
        let requests = LeaveRequestRepository::new(&txn);

        let current = requests
            .find_by_id(tenant_id, id)
            .await?
            .ok_or(LeaveError::NotFound("Leave request"))?;
        if !current.status.can_transition_to(to) {
            return Err(LeaveError::InvalidTransition {
                from: current.status,
                to,
            });
        }

        if !requests
            .transition(tenant_id, id, current.status, to, update)
            .await?
        {
            return Err(LeaveError::InvalidTransition {
                from: current.status,
                to,
            });
        }

        LeaveLedger::new(&txn)
            .recalculate(
                tenant_id,
                current.team_member_id,
                current.leave_type_id,
                current.start_date.year(),
            )
            .await?;

        let updated = requests
            .find_by_id(tenant_id, id)
            .await?
            .ok_or(LeaveError::NotFound("Leave request"))?;

        txn.commit().await?;

        counter!("leave_request_transitions_total", "transition" => transition_label(to))
            .increment(1);
        info!(
            tenant_id = %tenant_id,
            leave_request_id = %id,
            from = %current.status,
            to = %to,
            "Leave request status changed"
        );

        Ok(updated)
    }
}

fn transition_label(to: LeaveRequestStatus) -> &'static str {
    match to {
        LeaveRequestStatus::Pending => "created",
        LeaveRequestStatus::Approved => "approved",
        LeaveRequestStatus::Rejected => "rejected",
        LeaveRequestStatus::Cancelled => "cancelled",
    }
}

fn normalize_reason(reason: Option<String>) -> Result<Option<String>, LeaveError> {
    let reason = reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());

    if let Some(reason) = &reason
        && reason.chars().count() > MAX_REASON_LEN
    {
        return Err(LeaveError::validation(
            "reason",
            format!("reason cannot exceed {MAX_REASON_LEN} characters"),
        ));
    }

    Ok(reason)
}
