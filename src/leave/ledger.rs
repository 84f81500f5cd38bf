//! # Leave Balance Ledger
//!
//! Balances are derived data. [`LeaveLedger::recalculate`] rebuilds the
//! `used` and `pending` counters of one (member, leave type, year) row from the
//! full set of leave requests, so re-running it is always safe. No code path
//! adjusts a balance by adding or subtracting a delta.

use chrono::{Datelike, NaiveDate, Utc};
use metrics::counter;
use sea_orm::ConnectionTrait;
use serde::Serialize;
use tracing::{debug, info};
use utoipa::ToSchema;
use uuid::Uuid;

use super::LeaveError;
use super::quota::{
    self, available_balance, availability_message, default_quota, is_sufficient, nearly_equal,
    quota_for_year, round2,
};
use crate::models::leave_balance;
use crate::models::leave_request::LeaveRequestStatus;
use crate::models::leave_type;
use crate::models::team_member;
use crate::repositories::leave_balance::{BalanceCounters, NewLeaveBalance};
use crate::repositories::leave_request::year_bounds;
use crate::repositories::{
    JobRoleRepository, LeaveBalanceRepository, LeavePolicyRepository, LeaveRequestRepository,
    LeaveTypeRepository, TeamMemberRepository,
};

/// Result of checking whether a member can take `requested_days` of leave
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AvailabilityCheck {
    /// Whether the balance covers the request
    pub available: bool,
    /// Days available right now
    pub balance: f64,
    pub pending: f64,
    pub used: f64,
    pub total_quota: f64,
    pub carry_forward: f64,
    pub requested_days: f64,
    /// `max(0, requested_days - balance)`
    pub shortfall: f64,
    pub message: String,
}

/// A balance row whose stored counters differed from the recomputed ones
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceDrift {
    pub balance_id: Uuid,
    pub team_member_id: Uuid,
    pub leave_type_id: Uuid,
    pub stored_used: f64,
    pub stored_pending: f64,
    pub stored_available: f64,
    pub used: f64,
    pub pending: f64,
    pub available: f64,
}

/// Outcome of a tenant-wide reconciliation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconcileReport {
    pub tenant_id: Uuid,
    pub year: i32,
    pub checked: usize,
    pub drifted: Vec<BalanceDrift>,
}

/// Quota and carry-forward limit resolved for a member and leave type
#[derive(Debug, Clone, Copy, PartialEq)]
struct ResolvedPolicy {
    annual_quota: f64,
    carry_forward_limit: f64,
}

/// Ledger operations over a connection or an open transaction
pub struct LeaveLedger<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> LeaveLedger<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Rebuilds the balance for (member, leave type, year) from every request
    /// whose start date falls in that year.
    ///
    /// A missing row is created first, together with the member's other
    /// balances for the year.
    pub async fn recalculate(
        &self,
        tenant_id: Uuid,
        team_member_id: Uuid,
        leave_type_id: Uuid,
        year: i32,
    ) -> Result<leave_balance::Model, LeaveError> {
        let balance = self
            .ensure_balance(tenant_id, team_member_id, leave_type_id, year)
            .await?;
        let (balance, _) = self.recompute(balance, None).await?;
        Ok(balance)
    }

    /// Creates opening balances of `year` for every active leave type of the tenant.
    ///
    /// Existing rows are left untouched. Returns all of the member's balances for the year.
    pub async fn initialize_for_member(
        &self,
        tenant_id: Uuid,
        team_member_id: Uuid,
        joined_date: NaiveDate,
        year: i32,
    ) -> Result<Vec<leave_balance::Model>, LeaveError> {
        let member = self.member(tenant_id, team_member_id).await?;
        let leave_types = LeaveTypeRepository::new(self.db).list_active(tenant_id).await?;

        let mut created = 0usize;
        for leave_type in &leave_types {
            if self
                .open_balance(&member, leave_type, joined_date, year)
                .await?
            {
                created += 1;
            }
        }

        if created > 0 {
            info!(
                tenant_id = %tenant_id,
                team_member_id = %team_member_id,
                year,
                created,
                "Initialized leave balances"
            );
        }

        Ok(LeaveBalanceRepository::new(self.db)
            .list_for_member(tenant_id, team_member_id, year)
            .await?)
    }

    /// Balances of a member for `year`, initializing them on first access.
    pub async fn balances_for_member(
        &self,
        tenant_id: Uuid,
        team_member_id: Uuid,
        year: i32,
    ) -> Result<Vec<leave_balance::Model>, LeaveError> {
        let member = self.member(tenant_id, team_member_id).await?;
        self.initialize_for_member(tenant_id, member.id, member.joined_date, year)
            .await
    }

    /// Read-only availability check. A missing balance is initialized lazily.
    pub async fn check_availability(
        &self,
        tenant_id: Uuid,
        team_member_id: Uuid,
        leave_type_id: Uuid,
        requested_days: f64,
        year: Option<i32>,
    ) -> Result<AvailabilityCheck, LeaveError> {
        if !requested_days.is_finite() || requested_days <= 0.0 {
            return Err(LeaveError::validation(
                "requested_days",
                "requested_days must be a positive number",
            ));
        }

        let year = year.unwrap_or_else(|| Utc::now().year());
        let balances = LeaveBalanceRepository::new(self.db);

        let balance = match balances
            .find(tenant_id, team_member_id, leave_type_id, year)
            .await?
        {
            Some(balance) => balance,
            None => {
                self.recalculate(tenant_id, team_member_id, leave_type_id, year)
                    .await?
            }
        };

        Ok(build_availability(&balance, requested_days))
    }

    /// Rolls unused days of `from_year` into `from_year + 1`, up to the policy's limit.
    ///
    /// Both years are recomputed, so repeating the call yields the same result.
    pub async fn apply_carry_forward(
        &self,
        tenant_id: Uuid,
        team_member_id: Uuid,
        leave_type_id: Uuid,
        from_year: i32,
    ) -> Result<leave_balance::Model, LeaveError> {
        let member = self.member(tenant_id, team_member_id).await?;
        let leave_type = self.leave_type(tenant_id, leave_type_id).await?;
        let policy = self.resolve_policy(&member, &leave_type).await?;

        let closing = self
            .recalculate(tenant_id, team_member_id, leave_type_id, from_year)
            .await?;
        let carry_forward = round2(closing.available.min(policy.carry_forward_limit).max(0.0));

        let next_year = from_year + 1;
        let opening = self
            .ensure_balance(tenant_id, team_member_id, leave_type_id, next_year)
            .await?;
        let (balance, _) = self.recompute(opening, Some(carry_forward)).await?;

        info!(
            tenant_id = %tenant_id,
            team_member_id = %team_member_id,
            leave_type_id = %leave_type_id,
            from_year,
            carry_forward,
            "Applied leave carry-forward"
        );

        Ok(balance)
    }

    /// Recomputes every balance of the tenant for `year` and reports drifted rows.
    pub async fn reconcile(&self, tenant_id: Uuid, year: i32) -> Result<ReconcileReport, LeaveError> {
        let rows = LeaveBalanceRepository::new(self.db)
            .list_for_tenant_year(tenant_id, year)
            .await?;

        let mut report = ReconcileReport {
            tenant_id,
            year,
            checked: rows.len(),
            drifted: Vec::new(),
        };

        for stored in rows {
            let (recomputed, drifted) = self.recompute(stored.clone(), None).await?;
            if drifted {
                report.drifted.push(BalanceDrift {
                    balance_id: stored.id,
                    team_member_id: stored.team_member_id,
                    leave_type_id: stored.leave_type_id,
                    stored_used: stored.used,
                    stored_pending: stored.pending,
                    stored_available: stored.available,
                    used: recomputed.used,
                    pending: recomputed.pending,
                    available: recomputed.available,
                });
            }
        }

        info!(
            tenant_id = %tenant_id,
            year,
            checked = report.checked,
            drifted = report.drifted.len(),
            "Reconciled leave balances"
        );

        Ok(report)
    }

    /// Sums requests into counters and persists them.
    ///
    /// Returns the saved row and whether any stored counter changed.
    async fn recompute(
        &self,
        balance: leave_balance::Model,
        carry_forward: Option<f64>,
    ) -> Result<(leave_balance::Model, bool), LeaveError> {
        let (from, to) = year_bounds(balance.year)?;
        let requests = LeaveRequestRepository::new(self.db)
            .list_starting_between(balance.team_member_id, balance.leave_type_id, from, to)
            .await?;

        let (mut used, mut pending) = (0.0, 0.0);
        for request in &requests {
            match request.status {
                LeaveRequestStatus::Approved => used += request.total_days,
                LeaveRequestStatus::Pending => pending += request.total_days,
                LeaveRequestStatus::Rejected | LeaveRequestStatus::Cancelled => {}
            }
        }

        let carry_forward = carry_forward.unwrap_or(balance.carry_forward);
        let counters = BalanceCounters {
            used: round2(used),
            pending: round2(pending),
            available: available_balance(balance.total_quota, carry_forward, used, pending),
            carry_forward,
        };

        let drifted = !nearly_equal(balance.used, counters.used)
            || !nearly_equal(balance.pending, counters.pending)
            || !nearly_equal(balance.available, counters.available)
            || !nearly_equal(balance.carry_forward, counters.carry_forward);

        debug!(
            balance_id = %balance.id,
            year = balance.year,
            requests = requests.len(),
            used = counters.used,
            pending = counters.pending,
            available = counters.available,
            drifted,
            "Recalculated leave balance"
        );

        let saved = LeaveBalanceRepository::new(self.db)
            .save_counters(balance, counters)
            .await?;
        counter!("leave_balance_recalculations_total").increment(1);

        Ok((saved, drifted))
    }

    /// Returns the balance row, creating the member's balances for the year when it is missing.
    async fn ensure_balance(
        &self,
        tenant_id: Uuid,
        team_member_id: Uuid,
        leave_type_id: Uuid,
        year: i32,
    ) -> Result<leave_balance::Model, LeaveError> {
        let balances = LeaveBalanceRepository::new(self.db);
        if let Some(balance) = balances
            .find(tenant_id, team_member_id, leave_type_id, year)
            .await?
        {
            return Ok(balance);
        }

        let member = self.member(tenant_id, team_member_id).await?;
        self.initialize_for_member(tenant_id, member.id, member.joined_date, year)
            .await?;

        if let Some(balance) = balances
            .find(tenant_id, team_member_id, leave_type_id, year)
            .await?
        {
            return Ok(balance);
        }

        // Inactive leave types are skipped by initialization but may still carry requests.
        let leave_type = self.leave_type(tenant_id, leave_type_id).await?;
        self.open_balance(&member, &leave_type, member.joined_date, year)
            .await?;

        balances
            .find(tenant_id, team_member_id, leave_type_id, year)
            .await?
            .ok_or(LeaveError::NotFound("Leave balance"))
    }

    /// Inserts the opening balance for one leave type. Returns whether a row was created.
    async fn open_balance(
        &self,
        member: &team_member::Model,
        leave_type: &leave_type::Model,
        joined_date: NaiveDate,
        year: i32,
    ) -> Result<bool, LeaveError> {
        let policy = self.resolve_policy(member, leave_type).await?;

        let created = LeaveBalanceRepository::new(self.db)
            .insert_if_missing(NewLeaveBalance {
                tenant_id: member.tenant_id,
                team_member_id: member.id,
                leave_type_id: leave_type.id,
                year,
                total_quota: quota_for_year(policy.annual_quota, joined_date, year),
                carry_forward: 0.0,
            })
            .await?;

        Ok(created)
    }

    /// Active policy of the member's job role, or the category default.
    async fn resolve_policy(
        &self,
        member: &team_member::Model,
        leave_type: &leave_type::Model,
    ) -> Result<ResolvedPolicy, LeaveError> {
        let role = JobRoleRepository::new(self.db)
            .find_active_by_title(member.tenant_id, &member.job_title)
            .await?;

        if let Some(role) = role {
            let policy = LeavePolicyRepository::new(self.db)
                .find_active(member.tenant_id, role.id, leave_type.id)
                .await?;
            if let Some(policy) = policy {
                return Ok(ResolvedPolicy {
                    annual_quota: policy.annual_quota,
                    carry_forward_limit: policy.carry_forward_limit,
                });
            }
        }

        let fallback = default_quota(leave_type.category);
        Ok(ResolvedPolicy {
            annual_quota: fallback.annual_quota,
            carry_forward_limit: fallback.carry_forward_limit,
        })
    }

    async fn member(&self, tenant_id: Uuid, id: Uuid) -> Result<team_member::Model, LeaveError> {
        TeamMemberRepository::new(self.db)
            .find_by_id(tenant_id, id)
            .await?
            .ok_or(LeaveError::NotFound("Team member"))
    }

    async fn leave_type(&self, tenant_id: Uuid, id: Uuid) -> Result<leave_type::Model, LeaveError> {
        LeaveTypeRepository::new(self.db)
            .find_by_id(tenant_id, id)
            .await?
            .ok_or(LeaveError::NotFound("Leave type"))
    }
}

fn build_availability(balance: &leave_balance::Model, requested_days: f64) -> AvailabilityCheck {
    AvailabilityCheck {
        available: is_sufficient(requested_days, balance.available),
        balance: balance.available,
        pending: balance.pending,
        used: balance.used,
        total_quota: balance.total_quota,
        carry_forward: balance.carry_forward,
        requested_days,
        shortfall: quota::shortfall(requested_days, balance.available),
        message: availability_message(requested_days, balance.available),
    }
}
