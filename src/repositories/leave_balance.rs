//! Leave balance repository.
//!
//! Balance rows are created with insert-or-get against the
//! (team_member_id, leave_type_id, year) unique index and rewritten only by
//! the ledger's recomputation.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set, sea_query::OnConflict,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::leave_balance::{self, Entity as LeaveBalance};

/// Opening values for a balance row
#[derive(Debug, Clone, PartialEq)]
pub struct NewLeaveBalance {
    pub tenant_id: Uuid,
    pub team_member_id: Uuid,
    pub leave_type_id: Uuid,
    pub year: i32,
    pub total_quota: f64,
    pub carry_forward: f64,
}

/// Derived counters written back by a recalculation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceCounters {
    pub used: f64,
    pub pending: f64,
    pub available: f64,
    pub carry_forward: f64,
}

/// Repository for leave balance database operations
pub struct LeaveBalanceRepository<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> LeaveBalanceRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn find(
        &self,
        tenant_id: Uuid,
        team_member_id: Uuid,
        leave_type_id: Uuid,
        year: i32,
    ) -> Result<Option<leave_balance::Model>, RepositoryError> {
        Ok(LeaveBalance::find()
            .filter(leave_balance::Column::TenantId.eq(tenant_id))
            .filter(leave_balance::Column::TeamMemberId.eq(team_member_id))
            .filter(leave_balance::Column::LeaveTypeId.eq(leave_type_id))
            .filter(leave_balance::Column::Year.eq(year))
            .one(self.db)
            .await?)
    }

    /// Inserts the opening balance unless a row already exists.
    ///
    /// Returns `true` when this call created the row. An existing row is never
    /// touched.
    pub async fn insert_if_missing(&self, new: NewLeaveBalance) -> Result<bool, RepositoryError> {
        let now = Utc::now();
        let available = (new.total_quota + new.carry_forward).max(0.0);

        let model = leave_balance::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(new.tenant_id),
            team_member_id: Set(new.team_member_id),
            leave_type_id: Set(new.leave_type_id),
            year: Set(new.year),
            total_quota: Set(new.total_quota),
            used: Set(0.0),
            pending: Set(0.0),
            available: Set(available),
            carry_forward: Set(new.carry_forward),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let inserted = LeaveBalance::insert(model)
            .on_conflict(
                OnConflict::columns([
                    leave_balance::Column::TeamMemberId,
                    leave_balance::Column::LeaveTypeId,
                    leave_balance::Column::Year,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.db)
            .await?;

        Ok(inserted > 0)
    }

    /// Writes recomputed counters onto an existing row.
    pub async fn save_counters(
        &self,
        balance: leave_balance::Model,
        counters: BalanceCounters,
    ) -> Result<leave_balance::Model, RepositoryError> {
        let mut active = balance.into_active_model();
        active.used = Set(counters.used);
        active.pending = Set(counters.pending);
        active.available = Set(counters.available);
        active.carry_forward = Set(counters.carry_forward);
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(self.db).await?)
    }

    pub async fn list_for_member(
        &self,
        tenant_id: Uuid,
        team_member_id: Uuid,
        year: i32,
    ) -> Result<Vec<leave_balance::Model>, RepositoryError> {
        Ok(LeaveBalance::find()
            .filter(leave_balance::Column::TenantId.eq(tenant_id))
            .filter(leave_balance::Column::TeamMemberId.eq(team_member_id))
            .filter(leave_balance::Column::Year.eq(year))
            .order_by_asc(leave_balance::Column::LeaveTypeId)
            .all(self.db)
            .await?)
    }

    pub async fn list_for_tenant_year(
        &self,
        tenant_id: Uuid,
        year: i32,
    ) -> Result<Vec<leave_balance::Model>, RepositoryError> {
        Ok(LeaveBalance::find()
            .filter(leave_balance::Column::TenantId.eq(tenant_id))
            .filter(leave_balance::Column::Year.eq(year))
            .order_by_asc(leave_balance::Column::TeamMemberId)
            .order_by_asc(leave_balance::Column::LeaveTypeId)
            .all(self.db)
            .await?)
    }
}
