//! Leave request repository.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::leave_request::{self, Entity as LeaveRequest, LeaveRequestStatus};

/// A validated request ready to be stored as PENDING
#[derive(Debug, Clone)]
pub struct NewLeaveRequest {
    pub tenant_id: Uuid,
    pub reference: String,
    pub team_member_id: Uuid,
    pub leave_type_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_days: f64,
    pub reason: Option<String>,
}

/// Column values written by a status transition
#[derive(Debug, Clone, Default)]
pub struct StatusUpdate {
    pub approved_by: Option<Uuid>,
    pub rejection_reason: Option<String>,
}

/// Optional filters for listing requests
#[derive(Debug, Clone, Default)]
pub struct LeaveRequestFilter {
    pub team_member_id: Option<Uuid>,
    pub status: Option<LeaveRequestStatus>,
    pub year: Option<i32>,
}

/// Repository for leave request database operations
pub struct LeaveRequestRepository<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> LeaveRequestRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn insert(&self, new: NewLeaveRequest) -> Result<leave_request::Model, RepositoryError> {
        let now = Utc::now();
        let model = leave_request::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(new.tenant_id),
            reference: Set(new.reference),
            team_member_id: Set(new.team_member_id),
            leave_type_id: Set(new.leave_type_id),
            start_date: Set(new.start_date),
            end_date: Set(new.end_date),
            total_days: Set(new.total_days),
            reason: Set(new.reason),
            status: Set(LeaveRequestStatus::Pending),
            approved_by: Set(None),
            approved_at: Set(None),
            rejection_reason: Set(None),
            cancelled_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        Ok(model.insert(self.db).await?)
    }

    pub async fn find_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<leave_request::Model>, RepositoryError> {
        Ok(LeaveRequest::find_by_id(id)
            .filter(leave_request::Column::TenantId.eq(tenant_id))
            .one(self.db)
            .await?)
    }

    /// Moves a request from `from` to `to` with a compare-and-set on the status column.
    ///
    /// Returns `false` when the row no longer has status `from`, so two racing
    /// transitions cannot both succeed.
    pub async fn transition(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        from: LeaveRequestStatus,
        to: LeaveRequestStatus,
        update: StatusUpdate,
    ) -> Result<bool, RepositoryError> {
        let now = Utc::now();
        let mut changes = leave_request::ActiveModel {
            status: Set(to),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        match to {
            LeaveRequestStatus::Approved => {
                changes.approved_by = Set(update.approved_by);
                changes.approved_at = Set(Some(now.into()));
            }
            LeaveRequestStatus::Rejected => {
                changes.rejection_reason = Set(update.rejection_reason);
            }
            LeaveRequestStatus::Cancelled => {
                changes.cancelled_at = Set(Some(now.into()));
            }
            LeaveRequestStatus::Pending => {}
        }

        let result = LeaveRequest::update_many()
            .set(changes)
            .filter(leave_request::Column::Id.eq(id))
            .filter(leave_request::Column::TenantId.eq(tenant_id))
            .filter(leave_request::Column::Status.eq(from))
            .exec(self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Hard-deletes a request. Returns whether a row was removed.
    pub async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, RepositoryError> {
        let result = LeaveRequest::delete_many()
            .filter(leave_request::Column::Id.eq(id))
            .filter(leave_request::Column::TenantId.eq(tenant_id))
            .exec(self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Every request of a member and leave type whose start date falls in `[from, to]`.
    pub async fn list_starting_between(
        &self,
        team_member_id: Uuid,
        leave_type_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<leave_request::Model>, RepositoryError> {
        Ok(LeaveRequest::find()
            .filter(leave_request::Column::TeamMemberId.eq(team_member_id))
            .filter(leave_request::Column::LeaveTypeId.eq(leave_type_id))
            .filter(leave_request::Column::StartDate.between(from, to))
            .all(self.db)
            .await?)
    }

    /// Lists requests newest first. `page` is zero-based.
    ///
    /// Returns the page and the total number of matching rows.
    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: LeaveRequestFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<leave_request::Model>, u64), RepositoryError> {
        let mut query = LeaveRequest::find().filter(leave_request::Column::TenantId.eq(tenant_id));

        if let Some(member_id) = filter.team_member_id {
            query = query.filter(leave_request::Column::TeamMemberId.eq(member_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(leave_request::Column::Status.eq(status));
        }
        if let Some(year) = filter.year {
            let (from, to) = year_bounds(year)?;
            query = query.filter(leave_request::Column::StartDate.between(from, to));
        }

        let paginator = query
            .order_by_desc(leave_request::Column::CreatedAt)
            .order_by_desc(leave_request::Column::Id)
            .paginate(self.db, per_page);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page).await?;

        Ok((items, total))
    }
}

/// First and last calendar day of `year`.
pub fn year_bounds(year: i32) -> Result<(NaiveDate, NaiveDate), RepositoryError> {
    let from = NaiveDate::from_ymd_opt(year, 1, 1);
    let to = NaiveDate::from_ymd_opt(year, 12, 31);
    from.zip(to)
        .ok_or_else(|| RepositoryError::validation_error(format!("year {year} is out of range")))
}
