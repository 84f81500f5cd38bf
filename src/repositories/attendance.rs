//! Attendance repository.
//!
//! One row per (team member, date). [`AttendanceRepository::insert_if_missing`]
//! is the insert-or-get primitive used by the daily check-in path.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::OnConflict,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::attendance::{self, AttendanceStatus, Entity as Attendance};

/// Values for a new attendance row
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttendance {
    pub tenant_id: Uuid,
    pub team_member_id: Uuid,
    pub date: NaiveDate,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub status: AttendanceStatus,
    pub working_hours: f64,
    pub overtime_hours: f64,
    pub notes: Option<String>,
}

/// Repository for attendance database operations
pub struct AttendanceRepository<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> AttendanceRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Inserts a row. A second row for the same member and day is a unique violation.
    pub async fn insert(&self, new: NewAttendance) -> Result<attendance::Model, RepositoryError> {
        Ok(active_model(new).insert(self.db).await?)
    }

    /// Inserts the row unless the member already has one for that day.
    ///
    /// Returns the stored row and whether this call created it.
    pub async fn insert_if_missing(
        &self,
        new: NewAttendance,
    ) -> Result<(attendance::Model, bool), RepositoryError> {
        let (member_id, date) = (new.team_member_id, new.date);

        let inserted = Attendance::insert(active_model(new))
            .on_conflict(
                OnConflict::columns([attendance::Column::TeamMemberId, attendance::Column::Date])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db)
            .await?;

        let stored = self
            .find_for_day(member_id, date)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("Attendance".to_string()))?;

        Ok((stored, inserted > 0))
    }

    pub async fn find_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<attendance::Model>, RepositoryError> {
        Ok(Attendance::find_by_id(id)
            .filter(attendance::Column::TenantId.eq(tenant_id))
            .one(self.db)
            .await?)
    }

    pub async fn find_for_day(
        &self,
        team_member_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<attendance::Model>, RepositoryError> {
        Ok(Attendance::find()
            .filter(attendance::Column::TeamMemberId.eq(team_member_id))
            .filter(attendance::Column::Date.eq(date))
            .one(self.db)
            .await?)
    }

    /// Persists the changed columns of `model` and bumps `updated_at`.
    pub async fn update(
        &self,
        mut model: attendance::ActiveModel,
    ) -> Result<attendance::Model, RepositoryError> {
        model.updated_at = Set(Utc::now().into());
        Ok(model.update(self.db).await?)
    }

    /// Rows of one member between two dates, both inclusive, oldest first.
    pub async fn list_for_member(
        &self,
        tenant_id: Uuid,
        team_member_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<attendance::Model>, RepositoryError> {
        Ok(Attendance::find()
            .filter(attendance::Column::TenantId.eq(tenant_id))
            .filter(attendance::Column::TeamMemberId.eq(team_member_id))
            .filter(attendance::Column::Date.between(from, to))
            .order_by_asc(attendance::Column::Date)
            .all(self.db)
            .await?)
    }
}

fn active_model(new: NewAttendance) -> attendance::ActiveModel {
    let now = Utc::now();
    attendance::ActiveModel {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(new.tenant_id),
        team_member_id: Set(new.team_member_id),
        date: Set(new.date),
        check_in: Set(new.check_in),
        check_out: Set(new.check_out),
        status: Set(new.status),
        working_hours: Set(new.working_hours),
        overtime_hours: Set(new.overtime_hours),
        notes: Set(new.notes),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
}
