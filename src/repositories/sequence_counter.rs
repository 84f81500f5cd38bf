//! Persisted monotonic counters.
//!
//! Call [`SequenceCounterRepository::next_value`] inside the transaction that
//! consumes the value; the increment row lock then serializes concurrent callers.

use chrono::Utc;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
    prelude::DateTimeWithTimeZone,
    sea_query::{Expr, OnConflict},
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::sequence_counter::{self, Entity as SequenceCounter};

/// Counter scope for leave request references
pub const LEAVE_REQUEST_SCOPE: &str = "leave_request";

pub struct SequenceCounterRepository<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> SequenceCounterRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Increments the (tenant, scope, year) counter and returns the new value.
    ///
    /// The first call for a key returns 1.
    pub async fn next_value(
        &self,
        tenant_id: Uuid,
        scope: &str,
        year: i32,
    ) -> Result<i64, RepositoryError> {
        let now: DateTimeWithTimeZone = Utc::now().into();

        let seed = sequence_counter::ActiveModel {
            tenant_id: Set(tenant_id),
            scope: Set(scope.to_string()),
            year: Set(year),
            last_value: Set(0),
            updated_at: Set(now),
        };

        SequenceCounter::insert(seed)
            .on_conflict(
                OnConflict::columns([
                    sequence_counter::Column::TenantId,
                    sequence_counter::Column::Scope,
                    sequence_counter::Column::Year,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.db)
            .await?;

        SequenceCounter::update_many()
            .col_expr(
                sequence_counter::Column::LastValue,
                Expr::col(sequence_counter::Column::LastValue).add(1),
            )
            .col_expr(sequence_counter::Column::UpdatedAt, Expr::value(now))
            .filter(sequence_counter::Column::TenantId.eq(tenant_id))
            .filter(sequence_counter::Column::Scope.eq(scope))
            .filter(sequence_counter::Column::Year.eq(year))
            .exec(self.db)
            .await?;

        let counter = SequenceCounter::find_by_id((tenant_id, scope.to_string(), year))
            .one(self.db)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("Sequence counter {scope}/{year}")))?;

        Ok(counter.last_value)
    }
}

/// Formats a leave request reference such as `LR-2026-000042`.
pub fn format_leave_reference(year: i32, value: i64) -> String {
    format!("LR-{year}-{value:06}")
}
