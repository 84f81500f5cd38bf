//! # Leave Type Model
//!
//! Named leave categories (casual, sick, earned) registered per tenant.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Maximum length of a leave type code (e.g. `CL`, `SL`).
pub const MAX_CODE_LEN: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "leave_types")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    /// Short code, unique per tenant
    pub code: String,
    pub category: LeaveCategory,
    pub is_paid: bool,
    pub is_active: bool,
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
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveCategory {
    #[sea_orm(string_value = "CASUAL")]
    Casual,
    #[sea_orm(string_value = "SICK")]
    Sick,
    #[sea_orm(string_value = "EARNED")]
    Earned,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tenant::Entity",
        from = "Column::TenantId",
        to = "super::tenant::Column::Id"
    )]
    Tenant,
    #[sea_orm(has_many = "super::leave_policy::Entity")]
    LeavePolicy,
}

impl Related<super::tenant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl Related<super::leave_policy::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeavePolicy.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
