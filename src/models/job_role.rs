//! Job role entity model
//!
//! Leave policies are keyed by job role; members are matched to a role by
//! their `job_title`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "job_roles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub title: String,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::leave_policy::Entity")]
    LeavePolicy,
}

impl Related<super::leave_policy::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeavePolicy.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
