//! Leave catalog seeding
//!
//! Registers the Casual, Sick and Earned leave types for a tenant and gives
//! every active job role a policy for each of them.

use anyhow::Result;
use sea_orm::ConnectionTrait;
use uuid::Uuid;

use crate::leave::quota::default_quota;
use crate::models::leave_type::{self, LeaveCategory};
use crate::repositories::leave_policy::PolicyValues;
use crate::repositories::leave_type::NewLeaveType;
use crate::repositories::{JobRoleRepository, LeavePolicyRepository, LeaveTypeRepository};

/// Seeds the default leave types, returning the stored rows
///
/// Types whose code is already registered are left untouched.
pub async fn seed_leave_types<C: ConnectionTrait>(
    db: &C,
    tenant_id: Uuid,
) -> Result<Vec<leave_type::Model>> {
    let repo = LeaveTypeRepository::new(db);

    let defaults = vec![
        LeaveTypeSeed {
            code: "CL",
            name: "Casual Leave",
            category: LeaveCategory::Casual,
        },
        LeaveTypeSeed {
            code: "SL",
            name: "Sick Leave",
            category: LeaveCategory::Sick,
        },
        LeaveTypeSeed {
            code: "EL",
            name: "Earned Leave",
            category: LeaveCategory::Earned,
        },
    ];

    let mut seeded = Vec::with_capacity(defaults.len());
    for seed in defaults {
        let (stored, created) = repo
            .insert_if_missing(
                tenant_id,
                NewLeaveType {
                    name: seed.name.to_string(),
                    code: seed.code.to_string(),
                    category: seed.category,
                    is_paid: true,
                },
            )
            .await?;

        if created {
            log::info!("Created leave type '{}' for tenant {}", stored.code, tenant_id);
        } else {
            log::info!("Leave type '{}' already exists, skipping", stored.code);
        }
        seeded.push(stored);
    }

    Ok(seeded)
}

/// Gives every active job role a policy for every active leave type
///
/// Quotas come from the category defaults. Existing pairs keep their values.
/// Returns the number of policies created.
pub async fn seed_default_leave_policies<C: ConnectionTrait>(
    db: &C,
    tenant_id: Uuid,
) -> Result<usize> {
    let roles = JobRoleRepository::new(db).list_active(tenant_id).await?;
    let leave_types = LeaveTypeRepository::new(db).list_active(tenant_id).await?;
    let policies = LeavePolicyRepository::new(db);

    let mut created = 0;
    for role in &roles {
        for leave_type in &leave_types {
            let quota = default_quota(leave_type.category);
            let inserted = policies
                .insert_if_missing(
                    tenant_id,
                    PolicyValues {
                        job_role_id: role.id,
                        leave_type_id: leave_type.id,
                        annual_quota: quota.annual_quota,
                        carry_forward_limit: quota.carry_forward_limit,
                        is_active: true,
                    },
                )
                .await?;
            if inserted {
                created += 1;
            }
        }
    }

    log::info!(
        "Leave policy seeding completed for tenant {}: {} created across {} roles",
        tenant_id,
        created,
        roles.len()
    );
    Ok(created)
}

struct LeaveTypeSeed {
    code: &'static str,
    name: &'static str,
    category: LeaveCategory,
}
