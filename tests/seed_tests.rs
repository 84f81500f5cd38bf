//! Leave catalog seeding tests.

mod test_utils;

use peopleops::models::leave_type::LeaveCategory;
use peopleops::repositories::leave_policy::PolicyValues;
use peopleops::repositories::{
    CreateTenantRequest, LeavePolicyRepository, LeaveTypeRepository, TenantRepository,
};
use peopleops::seeds::{seed_default_leave_policies, seed_leave_types};
use test_utils::{create_job_role, create_test_tenant, leave_type_by_code, setup_test_db};

#[tokio::test]
async fn leave_type_seeding_is_idempotent() {
    let db = setup_test_db().await.unwrap();
    let tenant = TenantRepository::new(&db)
        .create_tenant(CreateTenantRequest {
            name: "Acme".to_string(),
        })
        .await
        .unwrap();

    let first = seed_leave_types(&db, tenant.id).await.unwrap();
    let second = seed_leave_types(&db, tenant.id).await.unwrap();

    assert_eq!(first.len(), 3);
    let first_ids: Vec<_> = first.iter().map(|t| t.id).collect();
    let second_ids: Vec<_> = second.iter().map(|t| t.id).collect();
    assert_eq!(first_ids, second_ids);

    let stored = LeaveTypeRepository::new(&db).list(tenant.id).await.unwrap();
    assert_eq!(stored.len(), 3);
}

#[tokio::test]
async fn seeded_types_carry_their_categories() {
    let db = setup_test_db().await.unwrap();
    let tenant_id = create_test_tenant(&db).await.unwrap();

    let casual = leave_type_by_code(&db, tenant_id, "CL").await.unwrap();
    let sick = leave_type_by_code(&db, tenant_id, "SL").await.unwrap();
    let earned = leave_type_by_code(&db, tenant_id, "EL").await.unwrap();

    assert_eq!(casual.category, LeaveCategory::Casual);
    assert_eq!(sick.category, LeaveCategory::Sick);
    assert_eq!(earned.category, LeaveCategory::Earned);
    assert!(casual.is_paid && sick.is_paid && earned.is_paid);
}

#[tokio::test]
async fn policy_seeding_covers_every_role_and_type_once() {
    let db = setup_test_db().await.unwrap();
    let tenant_id = create_test_tenant(&db).await.unwrap();
    create_job_role(&db, tenant_id, "Engineer").await.unwrap();
    create_job_role(&db, tenant_id, "Designer").await.unwrap();

    assert_eq!(seed_default_leave_policies(&db, tenant_id).await.unwrap(), 6);
    assert_eq!(seed_default_leave_policies(&db, tenant_id).await.unwrap(), 0);

    let earned = leave_type_by_code(&db, tenant_id, "EL").await.unwrap();
    let policies = LeavePolicyRepository::new(&db).list(tenant_id).await.unwrap();
    assert_eq!(policies.len(), 6);

    let earned_policy = policies
        .iter()
        .find(|p| p.leave_type_id == earned.id)
        .unwrap();
    assert_eq!(earned_policy.annual_quota, 15.0);
    assert_eq!(earned_policy.carry_forward_limit, 5.0);
}

#[tokio::test]
async fn policy_seeding_keeps_customized_quotas() {
    let db = setup_test_db().await.unwrap();
    let tenant_id = create_test_tenant(&db).await.unwrap();
    let role_id = create_job_role(&db, tenant_id, "Engineer").await.unwrap();
    let casual = leave_type_by_code(&db, tenant_id, "CL").await.unwrap();

    LeavePolicyRepository::new(&db)
        .upsert(
            tenant_id,
            PolicyValues {
                job_role_id: role_id,
                leave_type_id: casual.id,
                annual_quota: 20.0,
                carry_forward_limit: 0.0,
                is_active: true,
            },
        )
        .await
        .unwrap();

    assert_eq!(seed_default_leave_policies(&db, tenant_id).await.unwrap(), 2);

    let policy = LeavePolicyRepository::new(&db)
        .find(tenant_id, role_id, casual.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(policy.annual_quota, 20.0);
}
