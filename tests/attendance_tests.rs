//! Attendance store tests against an in-memory SQLite database.

mod test_utils;

use peopleops::attendance::{AttendanceError, AttendanceService, CreateAttendance, UpdateAttendance};
use peopleops::models::attendance::AttendanceStatus;
use test_utils::{create_team_member, create_test_tenant, date, setup_test_db};

const STANDARD_HOURS: f64 = 8.0;

fn full_day(team_member_id: uuid::Uuid) -> CreateAttendance {
    CreateAttendance {
        team_member_id,
        date: date(2026, 3, 2),
        check_in: Some("09:00".to_string()),
        check_out: Some("18:30".to_string()),
        status: AttendanceStatus::Present,
        notes: None,
    }
}

#[tokio::test]
async fn create_computes_regular_and_overtime_hours() {
    let db = setup_test_db().await.unwrap();
    let tenant_id = create_test_tenant(&db).await.unwrap();
    let member = create_team_member(&db, tenant_id, "Asha Rao", "Engineer", date(2025, 1, 10), None)
        .await
        .unwrap();

    let record = AttendanceService::new(&db, STANDARD_HOURS)
        .create(tenant_id, full_day(member.id))
        .await
        .unwrap();

    assert_eq!(record.working_hours, 8.0);
    assert_eq!(record.overtime_hours, 1.5);
    assert_eq!(record.status, AttendanceStatus::Present);
}

#[tokio::test]
async fn second_record_for_the_same_day_conflicts() {
    let db = setup_test_db().await.unwrap();
    let tenant_id = create_test_tenant(&db).await.unwrap();
    let member = create_team_member(&db, tenant_id, "Asha Rao", "Engineer", date(2025, 1, 10), None)
        .await
        .unwrap();
    let service = AttendanceService::new(&db, STANDARD_HOURS);

    service.create(tenant_id, full_day(member.id)).await.unwrap();
    let err = service.create(tenant_id, full_day(member.id)).await.unwrap_err();

    match err {
        AttendanceError::Repository(repo_err) => assert!(repo_err.is_unique_violation()),
        other => panic!("expected a unique violation, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_times_are_rejected() {
    let db = setup_test_db().await.unwrap();
    let tenant_id = create_test_tenant(&db).await.unwrap();
    let member = create_team_member(&db, tenant_id, "Asha Rao", "Engineer", date(2025, 1, 10), None)
        .await
        .unwrap();

    let mut input = full_day(member.id);
    input.check_in = Some("9am".to_string());

    let err = AttendanceService::new(&db, STANDARD_HOURS)
        .create(tenant_id, input)
        .await
        .unwrap_err();

    assert!(matches!(err, AttendanceError::InvalidTime { field: "check_in", .. }));
}

#[tokio::test]
async fn unknown_member_is_not_found() {
    let db = setup_test_db().await.unwrap();
    let tenant_id = create_test_tenant(&db).await.unwrap();

    let err = AttendanceService::new(&db, STANDARD_HOURS)
        .create(tenant_id, full_day(uuid::Uuid::new_v4()))
        .await
        .unwrap_err();

    assert!(matches!(err, AttendanceError::NotFound(_)));
}

#[tokio::test]
async fn update_recomputes_hours_from_merged_times() {
    let db = setup_test_db().await.unwrap();
    let tenant_id = create_test_tenant(&db).await.unwrap();
    let member = create_team_member(&db, tenant_id, "Asha Rao", "Engineer", date(2025, 1, 10), None)
        .await
        .unwrap();
    let service = AttendanceService::new(&db, STANDARD_HOURS);

    let mut input = full_day(member.id);
    input.check_out = None;
    let record = service.create(tenant_id, input).await.unwrap();
    assert_eq!(record.working_hours, 0.0);

    let updated = service
        .update(
            tenant_id,
            record.id,
            UpdateAttendance {
                check_out: Some("13:30".to_string()),
                notes: Some("  half day  ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.check_in.as_deref(), Some("09:00"));
    assert_eq!(updated.check_out.as_deref(), Some("13:30"));
    assert_eq!(updated.working_hours, 4.5);
    assert_eq!(updated.overtime_hours, 0.0);
}

#[tokio::test]
async fn update_of_another_tenants_record_is_not_found() {
    let db = setup_test_db().await.unwrap();
    let tenant_a = create_test_tenant(&db).await.unwrap();
    let tenant_b = create_test_tenant(&db).await.unwrap();
    let member = create_team_member(&db, tenant_a, "Asha Rao", "Engineer", date(2025, 1, 10), None)
        .await
        .unwrap();
    let service = AttendanceService::new(&db, STANDARD_HOURS);
    let record = service.create(tenant_a, full_day(member.id)).await.unwrap();

    let err = service
        .update(tenant_b, record.id, UpdateAttendance::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AttendanceError::NotFound(_)));
}

#[tokio::test]
async fn list_returns_the_inclusive_range_in_date_order() {
    let db = setup_test_db().await.unwrap();
    let tenant_id = create_test_tenant(&db).await.unwrap();
    let member = create_team_member(&db, tenant_id, "Asha Rao", "Engineer", date(2025, 1, 10), None)
        .await
        .unwrap();
    let service = AttendanceService::new(&db, STANDARD_HOURS);

    for day in [4, 2, 3, 9] {
        let mut input = full_day(member.id);
        input.date = date(2026, 3, day);
        service.create(tenant_id, input).await.unwrap();
    }

    let records = service
        .list(tenant_id, member.id, date(2026, 3, 2), date(2026, 3, 4))
        .await
        .unwrap();
    let days: Vec<_> = records.iter().map(|r| r.date).collect();

    assert_eq!(days, vec![date(2026, 3, 2), date(2026, 3, 3), date(2026, 3, 4)]);
}

#[tokio::test]
async fn list_rejects_an_inverted_range() {
    let db = setup_test_db().await.unwrap();
    let tenant_id = create_test_tenant(&db).await.unwrap();
    let member = create_team_member(&db, tenant_id, "Asha Rao", "Engineer", date(2025, 1, 10), None)
        .await
        .unwrap();

    let err = AttendanceService::new(&db, STANDARD_HOURS)
        .list(tenant_id, member.id, date(2026, 3, 5), date(2026, 3, 1))
        .await
        .unwrap_err();

    assert!(matches!(err, AttendanceError::Validation { field: "to", .. }));
}

#[tokio::test]
async fn get_or_create_for_day_is_idempotent() {
    let db = setup_test_db().await.unwrap();
    let tenant_id = create_test_tenant(&db).await.unwrap();
    let member = create_team_member(&db, tenant_id, "Asha Rao", "Engineer", date(2025, 1, 10), None)
        .await
        .unwrap();
    let service = AttendanceService::new(&db, STANDARD_HOURS);

    let (first, created) = service
        .get_or_create_for_day(tenant_id, member.id, date(2026, 3, 2))
        .await
        .unwrap();
    assert!(created);
    assert_eq!(first.status, AttendanceStatus::Present);
    assert!(first.check_in.is_none());

    let (second, created) = service
        .get_or_create_for_day(tenant_id, member.id, date(2026, 3, 2))
        .await
        .unwrap();
    assert!(!created);
    assert_eq!(first.id, second.id);
}

#[tokio::test]
async fn repeated_check_in_keeps_the_first_time() {
    let db = setup_test_db().await.unwrap();
    let tenant_id = create_test_tenant(&db).await.unwrap();
    let member = create_team_member(&db, tenant_id, "Asha Rao", "Engineer", date(2025, 1, 10), None)
        .await
        .unwrap();
    let service = AttendanceService::new(&db, STANDARD_HOURS);

    let (first, created) = service
        .record_check_in(tenant_id, member.id, date(2026, 3, 2), "09:05")
        .await
        .unwrap();
    assert!(created);

    let (second, created) = service
        .record_check_in(tenant_id, member.id, date(2026, 3, 2), "10:00")
        .await
        .unwrap();
    assert!(!created);
    assert_eq!(second.id, first.id);
    assert_eq!(second.check_in.as_deref(), Some("09:05"));
}

#[tokio::test]
async fn check_out_requires_a_check_in() {
    let db = setup_test_db().await.unwrap();
    let tenant_id = create_test_tenant(&db).await.unwrap();
    let member = create_team_member(&db, tenant_id, "Asha Rao", "Engineer", date(2025, 1, 10), None)
        .await
        .unwrap();
    let service = AttendanceService::new(&db, STANDARD_HOURS);

    let missing = service
        .record_check_out(member.id, date(2026, 3, 2), "18:00")
        .await
        .unwrap();
    assert!(missing.is_none());

    service
        .record_check_in(tenant_id, member.id, date(2026, 3, 2), "09:00")
        .await
        .unwrap();
    let record = service
        .record_check_out(member.id, date(2026, 3, 2), "18:00")
        .await
        .unwrap()
        .expect("checked out");

    assert_eq!(record.check_out.as_deref(), Some("18:00"));
    assert_eq!(record.working_hours, 8.0);
    assert_eq!(record.overtime_hours, 1.0);
}
