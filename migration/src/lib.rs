//! Database migrations for the PeopleOps service.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2026_01_05_090000_create_tenants;
mod m2026_01_05_090100_create_job_roles;
mod m2026_01_05_090200_create_team_members;
mod m2026_01_05_090300_create_leave_types;
mod m2026_01_05_090400_create_leave_policies;
mod m2026_01_05_090500_create_leave_balances;
mod m2026_01_05_090600_create_leave_requests;
mod m2026_01_05_090700_create_attendances;
mod m2026_01_05_090800_create_slack_attendance_logs;
mod m2026_01_05_090900_create_sequence_counters;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2026_01_05_090000_create_tenants::Migration),
            Box::new(m2026_01_05_090100_create_job_roles::Migration),
            Box::new(m2026_01_05_090200_create_team_members::Migration),
            Box::new(m2026_01_05_090300_create_leave_types::Migration),
            Box::new(m2026_01_05_090400_create_leave_policies::Migration),
            Box::new(m2026_01_05_090500_create_leave_balances::Migration),
            Box::new(m2026_01_05_090600_create_leave_requests::Migration),
            Box::new(m2026_01_05_090700_create_attendances::Migration),
            Box::new(m2026_01_05_090800_create_slack_attendance_logs::Migration),
            Box::new(m2026_01_05_090900_create_sequence_counters::Migration),
        ]
    }
}
