//! Database seeding
//!
//! Bootstraps a tenant with the standard leave catalog. Every seeder is
//! idempotent and only inserts what is missing.

pub mod leave_types;

pub use leave_types::{seed_default_leave_policies, seed_leave_types};
