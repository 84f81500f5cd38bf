//! # PeopleOps Library
//!
//! Leave balances, the leave request workflow and attendance tracking for
//! multi-tenant teams, served over a REST API with a Slack attendance bridge.

pub mod attendance;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod leave;
pub mod models;
pub mod repositories;
pub mod seeds;
pub mod server;
pub mod telemetry;
pub mod webhook_verification;
pub use migration;
