//! # Common API Types
//!
//! Shared response structures and pagination utilities for list endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_PER_PAGE: u64 = 20;
pub const MAX_PER_PAGE: u64 = 100;

/// Generic paginated response wrapper for list endpoints
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T> {
    /// Items of the current page
    pub data: Vec<T>,
    /// Current page, starting at 1
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 20)]
    pub per_page: u64,
    /// Total number of matching items
    #[schema(example = 42)]
    pub total: u64,
    /// Convenience field indicating if more pages exist
    pub has_more: bool,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, page: Page, total: u64) -> Self {
        Self {
            data,
            page: page.number,
            per_page: page.per_page,
            total,
            has_more: page.number * page.per_page < total,
        }
    }
}

/// Normalized 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u64,
    pub per_page: u64,
}

impl Page {
    /// Defaults to the first page of [`DEFAULT_PER_PAGE`]; `per_page` is clamped to `1..=MAX_PER_PAGE`.
    pub fn from_query(page: Option<u64>, per_page: Option<u64>) -> Self {
        Self {
            number: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
        }
    }

    /// Zero-based index for the repository paginator
    pub fn index(&self) -> u64 {
        self.number - 1
    }
}
