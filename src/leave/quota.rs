//! Pure quota arithmetic shared by the ledger and the workflow.

use chrono::{Datelike, NaiveDate};

use crate::models::leave_type::LeaveCategory;

const EPSILON: f64 = 1e-9;

/// Quota used when a job role has no active policy for a leave type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefaultQuota {
    pub annual_quota: f64,
    pub carry_forward_limit: f64,
}

pub fn default_quota(category: LeaveCategory) -> DefaultQuota {
    match category {
        LeaveCategory::Casual => DefaultQuota {
            annual_quota: 12.0,
            carry_forward_limit: 0.0,
        },
        LeaveCategory::Sick => DefaultQuota {
            annual_quota: 12.0,
            carry_forward_limit: 0.0,
        },
        LeaveCategory::Earned => DefaultQuota {
            annual_quota: 15.0,
            carry_forward_limit: 5.0,
        },
    }
}

/// Rounds to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Quota for the join year: `annual * (12 - month_index) / 12` with a 0-based month.
pub fn prorated_quota(annual_quota: f64, joined_date: NaiveDate) -> f64 {
    let month_index = joined_date.month0() as f64;
    round2(annual_quota * (12.0 - month_index) / 12.0)
}

/// Entitlement for `year`: full before the join year, pro-rated in it, zero after.
pub fn quota_for_year(annual_quota: f64, joined_date: NaiveDate, year: i32) -> f64 {
    match joined_date.year().cmp(&year) {
        std::cmp::Ordering::Less => round2(annual_quota),
        std::cmp::Ordering::Equal => prorated_quota(annual_quota, joined_date),
        std::cmp::Ordering::Greater => 0.0,
    }
}

/// `max(0, total_quota + carry_forward - used - pending)`, rounded.
pub fn available_balance(total_quota: f64, carry_forward: f64, used: f64, pending: f64) -> f64 {
    round2((total_quota + carry_forward - used - pending).max(0.0))
}

/// Days still missing to cover `requested_days` from `balance`.
pub fn shortfall(requested_days: f64, balance: f64) -> f64 {
    round2((requested_days - balance).max(0.0))
}

pub fn is_sufficient(requested_days: f64, balance: f64) -> bool {
    requested_days <= balance + EPSILON
}

pub fn availability_message(requested_days: f64, balance: f64) -> String {
    if is_sufficient(requested_days, balance) {
        format!(
            "Sufficient balance: {} day(s) will remain after this request",
            round2(balance - requested_days).max(0.0)
        )
    } else {
        format!(
            "Insufficient balance: requested {} day(s) but only {} available (short by {})",
            requested_days,
            balance,
            shortfall(requested_days, balance)
        )
    }
}

/// Field-level rule violation on a leave request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRuleViolation {
    pub field: &'static str,
    pub message: String,
}

impl RequestRuleViolation {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Checks the date range and the day count of a leave request.
///
/// `total_days` must be at least half a day, a multiple of 0.5 and no more
/// than the calendar span of the range.
pub fn validate_request_days(
    start_date: NaiveDate,
    end_date: NaiveDate,
    total_days: f64,
) -> Result<(), RequestRuleViolation> {
    if start_date > end_date {
        return Err(RequestRuleViolation::new(
            "end_date",
            "end_date must not be before start_date",
        ));
    }

    if !total_days.is_finite() || total_days < 0.5 {
        return Err(RequestRuleViolation::new(
            "total_days",
            "total_days must be at least 0.5",
        ));
    }

    if ((total_days * 2.0) - (total_days * 2.0).round()).abs() > EPSILON {
        return Err(RequestRuleViolation::new(
            "total_days",
            "total_days must be a multiple of 0.5",
        ));
    }

    let span = (end_date - start_date).num_days() + 1;
    if total_days > span as f64 + EPSILON {
        return Err(RequestRuleViolation::new(
            "total_days",
            format!("total_days cannot exceed the {span} day(s) between start_date and end_date"),
        ));
    }

    Ok(())
}

pub fn nearly_equal(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn july_joiner_gets_half_of_casual_quota() {
        assert_eq!(prorated_quota(12.0, date(2026, 7, 1)), 6.0);
    }

    #[test]
    fn january_joiner_gets_full_quota() {
        assert_eq!(prorated_quota(15.0, date(2026, 1, 20)), 15.0);
    }

    #[test]
    fn prorated_quota_is_rounded_to_two_decimals() {
        // 15 * 7 / 12 = 8.75, 10 * 11 / 12 = 9.1666..
        assert_eq!(prorated_quota(15.0, date(2026, 6, 3)), 8.75);
        assert_eq!(prorated_quota(10.0, date(2026, 2, 1)), 9.17);
    }

    #[test]
    fn quota_depends_on_join_year() {
        let joined = date(2026, 10, 1);
        assert_eq!(quota_for_year(12.0, joined, 2025), 0.0);
        assert_eq!(quota_for_year(12.0, joined, 2026), 3.0);
        assert_eq!(quota_for_year(12.0, joined, 2027), 12.0);
    }

    #[test]
    fn default_quota_table() {
        assert_eq!(default_quota(LeaveCategory::Casual).annual_quota, 12.0);
        assert_eq!(default_quota(LeaveCategory::Sick).carry_forward_limit, 0.0);
        let earned = default_quota(LeaveCategory::Earned);
        assert_eq!((earned.annual_quota, earned.carry_forward_limit), (15.0, 5.0));
    }

    #[test]
    fn available_balance_never_goes_negative() {
        assert_eq!(available_balance(12.0, 0.0, 4.0, 2.5), 5.5);
        assert_eq!(available_balance(12.0, 3.0, 4.0, 2.0), 9.0);
        assert_eq!(available_balance(2.0, 0.0, 3.0, 1.0), 0.0);
    }

    #[test]
    fn five_days_against_three_available_is_short_by_two() {
        assert!(!is_sufficient(5.0, 3.0));
        assert_eq!(shortfall(5.0, 3.0), 2.0);
        assert_eq!(
            availability_message(5.0, 3.0),
            "Insufficient balance: requested 5 day(s) but only 3 available (short by 2)"
        );
    }

    #[test]
    fn sufficient_message_reports_remaining_balance() {
        assert!(is_sufficient(3.0, 3.0));
        assert_eq!(shortfall(3.0, 3.0), 0.0);
        assert_eq!(
            availability_message(2.5, 6.0),
            "Sufficient balance: 3.5 day(s) will remain after this request"
        );
    }

    #[test]
    fn request_days_must_fit_the_range() {
        let start = date(2026, 3, 2);
        assert!(validate_request_days(start, date(2026, 3, 4), 3.0).is_ok());
        assert!(validate_request_days(start, start, 0.5).is_ok());

        let err = validate_request_days(start, date(2026, 3, 4), 3.5).unwrap_err();
        assert_eq!(err.field, "total_days");
    }

    #[test]
    fn request_days_must_be_half_day_multiples() {
        let start = date(2026, 3, 2);
        let end = date(2026, 3, 6);
        assert!(validate_request_days(start, end, 0.0).is_err());
        assert!(validate_request_days(start, end, 1.25).is_err());
        assert!(validate_request_days(start, end, f64::NAN).is_err());
        assert!(validate_request_days(start, end, 4.5).is_ok());
    }

    #[test]
    fn reversed_range_is_rejected_on_end_date() {
        let err = validate_request_days(date(2026, 3, 5), date(2026, 3, 4), 1.0).unwrap_err();
        assert_eq!(err.field, "end_date");
    }
}
