//! Interest and settlement arithmetic for pledged-item loans.
//!
//! Rates are flat, picked once from the principal when the loan is issued and
//! stored in basis points. Interest is charged per "billable month", where a
//! month is a fixed 30 days and the most recent month is not charged once a
//! loan is older than one month.

use bigdecimal::{BigDecimal, RoundingMode};
use serde::Serialize;

use crate::types::{Date, DateExt};

/// Principal at or above which the lower rate applies
pub const HIGH_VALUE_THRESHOLD: i64 = 10_000;
/// 2.5 %
pub const HIGH_VALUE_RATE_BPS: i16 = 250;
/// 3.0 %
pub const STANDARD_RATE_BPS: i16 = 300;
pub const DAYS_PER_MONTH: i64 = 30;

const BPS_PER_UNIT: i64 = 10_000;
const BPS_PER_PERCENT: i64 = 100;
// amounts are kept to paise
const MONEY_SCALE: i64 = 2;

/// Picks the flat monthly interest rate, in basis points, for a new loan
///
/// Callers must reject negative principals before calling.
pub fn select_interest_rate(principal: &BigDecimal) -> i16 {
	if *principal >= BigDecimal::from(HIGH_VALUE_THRESHOLD) {
		HIGH_VALUE_RATE_BPS
	} else {
		STANDARD_RATE_BPS
	}
}

/// Converts a rate in basis points to a percentage, `250` -> `2.5`
pub fn rate_percent(rate_bps: i16) -> BigDecimal {
	BigDecimal::from(rate_bps) / BigDecimal::from(BPS_PER_PERCENT)
}

/// Whole days between the pledge date and `as_of`, never negative
pub fn days_held(pledge_date: &Date, as_of: &Date) -> i64 {
	pledge_date.days_until(as_of).max(0)
}

/// Number of months interest is charged for
///
/// `months = floor(days / 30)`; up to one month bills as one, after that the
/// latest month is dropped (`months - 1`).
pub fn billable_months(pledge_date: &Date, as_of: &Date) -> u32 {
	let months = days_held(pledge_date, as_of) / DAYS_PER_MONTH;
	let months = u32::try_from(months).unwrap_or(u32::MAX);
	if months <= 1 {
		1
	} else {
		months - 1
	}
}

/// Interest owed and total payable to reclaim an item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settlement {
	pub interest_amount: BigDecimal,
	pub total_amount: BigDecimal,
}

/// Interest is rounded half-up to paise; the total is exactly
/// `principal + interest_amount`.
pub fn compute_settlement(principal: &BigDecimal, rate_bps: i16, billable_months: u32) -> Settlement {
	let accrued = principal * BigDecimal::from(rate_bps) * BigDecimal::from(billable_months)
		/ BigDecimal::from(BPS_PER_UNIT);
	let interest_amount = accrued.with_scale_round(MONEY_SCALE, RoundingMode::HalfUp);
	let total_amount = principal + &interest_amount;

	Settlement {
		interest_amount,
		total_amount,
	}
}

/// Suggested settlement for a loan as of a given date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
	pub as_of: Date,
	pub days_held: i64,
	pub billable_months: u32,
	/// percent, e.g. `2.5`
	pub interest_rate: BigDecimal,
	#[serde(flatten)]
	pub settlement: Settlement,
}

pub fn quote(principal: &BigDecimal, rate_bps: i16, pledge_date: &Date, as_of: &Date) -> Quote {
	let months = billable_months(pledge_date, as_of);
	Quote {
		as_of: *as_of,
		days_held: days_held(pledge_date, as_of),
		billable_months: months,
		interest_rate: rate_percent(rate_bps),
		settlement: compute_settlement(principal, rate_bps, months),
	}
}

#[cfg(test)]
mod tests {
	use std::str::FromStr;

	use chrono::Duration;
	use proptest::prelude::*;

	use super::*;

	fn dec(s: &str) -> BigDecimal {
		BigDecimal::from_str(s).unwrap()
	}

	fn pledged() -> Date {
		Date::from_ymd_opt(2024, 2, 10).unwrap()
	}

	#[test]
	fn rate_tiers() {
		assert_eq!(select_interest_rate(&dec("9999.99")), STANDARD_RATE_BPS);
		assert_eq!(select_interest_rate(&dec("10000")), HIGH_VALUE_RATE_BPS);
		assert_eq!(select_interest_rate(&dec("0")), STANDARD_RATE_BPS);
		assert_eq!(select_interest_rate(&dec("250000")), HIGH_VALUE_RATE_BPS);

		assert_eq!(rate_percent(HIGH_VALUE_RATE_BPS), dec("2.5"));
		assert_eq!(rate_percent(STANDARD_RATE_BPS), dec("3.0"));
	}

	#[test]
	fn billable_months_floor_and_discount() {
		let d = pledged();
		let after = |days| d + Duration::days(days);

		assert_eq!(billable_months(&d, &d), 1);
		assert_eq!(billable_months(&d, &after(29)), 1);
		assert_eq!(billable_months(&d, &after(30)), 1);
		assert_eq!(billable_months(&d, &after(59)), 1);
		assert_eq!(billable_months(&d, &after(60)), 1);
		assert_eq!(billable_months(&d, &after(89)), 1);
		assert_eq!(billable_months(&d, &after(90)), 2);
		assert_eq!(billable_months(&d, &after(365)), 11);
	}

	#[test]
	fn as_of_before_pledge_bills_one_month() {
		let d = pledged();
		let earlier = d - Duration::days(45);
		assert_eq!(days_held(&d, &earlier), 0);
		assert_eq!(billable_months(&d, &earlier), 1);
	}

	#[test]
	fn high_value_loan_held_95_days() {
		let d = pledged();
		let q = quote(&dec("150000"), select_interest_rate(&dec("150000")), &d, &(d + Duration::days(95)));

		assert_eq!(q.days_held, 95);
		assert_eq!(q.billable_months, 2);
		assert_eq!(q.interest_rate, dec("2.5"));
		assert_eq!(q.settlement.interest_amount, dec("7500"));
		assert_eq!(q.settlement.total_amount, dec("157500"));
	}

	#[test]
	fn small_loan_held_10_days() {
		let d = pledged();
		let q = quote(&dec("5000"), select_interest_rate(&dec("5000")), &d, &(d + Duration::days(10)));

		assert_eq!(q.billable_months, 1);
		assert_eq!(q.interest_rate, dec("3"));
		assert_eq!(q.settlement.interest_amount, dec("150"));
		assert_eq!(q.settlement.total_amount, dec("5150"));
	}

	#[test]
	fn interest_rounds_to_paise() {
		let s = compute_settlement(&dec("9999.99"), STANDARD_RATE_BPS, 1);
		assert_eq!(s.interest_amount, dec("300.00"));
		assert_eq!(s.total_amount, dec("10299.99"));

		let s = compute_settlement(&dec("333.33"), HIGH_VALUE_RATE_BPS, 3);
		// 333.33 * 0.025 * 3 = 24.99975
		assert_eq!(s.interest_amount, dec("25.00"));
		assert_eq!(s.total_amount, dec("358.33"));
	}

	#[test]
	fn total_keeps_principal_scale() {
		let p = dec("100.005");
		let s = compute_settlement(&p, select_interest_rate(&p), 1);
		assert_eq!(s.interest_amount, dec("3.00"));
		assert_eq!(s.total_amount, dec("103.005"));
		assert_eq!(s.total_amount, &p + &s.interest_amount);
	}

	#[test]
	fn repeated_calls_agree() {
		let d = pledged();
		let as_of = d + Duration::days(200);
		let p = dec("12345.67");
		assert_eq!(select_interest_rate(&p), select_interest_rate(&p));
		assert_eq!(billable_months(&d, &as_of), billable_months(&d, &as_of));
		assert_eq!(
			compute_settlement(&p, HIGH_VALUE_RATE_BPS, 5),
			compute_settlement(&p, HIGH_VALUE_RATE_BPS, 5)
		);
	}

	proptest! {
		#[test]
		fn total_is_principal_plus_interest(
			digits in 0i64..10_000_000_000_000,
			scale in -4i64..8,
			rate_bps in 0i16..2_000,
			months in 1u32..600,
		) {
			let principal = BigDecimal::new(digits.into(), scale);
			let s = compute_settlement(&principal, rate_bps, months);

			prop_assert!(s.interest_amount >= BigDecimal::from(0));
			prop_assert_eq!(s.total_amount, &principal + &s.interest_amount);
		}

		#[test]
		fn billable_months_never_below_one(days in -1_000i64..10_000) {
			let d = pledged();
			prop_assert!(billable_months(&d, &(d + Duration::days(days))) >= 1);
		}
	}
}
