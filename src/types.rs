use chrono::{DateTime, NaiveDate, Utc};

pub type Id = uuid::Uuid;
pub type Time = DateTime<Utc>;
pub type Date = NaiveDate;

pub trait DateExt {
	/// Whole days from `self` until `later`; negative when `later` is earlier
	fn days_until(&self, later: &Date) -> i64;
}

impl DateExt for Date {
	fn days_until(&self, later: &Date) -> i64 {
		later.signed_duration_since(*self).num_days()
	}
}

/// Source of "today" for anything that depends on the current date
pub trait Calendar: Send + Sync {
	/// Gets the current date
	fn current_date(&self) -> Date {
		Utc::now().date_naive()
	}
}

/// Calendar backed by the system clock (UTC)
pub struct SystemCalendar;

impl Calendar for SystemCalendar {}
