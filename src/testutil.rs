use std::str::FromStr;

pub use bigdecimal::BigDecimal;

use crate::interest;
use crate::pawn::{NewService, RecordInput, Service};
use crate::record::memory::MemoryStore;
use crate::record::{ItemType, NewRecord, Record};
use crate::types::{Calendar, Date};

pub fn dec(s: &str) -> BigDecimal {
	BigDecimal::from_str(s).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> Date {
	Date::from_ymd_opt(y, m, d).unwrap()
}

/// Calendar pinned to a single day
pub struct FixedCalendar(pub Date);

impl Calendar for FixedCalendar {
	fn current_date(&self) -> Date {
		self.0
	}
}

pub fn new_record(customer_name: &str, principal: &str) -> NewRecord {
	let principal_amount = dec(principal);
	NewRecord {
		customer_name: customer_name.to_string(),
		phone_number: None,
		address: None,
		item_type: ItemType::Gold,
		item_description: "22k chain".to_string(),
		weight_grams: dec("12.5"),
		interest_rate: interest::select_interest_rate(&principal_amount),
		principal_amount,
		pledge_date: date(2024, 1, 1),
		image_url: None,
	}
}

/// A record not yet persisted anywhere, customised by `f`
pub fn record(f: impl FnOnce(&mut Record)) -> Record {
	let mut r = Record {
		id: uuid::Uuid::new_v4(),
		customer_name: "Default".to_string(),
		phone_number: None,
		address: None,
		item_type: ItemType::Gold,
		item_description: "bangle".to_string(),
		weight_grams: dec("10"),
		principal_amount: dec("5000"),
		interest_rate: interest::STANDARD_RATE_BPS,
		pledge_date: date(2024, 1, 1),
		is_settled: false,
		returned_amount: None,
		returned_date: None,
		image_url: None,
		created_at: chrono::Utc::now(),
	};
	f(&mut r);
	r
}

pub fn input(customer_name: &str, principal: &str, pledge_date: Option<Date>) -> RecordInput {
	RecordInput {
		customer_name: customer_name.to_string(),
		phone_number: Some("98450 00000".to_string()),
		address: None,
		item_type: ItemType::Gold,
		item_description: "pair of earrings".to_string(),
		weight_grams: dec("8"),
		principal_amount: dec(principal),
		pledge_date,
		image_url: None,
	}
}

/// Service over an empty in-memory store whose "today" is `today`
pub fn service(today: Date) -> Service {
	Service::new(NewService {
		store: Box::new(MemoryStore::new()),
		calendar: Box::new(FixedCalendar(today)),
	})
}
