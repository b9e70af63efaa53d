#![allow(dead_code)]

use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

use diesel::prelude::*;

pub use bigdecimal::BigDecimal;
use pawnledger::db::{self, PgPool};
use pawnledger::interest;
use pawnledger::pawn::{NewService, Service};
use pawnledger::record::memory::MemoryStore;
use pawnledger::record::{ItemType, NewRecord};
use pawnledger::types::{Calendar, Date};

pub fn dec(s: &str) -> BigDecimal {
	BigDecimal::from_str(s).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> Date {
	Date::from_ymd_opt(y, m, d).unwrap()
}

pub struct FixedCalendar(pub Date);

impl Calendar for FixedCalendar {
	fn current_date(&self) -> Date {
		self.0
	}
}

/// Service over an empty in-memory store whose "today" is `today`
pub fn memory_service(today: Date) -> Arc<Service> {
	Arc::new(Service::new(NewService {
		store: Box::new(MemoryStore::new()),
		calendar: Box::new(FixedCalendar(today)),
	}))
}

pub fn new_record(customer_name: &str, principal: &str, pledge_date: Date) -> NewRecord {
	let principal_amount = dec(principal);
	NewRecord {
		customer_name: customer_name.to_string(),
		phone_number: Some("98450 11111".to_string()),
		address: None,
		item_type: ItemType::Gold,
		item_description: "22k chain".to_string(),
		weight_grams: dec("10.5"),
		interest_rate: interest::select_interest_rate(&principal_amount),
		principal_amount,
		pledge_date,
		image_url: None,
	}
}

// tests sharing the database take turns
static DB_LOCK: Mutex<()> = Mutex::new(());

/// A clean `records` table in the database at `DATABASE_URL`
///
/// Migrations must already be applied (`diesel migration run`).
pub struct Fixture {
	pub pool: PgPool,
	_guard: MutexGuard<'static, ()>,
}

impl Fixture {
	pub fn new() -> Self {
		let guard = DB_LOCK.lock().unwrap_or_else(|e| e.into_inner());
		dotenv::dotenv().ok();
		let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
		let pool = db::pg_pool(&url, 4).expect("building pool");

		let fixture = Fixture { pool, _guard: guard };
		fixture.teardown();
		fixture
	}

	pub fn teardown(&self) {
		let conn = &mut self.pool.get().unwrap();
		diesel::sql_query("DELETE FROM records")
			.execute(conn)
			.map(|n| println!("deleting {} from 'records' table", n))
			.expect("deleting db table");
	}
}
