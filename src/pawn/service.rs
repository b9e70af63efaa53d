use bigdecimal::{BigDecimal, Zero};
use log::*;
use serde::{Deserialize, Serialize};

use crate::dashboard::Stats;
use crate::interest::{self, Quote};
use crate::record::{ItemType, NewRecord, Record, RecordChanges, RecordFilter, Status, Store};
use crate::types::{Calendar, Date, Id};

use super::error::{Error, ErrorKind};

pub type Result<T> = std::result::Result<T, Error>;

// amounts are kept to paise, weights to milligrams
const MONEY_SCALE: i64 = 2;
const WEIGHT_SCALE: i64 = 3;
// exclusive upper bound for any amount or weight, 10^15
const MAX_INTEGER_DIGITS: i64 = 15;
const AMOUNT_LIMIT: i64 = 1_000_000_000_000_000;

/// Service for issuing, pricing and settling pledge loans
///
/// All amounts are validated here; the calculator in [`crate::interest`]
/// trusts its input.
pub struct Service {
	store: Box<dyn Store>,
	calendar: Box<dyn Calendar>,
}

/// Parameter object for creating a new Service
pub struct NewService {
	pub store: Box<dyn Store>,
	pub calendar: Box<dyn Calendar>,
}

/// Details captured when an item is pledged
#[derive(Debug, Clone, Deserialize)]
pub struct RecordInput {
	pub customer_name: String,
	pub phone_number: Option<String>,
	pub address: Option<String>,
	pub item_type: ItemType,
	pub item_description: String,
	#[serde(default)]
	pub weight_grams: BigDecimal,
	pub principal_amount: BigDecimal,
	/// Defaults to today
	pub pledge_date: Option<Date>,
	pub image_url: Option<String>,
}

/// Confirmation of an item being returned to its owner
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettleInput {
	/// What the customer actually paid; may differ from the quoted total
	pub returned_amount: Option<BigDecimal>,
	/// Defaults to today
	pub returned_date: Option<Date>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordQuote {
	pub record_id: Id,
	pub principal_amount: BigDecimal,
	pub pledge_date: Date,
	#[serde(flatten)]
	pub quote: Quote,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
	pub as_of: Date,
	#[serde(flatten)]
	pub stats: Stats,
	/// Interest that would be collected if every active item were returned today
	pub expected_interest: BigDecimal,
}

impl Service {
	pub fn new(v: NewService) -> Self {
		Service {
			store: v.store,
			calendar: v.calendar,
		}
	}

	pub fn today(&self) -> Date {
		self.calendar.current_date()
	}

	/// Record a newly pledged item and issue its loan
	///
	/// The interest rate is chosen from the principal here and never revisited.
	pub fn create_record(&self, input: RecordInput) -> Result<Record> {
		let today = self.today();
		let customer_name = required("customer_name", input.customer_name)?;
		let item_description = required("item_description", input.item_description)?;
		checked_amount("principal_amount", &input.principal_amount, MONEY_SCALE)?;
		checked_amount("weight_grams", &input.weight_grams, WEIGHT_SCALE)?;

		let pledge_date = input.pledge_date.unwrap_or(today);
		if pledge_date > today {
			let msg = format!("pledge date({}) is after today({})", pledge_date, today);
			return Err(ErrorKind::InvalidDate(msg).into());
		}

		let interest_rate = interest::select_interest_rate(&input.principal_amount);
		let record = self.store.create(NewRecord {
			customer_name,
			phone_number: optional(input.phone_number),
			address: optional(input.address),
			item_type: input.item_type,
			item_description,
			weight_grams: input.weight_grams,
			principal_amount: input.principal_amount,
			interest_rate,
			pledge_date,
			image_url: optional(input.image_url),
		})?;

		info!(
			"record {} created: {} {} at {} bps",
			record.id, record.item_type, record.principal_amount, record.interest_rate
		);
		Ok(record)
	}

	pub fn get_record(&self, id: &Id) -> Result<Record> {
		self.store.find_by_id(id).map_err(Into::into)
	}

	pub fn list_records(&self, filter: &RecordFilter) -> Result<Vec<Record>> {
		if let (Some(from), Some(to)) = (filter.pledged_from, filter.pledged_to) {
			if from > to {
				let msg = format!("pledged_from({}) is after pledged_to({})", from, to);
				return Err(ErrorKind::InvalidDate(msg).into());
			}
		}
		self.store.list(filter).map_err(Into::into)
	}

	/// Correct the customer or item details of a record
	pub fn update_record(&self, id: &Id, changes: RecordChanges) -> Result<Record> {
		// blank optional fields leave the stored value alone
		let changes = RecordChanges {
			customer_name: changes.customer_name.map(|v| required("customer_name", v)).transpose()?,
			phone_number: optional(changes.phone_number),
			address: optional(changes.address),
			item_description: changes.item_description.map(|v| required("item_description", v)).transpose()?,
			weight_grams: changes.weight_grams,
			image_url: optional(changes.image_url),
		};
		if let Some(weight) = &changes.weight_grams {
			checked_amount("weight_grams", weight, WEIGHT_SCALE)?;
		}
		if changes.is_empty() {
			return self.get_record(id);
		}

		let record = self.store.update_details(id, &changes)?;
		debug!("record {} updated", record.id);
		Ok(record)
	}

	/// Suggested payment to reclaim an item
	///
	/// # Arguments
	/// * `id` - record id
	/// * `as_of` - date to price at, today when `None`; must not precede the pledge date
	pub fn quote(&self, id: &Id, as_of: Option<Date>) -> Result<RecordQuote> {
		let record = self.store.find_by_id(id)?;
		if record.is_settled {
			return Err(ErrorKind::AlreadySettled.into());
		}

		let as_of = as_of.unwrap_or_else(|| self.today());
		if as_of < record.pledge_date {
			let msg = format!("as of date({}) precedes pledge date({})", as_of, record.pledge_date);
			return Err(ErrorKind::InvalidDate(msg).into());
		}

		Ok(RecordQuote {
			record_id: record.id,
			quote: record.quote(&as_of),
			principal_amount: record.principal_amount,
			pledge_date: record.pledge_date,
		})
	}

	/// Mark an item as returned to its owner
	///
	/// The returned amount is what the operator confirms was paid and is not
	/// checked against the quote. A record settles at most once; the store's
	/// conditional update decides between concurrent callers.
	pub fn settle(&self, id: &Id, input: SettleInput) -> Result<Record> {
		let returned_amount = match input.returned_amount {
			Some(amount) if amount > BigDecimal::zero() => amount,
			_ => return Err(ErrorKind::MissingReturnedAmount.into()),
		};
		checked_amount("returned_amount", &returned_amount, MONEY_SCALE)?;

		let record = self.store.find_by_id(id)?;
		if record.is_settled {
			warn!("record {} is already settled", id);
			return Err(ErrorKind::AlreadySettled.into());
		}

		let today = self.today();
		let returned_date = input.returned_date.unwrap_or(today);
		if returned_date < record.pledge_date {
			let msg = format!("returned date({}) precedes pledge date({})", returned_date, record.pledge_date);
			return Err(ErrorKind::InvalidDate(msg).into());
		}
		if returned_date > today {
			let msg = format!("returned date({}) is after today({})", returned_date, today);
			return Err(ErrorKind::InvalidDate(msg).into());
		}

		match self.store.mark_settled(id, &returned_amount, returned_date)? {
			Some(record) => {
				info!("record {} settled for {} on {}", record.id, returned_amount, returned_date);
				Ok(record)
			}
			None => {
				warn!("record {} was settled by another request", id);
				Err(ErrorKind::AlreadySettled.into())
			}
		}
	}

	pub fn dashboard(&self) -> Result<Dashboard> {
		let as_of = self.today();
		let stats = self.store.stats()?;
		let active = self.store.list(&RecordFilter {
			status: Some(Status::Active),
			..Default::default()
		})?;

		let expected_interest = active
			.iter()
			.filter(|r| r.pledge_date <= as_of)
			.map(|r| r.quote(&as_of).settlement.interest_amount)
			.fold(BigDecimal::zero(), |acc, x| acc + x);

		Ok(Dashboard {
			as_of,
			stats,
			expected_interest,
		})
	}
}

fn required(field: &'static str, value: String) -> Result<String> {
	let value = value.trim();
	if value.is_empty() {
		return Err(ErrorKind::MissingField(field).into());
	}
	Ok(value.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
	value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Rejects negative amounts, more than `max_scale` decimal places and
/// anything of 10^15 or more
fn checked_amount(field: &str, amount: &BigDecimal, max_scale: i64) -> Result<()> {
	if *amount < BigDecimal::zero() {
		let msg = format!("{} must not be negative", field);
		return Err(ErrorKind::InvalidAmount(msg).into());
	}

	// exponent checks come first so huge values are never expanded
	let (_, scale) = amount.normalized().as_bigint_and_exponent();
	if scale > max_scale {
		let msg = format!("{} allows at most {} decimal places", field, max_scale);
		return Err(ErrorKind::InvalidAmount(msg).into());
	}
	if scale < -MAX_INTEGER_DIGITS || *amount >= BigDecimal::from(AMOUNT_LIMIT) {
		let msg = format!("{} must have at most {} integer digits", field, MAX_INTEGER_DIGITS);
		return Err(ErrorKind::InvalidAmount(msg).into());
	}
	Ok(())
}
