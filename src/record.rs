use std::io::Write;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::dsl::{count_star, sum};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Varchar;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::dashboard::{Group, Stats};
use crate::db::{self, PgPool};
use crate::interest::{self, Quote};
use crate::schema::records;
use crate::types::{Date, Id, Time};

pub mod memory;

/// A pledged item and the loan issued against it
#[derive(Queryable, Identifiable, Debug, Clone, PartialEq, Serialize)]
#[diesel(table_name = records)]
pub struct Record {
	pub id: Id,
	pub customer_name: String,
	pub phone_number: Option<String>,
	pub address: Option<String>,
	pub item_type: ItemType,
	pub item_description: String,
	pub weight_grams: BigDecimal,
	pub principal_amount: BigDecimal,
	// basis points, fixed when the record is created
	#[serde(rename = "interest_rate_bps")]
	pub interest_rate: i16,
	pub pledge_date: Date,
	pub is_settled: bool,
	pub returned_amount: Option<BigDecimal>,
	pub returned_date: Option<Date>,
	pub image_url: Option<String>,
	pub created_at: Time,
}

impl Record {
	/// Interest rate as a percentage
	pub fn interest_rate(&self) -> BigDecimal {
		interest::rate_percent(self.interest_rate)
	}

	pub fn status(&self) -> Status {
		if self.is_settled {
			Status::Settled
		} else {
			Status::Active
		}
	}

	/// Suggested amount to reclaim the item on `as_of`
	pub fn quote(&self, as_of: &Date) -> Quote {
		interest::quote(&self.principal_amount, self.interest_rate, &self.pledge_date, as_of)
	}
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = records)]
pub struct NewRecord {
	pub customer_name: String,
	pub phone_number: Option<String>,
	pub address: Option<String>,
	pub item_type: ItemType,
	pub item_description: String,
	pub weight_grams: BigDecimal,
	pub principal_amount: BigDecimal,
	pub interest_rate: i16,
	pub pledge_date: Date,
	pub image_url: Option<String>,
}

/// Descriptive fields that may be corrected after a record is created
///
/// Principal, pledge date and rate are deliberately absent.
#[derive(AsChangeset, Deserialize, Debug, Clone, Default, PartialEq)]
#[diesel(table_name = records)]
#[serde(deny_unknown_fields)]
pub struct RecordChanges {
	pub customer_name: Option<String>,
	pub phone_number: Option<String>,
	pub address: Option<String>,
	pub item_description: Option<String>,
	pub weight_grams: Option<BigDecimal>,
	pub image_url: Option<String>,
}

impl RecordChanges {
	pub fn is_empty(&self) -> bool {
		*self == RecordChanges::default()
	}

	pub fn apply(&self, record: &mut Record) {
		if let Some(v) = &self.customer_name {
			record.customer_name = v.clone();
		}
		if let Some(v) = &self.phone_number {
			record.phone_number = Some(v.clone());
		}
		if let Some(v) = &self.address {
			record.address = Some(v.clone());
		}
		if let Some(v) = &self.item_description {
			record.item_description = v.clone();
		}
		if let Some(v) = &self.weight_grams {
			record.weight_grams = v.clone();
		}
		if let Some(v) = &self.image_url {
			record.image_url = Some(v.clone());
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsExpression, FromSqlRow, EnumString, Display, Serialize, Deserialize)]
#[diesel(sql_type = Varchar)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
	Gold,
	Silver,
}

impl ItemType {
	pub const ALL: [ItemType; 2] = [ItemType::Gold, ItemType::Silver];
}

impl ToSql<Varchar, Pg> for ItemType {
	fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
		out.write_all(self.to_string().as_bytes())?;
		Ok(IsNull::No)
	}
}

impl FromSql<Varchar, Pg> for ItemType {
	fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
		let s = std::str::from_utf8(bytes.as_bytes())?;
		Ok(ItemType::from_str(s)?)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
	Active,
	Settled,
}

/// Criteria for listing records; unset fields match everything
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordFilter {
	pub status: Option<Status>,
	pub item_type: Option<ItemType>,
	/// Case-insensitive match on customer name or phone number
	pub search: Option<String>,
	pub pledged_from: Option<Date>,
	pub pledged_to: Option<Date>,
}

impl RecordFilter {
	fn search_term(&self) -> Option<&str> {
		self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
	}

	pub fn matches(&self, record: &Record) -> bool {
		if self.status.map_or(false, |s| s != record.status()) {
			return false;
		}
		if self.item_type.map_or(false, |t| t != record.item_type) {
			return false;
		}
		if self.pledged_from.map_or(false, |d| record.pledge_date < d) {
			return false;
		}
		if self.pledged_to.map_or(false, |d| record.pledge_date > d) {
			return false;
		}
		match self.search_term() {
			Some(term) => {
				let term = term.to_lowercase();
				record.customer_name.to_lowercase().contains(&term)
					|| record.phone_number.as_deref().map_or(false, |p| p.to_lowercase().contains(&term))
			}
			None => true,
		}
	}
}

/// `ILIKE` pattern matching `term` literally anywhere in a column
fn contains_pattern(term: &str) -> String {
	let mut pattern = String::with_capacity(term.len() + 2);
	pattern.push('%');
	for c in term.chars() {
		if matches!(c, '\\' | '%' | '_') {
			pattern.push('\\');
		}
		pattern.push(c);
	}
	pattern.push('%');
	pattern
}

/// Persistence operations the pawn service relies on
pub trait Store: Send + Sync {
	fn create(&self, new_record: NewRecord) -> db::Result<Record>;

	fn find_by_id(&self, id: &Id) -> db::Result<Record>;

	/// Records matching `filter`, newest pledge first
	fn list(&self, filter: &RecordFilter) -> db::Result<Vec<Record>>;

	fn update_details(&self, id: &Id, changes: &RecordChanges) -> db::Result<Record>;

	/// Settles the record only while it is still active
	///
	/// Returns `None` when no active record with `id` exists, which is how a
	/// second settlement of the same record loses.
	fn mark_settled(&self, id: &Id, returned_amount: &BigDecimal, returned_date: Date) -> db::Result<Option<Record>>;

	fn stats(&self) -> db::Result<Stats>;
}

/// PostgreSQL backed store
pub struct Repo {
	db: PgPool,
}

impl Repo {
	pub fn new(db: PgPool) -> Self {
		Repo { db }
	}
}

impl Store for Repo {
	fn create(&self, new_record: NewRecord) -> db::Result<Record> {
		let conn = &mut self.db.get()?;
		diesel::insert_into(records::table)
			.values(&new_record)
			.get_result(conn)
			.map_err(Into::into)
	}

	fn find_by_id(&self, id: &Id) -> db::Result<Record> {
		let conn = &mut self.db.get()?;
		records::table
			.find(id)
			.first(conn)
			.map_err(Into::into)
	}

	fn list(&self, filter: &RecordFilter) -> db::Result<Vec<Record>> {
		let conn = &mut self.db.get()?;
		let mut query = records::table.into_boxed();

		if let Some(status) = filter.status {
			query = query.filter(records::is_settled.eq(status == Status::Settled));
		}
		if let Some(item_type) = filter.item_type {
			query = query.filter(records::item_type.eq(item_type));
		}
		if let Some(from) = filter.pledged_from {
			query = query.filter(records::pledge_date.ge(from));
		}
		if let Some(to) = filter.pledged_to {
			query = query.filter(records::pledge_date.le(to));
		}
		if let Some(term) = filter.search_term() {
			let pattern = contains_pattern(term);
			query = query.filter(
				records::customer_name.ilike(pattern.clone())
					.or(records::phone_number.ilike(pattern))
			);
		}

		query
			.order((records::pledge_date.desc(), records::created_at.desc()))
			.load::<Record>(conn)
			.map_err(Into::into)
	}

	fn update_details(&self, id: &Id, changes: &RecordChanges) -> db::Result<Record> {
		let conn = &mut self.db.get()?;
		diesel::update(records::table.find(id))
			.set(changes)
			.get_result(conn)
			.map_err(Into::into)
	}

	fn mark_settled(&self, id: &Id, returned_amount: &BigDecimal, returned_date: Date) -> db::Result<Option<Record>> {
		let conn = &mut self.db.get()?;
		diesel::update(records::table)
			.filter(records::id.eq(id).and(records::is_settled.eq(false)))
			.set((
				records::is_settled.eq(true),
				records::returned_amount.eq(returned_amount),
				records::returned_date.eq(returned_date),
			))
			.get_result(conn)
			.optional()
			.map_err(Into::into)
	}

	fn stats(&self) -> db::Result<Stats> {
		let conn = &mut self.db.get()?;
		let rows = records::table
			.group_by((records::item_type, records::is_settled))
			.select((
				records::item_type,
				records::is_settled,
				count_star(),
				sum(records::principal_amount),
				sum(records::returned_amount),
			))
			.load::<(ItemType, bool, i64, Option<BigDecimal>, Option<BigDecimal>)>(conn)?;

		let groups = rows.into_iter().map(|(item_type, is_settled, count, principal, returned)| Group {
			item_type,
			is_settled,
			count,
			principal: principal.unwrap_or_default(),
			returned: returned.unwrap_or_default(),
		});
		Ok(Stats::from_groups(groups))
	}
}
