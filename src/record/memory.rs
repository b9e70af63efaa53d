use std::collections::HashMap;

use bigdecimal::BigDecimal;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::dashboard::{Group, Stats};
use crate::db;
use crate::record::{NewRecord, Record, RecordChanges, RecordFilter, Store};
use crate::types::{Date, Id};

/// Records kept in process memory, lost on restart
#[derive(Default)]
pub struct MemoryStore {
	records: DashMap<Id, Record>,
}

impl MemoryStore {
	pub fn new() -> Self {
		MemoryStore::default()
	}
}

impl Store for MemoryStore {
	fn create(&self, n: NewRecord) -> db::Result<Record> {
		let record = Record {
			id: uuid::Uuid::new_v4(),
			customer_name: n.customer_name,
			phone_number: n.phone_number,
			address: n.address,
			item_type: n.item_type,
			item_description: n.item_description,
			weight_grams: n.weight_grams,
			principal_amount: n.principal_amount,
			interest_rate: n.interest_rate,
			pledge_date: n.pledge_date,
			is_settled: false,
			returned_amount: None,
			returned_date: None,
			image_url: n.image_url,
			created_at: chrono::Utc::now(),
		};

		match self.records.entry(record.id) {
			Entry::Occupied(_) => Err(db::Error::RecordAlreadyExists),
			Entry::Vacant(slot) => {
				slot.insert(record.clone());
				Ok(record)
			}
		}
	}

	fn find_by_id(&self, id: &Id) -> db::Result<Record> {
		self.records
			.get(id)
			.map(|r| r.value().clone())
			.ok_or(db::Error::RecordNotFound)
	}

	fn list(&self, filter: &RecordFilter) -> db::Result<Vec<Record>> {
		let mut found: Vec<Record> = self.records
			.iter()
			.filter(|r| filter.matches(r.value()))
			.map(|r| r.value().clone())
			.collect();
		found.sort_by(|a, b| {
			b.pledge_date.cmp(&a.pledge_date).then_with(|| b.created_at.cmp(&a.created_at))
		});
		Ok(found)
	}

	fn update_details(&self, id: &Id, changes: &RecordChanges) -> db::Result<Record> {
		let mut record = self.records.get_mut(id).ok_or(db::Error::RecordNotFound)?;
		changes.apply(record.value_mut());
		Ok(record.value().clone())
	}

	fn mark_settled(&self, id: &Id, returned_amount: &BigDecimal, returned_date: Date) -> db::Result<Option<Record>> {
		// the shard stays write-locked between the check and the update
		match self.records.get_mut(id) {
			Some(mut record) if !record.is_settled => {
				record.is_settled = true;
				record.returned_amount = Some(returned_amount.clone());
				record.returned_date = Some(returned_date);
				Ok(Some(record.clone()))
			}
			_ => Ok(None),
		}
	}

	fn stats(&self) -> db::Result<Stats> {
		let mut groups: HashMap<_, Group> = HashMap::new();
		for entry in self.records.iter() {
			let r = entry.value();
			let g = groups.entry((r.item_type, r.is_settled)).or_insert_with(|| Group {
				item_type: r.item_type,
				is_settled: r.is_settled,
				count: 0,
				principal: BigDecimal::default(),
				returned: BigDecimal::default(),
			});
			g.count += 1;
			g.principal += &r.principal_amount;
			if let Some(amount) = &r.returned_amount {
				g.returned += amount;
			}
		}
		Ok(Stats::from_groups(groups.into_values()))
	}
}
