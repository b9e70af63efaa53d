//! Dashboard statistics over the records table.

use bigdecimal::BigDecimal;
use serde::Serialize;

use crate::record::ItemType;

/// One row of the `(item_type, is_settled)` aggregate a store produces
#[derive(Debug, Clone)]
pub struct Group {
	pub item_type: ItemType,
	pub is_settled: bool,
	pub count: i64,
	pub principal: BigDecimal,
	pub returned: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemTypeStats {
	pub item_type: ItemType,
	pub count: i64,
	pub active: i64,
	/// principal still lent against active items of this type
	pub outstanding_principal: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
	pub total_records: i64,
	pub active_records: i64,
	pub settled_records: i64,
	pub outstanding_principal: BigDecimal,
	pub settled_principal: BigDecimal,
	pub total_returned: BigDecimal,
	pub by_item_type: Vec<ItemTypeStats>,
}

impl Stats {
	pub fn from_groups(groups: impl IntoIterator<Item = Group>) -> Stats {
		let mut by_item_type: Vec<ItemTypeStats> = ItemType::ALL
			.iter()
			.map(|&item_type| ItemTypeStats {
				item_type,
				count: 0,
				active: 0,
				outstanding_principal: BigDecimal::default(),
			})
			.collect();

		let mut stats = Stats {
			total_records: 0,
			active_records: 0,
			settled_records: 0,
			outstanding_principal: BigDecimal::default(),
			settled_principal: BigDecimal::default(),
			total_returned: BigDecimal::default(),
			by_item_type: Vec::new(),
		};

		for g in groups {
			stats.total_records += g.count;
			let per_type = by_item_type.iter_mut().find(|s| s.item_type == g.item_type);

			if g.is_settled {
				stats.settled_records += g.count;
				stats.settled_principal += &g.principal;
				stats.total_returned += &g.returned;
				if let Some(s) = per_type {
					s.count += g.count;
				}
			} else {
				stats.active_records += g.count;
				stats.outstanding_principal += &g.principal;
				if let Some(s) = per_type {
					s.count += g.count;
					s.active += g.count;
					s.outstanding_principal += &g.principal;
				}
			}
		}

		stats.by_item_type = by_item_type;
		stats
	}
}
