// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use std::cmp::Ordering;

use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::{
	collation::Collation,
	value::{Family, Value, convert::base_date},
};

impl Value {
	/// Total ordering used by sort, merge join and window operators.
	///
	/// NULL sorts before every other value and equals NULL. Non-null values
	/// order by family first and by value within a family.
	pub fn compare(&self, other: &Value, collation: &Collation) -> Ordering {
		let left = self.unwrap_variant();
		let right = other.unwrap_variant();
		match (left, right) {
			(Value::Null, Value::Null) => return Ordering::Equal,
			(Value::Null, _) => return Ordering::Less,
			(_, Value::Null) => return Ordering::Greater,
			_ => {}
		}

		let (Some(lf), Some(rf)) = (left.family(), right.family()) else {
			return Ordering::Equal;
		};
		if lf != rf {
			return lf.cmp(&rf);
		}

		match lf {
			Family::Boolean => left.as_bool().cmp(&right.as_bool()),
			Family::ExactNumeric => compare_exact(left, right),
			Family::ApproximateNumeric => {
				let l = left.as_f64().unwrap_or_default();
				let r = right.as_f64().unwrap_or_default();
				l.total_cmp(&r)
			}
			Family::NarrowCharacter | Family::WideCharacter => {
				collation.compare(left.as_str().unwrap_or_default(), right.as_str().unwrap_or_default())
			}
			Family::Binary => match (left, right) {
				(Value::VarBinary(l), Value::VarBinary(r)) => l.cmp(r),
				_ => Ordering::Equal,
			},
			Family::UniqueIdentifier => match (left, right) {
				(Value::UniqueIdentifier(l), Value::UniqueIdentifier(r)) => compare_uuid(l, r),
				_ => Ordering::Equal,
			},
			Family::DateTime => instant(left).cmp(&instant(right)),
		}
	}

	/// SQL `=`: unknown when either side is NULL, false across families.
	pub fn sql_equals(&self, other: &Value, collation: &Collation) -> Option<bool> {
		if self.is_null() || other.is_null() {
			return None;
		}
		if self.family() != other.family() {
			return Some(false);
		}
		Some(self.compare(other, collation) == Ordering::Equal)
	}
}

fn compare_exact(left: &Value, right: &Value) -> Ordering {
	match (left, right) {
		(Value::Decimal(l), Value::Decimal(r)) => l.value().cmp(r.value()),
		(Value::Decimal(l), r) => l.value().cmp(&bigdecimal::BigDecimal::from(r.as_i128().unwrap_or_default() as i64)),
		(l, Value::Decimal(r)) => bigdecimal::BigDecimal::from(l.as_i128().unwrap_or_default() as i64).cmp(r.value()),
		(l, r) => l.as_i128().cmp(&r.as_i128()),
	}
}

fn instant(value: &Value) -> NaiveDateTime {
	match value {
		Value::Date(d) => d.and_time(chrono::NaiveTime::MIN),
		Value::Time(t) => base_date().date().and_time(*t),
		Value::DateTime(dt) => *dt,
		Value::DateTimeOffset(dt) => dt.naive_utc(),
		_ => base_date(),
	}
}

/// SQL Server orders uniqueidentifier values by byte groups 10-15, 8-9, 6-7,
/// 4-5 and 0-3 of the displayed form.
pub(crate) fn compare_uuid(left: &Uuid, right: &Uuid) -> Ordering {
	const GROUPS: [std::ops::Range<usize>; 5] = [10..16, 8..10, 6..8, 4..6, 0..4];
	let l = left.as_bytes();
	let r = right.as_bytes();
	for group in GROUPS {
		let ordering = l[group.clone()].cmp(&r[group]);
		if ordering != Ordering::Equal {
			return ordering;
		}
	}
	Ordering::Equal
}
