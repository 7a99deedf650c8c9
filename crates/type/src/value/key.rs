// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use chrono::NaiveDateTime;
use num_bigint::BigInt;
use num_traits::Zero;
use uuid::Uuid;

use crate::{
	collation::Collation,
	value::{OrderedF64, Value, convert::base_date},
};

/// Hashable normal form of a value: two values produce the same key exactly
/// when [`Value::compare`] considers them equal under the same collation.
///
/// Used for grouping, distinct, hash lookups of spools and seen-sets of
/// DISTINCT aggregates.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyValue {
	Null,
	Boolean(bool),
	/// Exact numeric with trailing fractional zeros removed.
	Exact {
		digits: BigInt,
		scale: i64,
	},
	Approximate(OrderedF64),
	NarrowCharacter(String),
	WideCharacter(String),
	Binary(Vec<u8>),
	UniqueIdentifier(Uuid),
	DateTime(NaiveDateTime),
}

impl KeyValue {
	pub fn new(value: &Value, collation: &Collation) -> KeyValue {
		match value.unwrap_variant() {
			Value::Null => KeyValue::Null,
			Value::Boolean(b) => KeyValue::Boolean(*b),
			Value::TinyInt(_) | Value::SmallInt(_) | Value::Int(_) | Value::BigInt(_) => KeyValue::Exact {
				digits: BigInt::from(value.as_i128().unwrap_or_default()),
				scale: 0,
			},
			Value::Decimal(d) => {
				let (mut digits, mut scale) = d.value().as_bigint_and_exponent();
				let ten = BigInt::from(10u8);
				if digits.is_zero() {
					scale = 0;
				}
				while scale > 0 && (&digits % &ten).is_zero() {
					digits /= &ten;
					scale -= 1;
				}
				KeyValue::Exact {
					digits,
					scale,
				}
			}
			Value::Real(f) => KeyValue::Approximate(OrderedF64::try_from(f.value() as f64).unwrap_or_default()),
			Value::Float(f) => KeyValue::Approximate(*f),
			Value::VarChar(s) => KeyValue::NarrowCharacter(collation.key(s)),
			Value::NVarChar(s) => KeyValue::WideCharacter(collation.key(s)),
			Value::VarBinary(b) => KeyValue::Binary(b.clone()),
			Value::UniqueIdentifier(u) => KeyValue::UniqueIdentifier(*u),
			Value::Date(d) => KeyValue::DateTime(d.and_time(chrono::NaiveTime::MIN)),
			Value::Time(t) => KeyValue::DateTime(base_date().date().and_time(*t)),
			Value::DateTime(dt) => KeyValue::DateTime(*dt),
			Value::DateTimeOffset(dt) => KeyValue::DateTime(dt.naive_utc()),
			Value::Variant(inner) => KeyValue::new(inner, collation),
		}
	}

	pub fn is_null(&self) -> bool {
		matches!(self, KeyValue::Null)
	}

	/// Keys of a value list, value `i` folded with collation `i`.
	pub fn row(values: &[Value], collations: &[Collation]) -> Vec<KeyValue> {
		values.iter()
			.enumerate()
			.map(|(i, v)| KeyValue::new(v, collations.get(i).unwrap_or(&Collation::default())))
			.collect()
	}
}
